use financial_sheet_analyzer::{
    format_percent, format_tsek, AnalyzerConfig, CategoryKind, FinancialAnalyzer,
};
use std::env;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let config = match env::var("ANALYZER_CONFIG") {
        Ok(path) => AnalyzerConfig::from_json_file(&PathBuf::from(path))?,
        Err(_) => AnalyzerConfig::default(),
    };

    let analyzer = match env::args().nth(1) {
        Some(path) => FinancialAnalyzer::load(&PathBuf::from(path))?,
        None => FinancialAnalyzer::discover(&env::current_dir()?, &config)?,
    };

    println!("{}", analyzer.data_summary());

    for sheet in analyzer.list_sheets() {
        println!("=== {} ===", sheet);

        if let Some(series) = analyzer.monthly_series(sheet) {
            println!("{:<6} {:>14} {:>14} {:>14}", "Månad", "Intäkter", "Kostnader", "Resultat");
            for (month, revenue, expenses, net) in series.rows() {
                println!(
                    "{:<6} {:>14} {:>14} {:>14}",
                    month,
                    format_tsek(revenue),
                    format_tsek(expenses),
                    format_tsek(net)
                );
            }
        }

        let totals = analyzer.yearly_totals(sheet);
        println!(
            "Totalt: intäkter {} tSEK, kostnader {} tSEK, resultat {} tSEK, marginal {}",
            format_tsek(totals.revenue),
            format_tsek(totals.expenses),
            format_tsek(totals.net_result),
            format_percent(totals.profit_margin())
        );

        for (title, kind) in [
            ("Intäktskategorier", CategoryKind::Revenue),
            ("Kostnadskategorier", CategoryKind::Expense),
        ] {
            let categories = analyzer.category_breakdown_with(sheet, kind, &config);
            if categories.is_empty() {
                continue;
            }
            println!("{}:", title);
            for category in categories {
                println!("  {:<40} {:>14}", category.label, format_tsek(category.amount));
            }
        }
        println!();
    }

    let table = analyzer.kpi_table(analyzer.list_sheets());
    println!("{}", table.to_markdown());

    Ok(())
}
