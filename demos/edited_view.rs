use financial_sheet_analyzer::{
    filter_rows, format_tsek, EditFilter, FinancialAnalyzer, OverrideSummary,
    SheetOverrides,
};
use std::env;
use std::path::PathBuf;

/// Usage: edited_view <workbook> <sheet> [overrides.json]
fn main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1);
    let (Some(path), Some(sheet)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: edited_view <workbook> <sheet> [overrides.json]");
    };

    let analyzer = FinancialAnalyzer::load(&PathBuf::from(path))?;

    let mut overrides = match args.next() {
        Some(file) => SheetOverrides::from_json(&std::fs::read_to_string(file)?)?,
        None => SheetOverrides::new(),
    };

    let Some(rows) = analyzer.editable_rows(&sheet, &overrides) else {
        anyhow::bail!("sheet '{}' not found, available: {:?}", sheet, analyzer.list_sheets());
    };

    // Without an overrides file, show the effect of leaving out the first active expense row.
    if overrides.is_empty() {
        if let Some(row) = filter_rows(&rows, EditFilter::Expense, true).first() {
            println!("Exkluderar rad {} ({})\n", row.row, row.label);
            overrides.exclude(row.row, true);
        }
    }

    let rows = analyzer
        .editable_rows(&sheet, &overrides)
        .unwrap_or_default();

    println!("{:>4} {:<40} {:<8} {:<8}", "Rad", "Kategori", "Typ", "Exkl.");
    for row in filter_rows(&rows, EditFilter::All, true) {
        println!(
            "{:>4} {:<40} {:<8} {:<8}",
            row.row,
            row.label,
            format!("{:?}", row.assignment),
            if row.excluded { "ja" } else { "" }
        );
    }

    let summary = OverrideSummary::from_rows(&rows);
    println!(
        "\n{} intäktsrader, {} kostnadsrader, {} exkluderade",
        summary.revenue, summary.expense, summary.excluded
    );

    let reported = analyzer.monthly_series(&sheet).unwrap_or_default();
    let edited = analyzer
        .edited_monthly_series(&sheet, &overrides)
        .unwrap_or_default();
    let edited_net = edited.net_result();

    println!("\n{:<6} {:>14} {:>14}", "Månad", "Resultat", "Redigerat");
    for (idx, (month, _, _, net)) in reported.rows().enumerate() {
        println!(
            "{:<6} {:>14} {:>14}",
            month,
            format_tsek(net),
            format_tsek(edited_net[idx])
        );
    }

    println!("\n{}", overrides.to_json()?);
    Ok(())
}
