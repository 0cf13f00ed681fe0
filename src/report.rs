use crate::aggregation::YearlyTotals;
use crate::error::{FinancialSheetError, Result};
use crate::ingestion::SkippedSheet;
use crate::schema::ProcessedSheet;
use crate::utils::{format_percent, format_tsek};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

const SAMPLE_KEYS: usize = 5;

/// Yearly key figures of one company/year sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyKpi {
    pub sheet: String,
    pub revenue: f64,
    pub expenses: f64,
    pub net_result: f64,
    pub profit_margin: f64,
}

impl CompanyKpi {
    pub fn from_totals(sheet: &str, totals: &YearlyTotals) -> Self {
        Self {
            sheet: sheet.to_string(),
            revenue: totals.revenue.abs(),
            expenses: totals.expenses,
            net_result: totals.net_result,
            profit_margin: totals.profit_margin(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiTable {
    pub companies: Vec<CompanyKpi>,
}

impl KpiTable {
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "Företag/År",
            "Totala Intäkter (tSEK)",
            "Totala Kostnader (tSEK)",
            "Nettoresultat (tSEK)",
            "Vinstmarginal (%)",
        ])?;

        for company in &self.companies {
            writer.write_record([
                company.sheet.clone(),
                format!("{:.1}", company.revenue),
                format!("{:.1}", company.expenses),
                format!("{:.1}", company.net_result),
                format!("{:.1}", company.profit_margin),
            ])?;
        }

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        String::from_utf8(bytes)
            .map_err(|e| FinancialSheetError::IoError(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str("| Företag/År | Totala Intäkter (tSEK) | Totala Kostnader (tSEK) | Nettoresultat (tSEK) | Vinstmarginal (%) |\n");
        output.push_str("|---|---:|---:|---:|---:|\n");

        for company in &self.companies {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                company.sheet,
                format_tsek(company.revenue),
                format_tsek(company.expenses),
                format_tsek(company.net_result),
                format_percent(company.profit_margin)
            ));
        }

        output
    }

    pub fn best_margin(&self) -> Option<&CompanyKpi> {
        self.companies
            .iter()
            .max_by(|a, b| a.profit_margin.total_cmp(&b.profit_margin))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub sample_keys: Vec<String>,
    pub column_names: Vec<String>,
}

impl SheetSummary {
    pub fn from_processed(sheet: &ProcessedSheet) -> Self {
        let (rows, columns) = sheet.shape();
        Self {
            name: sheet.name.clone(),
            rows,
            columns,
            sample_keys: sheet.keys().take(SAMPLE_KEYS).map(str::to_string).collect(),
            column_names: sheet.columns.clone(),
        }
    }
}

/// Overview of a loaded workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub source: Option<String>,
    /// All sheets in the workbook, including skipped ones.
    pub sheet_count: usize,
    pub sheets: Vec<SheetSummary>,
    pub skipped: Vec<SkippedSheet>,
}

impl fmt::Display for DataSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Data summary")?;
        writeln!(
            f,
            "Workbook: {}",
            self.source.as_deref().unwrap_or("<memory>")
        )?;
        writeln!(f, "Sheets: {}", self.sheet_count)?;

        for sheet in &self.sheets {
            writeln!(f)?;
            writeln!(f, "{}:", sheet.name)?;
            writeln!(f, "  Size: {} rows x {} columns", sheet.rows, sheet.columns)?;
            let more = if sheet.rows > sheet.sample_keys.len() {
                ", ..."
            } else {
                ""
            };
            writeln!(f, "  Categories: {}{}", sheet.sample_keys.join(", "), more)?;
            writeln!(f, "  Columns: {}", sheet.column_names.join(", "))?;
        }

        for skipped in &self.skipped {
            writeln!(f)?;
            writeln!(f, "{}: skipped ({})", skipped.name, skipped.reason)?;
        }

        Ok(())
    }
}
