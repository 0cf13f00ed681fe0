//! # Financial Sheet Analyzer
//!
//! Reads a workbook of Swedish income statements (one sheet per company and
//! year) and derives monthly series, yearly totals and category breakdowns
//! from it.
//!
//! ## Core Concepts
//!
//! - **Raw sheet**: the sheet as read, with the `KONTO/BESKRIVNING` header row
//!   renamed to `Kategori`, `Jan` … `Dec`, `Totalt`
//! - **Processed sheet**: the numeric form, keyed by row label, decimal commas parsed
//! - **Summary rows**: `SUMMA RÖRELSENS INTÄKTER` / `SUMMA NETTOOMSÄTTNING`,
//!   `SUMMA RÖRELSENS KOSTNADER` and `BERÄKNAT RESULTAT`, which carry the
//!   reported figures
//! - **Detail rows**: account rows above the revenue summary (revenue) and
//!   between it and the net result (expenses)
//! - **Overrides**: per-sheet user edits that reassign or exclude detail rows
//!   in the edited view
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_sheet_analyzer::*;
//! use std::path::Path;
//!
//! let analyzer = FinancialAnalyzer::load(Path::new("Finansiell Data.xlsx"))?;
//!
//! for sheet in analyzer.list_sheets() {
//!     let totals = analyzer.yearly_totals(sheet);
//!     println!("{}: {} tSEK ({})", sheet, format_tsek(totals.net_result),
//!         format_percent(totals.profit_margin()));
//! }
//!
//! let mut overrides = SheetOverrides::new();
//! overrides.exclude(12, true);
//! let edited = analyzer.edited_monthly_series("Bolaget AB 2023", &overrides);
//! ```

pub mod aggregation;
pub mod classifier;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod overrides;
pub mod report;
pub mod schema;
pub mod utils;

pub use aggregation::{
    CategoryAmount, CategoryKind, MonthlySeries, MonthlyValues, YearlyTotals,
};
pub use classifier::{classify_rows, RowKind, ScanState, SummaryRows};
pub use config::AnalyzerConfig;
pub use error::{FinancialSheetError, Result};
pub use ingestion::{clean_sheet, SkippedSheet, Workbook};
pub use overrides::{
    filter_rows, Assignment, EditFilter, EditableRow, EditedSeries, OverrideSummary,
    RowOverride, SheetOverrides,
};
pub use report::{CompanyKpi, DataSummary, KpiTable, SheetSummary};
pub use schema::*;
pub use utils::*;

use log::{info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A loaded workbook and the queries over it.
///
/// Sheets are held in both their raw and processed form. A sheet that fails
/// cleaning, or repeats the name of an earlier sheet, is recorded in
/// [`FinancialAnalyzer::skipped_sheets`] and is not visible through any query.
#[derive(Debug, Clone)]
pub struct FinancialAnalyzer {
    source: Option<PathBuf>,
    sheet_names: Vec<String>,
    raw: BTreeMap<String, RawSheet>,
    processed: BTreeMap<String, ProcessedSheet>,
    skipped: Vec<SkippedSheet>,
}

impl FinancialAnalyzer {
    pub fn load(path: &Path) -> Result<Self> {
        let workbook = Workbook::open(path)?;
        let mut analyzer = Self::from_workbook(workbook);
        analyzer.source = Some(path.to_path_buf());
        Ok(analyzer)
    }

    pub fn load_bytes(bytes: Vec<u8>) -> Result<Self> {
        Ok(Self::from_workbook(Workbook::from_bytes(bytes)?))
    }

    /// Loads the first candidate workbook of `config` found in `dir`.
    pub fn discover(dir: &Path, config: &AnalyzerConfig) -> Result<Self> {
        let path = config.discover_workbook(dir).ok_or_else(|| {
            FinancialSheetError::WorkbookNotFound(format!(
                "none of {:?} in {}",
                config.candidate_files,
                dir.display()
            ))
        })?;
        Self::load(&path)
    }

    pub fn from_workbook(workbook: Workbook) -> Self {
        let mut analyzer = Self {
            source: workbook.source.as_ref().map(PathBuf::from),
            sheet_names: Vec::new(),
            raw: BTreeMap::new(),
            processed: BTreeMap::new(),
            skipped: Vec::new(),
        };

        for sheet in workbook.sheets {
            if analyzer.raw.contains_key(&sheet.name) {
                warn!("Duplicate sheet name '{}', keeping the first one", sheet.name);
                analyzer.skipped.push(SkippedSheet {
                    name: sheet.name,
                    reason: "duplicate sheet name".to_string(),
                });
                continue;
            }

            match clean_sheet(&sheet) {
                Ok(processed) => {
                    analyzer.sheet_names.push(sheet.name.clone());
                    analyzer.processed.insert(sheet.name.clone(), processed);
                    analyzer.raw.insert(sheet.name.clone(), sheet);
                }
                Err(e) => {
                    warn!("Could not process sheet '{}': {}", sheet.name, e);
                    analyzer.skipped.push(SkippedSheet {
                        name: sheet.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Loaded {} sheets from {}: {:?}",
            analyzer.sheet_names.len(),
            analyzer.source_display(),
            analyzer.sheet_names
        );

        analyzer
    }

    /// Reads the workbook again from its file, replacing everything loaded.
    ///
    /// On failure the analyzer keeps its current contents.
    pub fn reload(&mut self) -> Result<()> {
        let path = self.source.clone().ok_or_else(|| {
            FinancialSheetError::ConfigError(
                "workbook was not loaded from a file and cannot be reloaded".to_string(),
            )
        })?;
        *self = Self::load(&path)?;
        Ok(())
    }

    /// Sheet names in workbook order, skipped sheets excluded.
    pub fn list_sheets(&self) -> &[String] {
        &self.sheet_names
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn source_display(&self) -> String {
        self.source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string())
    }

    pub fn raw_sheet(&self, name: &str) -> Option<&RawSheet> {
        self.raw.get(name)
    }

    pub fn processed_sheet(&self, name: &str) -> Option<&ProcessedSheet> {
        self.processed.get(name)
    }

    pub fn skipped_sheets(&self) -> &[SkippedSheet] {
        &self.skipped
    }

    pub fn monthly_series(&self, sheet: &str) -> Option<MonthlySeries> {
        self.raw_sheet(sheet).map(aggregation::monthly_series)
    }

    /// Yearly totals of `sheet`; all zero when the sheet is unknown.
    pub fn yearly_totals(&self, sheet: &str) -> YearlyTotals {
        self.raw_sheet(sheet)
            .map(aggregation::yearly_totals)
            .unwrap_or_default()
    }

    pub fn category_breakdown(&self, sheet: &str, kind: CategoryKind) -> Vec<CategoryAmount> {
        self.raw_sheet(sheet)
            .map(|raw| aggregation::category_breakdown(raw, kind))
            .unwrap_or_default()
    }

    pub fn category_breakdown_with(
        &self,
        sheet: &str,
        kind: CategoryKind,
        config: &AnalyzerConfig,
    ) -> Vec<CategoryAmount> {
        self.raw_sheet(sheet)
            .map(|raw| {
                aggregation::category_breakdown_with(
                    raw,
                    kind,
                    config.noise_threshold,
                    config.label_width,
                )
            })
            .unwrap_or_default()
    }

    pub fn editable_rows(&self, sheet: &str, overrides: &SheetOverrides) -> Option<Vec<EditableRow>> {
        self.raw_sheet(sheet)
            .map(|raw| crate::overrides::editable_rows(raw, overrides))
    }

    /// Revenue and expense series summed from detail rows after applying `overrides`.
    pub fn edited_monthly_series(
        &self,
        sheet: &str,
        overrides: &SheetOverrides,
    ) -> Option<EditedSeries> {
        self.raw_sheet(sheet)
            .map(|raw| crate::overrides::edited_monthly_series(raw, overrides))
    }

    /// Yearly key figures for the given sheets, in the order given.
    ///
    /// Unknown sheet names are left out.
    pub fn kpi_table<S: AsRef<str>>(&self, sheets: &[S]) -> KpiTable {
        let companies = sheets
            .iter()
            .map(|name| name.as_ref())
            .filter(|name| self.raw.contains_key(*name))
            .map(|name| CompanyKpi::from_totals(name, &self.yearly_totals(name)))
            .collect();

        KpiTable { companies }
    }

    /// Monthly net result per sheet, for comparing companies.
    ///
    /// Unknown sheet names are left out; sheets without summary rows give a
    /// series of zeros.
    pub fn net_result_comparison<S: AsRef<str>>(&self, sheets: &[S]) -> Vec<(String, MonthlyValues)> {
        sheets
            .iter()
            .map(|name| name.as_ref())
            .filter_map(|name| {
                self.monthly_series(name)
                    .map(|series| (name.to_string(), series.net_result))
            })
            .collect()
    }

    pub fn data_summary(&self) -> DataSummary {
        DataSummary {
            source: self.source.as_ref().map(|p| p.display().to_string()),
            sheet_count: self.sheet_names.len() + self.skipped.len(),
            sheets: self
                .sheet_names
                .iter()
                .filter_map(|name| self.processed.get(name))
                .map(SheetSummary::from_processed)
                .collect(),
            skipped: self.skipped.clone(),
        }
    }
}

pub fn load_workbook(path: &Path) -> Result<FinancialAnalyzer> {
    FinancialAnalyzer::load(path)
}

pub fn discover_workbook(dir: &Path, config: &AnalyzerConfig) -> Result<FinancialAnalyzer> {
    FinancialAnalyzer::discover(dir, config)
}
