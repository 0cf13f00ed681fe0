use crate::classifier::{classify_rows, RowKind};
use crate::error::Result;
use crate::schema::{Cell, RawSheet, MONTHS};
use crate::utils::parse_locale_number;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a row takes part in the edited aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Assignment {
    /// Not counted as revenue or expense.
    #[default]
    Auto,
    Revenue,
    Expense,
}

impl Assignment {
    /// The assignment a row gets from its automatic classification.
    pub fn from_kind(kind: RowKind) -> Self {
        match kind {
            RowKind::RevenueDetail => Assignment::Revenue,
            RowKind::ExpenseDetail => Assignment::Expense,
            _ => Assignment::Auto,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RowOverride {
    #[schemars(description = "Replaces the automatic assignment of the row when set.")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Assignment>,

    #[schemars(description = "Leaves the row out of the edited aggregates.")]
    #[serde(default)]
    pub excluded: bool,
}

/// User edits for a single sheet, keyed by the row's position in the raw sheet.
///
/// Overrides are scoped to one sheet and are passed explicitly to the edited
/// aggregation; they never change the summary-row based figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SheetOverrides {
    #[serde(default)]
    pub rows: BTreeMap<usize, RowOverride>,
}

impl SheetOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, row: usize, assignment: Assignment) -> &mut Self {
        self.rows.entry(row).or_default().assignment = Some(assignment);
        self
    }

    pub fn exclude(&mut self, row: usize, excluded: bool) -> &mut Self {
        self.rows.entry(row).or_default().excluded = excluded;
        self
    }

    pub fn get(&self, row: usize) -> Option<&RowOverride> {
        self.rows.get(&row)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drops every edit, returning to the automatic classification.
    pub fn reset(&mut self) {
        self.rows.clear();
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(SheetOverrides);
        serde_json::to_string_pretty(&schema)
    }
}

/// A raw row as shown in the editable-data view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditableRow {
    pub row: usize,
    pub label: String,
    /// Automatic classification from the row scan.
    pub kind: RowKind,
    /// Effective assignment after overrides.
    pub assignment: Assignment,
    pub excluded: bool,
    /// Cells exactly as in the workbook.
    pub cells: Vec<Cell>,
    /// Parsed month values, 0 where the month column is missing.
    pub months: [f64; 12],
}

impl EditableRow {
    pub fn has_activity(&self) -> bool {
        self.months.iter().any(|v| *v != 0.0)
    }

    pub fn is_overridden(&self) -> bool {
        self.assignment != Assignment::from_kind(self.kind)
    }
}

pub fn editable_rows(sheet: &RawSheet, overrides: &SheetOverrides) -> Vec<EditableRow> {
    let month_columns: Vec<Option<usize>> = MONTHS
        .iter()
        .map(|(_, label)| sheet.column_index(label))
        .collect();

    classify_rows(sheet)
        .into_iter()
        .enumerate()
        .map(|(row, kind)| {
            let edit = overrides.get(row);
            let cells = sheet.rows.get(row).cloned().unwrap_or_default();

            let mut months = [0.0; 12];
            for (idx, column) in month_columns.iter().enumerate() {
                if let Some(cell) = column.and_then(|c| cells.get(c)) {
                    months[idx] = parse_locale_number(cell);
                }
            }

            EditableRow {
                row,
                label: sheet.label(row),
                kind,
                assignment: edit
                    .and_then(|e| e.assignment)
                    .unwrap_or_else(|| Assignment::from_kind(kind)),
                excluded: edit.is_some_and(|e| e.excluded),
                cells,
                months,
            }
        })
        .collect()
}

/// Monthly aggregates recomputed from the rows' current assignments.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EditedSeries {
    pub revenue: [f64; 12],
    pub expenses: [f64; 12],
}

impl EditedSeries {
    /// Revenue plus expenses; expenses already carry their sign.
    ///
    /// This can differ from the sheet's own net result row.
    pub fn net_result(&self) -> [f64; 12] {
        let mut net = [0.0; 12];
        for (idx, value) in net.iter_mut().enumerate() {
            *value = self.revenue[idx] + self.expenses[idx];
        }
        net
    }
}

/// Sums the month cells of every non-excluded row per assignment.
///
/// Monthly revenue is reported as its absolute value, expenses keep their sign.
pub fn edited_monthly_series(sheet: &RawSheet, overrides: &SheetOverrides) -> EditedSeries {
    let rows = editable_rows(sheet, overrides);
    let sum = |month: usize, wanted: Assignment| -> f64 {
        rows.iter()
            .filter(|r| !r.excluded && r.assignment == wanted)
            .map(|r| r.months[month])
            .sum()
    };

    let mut series = EditedSeries::default();
    for month in 0..12 {
        series.revenue[month] = sum(month, Assignment::Revenue).abs();
        series.expenses[month] = sum(month, Assignment::Expense);
    }
    series
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditFilter {
    #[default]
    All,
    Revenue,
    Expense,
    Excluded,
}

impl EditFilter {
    pub fn matches(self, row: &EditableRow) -> bool {
        match self {
            EditFilter::All => true,
            EditFilter::Revenue => row.assignment == Assignment::Revenue,
            EditFilter::Expense => row.assignment == Assignment::Expense,
            EditFilter::Excluded => row.excluded,
        }
    }
}

/// Rows to display in the editor. `active_only` keeps rows with a nonzero month.
pub fn filter_rows(rows: &[EditableRow], filter: EditFilter, active_only: bool) -> Vec<&EditableRow> {
    rows.iter()
        .filter(|r| !active_only || r.has_activity())
        .filter(|r| filter.matches(r))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverrideSummary {
    pub revenue: usize,
    pub expense: usize,
    pub excluded: usize,
}

impl OverrideSummary {
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a EditableRow>) -> Self {
        let mut summary = Self::default();
        for row in rows {
            match row.assignment {
                Assignment::Revenue => summary.revenue += 1,
                Assignment::Expense => summary.expense += 1,
                Assignment::Auto => {}
            }
            if row.excluded {
                summary.excluded += 1;
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::monthly_series;
    use crate::ingestion::ingest_grid;

    fn row(label: &str, jan: &str, feb: &str) -> Vec<Cell> {
        vec![Cell::from(label), Cell::from(jan), Cell::from(feb)]
    }

    fn sheet() -> RawSheet {
        ingest_grid(
            "Bolaget AB 2023",
            vec![
                row("KONTO/BESKRIVNING", "Jan", "Feb"),
                row("Försäljning", "1 000", "900"),
                row("Hyresintäkter", "200", ""),
                row("SUMMA RÖRELSENS INTÄKTER", "1 200", "900"),
                row("Lokalhyra", "-300", "-300"),
                row("Löner", "-400,5", "-400,5"),
                row("SUMMA RÖRELSENS KOSTNADER", "-700,5", "-700,5"),
                row("BERÄKNAT RESULTAT", "499,5", "199,5"),
            ],
        )
    }

    #[test]
    fn test_auto_assignment_follows_classification() {
        let rows = editable_rows(&sheet(), &SheetOverrides::new());

        let assignments: Vec<Assignment> = rows.iter().map(|r| r.assignment).collect();
        assert_eq!(
            assignments,
            vec![
                Assignment::Revenue,
                Assignment::Revenue,
                Assignment::Auto,
                Assignment::Expense,
                Assignment::Expense,
                Assignment::Auto,
                Assignment::Auto,
            ]
        );
        assert!(rows.iter().all(|r| !r.excluded && !r.is_overridden()));
        assert_eq!(rows[4].months[0], -400.5);
    }

    #[test]
    fn test_edited_series_without_overrides() {
        let series = edited_monthly_series(&sheet(), &SheetOverrides::new());

        assert_eq!(series.revenue[0], 1200.0);
        assert_eq!(series.revenue[1], 900.0);
        assert_eq!(series.expenses[0], -700.5);
        assert_eq!(series.net_result()[0], 499.5);
        assert_eq!(series.revenue[2], 0.0);
    }

    #[test]
    fn test_excluding_an_expense_row_only_changes_edited_view() {
        let sheet = sheet();
        let before = monthly_series(&sheet);

        let mut overrides = SheetOverrides::new();
        overrides.exclude(3, true);
        let edited = edited_monthly_series(&sheet, &overrides);

        assert_eq!(edited.expenses[0], -400.5);
        assert_eq!(edited.net_result()[0], 799.5);
        assert_eq!(monthly_series(&sheet), before);
        assert_eq!(before.expenses[0], -700.5);
    }

    #[test]
    fn test_reassigning_rows() {
        let mut overrides = SheetOverrides::new();
        overrides
            .assign(1, Assignment::Expense)
            .assign(2, Assignment::Revenue);

        let edited = edited_monthly_series(&sheet(), &overrides);

        // Hyresintäkter moved to expenses, the revenue summary row counted as revenue.
        assert_eq!(edited.revenue[0], 2200.0);
        assert_eq!(edited.expenses[0], 200.0 - 700.5);

        let rows = editable_rows(&sheet(), &overrides);
        assert!(rows[1].is_overridden());
        assert!(rows[2].is_overridden());
        assert!(!rows[0].is_overridden());
    }

    #[test]
    fn test_filters_and_summary() {
        let mut overrides = SheetOverrides::new();
        overrides.exclude(0, true);
        let mut rows = editable_rows(&sheet(), &overrides);
        rows[1].months = [0.0; 12];

        assert_eq!(filter_rows(&rows, EditFilter::All, false).len(), 7);
        assert_eq!(filter_rows(&rows, EditFilter::Revenue, false).len(), 2);
        assert_eq!(filter_rows(&rows, EditFilter::Revenue, true).len(), 1);
        assert_eq!(filter_rows(&rows, EditFilter::Expense, false).len(), 2);
        assert_eq!(filter_rows(&rows, EditFilter::Excluded, false)[0].label, "Försäljning");

        let summary = OverrideSummary::from_rows(&rows);
        assert_eq!(
            summary,
            OverrideSummary {
                revenue: 2,
                expense: 2,
                excluded: 1,
            }
        );
    }

    #[test]
    fn test_reset_and_json_round_trip() {
        let mut overrides = SheetOverrides::new();
        overrides.assign(4, Assignment::Revenue).exclude(5, true);

        let json = overrides.to_json().unwrap();
        let restored = SheetOverrides::from_json(&json).unwrap();
        assert_eq!(restored, overrides);

        overrides.reset();
        assert!(overrides.is_empty());

        let schema = SheetOverrides::schema_as_json().unwrap();
        assert!(schema.contains("excluded"));
        assert!(schema.contains("assignment"));
    }
}
