use crate::classifier::{classify_rows, RowKind, SummaryRows};
use crate::config::{DEFAULT_LABEL_WIDTH, DEFAULT_NOISE_THRESHOLD};
use crate::schema::{month_index, RawSheet, MONTHS};
use crate::utils::{parse_locale_number, profit_margin, truncate_label};
use chrono::Month;
use serde::{Deserialize, Serialize};

pub type MonthlyValues = [f64; 12];

/// Monthly revenue, expenses and net result of one sheet, January first.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub revenue: MonthlyValues,
    pub expenses: MonthlyValues,
    pub net_result: MonthlyValues,
}

impl MonthlySeries {
    /// (revenue, expenses, net result) for one month.
    pub fn month(&self, month: Month) -> (f64, f64, f64) {
        let idx = month_index(month);
        (self.revenue[idx], self.expenses[idx], self.net_result[idx])
    }

    /// One `(month label, revenue, expenses, net result)` tuple per month.
    pub fn rows(&self) -> impl Iterator<Item = (&'static str, f64, f64, f64)> + '_ {
        MONTHS.iter().enumerate().map(move |(idx, (_, label))| {
            (
                *label,
                self.revenue[idx],
                self.expenses[idx],
                self.net_result[idx],
            )
        })
    }
}

/// Yearly figures read from the total column of the summary rows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct YearlyTotals {
    pub revenue: f64,
    pub expenses: f64,
    pub net_result: f64,
}

impl YearlyTotals {
    pub fn profit_margin(&self) -> f64 {
        profit_margin(self.net_result, self.revenue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Revenue,
    Expense,
}

impl CategoryKind {
    pub fn detail_kind(self) -> RowKind {
        match self {
            CategoryKind::Revenue => RowKind::RevenueDetail,
            CategoryKind::Expense => RowKind::ExpenseDetail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAmount {
    pub label: String,
    /// Magnitude of the row's total, in tSEK.
    pub amount: f64,
}

fn cell_value(sheet: &RawSheet, row: Option<usize>, column: Option<usize>) -> f64 {
    match (row, column) {
        (Some(row), Some(column)) => sheet
            .cell(row, column)
            .map(parse_locale_number)
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

/// The total column, never the label column.
fn value_total_column(sheet: &RawSheet) -> Option<usize> {
    sheet.total_column().filter(|&column| column > 0)
}

/// Reads the monthly figures straight from the summary rows.
///
/// Revenue is reported as its absolute value, expenses and net result keep
/// the sign they have in the sheet. Missing summary rows and missing month
/// columns read as 0.
pub fn monthly_series(sheet: &RawSheet) -> MonthlySeries {
    let summary = SummaryRows::locate(sheet);
    let mut series = MonthlySeries::default();

    for (idx, (_, label)) in MONTHS.iter().enumerate() {
        let column = sheet.column_index(label);
        series.revenue[idx] = cell_value(sheet, summary.revenue, column).abs();
        series.expenses[idx] = cell_value(sheet, summary.expense, column);
        series.net_result[idx] = cell_value(sheet, summary.net_result, column);
    }

    series
}

pub fn yearly_totals(sheet: &RawSheet) -> YearlyTotals {
    let summary = SummaryRows::locate(sheet);
    let column = value_total_column(sheet);

    YearlyTotals {
        revenue: cell_value(sheet, summary.revenue, column).abs(),
        expenses: cell_value(sheet, summary.expense, column),
        net_result: cell_value(sheet, summary.net_result, column),
    }
}

pub fn category_breakdown(sheet: &RawSheet, kind: CategoryKind) -> Vec<CategoryAmount> {
    category_breakdown_with(sheet, kind, DEFAULT_NOISE_THRESHOLD, DEFAULT_LABEL_WIDTH)
}

/// Detail rows of one kind with their yearly total, largest first.
///
/// Rows whose total magnitude is at or below `noise_threshold` are left out.
/// Equal amounts keep sheet order.
pub fn category_breakdown_with(
    sheet: &RawSheet,
    kind: CategoryKind,
    noise_threshold: f64,
    label_width: usize,
) -> Vec<CategoryAmount> {
    let Some(total) = value_total_column(sheet) else {
        return Vec::new();
    };
    let wanted = kind.detail_kind();

    let mut amounts: Vec<CategoryAmount> = classify_rows(sheet)
        .into_iter()
        .enumerate()
        .filter(|(_, row_kind)| *row_kind == wanted)
        .filter_map(|(row, _)| {
            let amount = cell_value(sheet, Some(row), Some(total)).abs();
            (amount > noise_threshold).then(|| CategoryAmount {
                label: truncate_label(&sheet.label(row), label_width),
                amount,
            })
        })
        .collect();

    amounts.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    amounts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::ingest_grid;
    use crate::schema::{Cell, VALUE_COLUMNS};

    fn header() -> Vec<Cell> {
        let mut cells = vec![Cell::from("KONTO/BESKRIVNING")];
        cells.extend(VALUE_COLUMNS.iter().map(|c| Cell::from(c.to_uppercase().as_str())));
        cells
    }

    fn statement_row(label: &str, jan: &str, feb: &str, total: &str) -> Vec<Cell> {
        let mut cells = vec![Cell::Empty; 14];
        cells[0] = Cell::from(label);
        cells[1] = Cell::from(jan);
        cells[2] = Cell::from(feb);
        cells[13] = Cell::from(total);
        cells
    }

    fn statement_sheet() -> RawSheet {
        ingest_grid(
            "Bolaget AB 2023",
            vec![
                vec![Cell::from("Resultatrapport")],
                header(),
                statement_row("3010 Försäljning tjänster", "1 000,0", "800", "1 800,0"),
                statement_row("3990 Övriga intäkter", "", "", "10,01"),
                statement_row("3999 Öresavrundning", "", "", "10"),
                statement_row("SUMMA RÖRELSENS INTÄKTER", "1 234,5", "800,0", "2 034,5"),
                statement_row("5010 Lokalhyra", "-300", "-300", "-600"),
                statement_row("7010 Löner till tjänstemän", "-500,5", "", "-500,5"),
                statement_row("Summa personalkostnader", "-500,5", "", "-500,5"),
                statement_row("SUMMA RÖRELSENS KOSTNADER", "-800,5", "-300", "-1 100,5"),
                statement_row("BERÄKNAT RESULTAT", "434", "500", "934"),
            ],
        )
    }

    #[test]
    fn test_monthly_series_reads_summary_rows() {
        let series = monthly_series(&statement_sheet());

        assert_eq!(series.revenue[0], 1234.5);
        assert_eq!(series.revenue[1], 800.0);
        assert_eq!(series.expenses[0], -800.5);
        assert_eq!(series.expenses[1], -300.0);
        assert_eq!(series.net_result[0], 434.0);
        assert_eq!(series.net_result[1], 500.0);
        assert_eq!(series.month(Month::March), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_yearly_totals_read_total_column() {
        let totals = yearly_totals(&statement_sheet());

        assert_eq!(totals.revenue, 2034.5);
        assert_eq!(totals.expenses, -1100.5);
        assert_eq!(totals.net_result, 934.0);
        assert!((totals.profit_margin() - 934.0 / 2034.5 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_revenue_is_reported_as_absolute_value() {
        let sheet = ingest_grid(
            "Kreditsaldo",
            vec![
                header(),
                statement_row("Summa nettoomsättning", "-1 500", "", "-1 500"),
            ],
        );

        assert_eq!(monthly_series(&sheet).revenue[0], 1500.0);
        assert_eq!(yearly_totals(&sheet).revenue, 1500.0);
    }

    #[test]
    fn test_missing_markers_yield_zero() {
        let sheet = ingest_grid(
            "Ofullständig",
            vec![header(), statement_row("Försäljning", "100", "100", "200")],
        );

        assert_eq!(monthly_series(&sheet), MonthlySeries::default());
        assert_eq!(yearly_totals(&sheet), YearlyTotals::default());
        assert_eq!(yearly_totals(&sheet).profit_margin(), 0.0);
    }

    #[test]
    fn test_missing_month_columns_yield_zero() {
        let sheet = ingest_grid(
            "Kvartal",
            vec![
                vec![Cell::from("Kategori"), Cell::from("Jan"), Cell::from("Totalt")],
                vec![
                    Cell::from("SUMMA RÖRELSENS INTÄKTER"),
                    Cell::from("50"),
                    Cell::from("75"),
                ],
            ],
        );

        let series = monthly_series(&sheet);
        assert_eq!(series.revenue[0], 50.0);
        assert!(series.revenue[1..].iter().all(|v| *v == 0.0));
        assert_eq!(yearly_totals(&sheet).revenue, 75.0);
    }

    #[test]
    fn test_total_falls_back_to_last_column() {
        let sheet = ingest_grid(
            "Utan totalt",
            vec![
                vec![Cell::from("Konto"), Cell::from("Jan"), Cell::from("Helår")],
                vec![
                    Cell::from("BERÄKNAT RESULTAT"),
                    Cell::from("-5"),
                    Cell::from("-42,5"),
                ],
            ],
        );

        assert_eq!(yearly_totals(&sheet).net_result, -42.5);
    }

    #[test]
    fn test_label_column_is_never_the_total_column() {
        let sheet = ingest_grid(
            "Bara etiketter",
            vec![
                vec![Cell::from("Kategori")],
                vec![Cell::from("BERÄKNAT RESULTAT")],
                vec![Cell::from("Försäljning")],
            ],
        );

        assert_eq!(sheet.total_column(), Some(0));
        assert_eq!(yearly_totals(&sheet), YearlyTotals::default());
        assert!(category_breakdown(&sheet, CategoryKind::Revenue).is_empty());
    }

    #[test]
    fn test_breakdown_noise_threshold_boundary() {
        let revenue = category_breakdown(&statement_sheet(), CategoryKind::Revenue);

        assert_eq!(
            revenue,
            vec![
                CategoryAmount {
                    label: "3010 Försäljning tjänster".to_string(),
                    amount: 1800.0,
                },
                CategoryAmount {
                    label: "3990 Övriga intäkter".to_string(),
                    amount: 10.01,
                },
            ]
        );
    }

    #[test]
    fn test_expense_breakdown_uses_magnitude_and_skips_subtotals() {
        let expenses = category_breakdown(&statement_sheet(), CategoryKind::Expense);

        let labels: Vec<&str> = expenses.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["5010 Lokalhyra", "7010 Löner till tjänstemän"]);
        assert_eq!(expenses[0].amount, 600.0);
        assert_eq!(expenses[1].amount, 500.5);
    }

    #[test]
    fn test_breakdown_truncates_labels() {
        let sheet = ingest_grid(
            "Långa namn",
            vec![
                header(),
                statement_row(
                    "Försäljning av konsulttjänster inom området systemutveckling",
                    "",
                    "",
                    "250",
                ),
            ],
        );

        let revenue = category_breakdown(&sheet, CategoryKind::Revenue);
        assert_eq!(revenue.len(), 1);
        assert_eq!(revenue[0].label.chars().count(), 40);

        let narrow = category_breakdown_with(&sheet, CategoryKind::Revenue, 10.0, 11);
        assert_eq!(narrow[0].label, "Försäljning");
    }

    #[test]
    fn test_monthly_rows_are_in_calendar_order() {
        let series = monthly_series(&statement_sheet());
        let rows: Vec<_> = series.rows().collect();

        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0], ("Jan", 1234.5, -800.5, 434.0));
        assert_eq!(rows[4].0, "Maj");
        assert_eq!(rows[11].0, "Dec");
    }
}
