use crate::schema::RawSheet;
use serde::{Deserialize, Serialize};

pub const REVENUE_SUMMARY_KEYWORDS: [&str; 2] =
    ["SUMMA RÖRELSENS INTÄKTER", "SUMMA NETTOOMSÄTTNING"];
pub const EXPENSE_SUMMARY_KEYWORD: &str = "SUMMA RÖRELSENS KOSTNADER";
pub const NET_RESULT_KEYWORD: &str = "BERÄKNAT RESULTAT";
pub const SUMMARY_KEYWORD: &str = "SUMMA";

/// Structural role of a row in an income statement sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    RevenueDetail,
    ExpenseDetail,
    RevenueSummary,
    ExpenseSummary,
    NetResult,
    /// Blank labels, other subtotals and detail rows below the net result.
    Ignored,
}

impl RowKind {
    pub fn is_detail(self) -> bool {
        matches!(self, RowKind::RevenueDetail | RowKind::ExpenseDetail)
    }

    pub fn is_summary(self) -> bool {
        matches!(
            self,
            RowKind::RevenueSummary | RowKind::ExpenseSummary | RowKind::NetResult
        )
    }
}

/// What a label says about itself, before its position is taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMarker {
    RevenueSummary,
    ExpenseSummary,
    NetResult,
    OtherSummary,
    Blank,
    Detail,
}

pub fn label_marker(label: &str) -> LabelMarker {
    let upper = label.trim().to_uppercase();

    if upper.is_empty() {
        LabelMarker::Blank
    } else if REVENUE_SUMMARY_KEYWORDS.iter().any(|k| upper.contains(k)) {
        LabelMarker::RevenueSummary
    } else if upper.contains(EXPENSE_SUMMARY_KEYWORD) {
        LabelMarker::ExpenseSummary
    } else if upper.contains(NET_RESULT_KEYWORD) {
        LabelMarker::NetResult
    } else if upper.contains(SUMMARY_KEYWORD) {
        LabelMarker::OtherSummary
    } else {
        LabelMarker::Detail
    }
}

/// Position of the scan relative to the revenue summary and net result rows.
///
/// States only move forward: once the net result has been passed, a later
/// revenue summary does not reopen the expense region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ScanState {
    #[default]
    BeforeRevenueSummary,
    InExpenseRegion,
    AfterNetResult,
}

impl ScanState {
    /// Classifies the row with `label` and returns the state for the next row.
    pub fn step(self, label: &str) -> (RowKind, ScanState) {
        match label_marker(label) {
            LabelMarker::RevenueSummary => (
                RowKind::RevenueSummary,
                self.max(ScanState::InExpenseRegion),
            ),
            LabelMarker::ExpenseSummary => (RowKind::ExpenseSummary, self),
            LabelMarker::NetResult => (RowKind::NetResult, ScanState::AfterNetResult),
            LabelMarker::OtherSummary | LabelMarker::Blank => (RowKind::Ignored, self),
            LabelMarker::Detail => {
                let kind = match self {
                    ScanState::BeforeRevenueSummary => RowKind::RevenueDetail,
                    ScanState::InExpenseRegion => RowKind::ExpenseDetail,
                    ScanState::AfterNetResult => RowKind::Ignored,
                };
                (kind, self)
            }
        }
    }
}

/// Classifies labels in order, one [`RowKind`] per label.
pub fn classify_labels<I, S>(labels: I) -> Vec<RowKind>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut state = ScanState::default();
    labels
        .into_iter()
        .map(|label| {
            let (kind, next) = state.step(label.as_ref());
            state = next;
            kind
        })
        .collect()
}

pub fn classify_rows(sheet: &RawSheet) -> Vec<RowKind> {
    classify_labels((0..sheet.height()).map(|row| sheet.label(row)))
}

/// Row positions of the three summary rows of a sheet.
///
/// When a marker label occurs more than once the last occurrence is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryRows {
    pub revenue: Option<usize>,
    pub expense: Option<usize>,
    pub net_result: Option<usize>,
}

impl SummaryRows {
    pub fn from_kinds(kinds: &[RowKind]) -> Self {
        let mut rows = Self::default();
        for (idx, kind) in kinds.iter().enumerate() {
            match kind {
                RowKind::RevenueSummary => rows.revenue = Some(idx),
                RowKind::ExpenseSummary => rows.expense = Some(idx),
                RowKind::NetResult => rows.net_result = Some(idx),
                _ => {}
            }
        }
        rows
    }

    pub fn locate(sheet: &RawSheet) -> Self {
        Self::from_kinds(&classify_rows(sheet))
    }

    pub fn is_complete(&self) -> bool {
        self.revenue.is_some() && self.expense.is_some() && self.net_result.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_partition_detail_rows() {
        let kinds = classify_labels([
            "Försäljning varor",
            "Försäljning tjänster",
            "SUMMA RÖRELSENS INTÄKTER",
            "Lokalhyra",
            "Summa personalkostnader",
            "Löner",
            "SUMMA RÖRELSENS KOSTNADER",
            "Räntekostnader",
            "BERÄKNAT RESULTAT",
            "Bokslutsdispositioner",
        ]);

        assert_eq!(
            kinds,
            vec![
                RowKind::RevenueDetail,
                RowKind::RevenueDetail,
                RowKind::RevenueSummary,
                RowKind::ExpenseDetail,
                RowKind::Ignored,
                RowKind::ExpenseDetail,
                RowKind::ExpenseSummary,
                RowKind::ExpenseDetail,
                RowKind::NetResult,
                RowKind::Ignored,
            ]
        );
    }

    #[test]
    fn test_matching_ignores_case_and_whitespace() {
        assert_eq!(
            label_marker("  summa rörelsens intäkter "),
            LabelMarker::RevenueSummary
        );
        assert_eq!(
            label_marker("Summa nettoomsättning"),
            LabelMarker::RevenueSummary
        );
        assert_eq!(
            label_marker("Summa rörelsens kostnader"),
            LabelMarker::ExpenseSummary
        );
        assert_eq!(label_marker("Beräknat resultat"), LabelMarker::NetResult);
        assert_eq!(label_marker("Summa övriga kostnader"), LabelMarker::OtherSummary);
        assert_eq!(label_marker("   "), LabelMarker::Blank);
        assert_eq!(label_marker("3010 Försäljning"), LabelMarker::Detail);
    }

    #[test]
    fn test_states_only_advance() {
        let (kind, state) = ScanState::AfterNetResult.step("SUMMA NETTOOMSÄTTNING");
        assert_eq!(kind, RowKind::RevenueSummary);
        assert_eq!(state, ScanState::AfterNetResult);

        let (kind, state) = ScanState::BeforeRevenueSummary.step("BERÄKNAT RESULTAT");
        assert_eq!(kind, RowKind::NetResult);
        assert_eq!(state, ScanState::AfterNetResult);

        let (kind, state) = ScanState::InExpenseRegion.step("SUMMA RÖRELSENS KOSTNADER");
        assert_eq!(kind, RowKind::ExpenseSummary);
        assert_eq!(state, ScanState::InExpenseRegion);
    }

    #[test]
    fn test_sheet_without_markers_is_all_revenue_detail() {
        let kinds = classify_labels(["Hyra", "", "El"]);
        assert_eq!(
            kinds,
            vec![RowKind::RevenueDetail, RowKind::Ignored, RowKind::RevenueDetail]
        );
        assert_eq!(SummaryRows::from_kinds(&kinds), SummaryRows::default());
    }

    #[test]
    fn test_last_summary_occurrence_wins() {
        let kinds = classify_labels([
            "Summa nettoomsättning",
            "Övriga rörelseintäkter",
            "Summa rörelsens intäkter",
            "Summa rörelsens kostnader",
            "Beräknat resultat",
        ]);
        let rows = SummaryRows::from_kinds(&kinds);

        assert_eq!(rows.revenue, Some(2));
        assert_eq!(rows.expense, Some(3));
        assert_eq!(rows.net_result, Some(4));
        assert!(rows.is_complete());
        assert_eq!(kinds[1], RowKind::ExpenseDetail);
    }
}
