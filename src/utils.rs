use crate::schema::Cell;

/// Parses a Swedish-formatted amount such as `"1 234,5"` or `"-12 000"`.
///
/// Whitespace of any kind (including the non-breaking spaces Excel exports use
/// as thousands separators) is removed and a decimal comma becomes a point.
/// Returns `None` for blank or unparseable text.
pub fn parse_locale_str(text: &str) -> Option<f64> {
    let compact: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if compact.is_empty() {
        return None;
    }

    compact.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric value of a cell for aggregation. Blank and unparseable cells count as 0.
pub fn parse_locale_number(cell: &Cell) -> f64 {
    match cell {
        Cell::Number(value) if value.is_finite() => *value,
        Cell::Text(text) => parse_locale_str(text).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Numeric value of a cell for the processed table: decimal commas become
/// points, nothing else is rewritten. Thousands separators make the text
/// unparseable, which yields `None`.
pub fn parse_decimal_comma(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Empty => None,
        Cell::Number(value) => Some(*value).filter(|v| v.is_finite()),
        Cell::Text(text) => text
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite()),
    }
}

/// Trims a label and cuts it to at most `width` characters.
pub fn truncate_label(label: &str, width: usize) -> String {
    label.trim().chars().take(width).collect()
}

/// Net result as a percentage of revenue; 0 when there is no revenue.
pub fn profit_margin(net_result: f64, revenue: f64) -> f64 {
    if revenue == 0.0 {
        0.0
    } else {
        net_result / revenue * 100.0
    }
}

/// Formats an amount in tSEK with thousands separators and one decimal.
pub fn format_tsek(value: f64) -> String {
    format_num::format_num!(",.1f", value)
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}
