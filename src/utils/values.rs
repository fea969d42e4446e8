use crate::utils::constants::MISSING_MARKERS;

/// True when a table cell should be treated as missing
pub fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Parse a numeric cell. Missing cells are `Ok(None)`, garbage is `Err` with the text.
pub fn parse_number(cell: &str) -> std::result::Result<Option<f64>, String> {
    let trimmed = cell.trim();
    if is_missing(trimmed) {
        return Ok(None);
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        Ok(_) => Ok(None),
        Err(_) => Err(trimmed.to_string()),
    }
}

/// Integer identifiers, tolerating spreadsheet floats like `25135.0`
pub fn parse_integral(cell: &str) -> Option<i64> {
    let trimmed = cell.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .map(|v| v as i64)
}

/// Canonical text for a join key so `12`, `12.0` and ` 12 ` match
pub fn normalize_key(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    if is_missing(trimmed) {
        return None;
    }

    Some(
        parse_integral(trimmed)
            .map(|v| v.to_string())
            .unwrap_or_else(|| trimmed.to_string()),
    )
}
