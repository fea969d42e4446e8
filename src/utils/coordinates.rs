use crate::error::{ProcessingError, Result};
use crate::utils::values::is_missing;

/// Convert DMS (Degrees:Minutes:Seconds) format to decimal degrees
///
/// # Examples
/// ```
/// use aq_siting::utils::dms_to_decimal;
///
/// let decimal = dms_to_decimal("31:32:58").unwrap();
/// assert!((decimal - 31.549444).abs() < 0.000001);
/// ```
pub fn dms_to_decimal(dms: &str) -> Result<f64> {
    let parts: Vec<&str> = dms.split(':').collect();

    if parts.len() != 3 {
        return Err(ProcessingError::InvalidFormat(format!(
            "Invalid DMS format: '{}'. Expected format: 'DD:MM:SS'",
            dms
        )));
    }

    let is_negative = dms.starts_with('-');

    let degrees = parts[0].parse::<f64>().map_err(|_| {
        ProcessingError::InvalidFormat(format!("Invalid degrees value: '{}'", parts[0]))
    })?;

    let minutes = parts[1].parse::<f64>().map_err(|_| {
        ProcessingError::InvalidFormat(format!("Invalid minutes value: '{}'", parts[1]))
    })?;

    let seconds = parts[2].parse::<f64>().map_err(|_| {
        ProcessingError::InvalidFormat(format!("Invalid seconds value: '{}'", parts[2]))
    })?;

    if !(0.0..60.0).contains(&minutes) {
        return Err(ProcessingError::InvalidFormat(format!(
            "Minutes must be between 0 and 60, got: {}",
            minutes
        )));
    }

    if !(0.0..60.0).contains(&seconds) {
        return Err(ProcessingError::InvalidFormat(format!(
            "Seconds must be between 0 and 60, got: {}",
            seconds
        )));
    }

    if !degrees.is_finite() {
        return Err(ProcessingError::InvalidFormat(format!(
            "Degrees must be finite, got: '{}'",
            parts[0]
        )));
    }

    let decimal_value = degrees.abs() + minutes / 60.0 + seconds / 3600.0;

    if is_negative {
        Ok(-decimal_value)
    } else {
        Ok(decimal_value)
    }
}

/// Parse an optional coordinate cell.
///
/// Missing markers yield `Ok(None)`; decimal and `DD:MM:SS` text are both accepted.
pub fn parse_coordinate(coord_str: &str) -> Result<Option<f64>> {
    let trimmed = coord_str.trim();

    if is_missing(trimmed) {
        return Ok(None);
    }

    if trimmed.contains(':') {
        return dms_to_decimal(trimmed).map(Some);
    }

    let value = trimmed.parse::<f64>().map_err(|_| {
        ProcessingError::InvalidFormat(format!("Invalid coordinate value: '{}'", coord_str))
    })?;

    Ok(value.is_finite().then_some(value))
}
