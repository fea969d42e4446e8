use std::path::{Path, PathBuf};

/// Extract the first run of ASCII digits in a file name as a sensor id.
///
/// `sensor_25135_days3000.csv` yields `25135`.
pub fn sensor_id_from_filename(file_name: &str) -> Option<i64> {
    let start = file_name.find(|c: char| c.is_ascii_digit())?;
    let digits: String = file_name[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse::<i64>().ok()
}

/// True for `*.csv` regardless of case
pub fn is_csv_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Return the first candidate that exists on disk
pub fn first_existing(candidates: &[PathBuf]) -> Option<&PathBuf> {
    candidates.iter().find(|path| path.exists())
}
