use crate::error::{ProcessingError, Result};
use crate::utils::values::is_missing;

/// An in-memory string table as read from CSV or a spreadsheet.
///
/// Cells are kept as text; a missing cell is an empty (or missing-marker) string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn with_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// First candidate present in the header, in candidate order
    pub fn resolve_column<S: AsRef<str>>(&self, candidates: &[S]) -> Option<usize> {
        candidates
            .iter()
            .find_map(|candidate| self.column_index(candidate.as_ref()))
    }

    /// Like [`Table::resolve_column`] but a miss is fatal
    pub fn require_column<S: AsRef<str>>(&self, table: &str, candidates: &[S]) -> Result<usize> {
        self.resolve_column(candidates).ok_or_else(|| {
            let names: Vec<&str> = candidates.iter().map(|c| c.as_ref()).collect();
            ProcessingError::missing_column(table, names.join(" | "))
        })
    }

    /// Cell text, `None` when missing
    pub fn value(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|cell| cell.trim())
            .filter(|cell| !is_missing(cell))
    }

    pub fn column_values(&self, column: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        (0..self.rows.len()).map(move |row| self.value(row, column))
    }

    /// Project onto an allow-list; names absent from the table are skipped
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Table {
        let picked: Vec<(String, usize)> = columns
            .iter()
            .filter_map(|name| {
                self.column_index(name.as_ref())
                    .map(|idx| (name.as_ref().to_string(), idx))
            })
            .collect();

        let headers = picked.iter().map(|(name, _)| name.clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| picked.iter().map(|(_, idx)| row[*idx].clone()).collect())
            .collect();

        Table { headers, rows }
    }

    /// Append a column, or overwrite it when the name already exists
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(ProcessingError::InvalidFormat(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }

        Ok(())
    }

    /// Keep rows for which the predicate holds, returning how many were removed
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[String]) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        before - self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Table {
        Table::with_rows(
            vec!["sensor_id".into(), "name".into(), "lat".into()],
            vec![
                vec!["1".into(), "Gulberg".into(), "31.52".into()],
                vec!["2".into(), "".into()],
            ],
        )
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = sample();
        assert_eq!(table.rows[1].len(), 3);
        assert_eq!(table.value(1, 2), None);
        assert_eq!(table.value(1, 1), None);
    }

    #[test]
    fn test_resolve_column_uses_candidate_order() {
        let table = sample();
        assert_eq!(table.resolve_column(&["latitude", "lat"]), Some(2));
        assert_eq!(table.resolve_column(&["name", "lat"]), Some(1));
        assert_eq!(table.resolve_column(&["latitude"]), None);
        assert!(matches!(
            table.require_column("locations", &["latitude"]),
            Err(ProcessingError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_select_skips_absent_columns() {
        let selected = sample().select(&["lat", "owner_name", "sensor_id"]);
        assert_eq!(selected.headers, vec!["lat".to_string(), "sensor_id".to_string()]);
        assert_eq!(selected.rows[0], vec!["31.52".to_string(), "1".to_string()]);
    }

    #[test]
    fn test_set_column_appends_and_overwrites() -> Result<()> {
        let mut table = sample();
        table.set_column("latitude", vec!["31.5".into(), "31.6".into()])?;
        assert_eq!(table.headers.len(), 4);
        table.set_column("name", vec!["A".into(), "B".into()])?;
        assert_eq!(table.value(1, 1), Some("B"));
        assert!(table.set_column("bad", vec![]).is_err());
        Ok(())
    }

    #[test]
    fn test_retain_rows_reports_removed() {
        let mut table = sample();
        let removed = table.retain_rows(|row| !row[2].is_empty());
        assert_eq!(removed, 1);
        assert_eq!(table.len(), 1);
    }
}
