use crate::error::{ProcessingError, Result};
use crate::models::RankedCell;
use crate::writers::ParquetWriter;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl ValueRange {
    fn from_values(values: impl Iterator<Item = f64>) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;

        for value in values.filter(|v| v.is_finite()) {
            min = min.min(value);
            max = max.max(value);
            sum += value;
            count += 1;
        }

        (count > 0).then(|| Self {
            min,
            max,
            mean: sum / count as f64,
        })
    }

    fn describe(range: &Option<Self>, unit: &str) -> String {
        match range {
            Some(r) => format!("{:.3}{unit} to {:.3}{unit} (mean {:.3}{unit})", r.min, r.max, r.mean, unit = unit),
            None => "No valid values".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct RankingStatistics {
    pub total_cells: usize,
    pub score: Option<ValueRange>,
    pub distance_m: Option<ValueRange>,
    pub pollution: Option<ValueRange>,
    pub total_population: f64,
    pub missing_pollution: usize,
    /// Leading rows in rank order
    pub top: Vec<RankedCell>,
}

pub struct RankingAnalyzer;

impl RankingAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze_parquet(&self, path: &Path, top: usize) -> Result<RankingStatistics> {
        let writer = ParquetWriter::new();
        let total_rows = writer.get_file_info(path)?.total_rows.max(0) as usize;
        let cells = writer.read_ranked(path, total_rows)?;

        if cells.is_empty() {
            return Err(ProcessingError::MissingData(
                "No ranked cells found in Parquet file".to_string(),
            ));
        }

        Ok(self.calculate_statistics(&cells, top))
    }

    pub fn calculate_statistics(&self, cells: &[RankedCell], top: usize) -> RankingStatistics {
        RankingStatistics {
            total_cells: cells.len(),
            score: ValueRange::from_values(cells.iter().map(|c| c.score)),
            distance_m: ValueRange::from_values(cells.iter().map(|c| c.dist_to_sensor_m)),
            pollution: ValueRange::from_values(cells.iter().filter_map(|c| c.pollution)),
            total_population: cells.iter().map(|c| c.population).sum(),
            missing_pollution: cells.iter().filter(|c| c.pollution.is_none()).count(),
            top: cells.iter().take(top).cloned().collect(),
        }
    }
}

impl Default for RankingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-width preview of ranked cells, one line per cell
pub fn format_ranked_table(cells: &[RankedCell]) -> String {
    let mut table = format!(
        "{:>4}  {:<12} {:>10} {:>12} {:>16} {:>8}\n",
        "rank", "cell_id", "pop", "pm25_interp", "dist_to_sensor_m", "score"
    );

    for (i, cell) in cells.iter().enumerate() {
        let pollution = cell
            .pollution
            .map(|p| format!("{:.2}", p))
            .unwrap_or_else(|| "NaN".to_string());
        table.push_str(&format!(
            "{:>4}  {:<12} {:>10.1} {:>12} {:>16.1} {:>8.4}\n",
            i + 1,
            cell.cell_id,
            cell.population,
            pollution,
            cell.dist_to_sensor_m,
            cell.score
        ));
    }

    table
}

impl RankingStatistics {
    pub fn summary(&self) -> String {
        format!(
            "Ranked cells: {}\n\
            Total population: {:.0}\n\
            Score: {}\n\
            Distance to nearest sensor: {}\n\
            PM2.5 (interpolated): {} ({} cells missing)",
            self.total_cells,
            self.total_population,
            ValueRange::describe(&self.score, ""),
            ValueRange::describe(&self.distance_m, " m"),
            ValueRange::describe(&self.pollution, ""),
            self.missing_pollution
        )
    }

    pub fn detailed_summary(&self) -> String {
        if self.top.is_empty() {
            return self.summary();
        }

        format!(
            "{}\n\nTop {} candidate cells:\n{}",
            self.summary(),
            self.top.len(),
            format_ranked_table(&self.top)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    fn cell(id: &str, pop: f64, pollution: Option<f64>, distance: f64, score: f64) -> RankedCell {
        RankedCell {
            cell_id: id.to_string(),
            population: pop,
            pollution,
            dist_to_sensor_m: distance,
            score,
            location: Point::new(0.0, 0.0),
        }
    }

    #[test]
    fn test_statistics() {
        let cells = vec![
            cell("a", 100.0, Some(80.0), 2000.0, 0.9),
            cell("b", 50.0, None, 1000.0, 0.5),
            cell("c", 0.0, Some(40.0), 0.0, 0.1),
        ];

        let stats = RankingAnalyzer::new().calculate_statistics(&cells, 2);
        assert_eq!(stats.total_cells, 3);
        assert_eq!(stats.total_population, 150.0);
        assert_eq!(stats.missing_pollution, 1);
        assert_eq!(
            stats.distance_m,
            Some(ValueRange {
                min: 0.0,
                max: 2000.0,
                mean: 1000.0
            })
        );
        assert_eq!(stats.pollution.map(|r| r.mean), Some(60.0));
        assert_eq!(stats.top.len(), 2);

        let text = stats.detailed_summary();
        assert!(text.contains("Ranked cells: 3"));
        assert!(text.contains("Top 2 candidate cells"));
        assert!(text.contains("NaN"));
    }

    #[test]
    fn test_analyze_parquet() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let cells = vec![cell("a", 10.0, Some(1.0), 5.0, 0.7), cell("b", 5.0, Some(2.0), 1.0, 0.2)];
        ParquetWriter::new().write_ranked(&cells, temp_file.path())?;

        let stats = RankingAnalyzer::new().analyze_parquet(temp_file.path(), 10)?;
        assert_eq!(stats.total_cells, 2);
        assert_eq!(stats.top, cells);
        assert_eq!(stats.score.map(|r| r.max), Some(0.7));
        Ok(())
    }

    #[test]
    fn test_empty_file_is_an_error() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        ParquetWriter::new().write_ranked(&[], temp_file.path())?;
        assert!(matches!(
            RankingAnalyzer::new().analyze_parquet(temp_file.path(), 10),
            Err(ProcessingError::MissingData(_))
        ));
        Ok(())
    }
}
