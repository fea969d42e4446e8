use crate::error::{ProcessingError, Result};
use crate::models::RankedCell;
use crate::utils::constants::{
    COL_CELL_ID, COL_DISTANCE, COL_POLLUTION, COL_POPULATION, COL_SCORE, COMPRESSION_GZIP,
    COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use geo::Point;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Write ranked cells in rank order; `x`/`y` are in the exposure layer's CRS
    pub fn write_ranked(&self, cells: &[RankedCell], path: &Path) -> Result<()> {
        let schema = Self::ranked_schema();
        let batch = Self::ranked_to_batch(cells, schema.clone())?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        Ok(())
    }

    fn ranked_schema() -> Arc<Schema> {
        let fields = vec![
            Field::new("rank", DataType::UInt32, false),
            Field::new(COL_CELL_ID, DataType::Utf8, false),
            Field::new(COL_POPULATION, DataType::Float64, false),
            Field::new(COL_POLLUTION, DataType::Float64, true),
            Field::new(COL_DISTANCE, DataType::Float64, false),
            Field::new(COL_SCORE, DataType::Float64, false),
            Field::new("x", DataType::Float64, false),
            Field::new("y", DataType::Float64, false),
        ];

        Arc::new(Schema::new(fields))
    }

    fn ranked_to_batch(cells: &[RankedCell], schema: Arc<Schema>) -> Result<RecordBatch> {
        let ranks: Vec<u32> = (1..=cells.len() as u32).collect();
        let ids: Vec<&str> = cells.iter().map(|c| c.cell_id.as_str()).collect();
        let population: Vec<f64> = cells.iter().map(|c| c.population).collect();
        let pollution: Vec<Option<f64>> = cells.iter().map(|c| c.pollution).collect();
        let distance: Vec<f64> = cells.iter().map(|c| c.dist_to_sensor_m).collect();
        let score: Vec<f64> = cells.iter().map(|c| c.score).collect();
        let xs: Vec<f64> = cells.iter().map(|c| c.location.x()).collect();
        let ys: Vec<f64> = cells.iter().map(|c| c.location.y()).collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(UInt32Array::from(ranks)),
                Arc::new(StringArray::from(ids)),
                Arc::new(Float64Array::from(population)),
                Arc::new(Float64Array::from(pollution)),
                Arc::new(Float64Array::from(distance)),
                Arc::new(Float64Array::from(score)),
                Arc::new(Float64Array::from(xs)),
                Arc::new(Float64Array::from(ys)),
            ],
        )?;

        Ok(batch)
    }

    /// Read back up to `limit` ranked cells, in file order
    pub fn read_ranked(&self, path: &Path, limit: usize) -> Result<Vec<RankedCell>> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(limit.clamp(1, 8192))
            .build()?;

        let mut cells = Vec::new();

        for batch_result in reader {
            let batch = batch_result?;

            let ids = string_column(&batch, COL_CELL_ID)?;
            let population = float_column(&batch, COL_POPULATION)?;
            let pollution = float_column(&batch, COL_POLLUTION)?;
            let distance = float_column(&batch, COL_DISTANCE)?;
            let score = float_column(&batch, COL_SCORE)?;
            let xs = float_column(&batch, "x")?;
            let ys = float_column(&batch, "y")?;

            for i in 0..batch.num_rows() {
                if cells.len() >= limit {
                    return Ok(cells);
                }

                cells.push(RankedCell {
                    cell_id: ids.value(i).to_string(),
                    population: population.value(i),
                    pollution: pollution.is_valid(i).then(|| pollution.value(i)),
                    dist_to_sensor_m: distance.value(i),
                    score: score.value(i),
                    location: Point::new(xs.value(i), ys.value(i)),
                });
            }
        }

        Ok(cells)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        // codec as stored in the file, not this writer's setting
        let compression = (row_groups > 0 && metadata.row_group(0).num_columns() > 0)
            .then(|| metadata.row_group(0).column(0).compression())
            .unwrap_or(Compression::UNCOMPRESSED);

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
        })
    }
}

fn column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ProcessingError::missing_column("ranking parquet", name))
}

fn float_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b Float64Array> {
    column(batch, name)?
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid {} column type", name)))
}

fn string_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b StringArray> {
    column(batch, name)?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid {} column type", name)))
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0,
            self.compression,
            avg_rows
        )
    }
}
