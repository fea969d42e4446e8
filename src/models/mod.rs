pub mod aggregate;
pub mod exposure;
pub mod sensor;
pub mod table;

pub use aggregate::{AggregateRecord, AggregationReport, SkipReason, SkippedFile};
pub use exposure::{Boundary, ExposureCell, ExposureLayer, RankedCell};
pub use sensor::SensorRecord;
pub use table::Table;
