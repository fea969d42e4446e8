pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod progress;
pub mod values;

pub use constants::*;
pub use coordinates::{dms_to_decimal, parse_coordinate};
pub use filename::{first_existing, is_csv_file, sensor_id_from_filename};
pub use progress::ProgressReporter;
pub use values::{is_missing, normalize_key, parse_integral, parse_number};
