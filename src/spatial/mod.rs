pub mod clip;
pub mod crs;
pub mod nearest;
pub mod projection;

pub use clip::{clip_within, points_span_km, polygon_span_km};
pub use crs::Crs;
pub use nearest::NearestSensorIndex;
pub use projection::{Transformer, UtmProjection};
