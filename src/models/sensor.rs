use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SensorRecord {
    pub sensor_id: i64,

    pub name: Option<String>,

    pub owner: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub datetime_first: Option<String>,

    pub datetime_last: Option<String>,
}

impl SensorRecord {
    pub fn new(sensor_id: i64, latitude: f64, longitude: f64) -> Self {
        Self {
            sensor_id,
            name: None,
            owner: None,
            latitude,
            longitude,
            datetime_first: None,
            datetime_last: None,
        }
    }

    pub fn with_time_range(mut self, first: Option<String>, last: Option<String>) -> Self {
        self.datetime_first = first;
        self.datetime_last = last;
        self
    }

    /// Geographic position as `(x, y)` = `(lon, lat)`
    pub fn lon_lat(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_validation() {
        let mut sensor = SensorRecord::new(25135, 31.5204, 74.3587);
        sensor.owner = Some("OpenAQ".to_string());

        assert!(sensor.validate().is_ok());
        assert_eq!(sensor.lon_lat(), (74.3587, 31.5204));
        assert_eq!(sensor.owner.as_deref(), Some("OpenAQ"));
    }

    #[test]
    fn test_invalid_coordinates() {
        let sensor = SensorRecord::new(1, 91.0, 74.0);
        assert!(sensor.validate().is_err());
    }
}
