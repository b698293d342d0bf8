use serde::{Deserialize, Serialize};
use std::fmt;

/// Spot record as served by `GET /cameras/{camera}/spots`.
///
/// Backends disagree on the occupancy field: newer ones send `spot_status`
/// (`"occupied"` / `"free"`), older ones a boolean `ocupado`. Both are
/// accepted; `spot_status` wins when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BackendSpotRecord {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocupado: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Display-ready parking spot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParkingSpot {
    pub id: i64,
    pub label: String,
    pub row: u32,
    pub occupied: bool,
}

impl ParkingSpot {
    /// Backend-shaped record carrying the same information.
    pub fn to_record(&self) -> BackendSpotRecord {
        BackendSpotRecord {
            id: self.id,
            spot_status: None,
            ocupado: Some(self.occupied),
            row: Some(self.row),
            slot_number: None,
            label: Some(self.label.clone()),
        }
    }
}

/// One point of the hourly occupancy series, `hour` formatted as `HH:00`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricPoint {
    pub hour: String,
    pub occupancy: f64,
}

/// A JSON value the analytics service sends either as a string or a number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => write!(f, "{}", s),
            Scalar::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<u32> for Scalar {
    fn from(n: u32) -> Self {
        Scalar::Number(n.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemStatus {
    Online,
    Offline,
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemStatus::Online => write!(f, "Online"),
            SystemStatus::Offline => write!(f, "Offline"),
        }
    }
}

/// Analytics summary shown as one unit; the six fields are always replaced
/// together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardMetrics {
    /// Fraction in `0.0..=1.0`.
    pub occupancy_pct: f64,
    pub top_row: Option<Scalar>,
    pub peak_hour: Option<String>,
    pub least_busy_hour: Option<String>,
    pub current_excessive: Option<Scalar>,
    pub status: SystemStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accepts_spot_status_shape() {
        let record: BackendSpotRecord = serde_json::from_str(
            r#"{"id": 3, "spot_status": "occupied", "row": 2, "slot_number": 5}"#,
        )
        .unwrap();
        assert_eq!(record.spot_status.as_deref(), Some("occupied"));
        assert_eq!(record.row, Some(2));
        assert_eq!(record.ocupado, None);
    }

    #[test]
    fn test_record_accepts_ocupado_shape() {
        let record: BackendSpotRecord =
            serde_json::from_str(r#"{"id": 7, "ocupado": true, "label": "A-7"}"#).unwrap();
        assert_eq!(record.ocupado, Some(true));
        assert_eq!(record.row, None);
        assert_eq!(record.label.as_deref(), Some("A-7"));
    }

    #[test]
    fn test_scalar_accepts_text_and_number() {
        let text: Scalar = serde_json::from_str(r#""A-12""#).unwrap();
        let number: Scalar = serde_json::from_str("2").unwrap();
        assert_eq!(text.to_string(), "A-12");
        assert_eq!(number.to_string(), "2");
    }
}
