// services/parking-dash/src/mock.rs
//
// Deterministic fallback data and the in-memory demo backend

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Timelike};
use parkkit::types::{BackendSpotRecord, DashboardMetrics, MetricPoint, Scalar, SystemStatus};
use parkkit::FetchError;
use tracing::debug;

use crate::api::ParkingDataSource;

/// Number of hourly points in the simulated series.
pub const METRIC_POINTS: usize = 12;

/// (camera, first id, spot count, row, every n-th spot occupied)
const MOCK_CAMERAS: [(&str, i64, u32, u32, u32); 3] = [
    ("cam1", 1, 8, 1, 3),
    ("cam2", 11, 6, 2, 4),
    ("cam3", 21, 10, 3, 2),
];

/// Canned spot records for a camera; empty for cameras the mock doesn't know.
pub fn mock_spot_records(camera: &str) -> Vec<BackendSpotRecord> {
    MOCK_CAMERAS
        .iter()
        .find(|(name, ..)| *name == camera)
        .map(|&(_, first_id, count, row, every)| {
            (0..count)
                .map(|i| BackendSpotRecord {
                    id: first_id + i as i64,
                    spot_status: Some(if i % every == 0 { "occupied" } else { "free" }.to_string()),
                    ocupado: None,
                    row: Some(row),
                    slot_number: Some(i + 1),
                    label: None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Twelve hourly points ending at `now`'s hour, oldest first.
///
/// The value for hour `h` is `20 + (h * 37 % 60)`, so the series only depends
/// on the wall-clock hour.
pub fn mock_metric_series<Tz: TimeZone>(now: &DateTime<Tz>) -> Vec<MetricPoint> {
    (0..METRIC_POINTS as i64)
        .rev()
        .map(|hours_ago| {
            let hour = (now.clone() - chrono::Duration::hours(hours_ago)).hour();
            MetricPoint {
                hour: format!("{:02}:00", hour),
                occupancy: mock_occupancy_for_hour(hour),
            }
        })
        .collect()
}

pub fn mock_occupancy_for_hour(hour: u32) -> f64 {
    (20 + (hour * 37) % 60) as f64
}

/// Fixed analytics summary shown while the analytics service is unreachable.
pub fn mock_dashboard_metrics() -> DashboardMetrics {
    DashboardMetrics {
        occupancy_pct: 0.45,
        top_row: Some(Scalar::from(2u32)),
        peak_hour: Some("18:00".to_string()),
        least_busy_hour: Some("03:00".to_string()),
        current_excessive: Some(Scalar::from("A-12")),
        status: SystemStatus::Offline,
    }
}

/// In-memory backend used by demo mode and tests.
///
/// Each instance owns its own store, so toggles in one source never leak into
/// another.
pub struct MockDataSource {
    store: Mutex<BTreeMap<String, Vec<BackendSpotRecord>>>,
    latency: Duration,
}

impl MockDataSource {
    pub fn new() -> Self {
        let store = MOCK_CAMERAS
            .iter()
            .map(|(name, ..)| (name.to_string(), mock_spot_records(name)))
            .collect();

        Self {
            store: Mutex::new(store),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call, to make demo mode feel like a network.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn records(&self, camera: &str) -> Vec<BackendSpotRecord> {
        self.store
            .lock()
            .map(|store| store.get(camera).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl Default for MockDataSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParkingDataSource for MockDataSource {
    async fn get_spots(&self, camera: &str) -> Result<Vec<BackendSpotRecord>, FetchError> {
        self.simulate_latency().await;
        Ok(self.records(camera))
    }

    async fn toggle_spot(&self, id: i64) -> Result<(), FetchError> {
        self.simulate_latency().await;

        let mut store = self
            .store
            .lock()
            .map_err(|_| FetchError::Network("mock store poisoned".to_string()))?;

        let found = store
            .values_mut()
            .flat_map(|records| records.iter_mut())
            .find(|r| r.id == id);

        match found {
            Some(record) => {
                let occupied = record.spot_status.as_deref() == Some("occupied");
                record.spot_status = Some(if occupied { "free" } else { "occupied" }.to_string());
                debug!(spot_id = id, occupied = !occupied, "Toggled mock spot");
                Ok(())
            }
            None => Err(FetchError::HttpStatus { code: 404 }),
        }
    }

    async fn get_metrics(&self) -> Result<Vec<MetricPoint>, FetchError> {
        self.simulate_latency().await;
        Ok(mock_metric_series(&Local::now()))
    }

    async fn get_dashboard_metrics(&self, camera: &str) -> Result<DashboardMetrics, FetchError> {
        self.simulate_latency().await;

        let records = self.records(camera);
        let occupied = records
            .iter()
            .filter(|r| r.spot_status.as_deref() == Some("occupied"))
            .count();
        let occupancy_pct = if records.is_empty() {
            0.0
        } else {
            occupied as f64 / records.len() as f64
        };

        Ok(DashboardMetrics {
            occupancy_pct,
            status: SystemStatus::Online,
            ..mock_dashboard_metrics()
        })
    }
}
