// services/parking-dash/src/api.rs
//
// HTTP client for the parking / analytics backend

use std::time::Duration;

use async_trait::async_trait;
use parkkit::config::ApiConfig;
use parkkit::types::{BackendSpotRecord, DashboardMetrics, MetricPoint, Scalar, SystemStatus};
use parkkit::FetchError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Where the dashboard gets its data from.
///
/// The live backend and the in-memory demo store both implement this, and
/// tests plug in their own fakes.
#[async_trait]
pub trait ParkingDataSource: Send + Sync {
    async fn get_spots(&self, camera: &str) -> Result<Vec<BackendSpotRecord>, FetchError>;

    async fn toggle_spot(&self, id: i64) -> Result<(), FetchError>;

    async fn get_metrics(&self) -> Result<Vec<MetricPoint>, FetchError>;

    async fn get_dashboard_metrics(&self, camera: &str) -> Result<DashboardMetrics, FetchError>;
}

#[derive(Debug, Deserialize)]
struct OccupancyResponse {
    occupancy_pct: f64,
}

#[derive(Debug, Deserialize)]
struct TopSpotsResponse {
    top_spots: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TopRowResponse {
    row: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct ExcessiveResponse {
    spot: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct HourResponse {
    hour: Option<String>,
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, FetchError> {
        Self::new(&config.base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `base_url + path` and decode the JSON body. Never retries.
    pub async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Backend returned non-success status");
            return Err(FetchError::HttpStatus {
                code: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn spots(&self, camera: &str) -> Result<Vec<BackendSpotRecord>, FetchError> {
        self.fetch_json(&format!("/cameras/{}/spots", camera)).await
    }

    pub async fn occupancy_pct(&self, image: &str) -> Result<f64, FetchError> {
        let resp: OccupancyResponse = self
            .fetch_json(&format!("/analytics/occupancy/{}", image))
            .await?;
        Ok(resp.occupancy_pct)
    }

    pub async fn top_spots(&self) -> Result<Vec<serde_json::Value>, FetchError> {
        let resp: TopSpotsResponse = self.fetch_json("/analytics/top_spots").await?;
        Ok(resp.top_spots)
    }

    pub async fn top_row(&self) -> Result<Option<Scalar>, FetchError> {
        let resp: TopRowResponse = self.fetch_json("/analytics/top_row").await?;
        Ok(resp.row)
    }

    pub async fn current_excessive(&self) -> Result<Option<Scalar>, FetchError> {
        let resp: ExcessiveResponse = self.fetch_json("/analytics/current_excessive").await?;
        Ok(resp.spot)
    }

    pub async fn peak_hour(&self) -> Result<Option<String>, FetchError> {
        let resp: HourResponse = self.fetch_json("/analytics/peak_hour").await?;
        Ok(resp.hour)
    }

    pub async fn least_busy_hour(&self) -> Result<Option<String>, FetchError> {
        let resp: HourResponse = self.fetch_json("/analytics/least_busy_hour").await?;
        Ok(resp.hour)
    }

    /// All analytics values for a camera, or the first failure.
    ///
    /// The five requests run concurrently; nothing is returned unless every
    /// one of them succeeded.
    pub async fn dashboard_metrics(&self, camera: &str) -> Result<DashboardMetrics, FetchError> {
        let (occupancy_pct, top_row, peak_hour, least_busy_hour, current_excessive) = tokio::try_join!(
            self.occupancy_pct(camera),
            self.top_row(),
            self.peak_hour(),
            self.least_busy_hour(),
            self.current_excessive(),
        )?;

        Ok(DashboardMetrics {
            occupancy_pct,
            top_row,
            peak_hour,
            least_busy_hour,
            current_excessive,
            status: SystemStatus::Online,
        })
    }
}

#[async_trait]
impl ParkingDataSource for ApiClient {
    async fn get_spots(&self, camera: &str) -> Result<Vec<BackendSpotRecord>, FetchError> {
        self.spots(camera).await
    }

    async fn toggle_spot(&self, _id: i64) -> Result<(), FetchError> {
        Err(FetchError::Unsupported("toggle_spot"))
    }

    async fn get_metrics(&self) -> Result<Vec<MetricPoint>, FetchError> {
        // The backend has no hourly series endpoint; callers fall back to the
        // simulated series.
        Err(FetchError::Unsupported("hourly occupancy series"))
    }

    async fn get_dashboard_metrics(&self, camera: &str) -> Result<DashboardMetrics, FetchError> {
        self.dashboard_metrics(camera).await
    }
}
