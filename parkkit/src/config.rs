use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backoff::BackoffPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub cameras: CameraConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 5_000,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub spots_interval_ms: u64,
    pub analytics_interval_ms: u64,
    pub metrics_interval_ms: u64,
    /// Absent means a constant refresh interval, even while the backend is down.
    pub backoff: Option<BackoffConfig>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            spots_interval_ms: 2_000,
            analytics_interval_ms: 30_000,
            metrics_interval_ms: 30_000,
            backoff: None,
        }
    }
}

impl PollingConfig {
    pub fn spots_interval(&self) -> Duration {
        Duration::from_millis(self.spots_interval_ms)
    }

    pub fn analytics_interval(&self) -> Duration {
        Duration::from_millis(self.analytics_interval_ms)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_interval_ms)
    }

    pub fn backoff_policy(&self) -> Option<BackoffPolicy> {
        self.backoff.as_ref().map(|b| BackoffPolicy {
            multiplier: b.multiplier,
            max_delay: Duration::from_millis(b.max_delay_ms),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub names: Vec<String>,
    pub initial: Option<String>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            names: vec!["cam1".to_string(), "cam2".to_string(), "cam3".to_string()],
            initial: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_file: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: "parking-dash.log".to_string(),
        }
    }
}
