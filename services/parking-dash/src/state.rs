// services/parking-dash/src/state.rs
//
// Dashboard state: camera selection, layout mode and one polling session
// per view

use std::time::Instant;

use chrono::{DateTime, Local};
use parkkit::config::DashboardConfig;
use parkkit::types::{BackendSpotRecord, DashboardMetrics, MetricPoint, ParkingSpot};
use parkkit::FetchError;
use tokio_util::sync::CancellationToken;

use crate::layout::{compose, SpotLayout, ViewMode};
use crate::mock::{mock_dashboard_metrics, mock_metric_series, mock_spot_records};
use crate::presentation::to_display_spots;
use crate::session::{PollSession, PollState, PollingController, Resolution};

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

/// Work the fetch runtime should perform.
#[derive(Debug, Clone)]
pub enum FetchRequest {
    Spots { session: PollSession },
    Analytics { session: PollSession },
    Metrics { session: PollSession },
    Toggle { spot_id: i64 },
}

impl FetchRequest {
    /// Token that aborts the request when its session ends.
    pub fn cancel_token(&self) -> Option<CancellationToken> {
        match self {
            FetchRequest::Spots { session }
            | FetchRequest::Analytics { session }
            | FetchRequest::Metrics { session } => Some(session.cancel_token().clone()),
            FetchRequest::Toggle { .. } => None,
        }
    }
}

/// Result of a `FetchRequest`, handed back to the UI thread.
#[derive(Debug)]
pub enum Completion {
    Spots {
        session: PollSession,
        result: Result<Vec<BackendSpotRecord>, FetchError>,
    },
    Analytics {
        session: PollSession,
        result: Result<DashboardMetrics, FetchError>,
    },
    Metrics {
        session: PollSession,
        result: Result<Vec<MetricPoint>, FetchError>,
    },
    Toggle {
        spot_id: i64,
        result: Result<(), FetchError>,
    },
}

pub struct DashboardState {
    pub cameras: Vec<String>,
    pub selected_camera: usize,
    pub view_mode: ViewMode,
    pub spot_cursor: usize,

    pub spots: PollingController<Vec<ParkingSpot>>,
    pub analytics: PollingController<DashboardMetrics>,
    pub metrics: PollingController<Vec<MetricPoint>>,

    pub activity_log: Vec<LogEntry>,
    pub scroll_offset: usize,
}

impl DashboardState {
    pub fn new(config: &DashboardConfig) -> Self {
        let mut cameras = config.cameras.names.clone();
        if cameras.is_empty() {
            cameras = parkkit::config::CameraConfig::default().names;
        }

        let selected_camera = match config.cameras.initial.as_deref() {
            Some(initial) => match cameras.iter().position(|c| c == initial) {
                Some(idx) => idx,
                None => {
                    cameras.push(initial.to_string());
                    cameras.len() - 1
                }
            },
            None => 0,
        };

        let backoff = config.polling.backoff_policy();

        Self {
            cameras,
            selected_camera,
            view_mode: ViewMode::default(),
            spot_cursor: 0,
            spots: PollingController::new("spots", config.polling.spots_interval())
                .with_backoff(backoff.clone()),
            analytics: PollingController::new("analytics", config.polling.analytics_interval())
                .with_backoff(backoff.clone()),
            metrics: PollingController::new("metrics", config.polling.metrics_interval())
                .with_backoff(backoff),
            activity_log: Vec::new(),
            scroll_offset: 0,
        }
    }

    pub fn selected_camera_name(&self) -> &str {
        self.cameras
            .get(self.selected_camera)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Start every view's session for the selected camera.
    pub fn start(&mut self, now: Instant) {
        let camera = self.selected_camera_name().to_string();
        self.spots.start(Some(camera.clone()), now);
        self.analytics.start(Some(camera), now);
        self.metrics.start(None, now);
        self.spot_cursor = 0;
    }

    /// Switch camera. Camera-bound sessions restart; the global metrics
    /// session keeps running.
    pub fn select_camera(&mut self, index: usize, now: Instant) {
        if index >= self.cameras.len() || index == self.selected_camera {
            return;
        }

        self.selected_camera = index;
        let camera = self.selected_camera_name().to_string();
        self.spots.start(Some(camera.clone()), now);
        self.analytics.start(Some(camera.clone()), now);
        self.spot_cursor = 0;
        self.add_log(LogLevel::Info, &format!("Switched to camera {}", camera));
    }

    pub fn next_camera(&mut self, now: Instant) {
        if !self.cameras.is_empty() {
            self.select_camera((self.selected_camera + 1) % self.cameras.len(), now);
        }
    }

    pub fn prev_camera(&mut self, now: Instant) {
        if !self.cameras.is_empty() {
            let len = self.cameras.len();
            self.select_camera((self.selected_camera + len - 1) % len, now);
        }
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn cycle_view_mode(&mut self) {
        self.view_mode = self.view_mode.next();
    }

    /// Layout of the current spots in the current mode.
    pub fn layout(&self) -> SpotLayout {
        let spots = self.spots.data().map(Vec::as_slice).unwrap_or_default();
        compose(spots, self.view_mode)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let count = self.spots.data().map(Vec::len).unwrap_or(0);
        if count == 0 {
            self.spot_cursor = 0;
            return;
        }
        let next = self.spot_cursor as isize + delta;
        self.spot_cursor = next.rem_euclid(count as isize) as usize;
    }

    /// Spot under the cursor, in render order of the current layout.
    pub fn selected_spot(&self) -> Option<ParkingSpot> {
        self.layout().spots().get(self.spot_cursor).map(|s| (*s).clone())
    }

    pub fn toggle_request(&self) -> Option<FetchRequest> {
        self.selected_spot()
            .map(|spot| FetchRequest::Toggle { spot_id: spot.id })
    }

    /// Re-arm every view immediately.
    pub fn refresh_all(&mut self, now: Instant) {
        self.spots.refresh_now(now);
        self.analytics.refresh_now(now);
        self.metrics.refresh_now(now);
        self.add_log(LogLevel::Info, "Manual refresh");
    }

    /// Fetches whose timers have fired.
    pub fn due_requests(&mut self, now: Instant) -> Vec<FetchRequest> {
        let mut requests = Vec::new();
        if let Some(session) = self.spots.poll_due(now) {
            requests.push(FetchRequest::Spots { session });
        }
        if let Some(session) = self.analytics.poll_due(now) {
            requests.push(FetchRequest::Analytics { session });
        }
        if let Some(session) = self.metrics.poll_due(now) {
            requests.push(FetchRequest::Metrics { session });
        }
        requests
    }

    pub fn apply(&mut self, completion: Completion, now: Instant) {
        match completion {
            Completion::Spots { session, result } => {
                let camera = session.key().unwrap_or_default().to_string();
                let result = result.map(|records| to_display_spots(&records));
                let resolution = self.spots.resolve(
                    &session,
                    result,
                    || to_display_spots(&mock_spot_records(&camera)),
                    now,
                );
                self.log_resolution(&format!("Spots for {}", camera), resolution);
                self.clamp_cursor();
            }
            Completion::Analytics { session, result } => {
                let camera = session.key().unwrap_or_default().to_string();
                let resolution = self
                    .analytics
                    .resolve(&session, result, mock_dashboard_metrics, now);
                self.log_resolution(&format!("Analytics for {}", camera), resolution);
            }
            Completion::Metrics { session, result } => {
                let resolution = self.metrics.resolve(
                    &session,
                    result,
                    || mock_metric_series(&Local::now()),
                    now,
                );
                self.log_resolution("Hourly occupancy", resolution);
            }
            Completion::Toggle { spot_id, result } => match result {
                Ok(()) => {
                    self.add_log(LogLevel::Info, &format!("Toggled spot {}", spot_id));
                    self.spots.refresh_now(now);
                }
                Err(e) => {
                    self.add_log(LogLevel::Warn, &format!("Cannot toggle spot {}: {}", spot_id, e));
                }
            },
        }
    }

    /// Banner text while a camera-bound view shows simulated data.
    pub fn offline_banner(&self) -> Option<String> {
        let error = self
            .spots
            .state()
            .last_error
            .as_ref()
            .or(self.analytics.state().last_error.as_ref())?;
        Some(format!(
            "Offline ({}): backend unreachable, showing simulated data",
            error.kind()
        ))
    }

    pub fn is_offline(&self) -> bool {
        self.spots.state().is_offline() || self.analytics.state().is_offline()
    }

    pub fn spots_state(&self) -> &PollState {
        self.spots.state()
    }

    /// Stop every session; nothing is fetched or applied afterwards.
    pub fn teardown(&mut self) {
        self.spots.teardown();
        self.analytics.teardown();
        self.metrics.teardown();
    }

    pub fn scroll_up(&mut self) {
        if self.scroll_offset > 0 {
            self.scroll_offset -= 1;
        }
    }

    pub fn scroll_down(&mut self) {
        if self.scroll_offset + 1 < self.activity_log.len() {
            self.scroll_offset += 1;
        }
    }

    pub fn add_log(&mut self, level: LogLevel, message: &str) {
        self.activity_log.push(LogEntry {
            timestamp: Local::now(),
            level,
            message: message.to_string(),
        });

        if self.activity_log.len() > MAX_LOG_ENTRIES {
            self.activity_log.remove(0);
        }
    }

    fn log_resolution(&mut self, what: &str, resolution: Resolution) {
        match resolution {
            Resolution::Live { recovered: true } => {
                self.add_log(LogLevel::Info, &format!("{} back online", what));
            }
            Resolution::Fallback {
                error: FetchError::Unsupported(_),
                first_failure: true,
            } => {
                self.add_log(
                    LogLevel::Info,
                    &format!("{} not served by backend, using simulated data", what),
                );
            }
            Resolution::Fallback {
                error,
                first_failure: true,
            } => {
                self.add_log(
                    LogLevel::Warn,
                    &format!("{} unavailable ({}), using simulated data", what, error),
                );
            }
            _ => {}
        }
    }

    fn clamp_cursor(&mut self) {
        let count = self.spots.data().map(Vec::len).unwrap_or(0);
        if self.spot_cursor >= count {
            self.spot_cursor = count.saturating_sub(1);
        }
    }
}
