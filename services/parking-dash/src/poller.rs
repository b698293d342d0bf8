// services/parking-dash/src/poller.rs
//
// Runs fetch requests on the tokio runtime and hands completions back to the
// UI thread

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::ParkingDataSource;
use crate::state::{Completion, FetchRequest};

pub struct Poller {
    handle: Handle,
    source: Arc<dyn ParkingDataSource>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl Poller {
    pub fn new(handle: Handle, source: Arc<dyn ParkingDataSource>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            handle,
            source,
            tx,
            rx,
        }
    }

    /// Spawn `request`. If its session is cancelled before the fetch
    /// finishes, the result is dropped instead of delivered.
    pub fn dispatch(&self, request: FetchRequest) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let cancel = request.cancel_token();

        self.handle.spawn(async move {
            let work = execute(source.as_ref(), request);
            let completion = match &cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("Fetch cancelled with its session");
                        return;
                    }
                    completion = work => completion,
                },
                None => work.await,
            };

            // The session can end while the fetch is finishing.
            if cancel.as_ref().is_some_and(|token| token.is_cancelled()) {
                debug!("Session ended before delivery, dropping fetch result");
                return;
            }

            if tx.send(completion).is_err() {
                debug!("Dashboard closed, dropping fetch result");
            }
        });
    }

    /// Completions that arrived since the last call, without blocking.
    pub fn drain(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            completions.push(completion);
        }
        completions
    }

    /// Wait for the next completion.
    pub async fn recv(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }
}

async fn execute(source: &dyn ParkingDataSource, request: FetchRequest) -> Completion {
    match request {
        FetchRequest::Spots { session } => {
            let camera = session.key().unwrap_or_default().to_string();
            let result = source.get_spots(&camera).await;
            Completion::Spots { session, result }
        }
        FetchRequest::Analytics { session } => {
            let camera = session.key().unwrap_or_default().to_string();
            let result = source.get_dashboard_metrics(&camera).await;
            Completion::Analytics { session, result }
        }
        FetchRequest::Metrics { session } => {
            let result = source.get_metrics().await;
            Completion::Metrics { session, result }
        }
        FetchRequest::Toggle { spot_id } => {
            let result = source.toggle_spot(spot_id).await;
            Completion::Toggle { spot_id, result }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use parkkit::config::DashboardConfig;
    use parkkit::types::{BackendSpotRecord, DashboardMetrics, MetricPoint};
    use parkkit::FetchError;
    use tokio::sync::oneshot;

    use crate::mock::{mock_dashboard_metrics, mock_spot_records, MockDataSource};
    use crate::state::DashboardState;

    /// Spot fetches for gated cameras block until the test releases them.
    struct GatedSource {
        gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    }

    impl GatedSource {
        fn new() -> (Self, HashMap<String, oneshot::Sender<()>>) {
            let mut gates = HashMap::new();
            let mut releases = HashMap::new();
            for camera in ["cam1", "cam2"] {
                let (tx, rx) = oneshot::channel();
                gates.insert(camera.to_string(), rx);
                releases.insert(camera.to_string(), tx);
            }
            (
                Self {
                    gates: Mutex::new(gates),
                },
                releases,
            )
        }
    }

    #[async_trait]
    impl ParkingDataSource for GatedSource {
        async fn get_spots(&self, camera: &str) -> Result<Vec<BackendSpotRecord>, FetchError> {
            let gate = self.gates.lock().unwrap().remove(camera);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(mock_spot_records(camera))
        }

        async fn toggle_spot(&self, _id: i64) -> Result<(), FetchError> {
            Ok(())
        }

        async fn get_metrics(&self) -> Result<Vec<MetricPoint>, FetchError> {
            Err(FetchError::Unsupported("series"))
        }

        async fn get_dashboard_metrics(&self, _camera: &str) -> Result<DashboardMetrics, FetchError> {
            Ok(mock_dashboard_metrics())
        }
    }

    #[tokio::test]
    async fn test_out_of_order_resolution_keeps_newest_camera() {
        let (source, mut releases) = GatedSource::new();
        let mut poller = Poller::new(Handle::current(), Arc::new(source));
        let mut state = DashboardState::new(&DashboardConfig::default());
        let t0 = Instant::now();

        state.start(t0);
        for request in state.due_requests(t0) {
            if matches!(request, FetchRequest::Spots { .. }) {
                poller.dispatch(request);
            }
        }

        state.select_camera(1, t0);
        for request in state.due_requests(t0) {
            if matches!(request, FetchRequest::Spots { .. }) {
                poller.dispatch(request);
            }
        }

        releases.remove("cam2").unwrap().send(()).unwrap();
        let completion = poller.recv().await.unwrap();
        state.apply(completion, t0);

        // cam1's fetch finishes after cam2's was applied.
        let _ = releases.remove("cam1").unwrap().send(());
        tokio::time::sleep(Duration::from_millis(50)).await;
        for completion in poller.drain() {
            state.apply(completion, t0);
        }

        let ids: Vec<i64> = state.spots.data().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, (11..=16).collect::<Vec<_>>());
        assert_eq!(state.spots.key(), Some("cam2"));
    }

    #[tokio::test]
    async fn test_cancelled_session_delivers_nothing() {
        let (source, mut releases) = GatedSource::new();
        let mut poller = Poller::new(Handle::current(), Arc::new(source));
        let mut state = DashboardState::new(&DashboardConfig::default());
        let t0 = Instant::now();

        state.start(t0);
        for request in state.due_requests(t0) {
            if matches!(request, FetchRequest::Spots { .. }) {
                poller.dispatch(request);
            }
        }
        state.teardown();

        let _ = releases.remove("cam1").unwrap().send(());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(poller.drain().is_empty());
    }

    /// Source whose fetches complete immediately.
    struct ReadySource;

    #[async_trait]
    impl ParkingDataSource for ReadySource {
        async fn get_spots(&self, camera: &str) -> Result<Vec<BackendSpotRecord>, FetchError> {
            Ok(mock_spot_records(camera))
        }

        async fn toggle_spot(&self, _id: i64) -> Result<(), FetchError> {
            Ok(())
        }

        async fn get_metrics(&self) -> Result<Vec<MetricPoint>, FetchError> {
            Ok(Vec::new())
        }

        async fn get_dashboard_metrics(&self, _camera: &str) -> Result<DashboardMetrics, FetchError> {
            Ok(mock_dashboard_metrics())
        }
    }

    #[tokio::test]
    async fn test_ready_fetch_for_ended_session_is_never_delivered() {
        // Both select arms are ready on first poll; the token must win every time.
        for _ in 0..200 {
            let mut poller = Poller::new(Handle::current(), Arc::new(ReadySource));
            let mut state = DashboardState::new(&DashboardConfig::default());
            let t0 = Instant::now();
            state.start(t0);

            let requests = state.due_requests(t0);
            state.teardown();
            for request in requests {
                poller.dispatch(request);
            }

            tokio::time::sleep(Duration::from_millis(1)).await;
            assert!(poller.drain().is_empty());
        }
    }

    #[tokio::test]
    async fn test_toggle_round_trip_against_demo_store() {
        let mut poller = Poller::new(Handle::current(), Arc::new(MockDataSource::new()));
        let mut state = DashboardState::new(&DashboardConfig::default());
        let t0 = Instant::now();
        state.start(t0);

        for request in state.due_requests(t0) {
            poller.dispatch(request);
        }
        for _ in 0..3 {
            let completion = poller.recv().await.unwrap();
            state.apply(completion, t0);
        }
        assert!(!state.is_offline());

        let toggle = state.toggle_request().unwrap();
        poller.dispatch(toggle);
        let completion = poller.recv().await.unwrap();
        state.apply(completion, t0);

        // The toggle re-arms the spot session right away.
        let refetch: Vec<FetchRequest> = state.due_requests(t0);
        assert_eq!(refetch.len(), 1);
        for request in refetch {
            poller.dispatch(request);
        }
        let completion = poller.recv().await.unwrap();
        state.apply(completion, t0);

        let first = &state.spots.data().unwrap()[0];
        assert_eq!(first.id, 1);
        assert!(!first.occupied);
    }
}
