// services/parking-dash/src/session.rs
//
// Polling sessions: fetch scheduling, fallback substitution and
// late-arrival suppression for one view

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use parkkit::backoff::BackoffPolicy;
use parkkit::FetchError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One live-refresh lifecycle bound to a key (a camera, or nothing for global
/// views). Cheap to clone; every fetch carries a copy.
#[derive(Debug, Clone)]
pub struct PollSession {
    key: Option<String>,
    generation: u64,
    cancel: CancellationToken,
}

impl PollSession {
    fn new(key: Option<String>, generation: u64) -> Self {
        Self {
            key,
            generation,
            cancel: CancellationToken::new(),
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_live(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollState {
    pub is_loading: bool,
    pub last_error: Option<FetchError>,
    pub last_updated_at: Option<DateTime<Local>>,
}

impl PollState {
    fn loading() -> Self {
        Self {
            is_loading: true,
            last_error: None,
            last_updated_at: None,
        }
    }

    /// True while the view shows simulated data.
    pub fn is_offline(&self) -> bool {
        self.last_error.is_some()
    }
}

/// What `resolve` did with a completed fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Live data stored. `recovered` is set when the previous fetch had failed.
    Live { recovered: bool },
    /// Fetch failed and fallback data was substituted. `first_failure` is set
    /// on the transition from online to offline.
    Fallback { error: FetchError, first_failure: bool },
    /// The session was superseded or torn down; nothing changed.
    Stale,
}

/// Drives the data lifecycle of one view.
///
/// Time is passed in by the caller, so the controller never reads a clock
/// for scheduling and can be driven with simulated instants.
pub struct PollingController<T> {
    name: &'static str,
    interval: Duration,
    backoff: Option<BackoffPolicy>,
    session: Option<PollSession>,
    generation: u64,
    state: PollState,
    data: Option<T>,
    next_due: Option<Instant>,
    in_flight: bool,
    consecutive_failures: u32,
}

impl<T> PollingController<T> {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            interval,
            backoff: None,
            session: None,
            generation: 0,
            state: PollState::default(),
            data: None,
            next_due: None,
            in_flight: false,
            consecutive_failures: 0,
        }
    }

    pub fn with_backoff(mut self, backoff: Option<BackoffPolicy>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn key(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.key())
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Start a new session, superseding any previous one.
    ///
    /// The previous session's token is cancelled and its data discarded. The
    /// first fetch is due immediately.
    pub fn start(&mut self, key: Option<String>, now: Instant) -> PollSession {
        if let Some(old) = self.session.take() {
            old.cancel.cancel();
            debug!(
                view = self.name,
                generation = old.generation,
                "Superseded polling session"
            );
        }

        self.generation += 1;
        let session = PollSession::new(key, self.generation);
        info!(
            view = self.name,
            key = session.key().unwrap_or("-"),
            generation = session.generation,
            "Starting polling session"
        );

        self.session = Some(session.clone());
        self.state = PollState::loading();
        self.data = None;
        self.next_due = Some(now);
        self.in_flight = false;
        self.consecutive_failures = 0;
        session
    }

    /// Session to fetch for, if the timer has fired and no fetch is in flight.
    pub fn poll_due(&mut self, now: Instant) -> Option<PollSession> {
        if self.in_flight {
            return None;
        }
        let session = self.session.as_ref()?;
        match self.next_due {
            Some(due) if due <= now => {
                self.in_flight = true;
                self.next_due = None;
                self.state.is_loading = true;
                Some(session.clone())
            }
            _ => None,
        }
    }

    /// Apply a completed fetch.
    ///
    /// Results from a superseded or cancelled session are dropped. On failure
    /// the value from `fallback` is shown instead. Either way the next fetch
    /// is armed.
    pub fn resolve<F>(
        &mut self,
        session: &PollSession,
        result: Result<T, FetchError>,
        fallback: F,
        now: Instant,
    ) -> Resolution
    where
        F: FnOnce() -> T,
    {
        if !self.is_current(session) {
            debug!(
                view = self.name,
                generation = session.generation,
                current = self.generation,
                "Dropping late fetch result"
            );
            return Resolution::Stale;
        }

        self.in_flight = false;
        self.state.is_loading = false;

        let resolution = match result {
            Ok(data) => {
                let recovered = self.state.last_error.is_some();
                self.data = Some(data);
                self.state.last_error = None;
                self.state.last_updated_at = Some(Local::now());
                self.consecutive_failures = 0;
                Resolution::Live { recovered }
            }
            Err(error) => {
                let first_failure = self.state.last_error.is_none();
                if first_failure {
                    warn!(view = self.name, error = %error, "Fetch failed, showing simulated data");
                } else {
                    debug!(view = self.name, error = %error, "Fetch still failing");
                }
                self.data = Some(fallback());
                self.state.last_error = Some(error.clone());
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                Resolution::Fallback {
                    error,
                    first_failure,
                }
            }
        };

        self.next_due = Some(now + self.current_delay());
        resolution
    }

    /// Arm the next fetch immediately (manual refresh). No-op while a fetch is
    /// in flight, since that fetch will re-arm the timer on completion.
    pub fn refresh_now(&mut self, now: Instant) {
        if self.session.is_some() && !self.in_flight {
            self.next_due = Some(now);
        }
    }

    /// End the session: cancel its token and disarm the timer.
    pub fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
            info!(
                view = self.name,
                generation = session.generation,
                "Tore down polling session"
            );
        }
        self.next_due = None;
        self.in_flight = false;
        self.state.is_loading = false;
    }

    fn is_current(&self, session: &PollSession) -> bool {
        session.is_live()
            && self
                .session
                .as_ref()
                .is_some_and(|current| current.generation == session.generation)
    }

    fn current_delay(&self) -> Duration {
        match (&self.backoff, self.consecutive_failures) {
            (Some(policy), failures) if failures > 0 => {
                policy.delay_after(self.interval, failures)
            }
            _ => self.interval,
        }
    }
}
