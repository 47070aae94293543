use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use callwatch_core::liveness::is_session_live;
use callwatch_core::session::SessionSummary;
use callwatch_core::time::{self, Timestamp};

use crate::client::DashboardClient;

/// Floor for the session poll period.
pub const MIN_SESSION_INTERVAL: Duration = Duration::from_secs(1);

/// A session that appeared since the previous poll and is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLiveSession {
    pub run_id: String,
}

/// Latest session list for the selector.
#[derive(Debug, Clone)]
pub struct SessionFeedState {
    pub sessions: Vec<SessionSummary>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for SessionFeedState {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            is_loading: true,
            error: None,
        }
    }
}

/// Remembers every run id ever listed and picks out newly appeared live ones.
///
/// The seen set is never pruned and lives as long as the poller. A run that
/// drops off the list and later reappears must not be announced again, and
/// the ids are small next to the session list itself.
#[derive(Debug, Default)]
pub struct SessionWatch {
    seen: HashSet<String>,
}

impl SessionWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, run_id: &str) -> bool {
        self.seen.contains(run_id)
    }

    /// Record a poll result. Returns the run id to switch to, if any: among
    /// sessions not seen before that are live at `now`, the one with the
    /// earliest first event (list order breaks ties). Every listed id is
    /// marked seen afterwards, so an id is returned at most once.
    pub fn observe(&mut self, sessions: &[SessionSummary], now: Timestamp) -> Option<String> {
        let mut pick: Option<(&SessionSummary, Timestamp)> = None;
        for session in sessions {
            if self.seen.contains(&session.run_id) || !is_session_live(session, now) {
                continue;
            }
            let Some(first) = session.first_timestamp else {
                continue;
            };
            match pick {
                Some((_, best)) if best <= first => {},
                _ => pick = Some((session, first)),
            }
        }
        let picked = pick.map(|(session, _)| session.run_id.clone());
        self.seen
            .extend(sessions.iter().map(|session| session.run_id.clone()));
        picked
    }
}

/// Polls the session list and announces new live sessions.
pub struct SessionPoller {
    client: DashboardClient,
    interval: Duration,
    watch: SessionWatch,
}

impl SessionPoller {
    pub fn new(client: DashboardClient, interval: Duration) -> Self {
        Self {
            client,
            interval,
            watch: SessionWatch::new(),
        }
    }

    /// Time between polls: the requested interval, floored at
    /// [`MIN_SESSION_INTERVAL`].
    pub fn period(&self) -> Duration {
        self.interval.max(MIN_SESSION_INTERVAL)
    }

    pub fn spawn(self) -> SessionPollerHandle {
        let (state_tx, state_rx) = watch::channel(SessionFeedState::default());
        let (live_tx, live_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(state_tx, live_tx));
        SessionPollerHandle {
            state: state_rx,
            live_sessions: live_rx,
            task,
        }
    }

    /// Run the poll loop. Each fetch is awaited before the next tick, so
    /// requests never overlap. Stops once nobody watches the state.
    pub async fn run(
        mut self,
        state_tx: watch::Sender<SessionFeedState>,
        live_tx: mpsc::UnboundedSender<NewLiveSession>,
    ) {
        let mut ticker = tokio::time::interval(self.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut state = SessionFeedState::default();

        loop {
            ticker.tick().await;
            if let Some(run_id) = self.poll_once(&mut state).await {
                tracing::info!(run_id = %run_id, "new live session");
                if live_tx.send(NewLiveSession { run_id }).is_err() {
                    tracing::debug!("no listener for new live sessions");
                }
            }
            if state_tx.send(state.clone()).is_err() {
                break;
            }
        }
        tracing::debug!("session poller stopped");
    }

    /// One fetch. A failure keeps the previous list and the seen set.
    pub async fn poll_once(&mut self, state: &mut SessionFeedState) -> Option<String> {
        let result = self.client.fetch_sessions().await;
        state.is_loading = false;
        match result {
            Ok(sessions) => {
                let picked = self.watch.observe(&sessions, time::now());
                state.sessions = sessions;
                state.error = None;
                picked
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch sessions");
                state.error = Some(e.to_string());
                None
            },
        }
    }
}

/// Receiving side of a running [`SessionPoller`].
pub struct SessionPollerHandle {
    pub state: watch::Receiver<SessionFeedState>,
    pub live_sessions: mpsc::UnboundedReceiver<NewLiveSession>,
    task: JoinHandle<()>,
}

impl SessionPollerHandle {
    pub fn shutdown(self) {
        self.task.abort();
    }
}
