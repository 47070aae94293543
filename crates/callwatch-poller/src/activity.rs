use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use callwatch_core::events::ActivityRecord;

use crate::client::{ActivityQuery, DashboardClient, FetchError};

/// What the activity feed currently shows.
#[derive(Debug, Clone)]
pub struct ActivityFeedState {
    /// Newest first, as returned by the relay.
    pub activities: Vec<ActivityRecord>,
    /// True until a response for the current query has been applied.
    pub is_loading: bool,
    /// Message of the most recent failed request; cleared by the next success.
    pub error: Option<String>,
    pub query: ActivityQuery,
}

impl ActivityFeedState {
    pub fn new(query: ActivityQuery) -> Self {
        Self {
            activities: Vec::new(),
            is_loading: true,
            error: None,
            query,
        }
    }
}

/// Identifies one in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    query: ActivityQuery,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn query(&self) -> &ActivityQuery {
        &self.query
    }
}

/// Orders overlapping requests. A completion is applied only if it is newer
/// than the last applied one and was issued for the current query.
#[derive(Debug)]
pub struct FeedTracker {
    next_seq: u64,
    applied_seq: u64,
    state: ActivityFeedState,
}

impl FeedTracker {
    pub fn new(query: ActivityQuery) -> Self {
        Self {
            next_seq: 0,
            applied_seq: 0,
            state: ActivityFeedState::new(query),
        }
    }

    pub fn state(&self) -> &ActivityFeedState {
        &self.state
    }

    /// Replace the query. Returns false if it was already current.
    pub fn set_query(&mut self, query: ActivityQuery) -> bool {
        if self.state.query == query {
            return false;
        }
        self.state.query = query;
        self.state.is_loading = true;
        true
    }

    pub fn begin(&mut self) -> Ticket {
        self.next_seq += 1;
        Ticket {
            seq: self.next_seq,
            query: self.state.query.clone(),
        }
    }

    /// Apply a finished request. Returns whether the state changed.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<ActivityRecord>, FetchError>,
    ) -> bool {
        if ticket.seq <= self.applied_seq || ticket.query != self.state.query {
            tracing::debug!(
                seq = ticket.seq,
                applied = self.applied_seq,
                "dropping stale activity response"
            );
            return false;
        }
        self.applied_seq = ticket.seq;
        self.state.is_loading = false;
        match result {
            Ok(activities) => {
                self.state.activities = activities;
                self.state.error = None;
            },
            Err(e) => {
                tracing::warn!(error = %e, run_id = ?ticket.query.run_id, "Failed to fetch activities");
                self.state.error = Some(e.to_string());
            },
        }
        true
    }
}

#[derive(Debug)]
enum Command {
    SetQuery(ActivityQuery),
    SetEnabled(bool),
    Refetch,
}

type Completion = (Ticket, Result<Vec<ActivityRecord>, FetchError>);

/// Periodically fetches activities for the current query.
pub struct ActivityPoller {
    client: DashboardClient,
    interval: Duration,
    enabled: bool,
    tracker: FeedTracker,
}

impl ActivityPoller {
    pub fn new(client: DashboardClient, interval: Duration, query: ActivityQuery) -> Self {
        Self {
            client,
            interval,
            enabled: true,
            tracker: FeedTracker::new(query),
        }
    }

    /// Start the poller on the current runtime. The first fetch is issued
    /// immediately.
    pub fn spawn(self) -> ActivityPollerHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(self.tracker.state().clone());
        let task = tokio::spawn(self.run(cmd_rx, state_tx));
        ActivityPollerHandle {
            commands: cmd_tx,
            state: state_rx,
            task,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        state_tx: watch::Sender<ActivityFeedState>,
    ) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        // Zero interval: fetch once, then only on query change or refetch
        let periodic = !self.interval.is_zero();
        let mut ticker = tokio::time::interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !periodic && self.enabled {
            self.start_fetch(&done_tx);
        }

        loop {
            tokio::select! {
                _ = ticker.tick(), if self.enabled && periodic => self.start_fetch(&done_tx),
                cmd = commands.recv() => match cmd {
                    Some(Command::SetQuery(query)) => {
                        if self.tracker.set_query(query) {
                            state_tx.send_replace(self.tracker.state().clone());
                            if self.enabled {
                                self.start_fetch(&done_tx);
                            }
                        }
                    },
                    Some(Command::SetEnabled(enabled)) => {
                        if enabled && !self.enabled {
                            if periodic {
                                ticker.reset_immediately();
                            } else {
                                self.start_fetch(&done_tx);
                            }
                        }
                        self.enabled = enabled;
                    },
                    Some(Command::Refetch) => self.start_fetch(&done_tx),
                    None => break,
                },
                Some((ticket, result)) = done_rx.recv() => {
                    if self.tracker.complete(ticket, result) {
                        state_tx.send_replace(self.tracker.state().clone());
                    }
                },
            }
        }
        tracing::debug!("activity poller stopped");
    }

    /// Issue a request without waiting for it; overlapping requests are
    /// sorted out by the tracker when they complete.
    fn start_fetch(&mut self, done: &mpsc::UnboundedSender<Completion>) {
        let ticket = self.tracker.begin();
        let client = self.client.clone();
        let done = done.clone();
        tokio::spawn(async move {
            let result = client.fetch_activities(ticket.query()).await;
            let _ = done.send((ticket, result));
        });
    }
}

/// Control side of a running [`ActivityPoller`].
pub struct ActivityPollerHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ActivityFeedState>,
    task: JoinHandle<()>,
}

impl ActivityPollerHandle {
    /// Switch to a different run or limit and fetch right away.
    pub fn set_query(&self, query: ActivityQuery) {
        self.send(Command::SetQuery(query));
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.send(Command::SetEnabled(enabled));
    }

    pub fn refetch(&self) {
        self.send(Command::Refetch);
    }

    pub fn subscribe(&self) -> watch::Receiver<ActivityFeedState> {
        self.state.clone()
    }

    /// Snapshot of the latest published state.
    pub fn state(&self) -> ActivityFeedState {
        self.state.borrow().clone()
    }

    pub fn shutdown(self) {
        self.task.abort();
    }

    fn send(&self, cmd: Command) {
        if self.commands.send(cmd).is_err() {
            tracing::debug!("activity poller is no longer running");
        }
    }
}
