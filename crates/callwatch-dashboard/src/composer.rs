use callwatch_core::events::ActivityRecord;
use callwatch_core::liveness::activities_are_live;
use callwatch_core::time::Timestamp;
use callwatch_core::view::{Selection, ViewMode, select};
use callwatch_poller::{ActivityFeedState, ActivityQuery, NewLiveSession, SessionFeedState};

use crate::panels::{CarrierPanel, FeedPanel, SessionOption, session_options};

pub const TITLE: &str = "Call Activity Dashboard";
pub const SUBTITLE: &str = "Real-time call activity monitoring";
pub const ERROR_HEADING: &str = "Error loading activities";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub heading: &'static str,
    pub message: String,
}

/// Everything one frame shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub selection: Selection,
    pub error: Option<ErrorBanner>,
    pub carrier: CarrierPanel,
    pub feed: FeedPanel,
    pub sessions: Vec<SessionOption>,
    pub sessions_loading: bool,
}

impl DashboardView {
    /// Label of the selected session option, for the header.
    pub fn selection_label(&self) -> &str {
        self.sessions
            .iter()
            .find(|option| option.selected)
            .map(|option| option.label.as_str())
            .unwrap_or_else(|| self.selection.token())
    }
}

/// Owns the current selection. The only way to change it is through a
/// selector token or a new-live-session notification.
#[derive(Debug, Clone)]
pub struct Dashboard {
    selection: Selection,
    limit: u32,
}

impl Dashboard {
    pub fn new(limit: u32) -> Self {
        Self {
            selection: Selection::waitroom(),
            limit,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Apply a selector token. Returns whether the selection changed.
    pub fn choose(&mut self, token: &str) -> bool {
        self.replace(select(token))
    }

    /// A new live call takes over the view whatever was selected before.
    pub fn on_new_live_session(&mut self, event: &NewLiveSession) -> bool {
        tracing::info!(run_id = %event.run_id, "switching to new live session");
        self.replace(Selection::session(event.run_id.clone()))
    }

    fn replace(&mut self, next: Selection) -> bool {
        if self.selection == next {
            return false;
        }
        self.selection = next;
        true
    }

    /// Parameters the activity poller should use for the current selection.
    pub fn activity_query(&self) -> ActivityQuery {
        ActivityQuery::new(self.selection.run_id.clone(), self.limit)
    }

    /// Wait room shows the fetched list only while it looks like a call in
    /// progress; history and session views show everything.
    pub fn visible_activities<'a>(
        &self,
        activities: &'a [ActivityRecord],
        now: Timestamp,
    ) -> &'a [ActivityRecord] {
        match self.selection.mode {
            ViewMode::Waitroom if !activities_are_live(activities, now) => &[],
            _ => activities,
        }
    }

    pub fn compose(
        &self,
        feed: &ActivityFeedState,
        sessions: &SessionFeedState,
        now: Timestamp,
    ) -> DashboardView {
        // Until the poller picks up the current query its data belongs to
        // the previous selection.
        let current = feed.query == self.activity_query();
        let loading = feed.is_loading || !current;
        let visible = if current {
            self.visible_activities(&feed.activities, now)
        } else {
            &[]
        };
        DashboardView {
            selection: self.selection.clone(),
            error: feed
                .error
                .as_ref()
                .filter(|_| current)
                .map(|message| ErrorBanner {
                    heading: ERROR_HEADING,
                    message: message.clone(),
                }),
            carrier: CarrierPanel::from_activities(visible, loading),
            feed: FeedPanel::from_activities(visible, loading, now),
            sessions: session_options(&sessions.sessions, self.selection.token(), now),
            sessions_loading: sessions.is_loading,
        }
    }
}
