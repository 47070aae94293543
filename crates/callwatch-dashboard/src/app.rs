use crossterm::event::{KeyCode, KeyEvent};

use callwatch_core::time::Timestamp;
use callwatch_core::view::{HISTORY_TOKEN, WAITROOM_TOKEN};
use callwatch_poller::{ActivityFeedState, ActivityQuery, NewLiveSession, SessionFeedState};

use crate::composer::{Dashboard, DashboardView};

/// Lines moved by PageUp/PageDown.
pub const PAGE: u16 = 10;

/// Work the event loop must hand to the activity poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Refetch,
    QueryChanged(ActivityQuery),
}

/// Application state for the TUI.
pub struct App {
    pub dashboard: Dashboard,
    pub feed: ActivityFeedState,
    pub sessions: SessionFeedState,
    pub should_quit: bool,
    /// Keep the feed scrolled to the newest entry.
    pub follow: bool,
    /// Index into the session selector options.
    pub highlighted: usize,
    feed_scroll: u16,
}

impl App {
    pub fn new(limit: u32) -> Self {
        let dashboard = Dashboard::new(limit);
        let feed = ActivityFeedState::new(dashboard.activity_query());
        Self {
            dashboard,
            feed,
            sessions: SessionFeedState::default(),
            should_quit: false,
            follow: true,
            highlighted: 0,
            feed_scroll: 0,
        }
    }

    pub fn view(&self, now: Timestamp) -> DashboardView {
        self.dashboard.compose(&self.feed, &self.sessions, now)
    }

    pub fn set_feed(&mut self, feed: ActivityFeedState) {
        self.feed = feed;
    }

    pub fn set_sessions(&mut self, sessions: SessionFeedState) {
        self.sessions = sessions;
        self.highlighted = self.highlighted.min(self.option_count() - 1);
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<AppCommand> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                None
            },
            KeyCode::Char('w') => self.choose(WAITROOM_TOKEN),
            KeyCode::Char('a') => self.choose(HISTORY_TOKEN),
            KeyCode::Char('j') | KeyCode::Down => {
                self.highlighted = (self.highlighted + 1).min(self.option_count() - 1);
                None
            },
            KeyCode::Char('k') | KeyCode::Up => {
                self.highlighted = self.highlighted.saturating_sub(1);
                None
            },
            KeyCode::Enter => {
                let token = self.option_token(self.highlighted)?;
                self.choose(&token)
            },
            KeyCode::Char('r') => Some(AppCommand::Refetch),
            KeyCode::Char('p') => {
                self.follow = !self.follow;
                None
            },
            KeyCode::PageUp => {
                self.follow = false;
                self.feed_scroll = self.feed_scroll.saturating_sub(PAGE);
                None
            },
            KeyCode::PageDown => {
                self.follow = false;
                self.feed_scroll = self.feed_scroll.saturating_add(PAGE);
                None
            },
            KeyCode::End => {
                self.follow = true;
                None
            },
            _ => None,
        }
    }

    /// A newly started call takes over the view.
    pub fn on_new_live_session(&mut self, event: &NewLiveSession) -> Option<AppCommand> {
        if !self.dashboard.on_new_live_session(event) {
            return None;
        }
        Some(self.selection_changed())
    }

    /// Scroll offset for a feed with `max` lines hidden below the fold.
    pub fn feed_offset(&mut self, max: u16) -> u16 {
        self.feed_scroll = if self.follow {
            max
        } else {
            self.feed_scroll.min(max)
        };
        self.feed_scroll
    }

    fn choose(&mut self, token: &str) -> Option<AppCommand> {
        if !self.dashboard.choose(token) {
            return None;
        }
        Some(self.selection_changed())
    }

    fn selection_changed(&mut self) -> AppCommand {
        self.follow = true;
        self.feed_scroll = 0;
        self.sync_highlight();
        AppCommand::QueryChanged(self.dashboard.activity_query())
    }

    /// Wait room and history, then one option per session.
    fn option_count(&self) -> usize {
        2 + self.sessions.sessions.len()
    }

    fn option_token(&self, index: usize) -> Option<String> {
        match index {
            0 => Some(WAITROOM_TOKEN.to_string()),
            1 => Some(HISTORY_TOKEN.to_string()),
            n => self
                .sessions
                .sessions
                .get(n - 2)
                .map(|session| session.run_id.clone()),
        }
    }

    /// Point the highlight at the selected option when it is listed.
    fn sync_highlight(&mut self) {
        let token = self.dashboard.selection().token();
        let position =
            (0..self.option_count()).find(|&i| self.option_token(i).as_deref() == Some(token));
        if let Some(position) = position {
            self.highlighted = position;
        }
    }
}
