use serde::{Deserialize, Serialize};

/// Selector token for the wait-room view.
pub const WAITROOM_TOKEN: &str = "waitroom";
/// Selector token for the all-sessions history view.
pub const HISTORY_TOKEN: &str = "all";

/// Which slice of activity the dashboard shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// No session chosen; activity is shown only while it looks live.
    #[default]
    Waitroom,
    /// Every session, unfiltered.
    History,
    /// One explicitly chosen run.
    Session,
}

/// The user's current choice: which run (if any) and in which mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub run_id: Option<String>,
    pub mode: ViewMode,
}

impl Selection {
    pub fn waitroom() -> Self {
        Self::default()
    }

    pub fn history() -> Self {
        Self {
            run_id: None,
            mode: ViewMode::History,
        }
    }

    pub fn session(run_id: impl Into<String>) -> Self {
        Self {
            run_id: Some(run_id.into()),
            mode: ViewMode::Session,
        }
    }

    /// Token that would produce this selection through [`select`].
    pub fn token(&self) -> &str {
        match (self.mode, self.run_id.as_deref()) {
            (ViewMode::Session, Some(run_id)) => run_id,
            (ViewMode::History, _) => HISTORY_TOKEN,
            _ => WAITROOM_TOKEN,
        }
    }
}

/// Map a selector token to a selection. Anything that is not one of the
/// two sentinels is a `run_id`.
pub fn select(token: &str) -> Selection {
    match token {
        WAITROOM_TOKEN => Selection::waitroom(),
        HISTORY_TOKEN => Selection::history(),
        run_id => Selection::session(run_id),
    }
}
