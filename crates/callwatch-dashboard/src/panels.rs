use callwatch_core::events::{ActivityRecord, EventData};
use callwatch_core::format::{
    FormattedEvent, format_event, format_relative_time, format_timestamp,
};
use callwatch_core::liveness::is_session_live;
use callwatch_core::session::SessionSummary;
use callwatch_core::time::Timestamp;
use callwatch_core::view::{HISTORY_TOKEN, WAITROOM_TOKEN};

/// Left panel: what is known about the carrier on the call.
#[derive(Debug, Clone, PartialEq)]
pub enum CarrierPanel {
    Loading,
    /// No verification result yet.
    Waiting,
    Failed {
        mc_number: String,
        reason: String,
    },
    Verified {
        carrier_name: String,
        mc_number: String,
        status: String,
        address: Option<String>,
    },
}

impl CarrierPanel {
    /// Build from activities in fetched (newest-first) order; the first
    /// verification outcome found wins.
    pub fn from_activities(activities: &[ActivityRecord], is_loading: bool) -> Self {
        if is_loading {
            return Self::Loading;
        }
        let outcome = activities.iter().find_map(|a| match &a.data {
            EventData::McVerified(_) | EventData::McVerificationFailed(_) => Some(&a.data),
            _ => None,
        });
        match outcome {
            Some(EventData::McVerified(d)) => Self::Verified {
                carrier_name: d.carrier_name.clone(),
                mc_number: d.mc_number.clone(),
                status: carrier_status(d.carrier_status.as_deref(), d.is_active),
                address: d.physical_address.clone().filter(|a| !a.is_empty()),
            },
            Some(EventData::McVerificationFailed(d)) => Self::Failed {
                mc_number: d.mc_number.clone(),
                reason: d.failure_reason().to_string(),
            },
            _ => Self::Waiting,
        }
    }
}

/// `A` reads as "Active"; other codes are shown as sent. A check mark is
/// appended when the carrier is flagged active.
fn carrier_status(code: Option<&str>, is_active: Option<bool>) -> String {
    let mut status = match code {
        Some("A") => "Active".to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    if is_active == Some(true) {
        if !status.is_empty() {
            status.push(' ');
        }
        status.push('✓');
    }
    status
}

/// One line of the activity feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub event: FormattedEvent,
    pub relative_time: String,
    pub timestamp: String,
}

/// Right panel: the call timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedPanel {
    Loading,
    /// Nothing to show yet.
    Empty,
    /// Oldest first.
    Entries(Vec<FeedEntry>),
}

impl FeedPanel {
    /// `activities` arrive newest-first and are shown oldest-first.
    pub fn from_activities(activities: &[ActivityRecord], is_loading: bool, now: Timestamp) -> Self {
        if is_loading {
            return Self::Loading;
        }
        if activities.is_empty() {
            return Self::Empty;
        }
        let entries = activities
            .iter()
            .rev()
            .map(|activity| FeedEntry {
                event: format_event(activity),
                relative_time: format_relative_time(activity.timestamp, now),
                timestamp: format_timestamp(activity.timestamp),
            })
            .collect();
        Self::Entries(entries)
    }

    /// `"1 event"`, `"7 events"`.
    pub fn count_label(&self) -> Option<String> {
        match self {
            Self::Entries(entries) => {
                let n = entries.len();
                Some(format!("{n} event{}", if n == 1 { "" } else { "s" }))
            },
            _ => None,
        }
    }
}

/// One choice in the session selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOption {
    /// Token passed back to the view-mode selector.
    pub token: String,
    pub label: String,
    pub live: bool,
    pub selected: bool,
}

/// Wait room, history, then one option per session in list order.
pub fn session_options(
    sessions: &[SessionSummary],
    current_token: &str,
    now: Timestamp,
) -> Vec<SessionOption> {
    let fixed = [
        (WAITROOM_TOKEN, "Wait Room".to_string(), false),
        (HISTORY_TOKEN, "All Sessions (History)".to_string(), false),
    ];
    let per_session = sessions.iter().map(|session| {
        (
            session.run_id.as_str(),
            format!(
                "{}... ({} events)",
                short_run_id(&session.run_id),
                session.total_activities
            ),
            is_session_live(session, now),
        )
    });
    fixed
        .into_iter()
        .chain(per_session)
        .map(|(token, label, live)| SessionOption {
            token: token.to_string(),
            label,
            live,
            selected: token == current_token,
        })
        .collect()
}

/// First eight characters of a run id.
pub fn short_run_id(run_id: &str) -> &str {
    match run_id.char_indices().nth(8) {
        Some((idx, _)) => &run_id[..idx],
        None => run_id,
    }
}
