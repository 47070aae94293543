use chrono::TimeDelta;

use crate::events::ActivityRecord;
use crate::session::SessionSummary;
use crate::time::Timestamp;

/// How long after its first event a session that has not ended counts as live.
pub const LIVE_WINDOW_SECS: i64 = 600;

pub fn live_window() -> TimeDelta {
    TimeDelta::seconds(LIVE_WINDOW_SECS)
}

/// A session is live when it has not ended and its first event happened
/// less than [`LIVE_WINDOW_SECS`] before `now`.
///
/// The answer decays with time; evaluate it with a fresh `now` every time.
pub fn is_live(has_ended: bool, first_timestamp: Timestamp, now: Timestamp) -> bool {
    if has_ended {
        return false;
    }
    now.signed_duration_since(first_timestamp) < live_window()
}

/// Liveness of a session summary. Sessions without activities have no
/// first event and are never live.
pub fn is_session_live(session: &SessionSummary, now: Timestamp) -> bool {
    if session.total_activities == 0 {
        return false;
    }
    match session.first_timestamp {
        Some(first) => is_live(session.has_ended, first, now),
        None => false,
    }
}

/// Liveness judged from a fetched activity list instead of a summary: not
/// live if the list is empty or contains a `CALL_ENDED`, otherwise the
/// window is measured from the earliest record.
pub fn activities_are_live(activities: &[ActivityRecord], now: Timestamp) -> bool {
    if activities.iter().any(ActivityRecord::is_call_ended) {
        return false;
    }
    match activities.iter().map(|a| a.timestamp).min() {
        Some(first) => is_live(false, first, now),
        None => false,
    }
}
