use serde::{Deserialize, Serialize};

use crate::events::EventType;
use crate::time::{Timestamp, de_opt_timestamp};

/// Backend aggregate over all activities of one `run_id`.
///
/// Recomputed by the backend on every poll; the client never derives or
/// stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub run_id: String,
    #[serde(
        default,
        deserialize_with = "de_opt_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_timestamp: Option<Timestamp>,
    #[serde(
        default,
        deserialize_with = "de_opt_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub latest_timestamp: Option<Timestamp>,
    #[serde(default)]
    pub total_activities: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_event_type: Option<EventType>,
    #[serde(default)]
    pub has_ended: bool,
}
