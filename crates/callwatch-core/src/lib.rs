pub mod events;
pub mod format;
pub mod liveness;
pub mod session;
pub mod time;
pub mod view;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    use crate::events::ActivityRecord;
    use crate::session::SessionSummary;
    use crate::time::Timestamp;

    /// Fixed reference instant used across tests: 2025-03-01T12:00:00Z.
    pub fn base_time() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Build an activity through the wire decoder so payload validation runs.
    pub fn activity_at(
        id: &str,
        run_id: &str,
        event_type: &str,
        data: Value,
        timestamp: Timestamp,
    ) -> ActivityRecord {
        serde_json::from_value(wire_activity(id, run_id, event_type, data, timestamp))
            .unwrap_or_else(|e| panic!("test activity {id} must decode: {e}"))
    }

    /// Activity with a placeholder id and run at [`base_time`].
    pub fn activity(event_type: &str, data: Value) -> ActivityRecord {
        activity_at("act-1", "run-1", event_type, data, base_time())
    }

    /// JSON form of an activity as the backend would send it.
    pub fn wire_activity(
        id: &str,
        run_id: &str,
        event_type: &str,
        data: Value,
        timestamp: Timestamp,
    ) -> Value {
        json!({
            "id": id,
            "run_id": run_id,
            "event_type": event_type,
            "data": data,
            "timestamp": timestamp.to_rfc3339(),
        })
    }

    /// A one-activity session that started at `first`.
    pub fn session_at(run_id: &str, first: Timestamp, has_ended: bool) -> SessionSummary {
        SessionSummary {
            run_id: run_id.to_string(),
            first_timestamp: Some(first),
            latest_timestamp: Some(first),
            total_activities: 1,
            latest_event_type: None,
            has_ended,
        }
    }
}
