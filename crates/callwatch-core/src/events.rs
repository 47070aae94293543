use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::time::{Timestamp, de_timestamp};

/// Recognized call events. Anything else the backend sends is kept
/// verbatim in [`EventType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    McVerified,
    McVerificationFailed,
    LoadSearched,
    LoadSearchNoResults,
    LoadAccepted,
    NegotiationRound,
    CallEnded,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::McVerified => "MC_VERIFIED",
            Self::McVerificationFailed => "MC_VERIFICATION_FAILED",
            Self::LoadSearched => "LOAD_SEARCHED",
            Self::LoadSearchNoResults => "LOAD_SEARCH_NO_RESULTS",
            Self::LoadAccepted => "LOAD_ACCEPTED",
            Self::NegotiationRound => "NEGOTIATION_ROUND",
            Self::CallEnded => "CALL_ENDED",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for EventType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "MC_VERIFIED" => Self::McVerified,
            "MC_VERIFICATION_FAILED" => Self::McVerificationFailed,
            "LOAD_SEARCHED" => Self::LoadSearched,
            "LOAD_SEARCH_NO_RESULTS" => Self::LoadSearchNoResults,
            "LOAD_ACCEPTED" => Self::LoadAccepted,
            "NEGOTIATION_ROUND" => Self::NegotiationRound,
            "CALL_ENDED" => Self::CallEnded,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for EventType {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of `MC_VERIFIED`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McVerified {
    #[serde(deserialize_with = "de_lenient_string")]
    pub mc_number: String,
    pub carrier_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Payload of `MC_VERIFICATION_FAILED`.
///
/// Some backend builds report the failure under `error`, others under
/// `reason`; both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McVerificationFailed {
    #[serde(deserialize_with = "de_lenient_string")]
    pub mc_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fallback text when a failed verification carries no explanation.
pub const DEFAULT_VERIFICATION_FAILURE: &str = "Carrier not valid";

impl McVerificationFailed {
    pub fn failure_reason(&self) -> &str {
        non_empty(self.reason.as_deref())
            .or_else(|| non_empty(self.error.as_deref()))
            .unwrap_or(DEFAULT_VERIFICATION_FAILURE)
    }
}

/// Filters the carrier searched with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_type: Option<String>,
}

/// One load returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    #[serde(deserialize_with = "de_lenient_string")]
    pub load_id: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub equipment_type: String,
    #[serde(default)]
    pub loadboard_rate: f64,
    #[serde(default)]
    pub miles: f64,
}

/// Payload shared by `LOAD_SEARCHED` and `LOAD_SEARCH_NO_RESULTS`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadSearch {
    #[serde(default)]
    pub search_params: SearchParams,
    #[serde(default)]
    pub results_count: u64,
    #[serde(default)]
    pub loads: Vec<LoadSummary>,
}

/// Payload of `LOAD_ACCEPTED`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadAccepted {
    #[serde(deserialize_with = "de_lenient_string")]
    pub load_id: String,
    pub accepted_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadboard_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negotiation_id: Option<String>,
}

/// Decision taken in one negotiation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationAction {
    Accept,
    Counter,
    Transfer,
}

/// Payload of `NEGOTIATION_ROUND`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationRound {
    #[serde(default, deserialize_with = "de_opt_lenient_string")]
    pub load_id: Option<String>,
    #[serde(default)]
    pub round: Option<u32>,
    #[serde(default)]
    pub carrier_offer: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadboard_rate: Option<f64>,
    /// Raw action string; see [`NegotiationRound::action`].
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub counter_offer: Option<f64>,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negotiation_id: Option<String>,
}

impl NegotiationRound {
    pub fn action(&self) -> Option<NegotiationAction> {
        match self.action.as_deref()? {
            "ACCEPT" => Some(NegotiationAction::Accept),
            "COUNTER" => Some(NegotiationAction::Counter),
            "TRANSFER" => Some(NegotiationAction::Transfer),
            _ => None,
        }
    }
}

/// Payload of `CALL_ENDED`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallEnded {
    #[serde(default, deserialize_with = "de_opt_lenient_string")]
    pub mc_number: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default, deserialize_with = "de_opt_lenient_string")]
    pub load_id: Option<String>,
    #[serde(default)]
    pub final_price: Option<f64>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub outcome_reason: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub negotiation_rounds: Option<u32>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub call_end: Option<String>,
}

/// Event payload, keyed by the record's event type.
///
/// A payload whose shape does not match its event type, and every payload of
/// an unrecognized type, is kept as [`EventData::Raw`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    McVerified(McVerified),
    McVerificationFailed(McVerificationFailed),
    LoadSearched(LoadSearch),
    LoadSearchNoResults(LoadSearch),
    LoadAccepted(LoadAccepted),
    NegotiationRound(NegotiationRound),
    CallEnded(CallEnded),
    Raw(Map<String, Value>),
}

impl EventData {
    /// Validate `data` against the shape `event_type` calls for.
    pub fn decode(event_type: &EventType, data: Value) -> Self {
        let data = match data {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        let decoded = match event_type {
            EventType::McVerified => decode_as(&data, Self::McVerified),
            EventType::McVerificationFailed => decode_as(&data, Self::McVerificationFailed),
            EventType::LoadSearched => decode_as(&data, Self::LoadSearched),
            EventType::LoadSearchNoResults => decode_as(&data, Self::LoadSearchNoResults),
            EventType::LoadAccepted => decode_as(&data, Self::LoadAccepted),
            EventType::NegotiationRound => decode_as(&data, Self::NegotiationRound),
            EventType::CallEnded => decode_as(&data, Self::CallEnded),
            EventType::Other(_) => None,
        };
        decoded.unwrap_or_else(|| {
            if event_type.is_known() {
                tracing::debug!(%event_type, "payload does not match event type, keeping raw data");
            }
            match data {
                Value::Object(map) => Self::Raw(map),
                other => {
                    let mut map = Map::new();
                    map.insert("value".to_string(), other);
                    Self::Raw(map)
                },
            }
        })
    }

    pub fn to_value(&self) -> Value {
        let encoded = match self {
            Self::McVerified(d) => serde_json::to_value(d),
            Self::McVerificationFailed(d) => serde_json::to_value(d),
            Self::LoadSearched(d) | Self::LoadSearchNoResults(d) => serde_json::to_value(d),
            Self::LoadAccepted(d) => serde_json::to_value(d),
            Self::NegotiationRound(d) => serde_json::to_value(d),
            Self::CallEnded(d) => serde_json::to_value(d),
            Self::Raw(map) => return Value::Object(map.clone()),
        };
        encoded.unwrap_or(Value::Null)
    }
}

fn decode_as<T, F>(data: &Value, wrap: F) -> Option<EventData>
where
    T: serde::de::DeserializeOwned,
    F: FnOnce(T) -> EventData,
{
    T::deserialize(data).ok().map(wrap)
}

/// One immutable fact recorded during a call session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireActivity", into = "WireActivity")]
pub struct ActivityRecord {
    pub id: String,
    pub run_id: String,
    pub event_type: EventType,
    pub data: EventData,
    pub timestamp: Timestamp,
}

impl ActivityRecord {
    pub fn is_call_ended(&self) -> bool {
        self.event_type == EventType::CallEnded
    }

    /// True for the two carrier verification outcomes.
    pub fn is_carrier_check(&self) -> bool {
        matches!(
            self.event_type,
            EventType::McVerified | EventType::McVerificationFailed
        )
    }
}

/// Activity record as it travels over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireActivity {
    #[serde(deserialize_with = "de_lenient_string")]
    id: String,
    run_id: String,
    event_type: EventType,
    #[serde(default)]
    data: Value,
    #[serde(deserialize_with = "de_timestamp")]
    timestamp: Timestamp,
}

impl From<WireActivity> for ActivityRecord {
    fn from(wire: WireActivity) -> Self {
        let data = EventData::decode(&wire.event_type, wire.data);
        Self {
            id: wire.id,
            run_id: wire.run_id,
            event_type: wire.event_type,
            data,
            timestamp: wire.timestamp,
        }
    }
}

impl From<ActivityRecord> for WireActivity {
    fn from(record: ActivityRecord) -> Self {
        Self {
            data: record.data.to_value(),
            id: record.id,
            run_id: record.run_id,
            event_type: record.event_type,
            timestamp: record.timestamp,
        }
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Accept identifiers sent either as JSON strings or numbers.
fn de_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn de_opt_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> ActivityRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn event_type_names() {
        for raw in [
            "MC_VERIFIED",
            "MC_VERIFICATION_FAILED",
            "LOAD_SEARCHED",
            "LOAD_SEARCH_NO_RESULTS",
            "LOAD_ACCEPTED",
            "NEGOTIATION_ROUND",
            "CALL_ENDED",
        ] {
            let et = EventType::from(raw);
            assert!(et.is_known(), "{raw} should be recognized");
            assert_eq!(et.as_str(), raw);
        }
        let other = EventType::from("SMS_SENT");
        assert_eq!(other, EventType::Other("SMS_SENT".to_string()));
        assert_eq!(String::from(other), "SMS_SENT");
    }

    #[test]
    fn decodes_verified_carrier() {
        let record = parse(json!({
            "id": "a1",
            "run_id": "run-1",
            "event_type": "MC_VERIFIED",
            "data": {
                "mc_number": 123456,
                "carrier_name": "Acme Freight",
                "carrier_status": "A",
                "physical_address": "1 Main St",
                "is_active": true
            },
            "timestamp": "2025-03-01T12:00:00Z"
        }));
        assert_eq!(record.event_type, EventType::McVerified);
        match record.data {
            EventData::McVerified(d) => {
                assert_eq!(d.mc_number, "123456");
                assert_eq!(d.carrier_name, "Acme Freight");
                assert_eq!(d.is_active, Some(true));
            },
            other => panic!("expected McVerified, got {other:?}"),
        }
    }

    #[test]
    fn failure_reason_prefers_reason_then_error() {
        let both = McVerificationFailed {
            mc_number: "1".into(),
            reason: Some("Inactive".into()),
            error: Some("Lookup failed".into()),
        };
        assert_eq!(both.failure_reason(), "Inactive");

        let error_only = McVerificationFailed {
            mc_number: "1".into(),
            reason: Some(String::new()),
            error: Some("Lookup failed".into()),
        };
        assert_eq!(error_only.failure_reason(), "Lookup failed");

        let neither = McVerificationFailed {
            mc_number: "1".into(),
            reason: None,
            error: None,
        };
        assert_eq!(neither.failure_reason(), DEFAULT_VERIFICATION_FAILURE);
    }

    #[test]
    fn mismatched_payload_kept_raw() {
        let record = parse(json!({
            "id": "a2",
            "run_id": "run-1",
            "event_type": "LOAD_ACCEPTED",
            "data": { "note": "no price here" },
            "timestamp": "2025-03-01T12:00:00Z"
        }));
        assert_eq!(record.event_type, EventType::LoadAccepted);
        match record.data {
            EventData::Raw(map) => assert_eq!(map["note"], json!("no price here")),
            other => panic!("expected raw payload, got {other:?}"),
        }
    }

    #[test]
    fn unknown_event_type_survives() {
        let record = parse(json!({
            "id": "a3",
            "run_id": "run-1",
            "event_type": "SMS_SENT",
            "data": { "to": "+15550100" },
            "timestamp": "2025-03-01T12:00:00Z"
        }));
        assert_eq!(record.event_type, EventType::Other("SMS_SENT".into()));
        assert!(matches!(record.data, EventData::Raw(_)));
    }

    #[test]
    fn missing_data_is_tolerated() {
        let record = parse(json!({
            "id": "a4",
            "run_id": "run-1",
            "event_type": "CALL_ENDED",
            "timestamp": "2025-03-01T12:00:00Z"
        }));
        assert!(record.is_call_ended());
        assert_eq!(record.data, EventData::CallEnded(CallEnded::default()));
    }

    #[test]
    fn bad_timestamp_rejects_record() {
        let result: Result<ActivityRecord, _> = serde_json::from_value(json!({
            "id": "a5",
            "run_id": "run-1",
            "event_type": "CALL_ENDED",
            "data": {},
            "timestamp": "not a time"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn negotiation_action_parsing() {
        let mut round = NegotiationRound {
            load_id: Some("L-1".into()),
            round: Some(2),
            carrier_offer: Some(1500.0),
            loadboard_rate: None,
            action: Some("COUNTER".into()),
            counter_offer: None,
            reason: "Too high".into(),
            negotiation_id: None,
        };
        assert_eq!(round.action(), Some(NegotiationAction::Counter));
        round.action = Some("ESCALATE".into());
        assert_eq!(round.action(), None);
        round.action = None;
        assert_eq!(round.action(), None);
    }

    #[test]
    fn wire_form_preserves_event_type_and_data() {
        let original = parse(json!({
            "id": "a6",
            "run_id": "run-9",
            "event_type": "LOAD_SEARCHED",
            "data": {
                "search_params": { "origin": "Dallas" },
                "results_count": 3,
                "loads": []
            },
            "timestamp": "2025-03-01T12:00:00Z"
        }));
        let value = serde_json::to_value(&original).unwrap();
        assert_eq!(value["event_type"], json!("LOAD_SEARCHED"));
        assert_eq!(value["data"]["results_count"], json!(3));
        let back: ActivityRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, original);
    }
}
