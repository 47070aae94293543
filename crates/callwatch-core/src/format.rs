use serde::Serialize;

use crate::events::{
    ActivityRecord, CallEnded, EventData, EventType, LoadAccepted, LoadSearch, McVerificationFailed,
    McVerified, NegotiationAction, NegotiationRound, SearchParams, non_empty,
};
use crate::time::Timestamp;

/// Tone of a badge attached to a formatted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub text: String,
    pub severity: Severity,
}

impl Badge {
    fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }
}

/// Display-ready form of one activity record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedEvent {
    pub id: String,
    pub event_type: EventType,
    pub title: String,
    pub description: String,
    pub timestamp: Timestamp,
    pub badge: Option<Badge>,
}

/// Format an activity record for the feed. Never fails: unknown event types
/// and payloads that do not match their type get a generic rendering.
pub fn format_event(activity: &ActivityRecord) -> FormattedEvent {
    let (title, description, badge) = match &activity.data {
        EventData::McVerified(data) => mc_verified(data),
        EventData::McVerificationFailed(data) => mc_failed(data),
        EventData::LoadSearched(data) => loads_found(data),
        EventData::LoadSearchNoResults(data) => no_loads(data),
        EventData::LoadAccepted(data) => load_accepted(data),
        EventData::NegotiationRound(data) => negotiation(data),
        EventData::CallEnded(data) => call_ended(data),
        EventData::Raw(_) => fallback(&activity.event_type),
    };
    FormattedEvent {
        id: activity.id.clone(),
        event_type: activity.event_type.clone(),
        title,
        description,
        timestamp: activity.timestamp,
        badge,
    }
}

type Parts = (String, String, Option<Badge>);

fn mc_verified(data: &McVerified) -> Parts {
    (
        "Carrier Verified".to_string(),
        format!("MC #{} - {}", data.mc_number, data.carrier_name),
        Some(Badge::new("Verified", Severity::Positive)),
    )
}

fn mc_failed(data: &McVerificationFailed) -> Parts {
    (
        "Verification Failed".to_string(),
        format!("MC #{} - {}", data.mc_number, data.failure_reason()),
        Some(Badge::new("Failed", Severity::Negative)),
    )
}

fn loads_found(data: &LoadSearch) -> Parts {
    let n = data.results_count;
    let description = format!(
        "{n} {} found {}",
        plural(n, "load"),
        search_terms(&data.search_params)
    );
    (
        "Loads Found".to_string(),
        description.trim_end().to_string(),
        Some(Badge::new(
            format!("{n} {}", plural(n, "result")),
            Severity::Positive,
        )),
    )
}

fn no_loads(data: &LoadSearch) -> Parts {
    let description = format!("No available loads {}", search_terms(&data.search_params));
    (
        "No Loads Found".to_string(),
        description.trim_end().to_string(),
        Some(Badge::new("No results", Severity::Neutral)),
    )
}

fn load_accepted(data: &LoadAccepted) -> Parts {
    (
        "Load Accepted".to_string(),
        format!(
            "Load {} accepted at {}",
            data.load_id,
            format_currency(data.accepted_price)
        ),
        Some(Badge::new("Accepted", Severity::Positive)),
    )
}

fn negotiation(data: &NegotiationRound) -> Parts {
    let heading = match data.round {
        Some(round) => format!("Negotiation Round {round}"),
        None => "Negotiation Round".to_string(),
    };
    let offer = format_currency(data.carrier_offer.unwrap_or(0.0));
    match data.action() {
        Some(NegotiationAction::Accept) => (
            format!("{heading} - Accepted"),
            format!(
                "{} accepted at {offer} - {}",
                load_label(data.load_id.as_deref()),
                data.reason
            ),
            Some(Badge::new("Accepted", Severity::Positive)),
        ),
        Some(NegotiationAction::Counter) => (
            format!("{heading} - Counter Offer"),
            format!(
                "Carrier offered {offer}, countered with {} - {}",
                format_currency(data.counter_offer.unwrap_or(0.0)),
                data.reason
            ),
            Some(Badge::new("Counter", Severity::Neutral)),
        ),
        Some(NegotiationAction::Transfer) => (
            format!("{heading} - Transfer"),
            format!("Transferring to sales representative - {}", data.reason),
            Some(Badge::new("Transfer", Severity::Positive)),
        ),
        None => (heading, data.reason.clone(), None),
    }
}

fn call_ended(data: &CallEnded) -> Parts {
    let mut description = non_empty(data.carrier.as_deref())
        .unwrap_or("Call")
        .to_string();
    let outcome = non_empty(data.outcome.as_deref());
    if let Some(outcome) = outcome {
        description.push_str(" - ");
        description.push_str(outcome);
    }
    if let Some(price) = data.final_price.filter(|p| *p != 0.0 && p.is_finite()) {
        description.push_str(" at ");
        description.push_str(&format_currency(price));
    }
    (
        "Call Ended".to_string(),
        description,
        outcome.map(|o| Badge::new(o, Severity::Positive)),
    )
}

fn fallback(event_type: &EventType) -> Parts {
    let title = match event_type {
        EventType::McVerified => "Carrier Verified",
        EventType::McVerificationFailed => "Verification Failed",
        EventType::LoadSearched => "Loads Found",
        EventType::LoadSearchNoResults => "No Loads Found",
        EventType::LoadAccepted => "Load Accepted",
        EventType::NegotiationRound => "Negotiation Round",
        EventType::CallEnded => "Call Ended",
        EventType::Other(raw) if !raw.trim().is_empty() => {
            return (raw.clone(), "Unknown event type".to_string(), None);
        },
        EventType::Other(_) => {
            return ("Unknown Event".to_string(), "Unknown event type".to_string(), None);
        },
    };
    (title.to_string(), "Event details unavailable".to_string(), None)
}

fn load_label(load_id: Option<&str>) -> String {
    match non_empty(load_id) {
        Some(id) => format!("Load {id}"),
        None => "Load".to_string(),
    }
}

/// `from <origin> to <destination> (<equipment>)`, skipping absent parts.
fn search_terms(params: &SearchParams) -> String {
    let origin = non_empty(params.origin.as_deref()).map(|o| format!("from {o}"));
    let destination = non_empty(params.destination.as_deref()).map(|d| format!("to {d}"));
    let equipment = non_empty(params.equipment_type.as_deref()).map(|e| format!("({e})"));
    [origin, destination, equipment]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}

fn plural(n: u64, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// Whole-dollar USD with thousands separators: `1234.9` → `$1,235`.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "$0".to_string();
    }
    let rounded = amount.round();
    let whole = rounded.abs() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 && whole != 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// `Mar 01, 2025 12:00:00` in UTC.
pub fn format_timestamp(ts: Timestamp) -> String {
    ts.format("%b %d, %Y %H:%M:%S").to_string()
}

const MINUTES_IN_DAY: i64 = 1440;
const MINUTES_IN_ALMOST_TWO_DAYS: i64 = 2520;
const MINUTES_IN_MONTH: i64 = 43_200;
const MINUTES_IN_TWO_MONTHS: i64 = 86_400;

/// Human distance between `ts` and `now`: `5 minutes ago`, `in about 2 hours`.
///
/// Depends on `now`, so callers recompute it on every render.
pub fn format_relative_time(ts: Timestamp, now: Timestamp) -> String {
    let delta = now.signed_duration_since(ts);
    let future = delta.num_milliseconds() < 0;
    let seconds = delta.num_seconds().abs();
    let minutes = (seconds as f64 / 60.0).round() as i64;
    let distance = distance_in_words(minutes);
    if future {
        format!("in {distance}")
    } else {
        format!("{distance} ago")
    }
}

fn distance_in_words(minutes: i64) -> String {
    if minutes < 2 {
        return if minutes == 0 {
            "less than a minute".to_string()
        } else {
            "1 minute".to_string()
        };
    }
    if minutes < 45 {
        return format!("{minutes} minutes");
    }
    if minutes < 90 {
        return "about 1 hour".to_string();
    }
    if minutes < MINUTES_IN_DAY {
        let hours = div_round(minutes, 60);
        return format!("about {hours} hours");
    }
    if minutes < MINUTES_IN_ALMOST_TWO_DAYS {
        return "1 day".to_string();
    }
    if minutes < MINUTES_IN_MONTH {
        let days = div_round(minutes, MINUTES_IN_DAY);
        return format!("{days} days");
    }
    if minutes < MINUTES_IN_TWO_MONTHS {
        let months = div_round(minutes, MINUTES_IN_MONTH);
        return format!("about {months} {}", plural(months as u64, "month"));
    }
    let months = minutes / MINUTES_IN_MONTH;
    if months < 12 {
        let nearest = div_round(minutes, MINUTES_IN_MONTH);
        return format!("{nearest} months");
    }
    let years = months / 12;
    match months % 12 {
        0..=2 => format!("about {years} {}", plural(years as u64, "year")),
        3..=8 => format!("over {years} {}", plural(years as u64, "year")),
        _ => format!("almost {} years", years + 1),
    }
}

fn div_round(value: i64, divisor: i64) -> i64 {
    (value as f64 / divisor as f64).round() as i64
}
