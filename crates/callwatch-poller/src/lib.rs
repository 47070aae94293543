pub mod activity;
pub mod client;
pub mod config;
pub mod sessions;

pub use activity::{ActivityFeedState, ActivityPoller, ActivityPollerHandle};
pub use client::{ActivityQuery, DashboardClient, FetchError};
pub use config::PollerConfig;
pub use sessions::{NewLiveSession, SessionFeedState, SessionPoller, SessionPollerHandle};
