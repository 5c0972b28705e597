//! Tracker plugins and the manager that drives them.
//!
//! A tracker plugin knows one external indexing site: which URLs it claims,
//! how to derive topic metadata from a URL, and how to check a topic for
//! new content. The [`TrackersManager`] owns the topic store and mediates
//! all access to the plugins.

mod direct;
mod login;
mod manager;
mod traits;
mod types;

pub use direct::{DirectTracker, DIRECT_TRACKER_NAME};
pub use login::{LoginTracker, LOGIN_TRACKER_NAME};
pub use manager::TrackersManager;
pub use traits::{TrackerCredentials, TrackerPlugin};
pub use types::{
    CheckResult, DownloadItem, FieldKind, FormField, FormSchema, OutcomeKind, ParsedTopic,
    TopicOutcome, TopicPreview, TrackerError, TrackerInfo,
};
