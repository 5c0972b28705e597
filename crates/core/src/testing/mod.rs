//! Testing utilities and mock implementations.
//!
//! Mock plugins and a recording logger so engine and manager behavior can
//! be exercised without real trackers, clients, or sockets.

mod mock_client;
mod mock_tracker;
mod recording_logger;

pub use mock_client::MockClient;
pub use mock_tracker::MockTracker;
pub use recording_logger::{RecordedEvent, RecordingLogger};
