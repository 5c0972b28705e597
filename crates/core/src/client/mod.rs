//! Download client plugins and their manager.
//!
//! A client plugin hands a discovered torrent to one download back-end.
//! The [`ClientsManager`] owns the registry and routes items to the named
//! or default client.

mod manager;
mod traits;
mod transmission;
mod types;
mod watch_dir;

pub use manager::ClientsManager;
pub use traits::ClientPlugin;
pub use transmission::{TransmissionClient, TRANSMISSION_CLIENT_NAME};
pub use types::{ClientError, ClientInfo};
pub use watch_dir::{WatchDirClient, WATCH_DIR_CLIENT_NAME};
