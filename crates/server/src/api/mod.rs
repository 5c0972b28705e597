pub mod clients;
pub mod error;
pub mod execute;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod topics;
pub mod trackers;
pub mod ws;

pub use routes::create_router;
pub use ws::{WsBroadcaster, WsLogger};
