//! Offline store (SQLite via sqlx).
//!
//! Holds the response cache, the durable queue of writes waiting for
//! connectivity, and the last-sync marker. Also exposes the connectivity
//! snapshot the dispatcher consults before touching the network.

mod cache;
mod db;
mod queue;
mod types;

pub use cache::is_fresh;
pub use db::OfflineStore;
pub use types::*;
