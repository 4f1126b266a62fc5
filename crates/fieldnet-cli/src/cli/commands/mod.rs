//! CLI command handlers. Each command is in its own file.

mod get;
mod pending;
mod purge;
mod status;
mod sync;
mod watch;
mod write;

pub use get::run_get;
pub use pending::run_pending;
pub use purge::run_purge;
pub use status::run_status;
pub use sync::run_sync;
pub use watch::run_watch;
pub use write::{run_write, WriteArgs};
