pub mod config;
pub mod logging;

pub mod connectivity;
pub mod dispatch;
pub mod error;
pub mod retry;
pub mod store;
pub mod transport;
