//! Error taxonomy and classification.
//!
//! Every failure the request layer sees (transport error, HTTP status, attempt
//! deadline, missing connectivity) is turned into a single [`ErrorRecord`]
//! whose [`ErrorKind`] drives both retry decisions and user-facing messaging.

mod classify;
mod kind;
mod record;

pub use classify::{
    classify, classify_http_status, classify_transport_error, Classify, Failure, Origin,
};
pub use kind::ErrorKind;
pub use record::ErrorRecord;
