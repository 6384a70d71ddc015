//! # Records
//!
//! Shared vocabulary of the feedback service.
//!
//! ## Overall Data Structures
//!
//! - Request payload (**json**): `feedback` (**string** holding json), `user`, `context`, `feedbackName`.
//!   Older clients send `fedbackName`, still accepted.
//!
//! - Document (**json object**): the parsed `feedback` string. Shape is up to the client, so every read
//!   goes through a typed accessor with a default for missing or mistyped keys.
//!
//! - Feedback record: the raw `feedback` string, the extracted `additionalInformation` text, the three
//!   labels and a server-side timestamp. The store assigns the id.
//!
//! ## Notes
//! - `additionalInformation` is stored untouched. Trimming is only used to decide if it is empty.
//! - Duplicate detection only compares against the newest record, never the full history.
pub mod document;
pub mod feedback;
pub mod metrics;

pub use document::Document;
pub use feedback::{
    ExtractError, FeedbackId, FeedbackRecord, FeedbackRequest, NewFeedback, get_request_from_bytes,
};
pub use self::metrics::{CounterMetrics, Metrics, MetricsSnapshot, PrometheusMetrics};

