//! # Notifications
//!
//! Best-effort side channel that tells humans about new feedback.
//!
//! ## Filter
//!
//! **Goal**: Avoid flooding the channel with trivial submissions. Never blocks or fails ingestion.
//!
//! - If `additionalInformation` trimmed is non-empty but under 5 characters, skip
//! - If `loadNewInformation` is false (or missing) and `additionalInformation` is under 10 characters, skip
//! - Otherwise format the flags, the text, `errorLog` and `href` into one message
//!
//! ## Dispatch
//!
//! - Jobs go into a bounded queue, the request never waits for delivery
//! - One worker drains the queue, every send is bounded by a timeout
//! - Failures are logged and counted, never retried
//! - On shutdown the queue is closed and drained until a deadline
//!
//! ## Channels
//!
//! - Webhook: Discord style, `{"content": message}`
//! - Redis: publishes `{"message", "channel"}` on a topic for a bot to pick up
//! - Log: notifications disabled, message only logged
pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod filter;

pub use channel::{LogNotifier, Notifier, RedisNotifier, WebhookNotifier};
pub use dispatcher::{Dispatcher, DispatcherConfig, NotificationJob};
pub use error::NotifyError;
pub use filter::{SkipReason, Verdict, prepare};
