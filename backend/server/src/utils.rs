use axum::body::Bytes;
use chrono::{DateTime, Utc};
use notify::{NotificationJob, Verdict, prepare};
use records::{ExtractError, FeedbackRecord, NewFeedback, get_request_from_bytes};
use tracing::{error, info, warn};

use crate::{
    database::{FeedbackStore, StoreError},
    error::AppError,
    state::State,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Notify,
    Silent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ingested {
    Stored(FeedbackRecord),
    Duplicate,
}

pub fn get_feedback_from_body(body: &Bytes, now: DateTime<Utc>) -> Result<NewFeedback, AppError> {
    let request = get_request_from_bytes(body).map_err(|e| {
        error!("Could not parse request: {e}");
        AppError::MalformedPayload(e)
    })?;

    NewFeedback::extract(request, now).map_err(|e| {
        match &e {
            ExtractError::MalformedPayload(inner) => error!("Could not parse feedback: {inner}"),
            ExtractError::MissingAdditionalInformation => warn!("Feedback without additionalInformation"),
        }

        AppError::from(e)
    })
}

/// Compares against the newest stored record only.
pub async fn is_duplicate(
    store: &dyn FeedbackStore,
    candidate: &NewFeedback,
) -> Result<bool, StoreError> {
    let latest = store.latest().await?;

    Ok(latest.is_some_and(|latest| candidate.is_duplicate_of(&latest)))
}

pub async fn ingest(state: &State, body: Bytes, delivery: Delivery) -> Result<Ingested, AppError> {
    let feedback = get_feedback_from_body(&body, Utc::now())?;

    if is_duplicate(state.store.as_ref(), &feedback).await? {
        info!("Detected duplicate feedback, skipping save");
        state.metrics.feedback_duplicate();
        return Ok(Ingested::Duplicate);
    }

    let id = state.store.append(&feedback).await?;
    state.metrics.feedback_stored();

    let record = feedback.into_record(id);

    if delivery == Delivery::Notify {
        schedule_notification(state, &record);
    }

    Ok(Ingested::Stored(record))
}

/// Queues a notification if the record passes the filter. Returns whether one was queued.
pub fn schedule_notification(state: &State, record: &FeedbackRecord) -> bool {
    match prepare(record) {
        Ok(Verdict::Send(message)) => state.dispatcher.enqueue(NotificationJob {
            message,
            channel: state.config.notify_channel.clone(),
        }),
        Ok(Verdict::Skip(reason)) => {
            info!("Not sending notification for feedback {}: {reason:?}", record.id);
            false
        }
        Err(e) => {
            error!("Could not parse feedback {} for notification: {e}", record.id);
            state.metrics.error("notification_format");
            false
        }
    }
}
