//! # Redis
//!
//! RAM database.
//!
//! Core purpose is to append feedback and hand back the newest record for duplicate checks.
//!
//! ## Requirements
//!
//! - Append only, no updates or deletes
//! - Ids assigned by the store
//! - O(1) lookup of the latest record
//!
//! ## Implementation
//!
//! - `{prefix}:next_id`: counter, `INCR` allocates the id
//! - `{prefix}:records`: list of json records, newest at the head
//! - `LPUSH` writes the whole record in one command, so a half written record is never visible
//! - `LINDEX 0` is the latest record
//!
//! ## Notes
//!
//! The duplicate check reads the head and then writes, without a transaction. Two identical
//! submissions racing each other can both be stored. That is accepted, the check only guards
//! against double clicks and client retries.
use std::time::Duration;

use async_trait::async_trait;
use records::{FeedbackId, FeedbackRecord, NewFeedback};
use redis::{
    AsyncCommands, Client, RedisError,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("Corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Stores the feedback atomically and returns the assigned id.
    async fn append(&self, feedback: &NewFeedback) -> Result<FeedbackId, StoreError>;

    /// Newest record, `None` while the store is empty.
    async fn latest(&self) -> Result<Option<FeedbackRecord>, StoreError>;
}

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, RedisError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(500));

    let client = Client::open(redis_url)?;

    client.get_connection_manager_with_config(config).await
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    next_id_key: String,
    records_key: String,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager, prefix: &str) -> Self {
        Self {
            connection,
            next_id_key: format!("{prefix}:next_id"),
            records_key: format!("{prefix}:records"),
        }
    }
}

#[async_trait]
impl FeedbackStore for RedisStore {
    async fn append(&self, feedback: &NewFeedback) -> Result<FeedbackId, StoreError> {
        let mut connection = self.connection.clone();

        let id: u64 = connection.incr(&self.next_id_key, 1).await?;
        let record = feedback.clone().into_record(FeedbackId(id));
        let payload = serde_json::to_string(&record)?;

        let _: usize = connection.lpush(&self.records_key, payload).await?;

        debug!("Inserted feedback with id {id}");
        Ok(record.id)
    }

    async fn latest(&self) -> Result<Option<FeedbackRecord>, StoreError> {
        let mut connection = self.connection.clone();

        let payload: Option<String> = connection.lindex(&self.records_key, 0).await?;

        payload
            .map(|payload| serde_json::from_str(&payload))
            .transpose()
            .map_err(StoreError::from)
    }
}

/// Process local store for development and tests.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<FeedbackRecord>>,
}

impl MemoryStore {
    /// Oldest first.
    pub async fn all(&self) -> Vec<FeedbackRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn append(&self, feedback: &NewFeedback) -> Result<FeedbackId, StoreError> {
        let mut records = self.records.write().await;

        let id = FeedbackId(records.len() as u64 + 1);
        records.push(feedback.clone().into_record(id));

        debug!("Inserted feedback with id {id}");
        Ok(id)
    }

    async fn latest(&self) -> Result<Option<FeedbackRecord>, StoreError> {
        Ok(self.records.read().await.last().cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn feedback(text: &str) -> NewFeedback {
        NewFeedback {
            raw_feedback: format!(r#"{{"additionalInformation":"{text}"}}"#),
            extracted_info: text.to_string(),
            user: "u1".to_string(),
            context: "app".to_string(),
            feedback_name: "bugreport".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_assigns_ids_and_latest() {
        let store = MemoryStore::default();
        assert_eq!(store.latest().await.unwrap(), None);

        let first = store.append(&feedback("first one")).await.unwrap();
        let second = store.append(&feedback("second one")).await.unwrap();

        assert_eq!(first, FeedbackId(1));
        assert_eq!(second, FeedbackId(2));

        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest.id, second);
        assert_eq!(latest.feedback, feedback_with_time("second one", &latest));
        assert_eq!(store.all().await.len(), 2);
    }

    fn feedback_with_time(text: &str, record: &FeedbackRecord) -> NewFeedback {
        NewFeedback {
            created_at: record.feedback.created_at,
            ..feedback(text)
        }
    }
}
