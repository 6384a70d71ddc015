use std::sync::Arc;

use anyhow::{Context, Error, anyhow};
use notify::{
    Dispatcher, DispatcherConfig, LogNotifier, Notifier, RedisNotifier, WebhookNotifier,
};
use records::{Metrics, PrometheusMetrics};
use redis::aio::ConnectionManager;
use reqwest::Client;
use tracing::{error, info};

use super::{
    config::{Config, NotifyBackend, StorageBackend},
    database::{FeedbackStore, MemoryStore, RedisStore, init_redis},
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn FeedbackStore>,
    pub dispatcher: Dispatcher,
    pub metrics: Arc<dyn Metrics>,
}

impl State {
    pub async fn new(config: Config) -> Result<Arc<Self>, Error> {
        let needs_redis = config.storage == StorageBackend::Redis
            || config.notify_backend == NotifyBackend::Redis;

        let redis_connection = if needs_redis {
            info!("Connecting to Redis...");
            Some(
                init_redis(&config.redis_url)
                    .await
                    .context("could not connect to redis")?,
            )
        } else {
            None
        };

        let store: Arc<dyn FeedbackStore> = match (config.storage, &redis_connection) {
            (StorageBackend::Redis, Some(connection)) => {
                Arc::new(RedisStore::new(connection.clone(), &config.feedback_key))
            }
            _ => {
                info!("Using in-memory storage, feedback is lost on restart");
                Arc::new(MemoryStore::default())
            }
        };

        let notifier = build_notifier(&config, redis_connection)?;

        Ok(Self::with_parts(
            config,
            store,
            notifier,
            Arc::new(PrometheusMetrics::new()),
        ))
    }

    /// Must be called inside a tokio runtime, it starts the notification worker.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn FeedbackStore>,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<dyn Metrics>,
    ) -> Arc<Self> {
        let dispatcher = Dispatcher::start(
            notifier,
            metrics.clone(),
            DispatcherConfig {
                capacity: config.notify_queue_capacity,
                send_timeout: config.notify_timeout,
            },
        );

        Arc::new(Self {
            config,
            store,
            dispatcher,
            metrics,
        })
    }
}

fn build_notifier(
    config: &Config,
    redis_connection: Option<ConnectionManager>,
) -> Result<Arc<dyn Notifier>, Error> {
    match (config.notify_backend, redis_connection) {
        (NotifyBackend::Webhook, _) => {
            let client = Client::builder()
                .timeout(config.notify_timeout)
                .build()
                .context("could not build http client")?;
            let url = config.webhook_url.clone().unwrap_or_default();

            match WebhookNotifier::new(client, url) {
                Ok(notifier) => Ok(Arc::new(notifier)),
                Err(e) => {
                    error!("WEBHOOK_URL is not usable, notifications are only logged: {e}");
                    Ok(Arc::new(LogNotifier))
                }
            }
        }
        (NotifyBackend::Redis, Some(connection)) => Ok(Arc::new(RedisNotifier::new(
            connection,
            config.notify_topic.clone(),
        ))),
        (NotifyBackend::Redis, None) => Err(anyhow!("redis notify backend needs a redis connection")),
        (NotifyBackend::Log, _) => {
            info!("Notifications disabled, messages are only logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}
