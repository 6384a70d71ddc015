use std::{sync::Arc, time::Duration};

use records::Metrics;
use tokio::{
    sync::{
        Mutex,
        mpsc::{self, Receiver, Sender, error::TrySendError},
        watch,
    },
    task::JoinHandle,
    time::timeout,
};
use tracing::{debug, error, info, warn};

use crate::{channel::Notifier, error::NotifyError};

#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub message: String,
    pub channel: String,
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub capacity: usize,
    pub send_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            send_timeout: Duration::from_secs(10),
        }
    }
}

/// Bounded queue in front of a single delivery worker.
pub struct Dispatcher {
    sender: Sender<NotificationJob>,
    shutdown: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    metrics: Arc<dyn Metrics>,
}

impl Dispatcher {
    pub fn start(
        notifier: Arc<dyn Notifier>,
        metrics: Arc<dyn Metrics>,
        config: DispatcherConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.capacity.max(1));
        let (shutdown, shutdown_rx) = watch::channel(false);

        let worker = tokio::spawn(run_worker(
            receiver,
            shutdown_rx,
            notifier,
            metrics.clone(),
            config.send_timeout,
        ));

        Self {
            sender,
            shutdown,
            worker: Mutex::new(Some(worker)),
            metrics,
        }
    }

    /// Never waits. A full or closed queue drops the job.
    pub fn enqueue(&self, job: NotificationJob) -> bool {
        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                warn!("Notification queue full, dropping message for {}", job.channel);
                self.metrics.error("notification_queue");
                false
            }
            Err(TrySendError::Closed(job)) => {
                warn!("Notification queue closed, dropping message for {}", job.channel);
                self.metrics.error("notification_queue");
                false
            }
        }
    }

    /// Stops intake and delivers what is already queued, giving up after `deadline`.
    pub async fn shutdown(&self, deadline: Duration) {
        let Some(mut worker) = self.worker.lock().await.take() else {
            return;
        };

        let _ = self.shutdown.send(true);

        match timeout(deadline, &mut worker).await {
            Ok(Ok(())) => info!("Notification queue drained"),
            Ok(Err(e)) => error!("Notification worker failed: {e}"),
            Err(_) => {
                warn!("Notification drain exceeded {deadline:?}, dropping remaining messages");
                worker.abort();
            }
        }
    }
}

async fn run_worker(
    mut receiver: Receiver<NotificationJob>,
    mut shutdown: watch::Receiver<bool>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<dyn Metrics>,
    send_timeout: Duration,
) {
    loop {
        tokio::select! {
            job = receiver.recv() => match job {
                Some(job) => deliver(notifier.as_ref(), metrics.as_ref(), send_timeout, job).await,
                None => break,
            },
            _ = shutdown.changed() => {
                receiver.close();

                while let Some(job) = receiver.recv().await {
                    deliver(notifier.as_ref(), metrics.as_ref(), send_timeout, job).await;
                }

                break;
            }
        }
    }

    debug!("Notification worker stopped");
}

async fn deliver(
    notifier: &dyn Notifier,
    metrics: &dyn Metrics,
    send_timeout: Duration,
    job: NotificationJob,
) {
    let result = match timeout(send_timeout, notifier.send(&job.message, &job.channel)).await {
        Ok(result) => result,
        Err(_) => Err(NotifyError::Timeout(send_timeout)),
    };

    match result {
        Ok(()) => info!("Sent notification to {}", job.channel),
        Err(e) if e.is_benign() => debug!("Nothing to send to {}: {e}", job.channel),
        Err(e) => {
            error!("Sending notification to {} failed: {e}", job.channel);
            metrics.error("notification_delivery");
        }
    }
}
