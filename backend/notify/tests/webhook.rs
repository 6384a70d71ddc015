use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use notify::{
    Dispatcher, DispatcherConfig, NotificationJob, Notifier, NotifyError, WebhookNotifier,
};
use pretty_assertions::assert_eq;
use records::CounterMetrics;
use serde_json::Value;

#[derive(Clone)]
struct Hook {
    status: StatusCode,
    received: Arc<Mutex<Vec<Value>>>,
}

async fn hook_handler(State(hook): State<Hook>, Json(body): Json<Value>) -> StatusCode {
    hook.received.lock().expect("lock hook").push(body);
    hook.status
}

async fn spawn_hook(status: StatusCode) -> (SocketAddr, Arc<Mutex<Vec<Value>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let hook = Hook {
        status,
        received: received.clone(),
    };
    let app = Router::new()
        .route("/hook", post(hook_handler))
        .with_state(hook);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve hook") });

    (addr, received)
}

#[tokio::test]
async fn webhook_posts_content() {
    let (addr, received) = spawn_hook(StatusCode::NO_CONTENT).await;
    let notifier = WebhookNotifier::new(reqwest::Client::new(), format!("http://{addr}/hook"))
        .expect("webhook notifier");

    notifier
        .send("New feedback received", "feedback")
        .await
        .expect("send");

    let bodies = received.lock().expect("lock hook").clone();
    assert_eq!(bodies, vec![serde_json::json!({ "content": "New feedback received" })]);
}

#[tokio::test]
async fn webhook_non_success_is_rejected() {
    let (addr, _) = spawn_hook(StatusCode::TOO_MANY_REQUESTS).await;
    let notifier = WebhookNotifier::new(reqwest::Client::new(), format!("http://{addr}/hook"))
        .expect("webhook notifier");

    let err = notifier
        .send("New feedback received", "feedback")
        .await
        .expect_err("rate limited");

    assert!(matches!(err, NotifyError::Rejected(status) if status == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn webhook_unreachable_is_delivery_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let notifier = WebhookNotifier::new(reqwest::Client::new(), format!("http://{addr}/hook"))
        .expect("webhook notifier");

    let err = notifier
        .send("New feedback received", "feedback")
        .await
        .expect_err("nobody listening");

    assert!(matches!(err, NotifyError::Delivery(_)));
}

#[tokio::test]
async fn dispatcher_counts_rejected_webhook() {
    let (addr, received) = spawn_hook(StatusCode::INTERNAL_SERVER_ERROR).await;
    let notifier = WebhookNotifier::new(reqwest::Client::new(), format!("http://{addr}/hook"))
        .expect("webhook notifier");
    let metrics = Arc::new(CounterMetrics::default());

    let dispatcher = Dispatcher::start(
        Arc::new(notifier),
        metrics.clone(),
        DispatcherConfig::default(),
    );
    assert!(dispatcher.enqueue(NotificationJob {
        message: "Button broke completely".to_string(),
        channel: "feedback".to_string(),
    }));
    dispatcher.shutdown(Duration::from_secs(5)).await;

    assert_eq!(received.lock().expect("lock hook").len(), 1);
    assert_eq!(metrics.snapshot().notification_errors, 1);
}
