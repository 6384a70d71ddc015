use chrono::Utc;
use feedback::database::{FeedbackStore, RedisStore, init_redis};
use pretty_assertions::assert_eq;
use records::NewFeedback;

fn feedback(text: &str) -> NewFeedback {
    NewFeedback {
        raw_feedback: serde_json::json!({ "additionalInformation": text }).to_string(),
        extracted_info: text.to_string(),
        user: "u1".to_string(),
        context: "app".to_string(),
        feedback_name: "bugreport".to_string(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn redis_store_appends_and_reads_latest() {
    let Ok(url) = std::env::var("REDIS_URL") else {
        eprintln!("REDIS_URL not set, skipping");
        return;
    };

    let connection = init_redis(&url).await.expect("connect redis");
    let prefix = format!("feedback-test-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let store = RedisStore::new(connection, &prefix);

    assert_eq!(store.latest().await.expect("latest"), None);

    let first = store.append(&feedback("first redis record")).await.expect("append");
    let second = store.append(&feedback("second redis record")).await.expect("append");
    assert!(second > first);

    let latest = store.latest().await.expect("latest").expect("a record");
    assert_eq!(latest.id, second);
    assert_eq!(latest.feedback.extracted_info, "second redis record");
}
