use std::fs;

use anyhow::{Context, Error, bail};
use clap::Parser;
use records::{FeedbackRequest, get_request_from_bytes};
use serde_json::{Map, Value, json};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Text sent as additionalInformation
    additional_information: Option<String>,

    /// Replay a captured request body instead of building one
    #[arg(long, conflicts_with = "additional_information")]
    file: Option<String>,

    #[arg(long, default_value = "http://localhost:3000")]
    server: String,

    #[arg(long, default_value = "/api")]
    path: String,

    #[arg(long, default_value = "tester")]
    user: String,

    #[arg(long, default_value = "cli")]
    context: String,

    #[arg(long, default_value = "bugreport")]
    name: String,

    #[arg(long)]
    load_new_information: bool,

    #[arg(long)]
    other_issue: bool,

    #[arg(long)]
    something_broke: bool,

    #[arg(long)]
    href: Option<String>,
}

fn build_request(args: &Args) -> Result<FeedbackRequest, Error> {
    if let Some(path) = &args.file {
        let data = fs::read(path).with_context(|| format!("could not read {path}"))?;

        return get_request_from_bytes(&data).context("file is not a feedback request");
    }

    let Some(text) = &args.additional_information else {
        bail!("pass additionalInformation text or --file");
    };

    let mut feedback = Map::new();
    feedback.insert("additionalInformation".to_string(), json!(text));
    feedback.insert("loadNewInformation".to_string(), json!(args.load_new_information));
    feedback.insert("otherIssue".to_string(), json!(args.other_issue));
    feedback.insert("somethingBroke".to_string(), json!(args.something_broke));
    if let Some(href) = &args.href {
        feedback.insert("href".to_string(), json!(href));
    }

    Ok(FeedbackRequest {
        feedback: Value::Object(feedback).to_string(),
        user: args.user.clone(),
        context: args.context.clone(),
        feedback_name: args.name.clone(),
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();
    let request = build_request(&args)?;

    println!("Sending: {}", request.feedback);

    let url = format!("{}{}", args.server.trim_end_matches('/'), args.path);
    let response = reqwest::Client::new()
        .post(&url)
        .json(&request)
        .send()
        .await
        .with_context(|| format!("could not reach {url}"))?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    println!("Status: {status}");
    if !body.is_empty() {
        println!("{body}");
    }

    if !status.is_success() {
        bail!("server rejected the feedback");
    }

    Ok(())
}
