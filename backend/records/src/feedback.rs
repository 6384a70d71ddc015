use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::document::Document;

pub const ADDITIONAL_INFORMATION: &str = "additionalInformation";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("additionalInformation is empty, that is classified as an error")]
    MissingAdditionalInformation,
}

/// Body of a feedback POST.
///
/// Missing or `null` fields read as empty strings. Older clients send the
/// name as `fedbackName`, it is used when `feedbackName` is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", from = "RequestBody")]
pub struct FeedbackRequest {
    pub feedback: String,
    pub user: String,
    pub context: String,
    pub feedback_name: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RequestBody {
    feedback: Option<String>,
    user: Option<String>,
    context: Option<String>,
    feedback_name: Option<String>,
    #[serde(rename = "fedbackName")]
    legacy_feedback_name: Option<String>,
}

impl From<RequestBody> for FeedbackRequest {
    fn from(body: RequestBody) -> Self {
        Self {
            feedback: body.feedback.unwrap_or_default(),
            user: body.user.unwrap_or_default(),
            context: body.context.unwrap_or_default(),
            feedback_name: body
                .feedback_name
                .or(body.legacy_feedback_name)
                .unwrap_or_default(),
        }
    }
}

pub fn get_request_from_bytes(bytes: &[u8]) -> Result<FeedbackRequest, serde_json::Error> {
    serde_json::from_slice(bytes)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct FeedbackId(pub u64);

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated feedback that has not been stored yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub raw_feedback: String,
    pub extracted_info: String,
    pub user: String,
    pub context: String,
    pub feedback_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRecord {
    pub id: FeedbackId,
    #[serde(flatten)]
    pub feedback: NewFeedback,
}

impl NewFeedback {
    pub fn extract(request: FeedbackRequest, created_at: DateTime<Utc>) -> Result<Self, ExtractError> {
        let document = Document::parse(&request.feedback)?;
        let extracted_info = additional_information(&document);

        if extracted_info.trim().is_empty() {
            return Err(ExtractError::MissingAdditionalInformation);
        }

        Ok(Self {
            raw_feedback: request.feedback,
            extracted_info,
            user: request.user,
            context: request.context,
            feedback_name: request.feedback_name,
            created_at,
        })
    }

    /// Same raw feedback and same extracted text, byte for byte.
    pub fn is_duplicate_of(&self, latest: &FeedbackRecord) -> bool {
        self.raw_feedback == latest.feedback.raw_feedback
            && self.extracted_info == latest.feedback.extracted_info
    }

    pub fn into_record(self, id: FeedbackId) -> FeedbackRecord {
        FeedbackRecord { id, feedback: self }
    }
}

fn additional_information(document: &Document) -> String {
    if !document.contains(ADDITIONAL_INFORMATION) {
        warn!("Could not find {ADDITIONAL_INFORMATION} in feedback data");
        return String::new();
    }

    match document.get_str(ADDITIONAL_INFORMATION) {
        Some(text) => text.to_string(),
        None => {
            warn!("{ADDITIONAL_INFORMATION} is not a string, can't use it");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn request(feedback: &str) -> FeedbackRequest {
        FeedbackRequest {
            feedback: feedback.to_string(),
            user: "u1".to_string(),
            context: "app".to_string(),
            feedback_name: "bugreport".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_extracts_additional_information() {
        let raw = r#"{"additionalInformation":"Button broke completely","otherIssue":true}"#;
        let feedback = NewFeedback::extract(request(raw), now()).unwrap();

        assert_eq!(feedback.raw_feedback, raw);
        assert_eq!(feedback.extracted_info, "Button broke completely");
        assert_eq!(feedback.user, "u1");
        assert_eq!(feedback.context, "app");
        assert_eq!(feedback.feedback_name, "bugreport");
        assert_eq!(feedback.created_at, now());
    }

    #[test]
    fn test_keeps_untrimmed_text() {
        let raw = r#"{"additionalInformation":"  spaced out  "}"#;
        let feedback = NewFeedback::extract(request(raw), now()).unwrap();

        assert_eq!(feedback.extracted_info, "  spaced out  ");
    }

    #[rstest]
    #[case(r#"{}"#)]
    #[case(r#"{"additionalInformation":null}"#)]
    #[case(r#"{"additionalInformation":42}"#)]
    #[case(r#"{"additionalInformation":{"nested":"text"}}"#)]
    #[case(r#"{"additionalInformation":""}"#)]
    #[case(r#"{"additionalInformation":"   \n\t "}"#)]
    #[case("null")]
    #[case(r#"["additionalInformation"]"#)]
    fn test_missing_additional_information(#[case] raw: &str) {
        let err = NewFeedback::extract(request(raw), now()).unwrap_err();

        assert!(matches!(err, ExtractError::MissingAdditionalInformation));
    }

    #[rstest]
    #[case("")]
    #[case("{additionalInformation: 'x'}")]
    #[case(r#"{"additionalInformation":"unterminated}"#)]
    fn test_malformed_feedback(#[case] raw: &str) {
        let err = NewFeedback::extract(request(raw), now()).unwrap_err();

        assert!(matches!(err, ExtractError::MalformedPayload(_)));
    }

    #[test]
    fn test_request_from_bytes() {
        let body = json!({
            "feedback": "{}",
            "user": "u1",
            "context": "app",
            "fedbackName": "legacy"
        })
        .to_string();
        let parsed = get_request_from_bytes(body.as_bytes()).unwrap();

        assert_eq!(parsed.feedback_name, "legacy");

        let partial = get_request_from_bytes(br#"{"feedback":"{}"}"#).unwrap();
        assert_eq!(partial.user, "");
        assert_eq!(partial.feedback_name, "");

        let both = get_request_from_bytes(
            br#"{"feedback":"{}","feedbackName":"current","fedbackName":"legacy"}"#,
        )
        .unwrap();
        assert_eq!(both.feedback_name, "current");

        let nulls = get_request_from_bytes(
            br#"{"feedback":"{}","user":null,"context":null,"feedbackName":null,"fedbackName":"legacy"}"#,
        )
        .unwrap();
        assert_eq!(nulls.user, "");
        assert_eq!(nulls.context, "");
        assert_eq!(nulls.feedback_name, "legacy");

        assert!(get_request_from_bytes(b"not json").is_err());
        assert!(get_request_from_bytes(br#"{"feedback":{"a":1}}"#).is_err());
    }

    #[test]
    fn test_duplicate_compares_raw_and_extracted() {
        let raw = r#"{"additionalInformation":"same thing twice"}"#;
        let first = NewFeedback::extract(request(raw), now()).unwrap();
        let stored = first.clone().into_record(FeedbackId(1));

        let mut second = first.clone();
        second.user = "someone else".to_string();
        second.created_at = now() + chrono::Duration::seconds(1);
        assert!(second.is_duplicate_of(&stored));

        let other = NewFeedback::extract(
            request(r#"{"additionalInformation":"same thing twice","href":"/x"}"#),
            now(),
        )
        .unwrap();
        assert!(!other.is_duplicate_of(&stored));
    }

    #[test]
    fn test_record_serialization_flattens() {
        let raw = r#"{"additionalInformation":"Button broke completely"}"#;
        let record = NewFeedback::extract(request(raw), now())
            .unwrap()
            .into_record(FeedbackId(7));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], json!(7));
        assert_eq!(value["rawFeedback"], json!(raw));
        assert_eq!(value["extractedInfo"], json!("Button broke completely"));
        assert_eq!(value["feedbackName"], json!("bugreport"));

        let back: FeedbackRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
