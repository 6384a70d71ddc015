use records::{Document, FeedbackRecord, feedback::ADDITIONAL_INFORMATION};

pub const MIN_TEXT_CHARS: usize = 5;
pub const MIN_UNREQUESTED_CHARS: usize = 10;

pub const LOAD_NEW_INFORMATION: &str = "loadNewInformation";
pub const OTHER_ISSUE: &str = "otherIssue";
pub const SOMETHING_BROKE: &str = "somethingBroke";
pub const ERROR_LOG: &str = "errorLog";
pub const HREF: &str = "href";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Send(String),
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TooShort,
    NotRequested,
}

/// Decides whether a stored record is worth a notification and renders it.
pub fn prepare(record: &FeedbackRecord) -> Result<Verdict, serde_json::Error> {
    let trimmed = record.feedback.extracted_info.trim();
    if !trimmed.is_empty() && trimmed.chars().count() < MIN_TEXT_CHARS {
        return Ok(Verdict::Skip(SkipReason::TooShort));
    }

    let document = Document::parse(&record.feedback.raw_feedback)?;

    let load_new = document.get_bool(LOAD_NEW_INFORMATION);
    let additional = document.text(ADDITIONAL_INFORMATION);

    if !load_new && additional.chars().count() < MIN_UNREQUESTED_CHARS {
        return Ok(Verdict::Skip(SkipReason::NotRequested));
    }

    Ok(Verdict::Send(format_message(&document, load_new, &additional)?))
}

fn format_message(
    document: &Document,
    load_new: bool,
    additional: &str,
) -> Result<String, serde_json::Error> {
    let mut message = String::from("New feedback received\n\n");

    message.push_str(&format!("• {LOAD_NEW_INFORMATION}: {load_new}\n"));
    message.push_str(&format!(
        "• {OTHER_ISSUE}: {}\n",
        document.get_bool(OTHER_ISSUE)
    ));
    message.push_str(&format!(
        "• {SOMETHING_BROKE}: {}\n\n",
        document.get_bool(SOMETHING_BROKE)
    ));

    message.push_str("additionalInformation:\n");
    if additional.is_empty() {
        message.push_str("_(empty)_\n\n");
    } else {
        message.push_str(additional);
        message.push_str("\n\n");
    }

    if let Some(error_log) = document.get(ERROR_LOG) {
        message.push_str("errorLog:\n");
        message.push_str(&serde_json::to_string_pretty(error_log)?);
        message.push_str("\n\n");
    }

    if let Some(href) = document.get_str(HREF).filter(|href| !href.is_empty()) {
        message.push_str(&format!("href: {href}\n"));
    }

    Ok(message)
}
