//! User-facing error messages and desktop toasts

use anyhow::Result;

/// Resolves a failed request to a message worth showing the user.
///
/// Status 0 means the server was unreachable. Otherwise a structured
/// JSON body may carry a `message` field; failing that, the status maps
/// to its canonical reason phrase. Returns None when the body is empty
/// and the status is unknown enough that nothing useful can be said.
pub fn request_error_message(status: u16, body: Option<&str>) -> Option<String> {
    if status == 0 {
        return Some("Server unreachable".to_string());
    }
    if let Some(text) = body {
        if !text.is_empty() {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(text) {
                if let Some(message) = json.get("message").and_then(|m| m.as_str()) {
                    return Some(message.to_string());
                }
            }
        }
    }
    reason_phrase(status).map(|p| p.to_string())
}

fn reason_phrase(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("Bad Request"),
        401 => Some("Unauthorized"),
        403 => Some("Forbidden"),
        404 => Some("Not Found"),
        409 => Some("Conflict"),
        500 => Some("Internal Server Error"),
        502 => Some("Bad Gateway"),
        503 => Some("Service Unavailable"),
        _ => None,
    }
}

/// Logs the message and, when enabled, raises a desktop notification.
/// The caller mirrors it into the status line; this is the out-of-band
/// channel.
pub fn toast_error(message: &str, notifications: bool) {
    tracing::error!("{}", message);
    if notifications {
        if let Err(e) = notify("archet", message) {
            tracing::debug!("desktop notification failed: {}", e);
        }
    }
}

fn notify(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("dialog-error")
        .show()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_zero_means_unreachable() {
        assert_eq!(
            request_error_message(0, None).as_deref(),
            Some("Server unreachable")
        );
        // body is irrelevant for status 0
        assert_eq!(
            request_error_message(0, Some(r#"{"message":"x"}"#)).as_deref(),
            Some("Server unreachable")
        );
    }

    #[test]
    fn structured_body_message_wins() {
        let body = r#"{"message":"archetype id already in use","code":17}"#;
        assert_eq!(
            request_error_message(409, Some(body)).as_deref(),
            Some("archetype id already in use")
        );
    }

    #[test]
    fn falls_back_to_the_reason_phrase() {
        assert_eq!(
            request_error_message(404, Some("not json")).as_deref(),
            Some("Not Found")
        );
        assert_eq!(
            request_error_message(500, Some(r#"{"detail":"no message field"}"#)).as_deref(),
            Some("Internal Server Error")
        );
    }

    #[test]
    fn unknown_status_without_message_yields_nothing() {
        assert_eq!(request_error_message(418, None), None);
        assert_eq!(request_error_message(418, Some("")), None);
    }
}
