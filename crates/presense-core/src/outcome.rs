//! Verification outcomes and recognition-service reply interpretation.
//!
//! The interpretation functions are pure (status code + body bytes in,
//! outcome out) so both upload paths share them and tests can cover the
//! wire cases without a server.

use serde::Deserialize;

/// Result of one upload, folded into the status model and superseded by
/// the next outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationOutcome {
    pub success: bool,
    pub subject_id: Option<String>,
    /// Recognition confidence in [0, 1], when the service supplies one.
    pub confidence: Option<f32>,
    pub is_new_record: Option<bool>,
    pub message: String,
}

impl VerificationOutcome {
    /// A failure outcome carrying an error's description. Used for
    /// transport, encoding, and parse failures alike.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            subject_id: None,
            confidence: None,
            is_new_record: None,
            message: message.into(),
        }
    }
}

/// Reply body of the match (single-shot) endpoint.
#[derive(Debug, Deserialize)]
struct MatchReply {
    user_id: Option<String>,
    detail: Option<String>,
}

/// Reply body of the stream (live tick) endpoint.
#[derive(Debug, Deserialize)]
struct StreamReply {
    user_id: Option<String>,
    created: Option<bool>,
    score: Option<f32>,
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Interpret a match-endpoint response.
///
/// 2xx with a recognized subject is a success; anything else is a
/// no-match carrying the server-provided detail or a generic message.
/// A body that fails to parse yields a failure with the parse error's
/// description.
pub fn interpret_match(status: u16, body: &[u8]) -> VerificationOutcome {
    let reply: MatchReply = match serde_json::from_slice(body) {
        Ok(reply) => reply,
        Err(e) => return VerificationOutcome::failure(e.to_string()),
    };

    if !is_success(status) {
        return VerificationOutcome::failure(
            reply.detail.unwrap_or_else(|| "No match".to_string()),
        );
    }

    match reply.user_id {
        Some(user_id) => VerificationOutcome {
            success: true,
            message: format!("Attendance marked! Welcome, {user_id}"),
            subject_id: Some(user_id),
            confidence: None,
            is_new_record: None,
        },
        None => VerificationOutcome::failure("No match"),
    }
}

/// Interpret a stream-endpoint response.
///
/// Only a 2xx carrying a subject id counts as a positive match; the
/// message distinguishes new attendance from an already-present record.
/// Any other well-formed reply is a no-match, annotated with a
/// confidence percentage when the service supplies a score.
pub fn interpret_stream(status: u16, body: &[u8]) -> VerificationOutcome {
    let reply: StreamReply = match serde_json::from_slice(body) {
        Ok(reply) => reply,
        Err(e) => return VerificationOutcome::failure(e.to_string()),
    };

    if is_success(status) {
        if let Some(user_id) = reply.user_id {
            let created = reply.created.unwrap_or(false);
            let note = if created {
                "(New attendance)"
            } else {
                "(Already present)"
            };
            return VerificationOutcome {
                success: true,
                message: format!("Welcome, {user_id}! {note}"),
                subject_id: Some(user_id),
                confidence: None,
                is_new_record: Some(created),
            };
        }
    }

    let annotation = match reply.score {
        Some(score) => format!(" (Confidence: {:.1}%)", score * 100.0),
        None => String::new(),
    };
    VerificationOutcome {
        success: false,
        subject_id: None,
        confidence: reply.score,
        is_new_record: None,
        message: format!("No face match found{annotation}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_recognized_subject() {
        let outcome = interpret_match(200, br#"{"user_id":"alice"}"#);
        assert!(outcome.success);
        assert!(outcome.message.contains("alice"));
        assert_eq!(outcome.subject_id.as_deref(), Some("alice"));
    }

    #[test]
    fn test_match_404_with_detail() {
        let outcome = interpret_match(404, br#"{"detail":"no face"}"#);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "no face");
    }

    #[test]
    fn test_match_failure_without_detail_is_generic() {
        let outcome = interpret_match(500, b"{}");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "No match");
    }

    #[test]
    fn test_match_2xx_without_subject_is_no_match() {
        let outcome = interpret_match(200, b"{}");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "No match");
    }

    #[test]
    fn test_match_malformed_body_is_failure() {
        let outcome = interpret_match(200, b"<html>oops</html>");
        assert!(!outcome.success);
        assert!(!outcome.message.is_empty());
    }

    #[test]
    fn test_stream_new_attendance() {
        let outcome = interpret_stream(200, br#"{"user_id":"bob","created":true}"#);
        assert!(outcome.success);
        assert_eq!(outcome.message, "Welcome, bob! (New attendance)");
        assert_eq!(outcome.is_new_record, Some(true));
    }

    #[test]
    fn test_stream_already_present() {
        let outcome = interpret_stream(200, br#"{"user_id":"bob","created":false}"#);
        assert!(outcome.success);
        assert_eq!(outcome.message, "Welcome, bob! (Already present)");
        assert_eq!(outcome.is_new_record, Some(false));
    }

    #[test]
    fn test_stream_missing_created_reads_as_already_present() {
        let outcome = interpret_stream(200, br#"{"user_id":"bob"}"#);
        assert!(outcome.success);
        assert_eq!(outcome.is_new_record, Some(false));
    }

    #[test]
    fn test_stream_score_annotates_confidence() {
        let outcome = interpret_stream(200, br#"{"score":0.42}"#);
        assert!(!outcome.success);
        assert!(outcome.message.contains("42.0%"), "message: {}", outcome.message);
        assert_eq!(outcome.confidence, Some(0.42));
    }

    #[test]
    fn test_stream_no_score_no_annotation() {
        let outcome = interpret_stream(200, b"{}");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "No face match found");
    }

    #[test]
    fn test_stream_subject_on_error_status_is_no_match() {
        // Only a 2xx can carry a positive match.
        let outcome = interpret_stream(500, br#"{"user_id":"bob"}"#);
        assert!(!outcome.success);
    }

    #[test]
    fn test_stream_malformed_body_is_failure() {
        let outcome = interpret_stream(200, b"not json");
        assert!(!outcome.success);
        assert!(!outcome.message.is_empty());
    }
}
