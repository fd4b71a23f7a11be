//! Error types for the wire boundary.
//!
//! Live dispatch never surfaces these: the view engine unwraps every
//! [`PayloadError`] to a fallback value. [`RecordError`] is returned by the
//! strict persisted-record conversion.

use thiserror::Error;

/// Failure decoding an item's JSON-encoded content.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Content is not valid JSON of the expected shape.
    #[error("malformed payload content: {0}")]
    Json(#[from] serde_json::Error),

    /// The item carries no content string at all.
    #[error("payload has no content")]
    MissingContent,
}

/// Failure converting a persisted conversation record into a stream event.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The stored event name is not a known [`crate::EventKind`].
    #[error("unknown event kind: {0}")]
    UnknownEvent(String),

    /// The stored payload string is not valid JSON.
    #[error("invalid record payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The stored metadata string is not a JSON object.
    #[error("invalid record metadata: {0}")]
    Metadata(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_error_display() {
        let err: PayloadError = serde_json::from_str::<serde_json::Value>("nope")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("malformed payload content"));
        assert_eq!(PayloadError::MissingContent.to_string(), "payload has no content");
    }

    #[test]
    fn record_error_display() {
        let err = RecordError::UnknownEvent("bogus".into());
        assert_eq!(err.to_string(), "unknown event kind: bogus");
    }
}
