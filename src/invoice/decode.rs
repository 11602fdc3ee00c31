//! Raw body decoding with an actionable error message.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Characters of the raw body echoed back when decoding fails.
const BODY_PREVIEW_CHARS: usize = 600;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty body")]
    EmptyBody,
    #[error("json decode failed: {reason}; body={preview}")]
    InvalidJson { reason: String, preview: String },
}

/// Decode a JSON request body, rejecting empty or malformed input.
pub fn decode_payload<T: DeserializeOwned>(raw: &[u8]) -> Result<T, DecodeError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::EmptyBody);
    }

    serde_json::from_slice(raw).map_err(|e| DecodeError::InvalidJson {
        reason: e.to_string(),
        preview: body_preview(raw),
    })
}

fn body_preview(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let mut chars = text.chars();
    let preview: String = chars.by_ref().take(BODY_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", preview)
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::models::InvoicePayload;

    #[test]
    fn test_empty_and_whitespace_bodies_are_rejected() {
        assert!(matches!(
            decode_payload::<InvoicePayload>(b""),
            Err(DecodeError::EmptyBody)
        ));
        assert!(matches!(
            decode_payload::<InvoicePayload>(b"  \n\t "),
            Err(DecodeError::EmptyBody)
        ));
    }

    #[test]
    fn test_invalid_json_includes_body_preview() {
        let err = decode_payload::<InvoicePayload>(b"{ not json").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("json decode failed:"));
        assert!(message.ends_with("body={ not json"));
    }

    #[test]
    fn test_preview_is_truncated() {
        let long = format!("[{}", "1,".repeat(1000));
        let err = decode_payload::<InvoicePayload>(long.as_bytes()).unwrap_err();
        match err {
            DecodeError::InvalidJson { preview, .. } => {
                assert_eq!(preview.chars().count(), BODY_PREVIEW_CHARS + 1);
                assert!(preview.ends_with('…'));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_valid_body_decodes() {
        let payload: InvoicePayload =
            decode_payload(br#"{"customer":{"email":"a@b.test"}}"#).unwrap();
        assert_eq!(payload.customer.email, "a@b.test");
    }
}
