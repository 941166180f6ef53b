use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::ApiError;

/// A decoded upload: raw bytes plus the MIME type carried by a data URI
/// prefix, when one was present.
#[derive(Debug)]
pub struct DecodedUpload {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

/// Decode a base64 payload that may be wrapped in a data URI
/// (`data:<mime>;base64,<payload>`). Anything before the first comma is
/// treated as the prefix and stripped before decoding.
pub fn decode_base64_upload(payload: &str) -> Result<DecodedUpload, ApiError> {
    let (mime_type, encoded) = match payload.split_once(',') {
        Some((prefix, rest)) => (mime_from_data_uri(prefix), rest),
        None => (None, payload),
    };

    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|_| ApiError::validation("Invalid base64 payload"))?;

    Ok(DecodedUpload { bytes, mime_type })
}

fn mime_from_data_uri(prefix: &str) -> Option<String> {
    let rest = prefix.strip_prefix("data:")?;
    let mime = rest.split(';').next()?.trim();
    if mime.is_empty() {
        None
    } else {
        Some(mime.to_string())
    }
}

pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}
