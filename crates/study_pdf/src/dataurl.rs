//! Decoding of `data:<mime>;base64,<payload>` URLs sent by the frontend.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::DecodeError;

const BASE64_MARKER: &str = "base64,";

/// Decodes the payload of a base64 data URL.
///
/// Everything after the first `base64,` marker is treated as the payload, so the media type is
/// not validated. ASCII whitespace inside the payload (line-wrapped encoders) is ignored.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, DecodeError> {
    let (_, payload) = data_url
        .split_once(BASE64_MARKER)
        .ok_or(DecodeError::MissingBase64Marker)?;

    let compact: String = payload
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();

    Ok(STANDARD.decode(compact)?)
}

/// Encodes `bytes` as a base64 data URL with the given media type.
pub fn encode_data_url(mime: &str, bytes: impl AsRef<[u8]>) -> String {
    format!("data:{mime};{BASE64_MARKER}{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_data_url() {
        let bytes = decode_data_url("data:image/png;base64,aGVsbG8=").expect("decodes");
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn rejects_missing_marker() {
        let err = decode_data_url("data:image/png,aGVsbG8=").unwrap_err();
        assert!(matches!(err, DecodeError::MissingBase64Marker));
    }

    #[test]
    fn rejects_invalid_payload() {
        let err = decode_data_url("data:image/png;base64,@@@").unwrap_err();
        assert!(matches!(err, DecodeError::Base64(_)));
    }

    #[test]
    fn ignores_wrapped_payload_whitespace() {
        let bytes = decode_data_url("data:text/plain;base64,aGVs\r\nbG8=").expect("decodes");
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn reencoding_reproduces_the_original_payload() {
        let payload = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGP4z8AAAAMBAQDJ/pLvAAAAAElFTkSuQmCC";
        let url = format!("data:image/png;base64,{payload}");
        let decoded = decode_data_url(&url).expect("decodes");
        assert_eq!(STANDARD.encode(&decoded), payload);
        assert_eq!(encode_data_url("image/png", &decoded), url);
    }
}
