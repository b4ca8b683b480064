//! Decoding of compact `header.payload.signature` tokens.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use super::error::{AuthError, Result};
use super::types::{DecodedToken, MalformedToken, Segment};

// Standard alphabet, forgiving about padding and trailing bits.
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decodes one base64url segment into JSON.
///
/// Bytes that are not UTF-8 JSON yield [`Segment::Malformed`]. Invalid base64 is an error.
pub fn decode_segment(segment: &str) -> Result<Segment> {
    let standard = segment.replace('-', "+").replace('_', "/");
    let bytes = SEGMENT_ENGINE.decode(standard.as_bytes())?;
    let parsed = std::str::from_utf8(&bytes)
        .ok()
        .and_then(|text| serde_json::from_str(text).ok());
    Ok(match parsed {
        Some(value) => Segment::Json(value),
        None => Segment::Malformed(MalformedToken::default()),
    })
}

/// Decodes the header and payload of `token`.
pub fn decode_token(token: &str) -> Result<DecodedToken> {
    let mut parts = token.split('.');
    let header = parts.next().unwrap_or_default();
    let payload = parts.next().ok_or(AuthError::InvalidTokenFormat)?;
    Ok(DecodedToken {
        header: decode_segment(header)?,
        payload: decode_segment(payload)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_padded_and_unpadded_segments() {
        // {"a":1}
        assert!(matches!(decode_segment("eyJhIjoxfQ").unwrap(), Segment::Json(_)));
        assert!(matches!(decode_segment("eyJhIjoxfQ==").unwrap(), Segment::Json(_)));
    }

    #[test]
    fn missing_payload_is_an_error() {
        let err = decode_token("eyJhIjoxfQ").unwrap_err();
        assert!(matches!(err, AuthError::InvalidTokenFormat));
    }
}
