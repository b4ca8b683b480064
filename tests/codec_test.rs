mod common;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{TimeZone, Utc};
use serde_json::json;
use starberry_auth::{AuthError, Segment, decode_segment, decode_token};

use common::{make_token, make_token_with};

#[test]
fn test_decode_segment_round_trips_json() {
    let original = json!({ "nonce": "abc", "name": "Zoë ~ user?", "roles": ["a", "b"] });
    let encoded = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&original).unwrap());
    match decode_segment(&encoded).unwrap() {
        Segment::Json(value) => assert_eq!(value, original),
        other => panic!("Expected JSON segment, got {:?}", other),
    }
}

#[test]
fn test_decode_segment_handles_non_ascii_payload() {
    let original = json!({ "k": "\u{fb}\u{ff}\u{fe}>>>???" });
    let encoded = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&original).unwrap());
    let segment = decode_segment(&encoded).unwrap();
    assert_eq!(segment.as_json(), Some(&original));
}

#[test]
fn test_decode_segment_maps_url_safe_characters() {
    let bytes = [0xfb, 0xef, 0xbe, 0xff, 0xff, 0xff];
    let encoded = URL_SAFE_NO_PAD.encode(bytes);
    assert_eq!(encoded, "----____");
    assert!(decode_segment(&encoded).unwrap().is_malformed());
}

#[test]
fn test_non_json_segment_is_malformed_not_error() {
    let encoded = URL_SAFE_NO_PAD.encode(b"definitely not json");
    let segment = decode_segment(&encoded).unwrap();
    assert!(segment.is_malformed());
    assert_eq!(serde_json::to_value(&segment).unwrap(), json!({ "error": "Malformed token" }));
}

#[test]
fn test_bad_base64_is_fatal() {
    let err = decode_segment("not*base64!").unwrap_err();
    assert!(matches!(err, AuthError::SegmentDecode(_)));
}

#[test]
fn test_decode_token_splits_header_and_payload() {
    let decoded = decode_token(&make_token("n-123")).unwrap();
    assert_eq!(decoded.header.get_str("alg"), Some("RS256"));
    assert_eq!(decoded.nonce(), Some("n-123"));
    assert_eq!(decoded.claim("sub"), Some(&json!("user-1")));
}

#[test]
fn test_decode_token_with_malformed_payload() {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(b"{broken");
    let decoded = decode_token(&format!("{}.{}.", header, payload)).unwrap();
    assert!(!decoded.header.is_malformed());
    assert!(decoded.payload.is_malformed());
    assert!(decoded.nonce().is_none());
}

#[test]
fn test_expiry_claim() {
    let decoded = decode_token(&make_token_with(json!({ "exp": 1_700_000_000 }))).unwrap();
    let exp = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    assert_eq!(decoded.expires_at(), Some(exp));
    assert!(decoded.is_expired_at(exp));
    assert!(!decoded.is_expired_at(Utc.timestamp_opt(1_600_000_000, 0).unwrap()));

    let no_exp = decode_token(&make_token_with(json!({ "nonce": "x" }))).unwrap();
    assert!(no_exp.expires_at().is_none());
    assert!(!no_exp.is_expired_at(Utc::now()));
}
