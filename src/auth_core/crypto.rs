//! Nonce generation for login attempts.

use ring::rand::{SecureRandom, SystemRandom};

use super::error::{AuthError, Result};

/// Random bytes per nonce.
pub const NONCE_BYTES: usize = 20;

/// Generates a fresh nonce: [`NONCE_BYTES`] random bytes, lower-case hex.
pub fn generate_nonce() -> Result<String> {
    let rng = SystemRandom::new();
    let mut buf = [0u8; NONCE_BYTES];
    rng.fill(&mut buf).map_err(|_| AuthError::NonceGeneration)?;
    Ok(buf.iter().map(|byte| format!("{:02x}", byte)).collect())
}

/// A token nonce only matches a pending nonce that actually exists.
pub fn nonce_matches(token_nonce: Option<&str>, pending: Option<&str>) -> bool {
    matches!((token_nonce, pending), (Some(found), Some(expected)) if found == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_is_forty_hex_chars() {
        let nonce = generate_nonce().unwrap();
        assert_eq!(nonce.len(), NONCE_BYTES * 2);
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(nonce, generate_nonce().unwrap());
    }

    #[test]
    fn absent_nonces_never_match() {
        assert!(nonce_matches(Some("a"), Some("a")));
        assert!(!nonce_matches(Some("a"), Some("b")));
        assert!(!nonce_matches(None, None));
        assert!(!nonce_matches(Some("a"), None));
    }
}
