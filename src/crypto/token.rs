use crate::error::Result;
use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use rand::rngs::OsRng;

/// The size of a session token in bytes.
const SESSION_TOKEN_SIZE: usize = 32;

/// Generates a new random session token.
///
/// The token is opaque: it carries no claims and is unguessable, so
/// holding it proves nothing beyond having logged in.
///
/// # Returns
///
/// A URL-safe base64-encoded session token.
pub fn generate_session_token() -> Result<String> {
    let mut token = [0u8; SESSION_TOKEN_SIZE];
    OsRng.fill_bytes(&mut token);

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique() {
        let a = generate_session_token().unwrap();
        let b = generate_session_token().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tokens_are_url_safe_without_padding() {
        let token = generate_session_token().unwrap();
        // 32 bytes -> 43 base64 characters, no '=' padding.
        assert_eq!(token.len(), 43);
        assert!(!token.contains('='));
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
    }
}
