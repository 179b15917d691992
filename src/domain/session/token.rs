//! Opaque session tokens.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;

/// Entropy per token: 256 bits.
pub const TOKEN_BYTES: usize = 32;

/// Longest token accepted from the outside world.
///
/// Anything longer cannot have been issued here and is rejected before it
/// reaches storage.
pub const MAX_TOKEN_LEN: usize = 256;

/// Opaque, unguessable session token.
///
/// Generated tokens are 32 bytes from the OS CSPRNG encoded as unpadded
/// base64url (43 characters), safe in headers and URLs. `Debug` never prints
/// the value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generates a fresh random token.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Accepts a token presented by a client.
    ///
    /// Returns `None` for values that can never match an issued token
    /// (empty, oversized, or containing whitespace/control characters).
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || raw.len() > MAX_TOKEN_LEN {
            return None;
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    /// Returns the token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning the text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn generated_token_is_43_url_safe_chars() {
        let token = SessionToken::generate();
        assert_eq!(token.as_str().len(), 43);
        assert!(token
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn generated_tokens_are_distinct() {
        let tokens: HashSet<String> = (0..1_000)
            .map(|_| SessionToken::generate().into_string())
            .collect();
        assert_eq!(tokens.len(), 1_000);
    }

    #[test]
    fn generated_token_decodes_to_32_bytes() {
        let token = SessionToken::generate();
        let bytes = URL_SAFE_NO_PAD.decode(token.as_str()).unwrap();
        assert_eq!(bytes.len(), TOKEN_BYTES);
    }

    #[test]
    fn debug_output_is_redacted() {
        let token = SessionToken::generate();
        let debug = format!("{:?}", token);
        assert!(!debug.contains(token.as_str()));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn parse_rejects_empty_and_oversized_values() {
        assert!(SessionToken::parse("").is_none());
        assert!(SessionToken::parse(&"a".repeat(MAX_TOKEN_LEN + 1)).is_none());
        assert!(SessionToken::parse(&"a".repeat(MAX_TOKEN_LEN)).is_some());
    }

    #[test]
    fn parse_rejects_whitespace() {
        assert!(SessionToken::parse("abc def").is_none());
        assert!(SessionToken::parse("abc\n").is_none());
    }

    proptest! {
        #[test]
        fn parse_accepts_every_generated_token(_seed in 0u32..64) {
            let token = SessionToken::generate();
            let parsed = SessionToken::parse(token.as_str());
            prop_assert_eq!(parsed, Some(token));
        }

        #[test]
        fn parse_never_accepts_whitespace(prefix in "[A-Za-z0-9_-]{0,20}", suffix in "[A-Za-z0-9_-]{0,20}") {
            let raw = format!("{} {}", prefix, suffix);
            prop_assert!(SessionToken::parse(&raw).is_none());
        }
    }
}
