//! [`Session`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display};
use rand_core::{OsRng, RngCore as _};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// Authenticated session of a [`User`], keyed by its [`Token`].
#[derive(Clone, Debug)]
pub struct Session {
    /// [`Token`] identifying this [`Session`].
    pub token: Token,

    /// ID of the [`User`] this [`Session`] belongs to.
    pub user_id: user::Id,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: ExpirationDateTime,
}

/// Opaque access token of a [`Session`], carried in the session cookie.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str)]
pub struct Token(String);

impl Token {
    /// Number of random bytes in a generated [`Token`].
    const ENTROPY: usize = 32;

    /// Maximum length of a [`Token`] accepted from a client.
    const MAX_LEN: usize = 256;

    /// Generates a new unguessable [`Token`] from the OS random source.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0; Self::ENTROPY];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Creates a [`Token`] from a value presented by a client.
    ///
    /// [`None`] is returned if the value cannot be a cookie value issued by
    /// this service.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        (!token.is_empty()
            && token.len() <= Self::MAX_LEN
            && token.bytes().all(|b| b.is_ascii_graphic() && b != b';'))
        .then_some(Self(token))
    }
}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use super::Token;

    #[test]
    fn generates_hex_tokens() {
        let token = Token::generate();

        assert_eq!(token.as_ref().len(), 64);
        assert!(token.as_ref().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generates_distinct_tokens() {
        assert_ne!(Token::generate(), Token::generate());
    }

    #[test]
    fn accepts_cookie_values() {
        assert!(Token::new("t1").is_some());
        assert!(Token::new(Token::generate().to_string()).is_some());

        assert!(Token::new("").is_none());
        assert!(Token::new("a b").is_none());
        assert!(Token::new("a;b").is_none());
        assert!(Token::new("x".repeat(257)).is_none());
    }
}
