//! Stateless anti-forgery [`Token`]s bound to a session cookie value.
//!
//! A [`Token`] has the form `<hex(signature)>:<expiry>`, where `expiry` is a
//! Unix timestamp in seconds and `signature` is
//! `HMAC-SHA256(secret, cookie ":" expiry)`. Nothing is stored on the server:
//! a [`Token`] is verified by recomputing the signature from the same cookie
//! value and secret.

use std::{fmt, sync::Arc};

use common::DateTime;
use derive_more::{AsRef, Display, Error as StdError, Into};
use hmac::{Hmac, Mac as _};
use secrecy::{ExposeSecret as _, SecretSlice};
use sha2::Sha256;
use subtle::ConstantTimeEq as _;

/// HMAC-SHA256 instance used for signing [`Token`]s.
type HmacSha256 = Hmac<Sha256>;

/// Separator between the signature and the expiry of a [`Token`].
const SEPARATOR: char = ':';

/// Anti-forgery token in its `<signature>:<expiry>` textual form.
#[derive(AsRef, Clone, Debug, Display, Eq, Into, PartialEq)]
#[as_ref(str)]
pub struct Token(String);

/// Creator and verifier of [`Token`]s holding the signing secret.
///
/// Cheap to clone: the secret is shared and never mutated after creation.
#[derive(Clone)]
pub struct Codec {
    /// Secret key of the HMAC.
    secret: Arc<SecretSlice<u8>>,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

impl Codec {
    /// Creates a new [`Codec`] signing with the provided `secret`.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Arc::new(SecretSlice::from(secret.into())),
        }
    }

    /// Creates a [`Token`] for the provided `cookie` value expiring at the
    /// provided Unix timestamp.
    ///
    /// Deterministic for the same inputs.
    #[must_use]
    pub fn create(&self, cookie: &str, expires_at: i64) -> Token {
        let signature = self.sign(cookie, expires_at).finalize().into_bytes();
        Token(format!("{}{SEPARATOR}{expires_at}", hex::encode(signature)))
    }

    /// Verifies the provided `token` against the `cookie` value at the
    /// current moment.
    ///
    /// # Errors
    ///
    /// See [`Codec::verify_at()`].
    pub fn verify(&self, cookie: &str, token: &str) -> Result<bool, Error> {
        self.verify_at(cookie, token, DateTime::now().unix_timestamp())
    }

    /// Verifies the provided `token` against the `cookie` value at the
    /// provided `now` Unix timestamp.
    ///
    /// `Ok(false)` means the `token` is well-formed and fresh, but was not
    /// signed for this `cookie` value with this secret.
    ///
    /// # Errors
    ///
    /// - [`Error::Malformed`] if the `token` cannot be parsed;
    /// - [`Error::Expired`] if the `token` expiry is before `now`.
    pub fn verify_at(
        &self,
        cookie: &str,
        token: &str,
        now: i64,
    ) -> Result<bool, Error> {
        let mut parts = token.split(SEPARATOR);
        let (Some(signature), Some(expires_at), None) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::Malformed);
        };

        let expires_at =
            expires_at.parse::<i64>().map_err(|_| Error::Malformed)?;
        if expires_at < now {
            return Err(Error::Expired);
        }

        let expected = self.sign(cookie, expires_at).finalize().into_bytes();
        let signature = hex::decode(signature).map_err(|_| Error::Malformed)?;

        Ok(expected.as_slice().ct_eq(signature.as_slice()).into())
    }

    /// Feeds the signed message of a [`Token`] into a fresh MAC.
    fn sign(&self, cookie: &str, expires_at: i64) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.expose_secret())
                .expect("HMAC accepts keys of any size");
        mac.update(format!("{cookie}{SEPARATOR}{expires_at}").as_bytes());
        mac
    }
}

/// Error of verifying a [`Token`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
pub enum Error {
    /// [`Token`] is not in the `<hex>:<timestamp>` form.
    #[display("Malformed CSRF token")]
    Malformed,

    /// [`Token`] expiry has passed.
    #[display("Expired CSRF token")]
    Expired,
}

#[cfg(test)]
mod spec {
    use super::{Codec, Error};

    const NOW: i64 = 1_700_000_000;

    fn codec() -> Codec {
        Codec::new("test-secret")
    }

    #[test]
    fn verifies_own_token_while_fresh() {
        let codec = codec();
        let token = codec.create("cookie-value", NOW + 60);

        assert_eq!(codec.verify_at("cookie-value", token.as_ref(), NOW), Ok(true));
        assert_eq!(
            codec.verify_at("cookie-value", token.as_ref(), NOW + 60),
            Ok(true),
        );
    }

    #[test]
    fn verifies_against_clock() {
        let codec = codec();
        let expires_at = common::DateTime::now().unix_timestamp() + 3600;
        let token = codec.create("cookie-value", expires_at);

        assert_eq!(codec.verify("cookie-value", token.as_ref()), Ok(true));
    }

    #[test]
    fn is_deterministic() {
        let codec = codec();

        assert_eq!(codec.create("abc", NOW), codec.create("abc", NOW));
        assert_ne!(codec.create("abc", NOW), codec.create("abc", NOW + 1));
        assert_ne!(
            codec.create("abc", NOW),
            Codec::new("other-secret").create("abc", NOW),
        );
    }

    #[test]
    fn has_signature_expiry_form() {
        let token = codec().create("abc", NOW);
        let (signature, expiry) = token.as_ref().split_once(':').unwrap();

        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(expiry, NOW.to_string());
    }

    #[test]
    fn rejects_expired_regardless_of_signature() {
        let codec = codec();
        let token = codec.create("cookie-value", NOW - 1);

        assert_eq!(
            codec.verify_at("cookie-value", token.as_ref(), NOW),
            Err(Error::Expired),
        );
        assert_eq!(
            codec.verify_at("cookie-value", &format!("00:{}", NOW - 1), NOW),
            Err(Error::Expired),
        );
    }

    #[test]
    fn rejects_other_cookie() {
        let codec = codec();
        let cookie = "0123456789abcdef";
        let token = codec.create(cookie, NOW + 60);

        for i in 0..cookie.len() {
            let mut bytes = cookie.as_bytes().to_vec();
            bytes[i] ^= 0x01;
            let tampered = String::from_utf8(bytes).unwrap();

            assert_eq!(
                codec.verify_at(&tampered, token.as_ref(), NOW),
                Ok(false),
                "tampered byte {i}",
            );
        }
    }

    #[test]
    fn rejects_foreign_signature() {
        let token = Codec::new("other-secret").create("cookie-value", NOW + 60);

        assert_eq!(
            codec().verify_at("cookie-value", token.as_ref(), NOW),
            Ok(false),
        );
    }

    #[test]
    fn rejects_malformed() {
        let codec = codec();

        for token in [
            "",
            "abcd",
            "abcd:notanumber",
            "abcd:1:2",
            "zz:9999999999",
            ":",
        ] {
            assert_eq!(
                codec.verify_at("cookie-value", token, NOW),
                Err(Error::Malformed),
                "token `{token}`",
            );
        }
    }
}
