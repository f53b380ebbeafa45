//! [`SessionCookie`] definitions.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service::domain::user::session;

/// Settings of the cookie carrying a [`session::Token`].
#[derive(Clone, Debug)]
pub struct SessionCookie {
    /// Name of the cookie.
    name: String,

    /// Whether the cookie is sent over HTTPS only.
    secure: bool,
}

impl SessionCookie {
    /// Creates new [`SessionCookie`] settings.
    #[must_use]
    pub fn new(name: impl Into<String>, secure: bool) -> Self {
        Self {
            name: name.into(),
            secure,
        }
    }

    /// Returns the name of the cookie.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the raw value of the cookie presented in the `jar`, if any.
    #[must_use]
    pub fn read<'j>(&self, jar: &'j CookieJar) -> Option<&'j str> {
        jar.get(&self.name).map(Cookie::value)
    }

    /// Builds the cookie handing out the provided [`session::Token`] until
    /// it `expires_at`.
    #[must_use]
    pub fn issue(
        &self,
        token: &session::Token,
        expires_at: session::ExpirationDateTime,
    ) -> Cookie<'static> {
        self.build(token.to_string(), expires_at.into())
    }

    /// Builds the cookie making the client forget its session.
    #[must_use]
    pub fn clear(&self) -> Cookie<'static> {
        self.build(String::new(), time::OffsetDateTime::UNIX_EPOCH)
    }

    /// Builds the cookie with the provided `value` and the attributes shared
    /// by all of its versions.
    fn build(
        &self,
        value: String,
        expires: time::OffsetDateTime,
    ) -> Cookie<'static> {
        Cookie::build((self.name.clone(), value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::None)
            .path("/")
            .expires(expires)
            .build()
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use service::domain::user::session;

    use super::SessionCookie;

    #[test]
    fn issues_hardened_cookie() {
        let cookie = SessionCookie::new("Session_cookie", true);
        let token = session::Token::generate();
        let expires_at = DateTime::from_unix_timestamp(1_700_000_000)
            .unwrap()
            .coerce();

        let header = cookie.issue(&token, expires_at).to_string();

        assert!(header.starts_with(&format!("Session_cookie={token}")));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=None"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Expires=Tue, 14 Nov 2023 22:13:20 GMT"));
    }

    #[test]
    fn clears_with_past_expiry() {
        let header = SessionCookie::new("Session_cookie", false)
            .clear()
            .to_string();

        assert!(header.starts_with("Session_cookie=;"));
        assert!(header.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
        assert!(!header.contains("Secure"));
    }
}
