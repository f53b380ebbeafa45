//! CSRF enforcement stage.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse as _, Response},
};
use axum_extra::extract::cookie::CookieJar;
use http::{HeaderName, Method};
use service::domain::csrf;
use tracing as log;

use crate::{cookie::SessionCookie, define_error};

/// Name of the header carrying a [`csrf::Token`].
pub const HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

/// Policy of the CSRF enforcement stage.
#[derive(Clone, Debug)]
pub struct CsrfGuard {
    /// [`csrf::Codec`] verifying presented tokens.
    codec: csrf::Codec,

    /// [`SessionCookie`] the tokens are bound to.
    cookie: SessionCookie,

    /// Guarded HTTP methods.
    methods: Vec<Method>,

    /// Paths exempt from the check.
    exempt: Vec<String>,
}

impl CsrfGuard {
    /// Creates a new [`CsrfGuard`] checking the provided `methods` on every
    /// path except the `exempt` ones.
    #[must_use]
    pub fn new(
        codec: csrf::Codec,
        cookie: SessionCookie,
        methods: Vec<Method>,
        exempt: Vec<String>,
    ) -> Self {
        Self {
            codec,
            cookie,
            methods,
            exempt,
        }
    }

    /// Indicates whether a request with the provided `method` to the provided
    /// `path` must carry a valid [`csrf::Token`].
    #[must_use]
    pub fn guards(&self, method: &Method, path: &str) -> bool {
        self.methods.contains(method) && !self.exempt.iter().any(|p| p == path)
    }

    /// Checks the session `cookie` and the `token` presented by the client.
    ///
    /// # Errors
    ///
    /// - [`CsrfError::CookieExpired`] if no session cookie is presented.
    /// - [`CsrfError::InvalidToken`] if the `token` is missing or doesn't
    ///   verify against the `cookie`.
    pub fn check(
        &self,
        cookie: Option<&str>,
        token: Option<&str>,
    ) -> Result<(), CsrfError> {
        let cookie = cookie.ok_or(CsrfError::CookieExpired)?;
        let token = token.ok_or_else(|| {
            log::debug!("rejecting request without CSRF token");
            CsrfError::InvalidToken
        })?;

        match self.codec.verify(cookie, token) {
            Ok(true) => Ok(()),
            Ok(false) => {
                log::warn!("rejecting request with forged CSRF token");
                Err(CsrfError::InvalidToken)
            }
            Err(e @ csrf::Error::Malformed) => {
                log::warn!("rejecting request with CSRF token: {e}");
                Err(CsrfError::InvalidToken)
            }
            Err(e @ csrf::Error::Expired) => {
                log::debug!("rejecting request with CSRF token: {e}");
                Err(CsrfError::InvalidToken)
            }
        }
    }
}

/// Rejects guarded requests without a valid [`csrf::Token`] before they reach
/// the next stage.
pub async fn enforce(
    State(guard): State<CsrfGuard>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    if !guard.guards(req.method(), req.uri().path()) {
        return next.run(req).await;
    }

    let token = req.headers().get(HEADER).and_then(|v| v.to_str().ok());
    match guard.check(guard.cookie.read(&jar), token) {
        Ok(()) => next.run(req).await,
        Err(e) => e.into_response(),
    }
}

define_error! {
    enum CsrfError {
        #[code = "COOKIE_EXPIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Cookie expired"]
        CookieExpired,

        #[code = "INVALID_CSRF_TOKEN"]
        #[status = FORBIDDEN]
        #[message = "Invalid CSRF token"]
        InvalidToken,
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use http::Method;
    use service::domain::csrf;

    use super::{CsrfError, CsrfGuard};
    use crate::cookie::SessionCookie;

    fn guard() -> CsrfGuard {
        CsrfGuard::new(
            csrf::Codec::new("secret"),
            SessionCookie::new("Session_cookie", true),
            vec![Method::POST, Method::PATCH],
            vec!["/api/v1/auth/login".to_owned()],
        )
    }

    #[test]
    fn guards_mutating_methods_only() {
        let guard = guard();

        assert!(guard.guards(&Method::PATCH, "/api/v1/users/me"));
        assert!(guard.guards(&Method::POST, "/api/v1/auth/logout"));
        assert!(!guard.guards(&Method::GET, "/api/v1/users/me"));
        assert!(!guard.guards(&Method::OPTIONS, "/api/v1/users/me"));
        assert!(!guard.guards(&Method::POST, "/api/v1/auth/login"));
    }

    #[test]
    fn checks_cookie_before_token() {
        assert!(matches!(
            guard().check(None, Some("abcd:1")),
            Err(CsrfError::CookieExpired),
        ));
        assert!(matches!(
            guard().check(Some("cookie"), None),
            Err(CsrfError::InvalidToken),
        ));
    }

    #[test]
    fn accepts_only_tokens_bound_to_cookie() {
        let expires_at = DateTime::now().unix_timestamp() + 60;
        let token = csrf::Codec::new("secret").create("cookie", expires_at);

        assert!(guard().check(Some("cookie"), Some(token.as_ref())).is_ok());
        for (cookie, token) in [
            ("other", token.as_ref()),
            ("cookie", "abcd:notanumber"),
            ("cookie", "abcd:1"),
        ] {
            assert!(
                matches!(
                    guard().check(Some(cookie), Some(token)),
                    Err(CsrfError::InvalidToken),
                ),
                "{cookie} {token}",
            );
        }
    }
}
