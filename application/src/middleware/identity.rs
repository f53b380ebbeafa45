//! Identity resolution stage.
//!
//! Resolves the session cookie into an [`Identity`] and never fails the
//! request: any resolution problem degrades the caller to
//! [`Identity::ANONYMOUS`] and clears the presented cookie.

use std::future::Future;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse as _, Response},
};
use axum_extra::extract::cookie::CookieJar;
use derive_more::{Display, Error};
use http::Method;
use service::{
    command::{self, Command as _},
    domain::user::{self, session},
};
use tracing as log;

use crate::{context::Identity, cookie::SessionCookie, Service};

/// Resolver of [`session::Token`]s into [`user::Id`]s.
pub trait Authorizer: Clone + Send + Sync + 'static {
    /// Resolves the provided [`session::Token`] into the [`user::Id`] owning
    /// it.
    fn authorize(
        &self,
        token: session::Token,
    ) -> impl Future<Output = Result<user::Id, AuthorizationError>> + Send;
}

/// Error of an [`Authorizer`].
#[derive(Debug, Display, Error)]
pub enum AuthorizationError {
    /// Session doesn't exist or has expired.
    #[display("session not found")]
    NotFound,

    /// [`Authorizer`] cannot be reached.
    #[display("authorization unavailable: {_0}")]
    Transport(#[error(not(source))] String),
}

impl Authorizer for Service {
    async fn authorize(
        &self,
        token: session::Token,
    ) -> Result<user::Id, AuthorizationError> {
        use command::authorize_user_session::ExecutionError as E;

        self.execute(command::AuthorizeUserSession { token })
            .await
            .map_err(|e| match e.as_ref() {
                E::SessionNotFound => AuthorizationError::NotFound,
                E::Store(_) => AuthorizationError::Transport(format!("{e}")),
            })
    }
}

/// State of the identity resolution stage.
#[derive(Clone, Debug)]
pub struct IdentityResolver<A> {
    /// [`Authorizer`] resolving presented cookies.
    authorizer: A,

    /// [`SessionCookie`] to read and clear.
    cookie: SessionCookie,
}

impl<A: Authorizer> IdentityResolver<A> {
    /// Creates a new [`IdentityResolver`].
    #[must_use]
    pub fn new(authorizer: A, cookie: SessionCookie) -> Self {
        Self { authorizer, cookie }
    }

    /// Resolves the raw cookie value into an [`Identity`].
    async fn resolve(
        &self,
        cookie: &str,
    ) -> Result<Identity, AuthorizationError> {
        let token =
            session::Token::new(cookie).ok_or(AuthorizationError::NotFound)?;
        self.authorizer
            .authorize(token)
            .await
            .map(Identity::authenticated)
    }
}

/// Attaches the [`Identity`] of the caller to the request and always calls
/// the next stage.
pub async fn resolve<A: Authorizer>(
    State(resolver): State<IdentityResolver<A>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    // Preflights are answered before any handler, so there is nothing to
    // resolve the cookie for.
    let presented = if req.method() == Method::OPTIONS {
        None
    } else {
        resolver.cookie.read(&jar)
    };
    let (identity, stale) = match presented {
        None => (Identity::ANONYMOUS, false),
        Some(cookie) => match resolver.resolve(cookie).await {
            Ok(identity) => (identity, false),
            Err(e @ AuthorizationError::NotFound) => {
                log::debug!("treating caller as anonymous: {e}");
                (Identity::ANONYMOUS, true)
            }
            Err(e @ AuthorizationError::Transport(_)) => {
                log::warn!("treating caller as anonymous: {e}");
                (Identity::ANONYMOUS, true)
            }
        },
    };

    drop(req.extensions_mut().insert(identity));
    let res = next.run(req).await;

    if stale && !sets_cookie(&res, resolver.cookie.name()) {
        (CookieJar::new().add(resolver.cookie.clear()), res).into_response()
    } else {
        res
    }
}

/// Checks whether the [`Response`] already sets the cookie with the provided
/// `name`.
fn sets_cookie(res: &Response, name: &str) -> bool {
    res.headers()
        .get_all(http::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| {
            v.strip_prefix(name).is_some_and(|rest| rest.starts_with('='))
        })
}
