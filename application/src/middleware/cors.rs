//! [CORS] stage.
//!
//! The stage is split in two halves: [`decorate()`] wraps the CSRF stage, so
//! its rejections carry the [`CorsPolicy`] headers too, while [`preflight()`]
//! answers `OPTIONS` requests right in front of the handler.
//!
//! [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse as _, Response},
};
use http::{
    header::{self, InvalidHeaderValue},
    HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
};
use itertools::Itertools as _;

/// Static [CORS] policy applied to every response.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug)]
pub struct CorsPolicy {
    /// Value of `Access-Control-Allow-Origin`.
    origin: HeaderValue,

    /// Value of `Access-Control-Allow-Methods`.
    methods: HeaderValue,

    /// Value of `Access-Control-Allow-Headers`.
    headers: HeaderValue,

    /// Whether `Access-Control-Allow-Credentials` is sent.
    credentials: bool,
}

impl CorsPolicy {
    /// Creates a new [`CorsPolicy`].
    ///
    /// # Errors
    ///
    /// If the `origin` is not a valid header value.
    pub fn new(
        origin: &str,
        methods: &[Method],
        headers: &[HeaderName],
        credentials: bool,
    ) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            origin: origin.parse()?,
            methods: methods.iter().map(Method::as_str).join(", ").parse()?,
            headers: headers
                .iter()
                .map(HeaderName::as_str)
                .join(", ")
                .parse()?,
            credentials,
        })
    }

    /// Sets the headers of this [`CorsPolicy`] on the provided [`HeaderMap`].
    fn apply(&self, headers: &mut HeaderMap) {
        drop(headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            self.origin.clone(),
        ));
        drop(headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            self.methods.clone(),
        ));
        drop(headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            self.headers.clone(),
        ));
        if self.credentials {
            drop(headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            ));
        }
        _ = headers.append(header::VARY, HeaderValue::from_static("Cookie"));
    }
}

/// Sets the [`CorsPolicy`] headers on every response coming back through this
/// stage, including the ones rejected by the inner stages.
pub async fn decorate(
    State(policy): State<CorsPolicy>,
    req: Request,
    next: Next,
) -> Response {
    let mut res = next.run(req).await;
    policy.apply(res.headers_mut());
    res
}

/// Answers preflight `OPTIONS` requests without calling the next stage.
pub async fn preflight(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(req).await
    }
}
