//! Access logging stage.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use axum_client_ip::InsecureClientIp;
use tracing::{self as log, Instrument as _};

use crate::context::RequestId;

/// Assigns a fresh [`RequestId`] to the request and logs its start and
/// duration within an `HTTP request` span.
///
/// The downstream [`Response`] is passed through unchanged.
pub async fn record(mut req: Request, next: Next) -> Response {
    let request_id = RequestId::generate();
    drop(req.extensions_mut().insert(request_id));

    let span = log::info_span!(
        "HTTP request",
        http.request_id = %request_id,
        http.client_ip = InsecureClientIp::from(req.headers(), req.extensions())
            .map(|ip| ip.0.to_string())
            .ok(),
        http.method = req.method().as_str(),
        http.target = req
            .uri()
            .path_and_query()
            .map(http::uri::PathAndQuery::as_str),
        http.user_agent = req
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|h| h.to_str().ok()),
        http.status_code = log::field::Empty,
    );

    async move {
        log::info!("{} {} started", req.method(), req.uri().path());
        let started = Instant::now();

        let res = next.run(req).await;

        let dur = started.elapsed();
        let status = res.status();
        _ = log::Span::current().record(
            "http.status_code",
            log::field::display(status.as_u16()),
        );
        if status.is_server_error() || status.is_client_error() {
            log::error!(duration = format!("{}ms", dur.as_millis()));
        } else {
            log::info!(duration = format!("{}ms", dur.as_millis()));
        }

        res
    }
    .instrument(span)
    .await
}
