//! One log line per request, in the spirit of a classic access log

use axum::{
    body::{Body, HttpBody},
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::info;

pub async fn access_log(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    // Most bodies only carry their length as a size hint until hyper writes them
    let length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| response.body().size_hint().exact().map(|n| n.to_string()))
        .unwrap_or_else(|| "-".to_string());

    info!(
        target: "phonebook::access",
        "{} {} {} {} - {:.3} ms",
        method,
        uri,
        response.status().as_u16(),
        length,
        started.elapsed().as_secs_f64() * 1000.0
    );

    response
}
