//! Per-request tracing spans and status-classified completion events

use http::{header, Request, Response};
use std::time::Duration;
use tower_http::classify::{ServerErrorsAsFailures, ServerErrorsFailureClass, SharedClassifier};
use tower_http::trace::TraceLayer;
use tracing::{info_span, Span};

pub type RequestTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    MakeRequestSpan,
    (),
    fn(&Response<axum::body::Body>, Duration, &Span),
    (),
    (),
    fn(ServerErrorsFailureClass, Duration, &Span),
>;

#[derive(Debug, Clone)]
pub struct MakeRequestSpan {
    service: String,
}

impl<B> tower_http::trace::MakeSpan<B> for MakeRequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let content_length = request
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");

        info_span!(
            "http_request",
            service = %self.service,
            method = %request.method(),
            path = %request.uri().path(),
            content_length = %content_length,
        )
    }
}

pub fn logging_layer(service: &str) -> RequestTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(MakeRequestSpan {
            service: service.to_string(),
        })
        .on_request(())
        .on_response(log_response as fn(&Response<axum::body::Body>, Duration, &Span))
        .on_body_chunk(())
        .on_eos(())
        .on_failure(log_failure as fn(ServerErrorsFailureClass, Duration, &Span))
}

fn log_response(response: &Response<axum::body::Body>, latency: Duration, _span: &Span) {
    let status = response.status().as_u16();
    let latency_ms = latency.as_millis();

    match status {
        200..=399 => tracing::info!(status, latency_ms, "request completed"),
        400..=499 => tracing::warn!(status, latency_ms, "client error response"),
        _ => tracing::error!(status, latency_ms, "server error response"),
    }
}

fn log_failure(error: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
    tracing::error!(
        latency_ms = latency.as_millis(),
        error = %error,
        "request failed"
    );
}
