//! Request/response logging middleware.
//!
//! Each request runs inside an `http_request` span. Multipart uploads also
//! record their part count and encoded length (when known).

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use partwise_core::RequestBody;
use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{Error, Request, Response, Result};

/// Layer that adds request/response logging.
///
/// # Example
///
/// ```
/// use partwise::HyperClient;
/// use partwise::middleware::{LoggingLayer, ServiceBuilder};
///
/// let service = ServiceBuilder::new()
///     .layer(LoggingLayer::new())
///     .service(HyperClient::new());
/// # drop(service);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Log level for the logging middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level (headers and body shape).
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

impl LoggingLayer {
    /// Create a new logging layer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service that logs requests and responses.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Logging<S> {
    /// Create a new logging service wrapping the given service.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            level: LogLevel::Info,
        }
    }
}

/// What the body looks like, for log fields.
fn body_kind(body: &RequestBody) -> &'static str {
    match body {
        RequestBody::Empty => "empty",
        RequestBody::Bytes(_) => "bytes",
        RequestBody::Multipart(_) => "multipart",
    }
}

impl<S> Service<Request> for Logging<S>
where
    S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let method = request.method().clone();
        let url = request.url().to_string();
        let level = self.level;

        let span = span!(Level::INFO, "http_request", %method, %url);

        let body = request.body();
        let kind = body_kind(body);
        let content_length = body.content_length();
        let parts = match body {
            RequestBody::Multipart(multipart) => Some(multipart.part_count()),
            RequestBody::Empty | RequestBody::Bytes(_) => None,
        };

        match level {
            LogLevel::Debug => {
                let part_names: Vec<String> = match body {
                    RequestBody::Multipart(multipart) => {
                        multipart.part_names().map(str::to_string).collect()
                    }
                    RequestBody::Empty | RequestBody::Bytes(_) => Vec::new(),
                };
                span.in_scope(|| {
                    debug!(
                        headers = ?request.headers(),
                        body = kind,
                        ?content_length,
                        ?part_names,
                        "sending request"
                    );
                });
            }
            LogLevel::Info => {
                span.in_scope(|| {
                    info!(body = kind, ?parts, ?content_length, "sending request");
                });
            }
        }

        let mut inner = self.inner.clone();
        Box::pin(
            async move {
                let start = Instant::now();
                let result = inner.call(request).await;

                // Saturating conversion to u64 (truncates after ~584 million years)
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) => {
                        let status = response.status();
                        let headers = response.header_count();
                        if response.is_success() {
                            info!(status, headers, elapsed_ms, "request completed");
                        } else {
                            warn!(status, headers, elapsed_ms, "request failed with HTTP error");
                        }
                    }
                    Err(err) if err.is_io() => {
                        warn!(error = %err, elapsed_ms, "reading upload body failed");
                    }
                    Err(err) => {
                        warn!(error = %err, elapsed_ms, "request failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use assert2::{check, let_assert};
    use bytes::Bytes;
    use partwise_core::MultipartEncoder;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn logging_layer_default() {
        check!(LoggingLayer::new().level == LogLevel::Info);
    }

    #[test]
    fn logging_layer_debug() {
        check!(LoggingLayer::debug().level == LogLevel::Debug);
    }

    #[test]
    fn body_kinds() {
        check!(body_kind(&RequestBody::Empty) == "empty");
        check!(body_kind(&RequestBody::Bytes(Bytes::new())) == "bytes");
    }

    /// Echoes the multipart part count back as a header.
    #[derive(Clone, Default)]
    struct Echo {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Service<Request> for Echo {
        type Response = Response;
        type Error = Error;
        type Future = Pin<Box<dyn Future<Output = Result<Response>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, request: Request) -> Self::Future {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.url().to_string());
            }
            let parts = match request.body() {
                RequestBody::Multipart(body) => body.part_count(),
                RequestBody::Empty | RequestBody::Bytes(_) => 0,
            };
            Box::pin(async move {
                Ok(Response::new(
                    200,
                    vec![("x-parts".to_string(), parts.to_string())],
                    Bytes::new(),
                ))
            })
        }
    }

    #[tokio::test]
    async fn passes_request_and_response_through() {
        let echo = Echo::default();
        let service = LoggingLayer::debug().layer(echo.clone());

        let mut encoder = MultipartEncoder::new();
        encoder
            .add_text_body("text1", "This is message 1", None)
            .and_then(|e| e.add_text_body("text2", "This is message 2", None))
            .expect("add");
        let request = Request::builder(
            http::Method::POST,
            url::Url::parse("http://localhost/echo").expect("url"),
        )
        .multipart(encoder.build().expect("build"))
        .build();

        let response = service.oneshot(request).await.expect("response");
        check!(response.header("x-parts") == Some("2"));
        let_assert!(Ok(seen) = echo.seen.lock());
        check!(seen.as_slice() == ["http://localhost/echo"]);
    }
}
