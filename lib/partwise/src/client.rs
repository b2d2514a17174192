//! HTTP client implementation using hyper-util.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;
use futures_util::stream;
use http::header::{CONTENT_LENGTH, USER_AGENT};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use partwise_core::{BodyReader, RequestBody};
use tower::Layer;
use tower::util::BoxCloneService;
use tower_service::Service;
use tracing::{debug, trace};

use crate::middleware::LoggingLayer;
use crate::{
    Error, Request, Response, Result,
    config::{ClientConfig, ClientConfigBuilder},
    connector::https_connector,
};

// ============================================================================
// Type-Erased Service for Middleware Composition
// ============================================================================

/// Type-erased service for middleware composition.
pub type BoxedService = BoxCloneService<Request, Response, Error>;

/// Future type for Tower Service implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// Request body handed to hyper.
type HttpBody = UnsyncBoxBody<Bytes, Error>;

/// Error raised while streaming a body, kept so it is reported as is
/// instead of through hyper's wrapping.
type UploadFailure = Arc<Mutex<Option<Error>>>;

/// Makes a `BoxedService` shareable behind `&self`.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request) -> ServiceFuture {
        let mut service = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.call(request).await })
    }
}

// ============================================================================
// Raw Client
// ============================================================================

/// hyper-util client without middleware.
#[derive(Clone)]
struct RawHyperClient {
    inner: Client<HttpsConnector<HttpConnector>, HttpBody>,
    config: ClientConfig,
}

impl RawHyperClient {
    fn new(config: ClientConfig) -> Self {
        let connector = https_connector(config.connect_timeout);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    /// Convert into a hyper request. Multipart bodies are opened here and
    /// read lazily while hyper writes them.
    fn build_hyper_request(
        config: &ClientConfig,
        request: Request,
        failure: &UploadFailure,
    ) -> Result<http::Request<HttpBody>> {
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder().method(method).uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let has_header = |wanted: &http::HeaderName| {
            headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(wanted.as_str()))
        };

        if let Some(user_agent) = &config.user_agent
            && !has_header(&USER_AGENT)
        {
            builder = builder.header(USER_AGENT, user_agent.as_str());
        }

        let body = match body {
            RequestBody::Empty => Empty::<Bytes>::new()
                .map_err(|never| match never {})
                .boxed_unsync(),
            RequestBody::Bytes(bytes) => {
                Full::new(bytes).map_err(|never| match never {}).boxed_unsync()
            }
            RequestBody::Multipart(multipart) => {
                let mut multipart = multipart.with_chunk_size(config.upload_chunk_size);
                match multipart.content_length() {
                    Some(length) if !has_header(&CONTENT_LENGTH) => {
                        builder = builder.header(CONTENT_LENGTH, length);
                    }
                    Some(_) => {}
                    None => debug!(
                        parts = multipart.part_count(),
                        "multipart length unknown, sending chunked"
                    ),
                }
                let reader = multipart.open()?;
                StreamBody::new(upload_stream(reader, Arc::clone(failure))).boxed_unsync()
            }
        };

        builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    /// Response headers in wire order. Non-UTF-8 values are decoded lossily.
    fn extract_headers(headers: &http::HeaderMap) -> Vec<(String, String)> {
        headers
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        let failure = UploadFailure::default();
        let hyper_request = Self::build_hyper_request(&self.config, request, &failure)?;

        let exchange = async {
            let response = self
                .inner
                .request(hyper_request)
                .await
                .map_err(|err| Self::map_hyper_error(err, &failure))?;

            let status = response.status().as_u16();
            let headers = Self::extract_headers(response.headers());

            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| Error::connection(e.to_string()))?
                .to_bytes();

            Ok(Response::new(status, headers, body))
        };

        tokio::time::timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)?
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error, failure: &UploadFailure) -> Error {
        if let Some(upload_error) = failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            return upload_error;
        }

        let msg = err.to_string();

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

/// Stream the body chunk by chunk. File and stream parts do blocking reads,
/// so each chunk is pulled on the blocking pool.
fn upload_stream(
    reader: BodyReader,
    failure: UploadFailure,
) -> impl Stream<Item = Result<Frame<Bytes>>> + Send + 'static {
    stream::unfold(Some(reader), move |state| {
        let failure = Arc::clone(&failure);
        async move {
            let mut reader = state?;
            let joined = tokio::task::spawn_blocking(move || {
                let next = reader.next();
                (reader, next)
            })
            .await;

            let err = match joined {
                Ok((reader, Some(Ok(chunk)))) => {
                    trace!(len = chunk.len(), sent = reader.position(), "upload chunk");
                    return Some((Ok(Frame::data(chunk)), Some(reader)));
                }
                Ok((_, None)) => return None,
                Ok((_, Some(Err(err)))) => err,
                Err(join) => Error::Io(std::io::Error::other(join)),
            };

            let reported = Error::connection(format!("upload aborted: {err}"));
            *failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
            Some((Err(reported), None))
        }
    })
}

impl Service<Request> for RawHyperClient {
    type Response = Response;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(request).await })
    }
}

// ============================================================================
// Public Client
// ============================================================================

/// HTTP client using hyper-util with TLS and tower middleware support.
///
/// Multipart bodies are streamed: file and stream parts are read while the
/// request is written, never buffered whole.
///
/// # Example
///
/// ```no_run
/// use partwise::prelude::*;
///
/// # async fn run() -> partwise::Result<()> {
/// let client = HyperClient::builder().with_logging().build();
///
/// let mut encoder = MultipartEncoder::new();
/// encoder
///     .add_file("upfile", "/tmp/image.jpg")?
///     .add_text_body("text", "This is a multipart post", None)?;
///
/// let response = client
///     .post_multipart("http://localhost:8080/echo", encoder.build()?)
///     .await?;
/// println!("{} with {} headers", response.status(), response.header_count());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HyperClient {
    service: SyncService,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Create a new client with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration (no middleware).
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let raw = RawHyperClient::new(config.clone());
        Self::with_service(BoxCloneService::new(raw), config)
    }

    fn with_service(service: BoxedService, config: ClientConfig) -> Self {
        Self {
            service: SyncService::new(service),
            config,
        }
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl partwise_core::HttpClient for HyperClient {
    async fn execute(&self, request: Request) -> Result<Response> {
        self.service.call(request).await
    }
}

impl Service<Request> for HyperClient {
    type Response = Response;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.service.call(request)
    }
}

/// Builder for [`HyperClient`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use partwise::HyperClient;
/// use partwise::middleware::LoggingLayer;
///
/// let client = HyperClient::builder()
///     .timeout(Duration::from_secs(60))
///     .upload_chunk_size(16 * 1024)
///     .layer(LoggingLayer::debug())
///     .build();
/// assert_eq!(client.config().upload_chunk_size, 16 * 1024);
/// ```
#[derive(Default)]
pub struct HyperClientBuilder {
    config: ClientConfigBuilder,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperClientBuilder {
    // ========================================================================
    // Core Configuration
    // ========================================================================

    /// Set the timeout for the whole exchange, upload included.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Set the size of chunks read from multipart bodies.
    #[must_use]
    pub fn upload_chunk_size(mut self, size: usize) -> Self {
        self.config = self.config.upload_chunk_size(size);
        self
    }

    /// Set the default `User-Agent`, or `None` to send none.
    #[must_use]
    pub fn user_agent(mut self, user_agent: Option<impl Into<String>>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    // ========================================================================
    // Middleware
    // ========================================================================

    /// Add a Tower layer to the client.
    ///
    /// Layers are applied in order: first added = innermost.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Add request/response logging.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Add debug-level logging (includes headers and body shape).
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the client with all configured middleware.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let config = self.config.build();
        let mut service: BoxedService = BoxCloneService::new(RawHyperClient::new(config.clone()));

        for layer_fn in self.layers {
            service = layer_fn(service);
        }

        HyperClient::with_service(service, config)
    }
}
