//! HTTP request building.
//!
//! Use [`Request::builder`] to construct requests with headers, query
//! parameters, and bodies.
//!
//! # Example
//!
//! ```
//! use partwise_core::{Method, MultipartEncoder, Request};
//!
//! let mut encoder = MultipartEncoder::new();
//! encoder.add_text_body("text", "This is a multipart post", None)?;
//!
//! let request = Request::builder(Method::POST, "http://echo.example.com".parse()?)
//!     .header("Accept", "*/*")
//!     .multipart(encoder.build()?)
//!     .build();
//!
//! assert!(request.header("content-type").is_some_and(|v| v.starts_with("multipart/form-data")));
//! # Ok::<(), partwise_core::Error>(())
//! ```

use bytes::Bytes;
use http::Method;
use url::Url;

use crate::MultipartBody;

/// Body of a [`Request`].
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Fully buffered body.
    Bytes(Bytes),
    /// Multipart body streamed while the request is sent.
    Multipart(MultipartBody),
}

impl RequestBody {
    /// Length in bytes, if known before sending.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        match self {
            Self::Empty => Some(0),
            Self::Bytes(bytes) => u64::try_from(bytes.len()).ok(),
            Self::Multipart(body) => body.content_length(),
        }
    }

    /// Returns `true` if there is no body.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// An HTTP request with method, URL, ordered headers, and a body.
#[derive(Debug)]
pub struct Request {
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
    body: RequestBody,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers, in the order they were set.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Single header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Mutable access to the body.
    #[must_use]
    pub fn body_mut(&mut self) -> &mut RequestBody {
        &mut self.body
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, Vec<(String, String)>, RequestBody) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
    body: RequestBody,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub const fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// Sets a header, replacing any value with the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        headers
            .into_iter()
            .fold(self, |builder, (name, value)| builder.header(name, value))
    }

    /// Appends a query parameter to the URL.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(name, value);
        self
    }

    /// Sets a buffered body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Bytes(body.into());
        self
    }

    /// Sets a multipart body and the matching `Content-Type` header.
    #[must_use]
    pub fn multipart(mut self, body: MultipartBody) -> Self {
        let content_type = body.content_type();
        self.body = RequestBody::Multipart(body);
        self.header(http::header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}
