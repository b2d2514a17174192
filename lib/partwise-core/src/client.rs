//! HTTP client traits.
//!
//! [`HttpClient`] is the seam between request construction and the
//! transport. The `partwise` crate implements it on top of hyper; tests can
//! implement it with an in-memory fake.

use std::future::Future;

use http::Method;

use crate::{MultipartBody, Request, Response, Result};

/// Core HTTP client trait.
///
/// Implementations send the request body as it is read, so a
/// [`RequestBody::Multipart`](crate::RequestBody::Multipart) body is consumed
/// exactly once per call.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the buffered response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - reading a file or stream part fails
    /// - network or TLS errors
    /// - timeouts
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}

/// Extension trait for [`HttpClient`] with convenience methods.
pub trait HttpClientExt: HttpClient {
    /// Execute a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the request fails.
    fn get(&self, url: &str) -> impl Future<Output = Result<Response>> + Send {
        let request = url::Url::parse(url).map(|url| Request::builder(Method::GET, url).build());
        async move { self.execute(request?).await }
    }

    /// POST a multipart body.
    ///
    /// `Content-Type` carries the body boundary; `Content-Length` is sent
    /// when every part is buffered.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, a part fails to read, or the
    /// request fails.
    fn post_multipart(
        &self,
        url: &str,
        body: MultipartBody,
    ) -> impl Future<Output = Result<Response>> + Send {
        let request = url::Url::parse(url)
            .map(|url| Request::builder(Method::POST, url).multipart(body).build());
        async move { self.execute(request?).await }
    }
}

impl<T: HttpClient> HttpClientExt for T {}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert2::{check, let_assert};
    use bytes::Bytes;

    use super::*;
    use crate::{Error, MultipartEncoder, RequestBody};

    /// Reads the body the way a transport would and records what was sent.
    #[derive(Default)]
    struct RecordingClient {
        sent: Mutex<Vec<(Method, String, Option<String>, Bytes)>>,
    }

    impl HttpClient for RecordingClient {
        fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
            let (method, url, headers, body) = request.into_parts();
            let content_type = headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
                .map(|(_, value)| value.clone());
            let bytes = match body {
                RequestBody::Empty => Ok(Bytes::new()),
                RequestBody::Bytes(bytes) => Ok(bytes),
                RequestBody::Multipart(mut body) => body.to_bytes(),
            };
            let result = bytes.map(|bytes| {
                if let Ok(mut sent) = self.sent.lock() {
                    sent.push((method, url.to_string(), content_type, bytes));
                }
                Response::new(200, Vec::new(), Bytes::from("ok"))
            });
            async move { result }
        }
    }

    #[tokio::test]
    async fn get_builds_request() {
        let client = RecordingClient::default();
        let response = client.get("http://echo.example.com/").await.expect("get");

        check!(response.status() == 200);
        let sent = client.sent.lock().expect("lock");
        let_assert!([(method, url, None, body)] = sent.as_slice());
        check!(*method == Method::GET);
        check!(url == "http://echo.example.com/");
        check!(body.is_empty());
    }

    #[tokio::test]
    async fn post_multipart_sends_body_and_content_type() {
        let mut encoder = MultipartEncoder::new()
            .with_boundary("simple-boundary")
            .expect("boundary");
        encoder
            .add_text_body("text", "This is a multipart post", None)
            .expect("add");
        let body = encoder.build().expect("build");

        let client = RecordingClient::default();
        client
            .post_multipart("http://echo.example.com/upload", body)
            .await
            .expect("post");

        let sent = client.sent.lock().expect("lock");
        let_assert!([(method, _, Some(content_type), bytes)] = sent.as_slice());
        check!(*method == Method::POST);
        check!(content_type == "multipart/form-data; boundary=simple-boundary");
        check!(bytes.ends_with(b"--simple-boundary--\r\n"));
    }

    #[tokio::test]
    async fn invalid_url_is_reported() {
        let client = RecordingClient::default();
        let mut encoder = MultipartEncoder::new();
        encoder.add_text_body("text", "x", None).expect("add");

        let_assert!(
            Err(Error::InvalidUrl(_)) = client
                .post_multipart("not a url", encoder.build().expect("build"))
                .await
        );
        check!(client.sent.lock().expect("lock").is_empty());
    }
}
