//! HTTP response handling.
//!
//! [`Response`] gives access to the status, the headers in the order the
//! server sent them, and the body with JSON/text decoding.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use partwise_core::Response;
//!
//! let headers = vec![
//!     ("Content-Type".to_string(), "text/plain".to_string()),
//!     ("Set-Cookie".to_string(), "a=1".to_string()),
//!     ("Set-Cookie".to_string(), "b=2".to_string()),
//! ];
//! let response = Response::new(200, headers, Bytes::from("ok"));
//!
//! assert_eq!(response.header_count(), 3);
//! assert_eq!(response.header_all("set-cookie").collect::<Vec<_>>(), ["a=1", "b=2"]);
//! assert_eq!(response.text()?, "ok");
//! # Ok::<(), partwise_core::Error>(())
//! ```

use bytes::Bytes;

use crate::{Error, Result};

/// HTTP response with status, ordered headers, and body.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    status: u16,
    headers: Vec<(String, String)>,
    body: B,
}

impl<B> Response<B> {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: Vec<(String, String)>, body: B) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers, in wire order. Repeated headers appear once per line.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Number of header lines.
    #[must_use]
    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    /// First header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All values of a header (case-insensitive), in wire order.
    pub fn header_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> B {
        self.body
    }

    /// Consume into (status, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (u16, Vec<(String, String)>, B) {
        (self.status, self.headers, self.body)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 3xx.
    #[must_use]
    pub const fn is_redirection(&self) -> bool {
        self.status >= 300 && self.status < 400
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Transform the body with a function.
    pub fn map_body<F, B2>(self, f: F) -> Response<B2>
    where
        F: FnOnce(B) -> B2,
    {
        Response {
            status: self.status,
            headers: self.headers,
            body: f(self.body),
        }
    }
}

impl Response<Bytes> {
    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JsonDeserialization`] with the failing path.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        from_json(&self.body)
    }

    /// Get the response body as text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|err| {
            Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
        })
    }

    /// Fail with [`Error::Http`] unless the status is 2xx.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] carrying the status and the body text.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = String::from_utf8_lossy(&self.body).into_owned();
        Err(Error::http(self.status, message))
    }
}

/// Deserialize JSON bytes, reporting the path of the failing field.
///
/// # Errors
///
/// Returns [`Error::JsonDeserialization`] if the bytes do not match `T`.
///
/// # Example
///
/// ```
/// use partwise_core::from_json;
///
/// let fields: Vec<String> = from_json(br#"["text1","text2"]"#)?;
/// assert_eq!(fields, ["text1", "text2"]);
/// # Ok::<(), partwise_core::Error>(())
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|err| Error::json_deserialization(err.path().to_string(), err.inner().to_string()))
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn response_basic() {
        let response = Response::new(
            200,
            headers(&[("Content-Type", "application/json")]),
            Bytes::from(r#"{"id":1}"#),
        );

        check!(response.status() == 200);
        check!(response.header("content-type") == Some("application/json"));
        check!(response.header_count() == 1);
        check!(response.is_success());
        check!(!response.is_client_error());
        check!(!response.is_server_error());
    }

    #[test]
    fn headers_keep_wire_order_and_duplicates() {
        let response = Response::new(
            200,
            headers(&[
                ("Date", "Mon, 19 Oct 2026 10:00:00 GMT"),
                ("Set-Cookie", "a=1"),
                ("Content-Length", "0"),
                ("set-cookie", "b=2"),
            ]),
            Bytes::new(),
        );

        check!(response.header_count() == 4);
        check!(response.header("SET-COOKIE") == Some("a=1"));
        check!(response.header_all("Set-Cookie").collect::<Vec<_>>() == ["a=1", "b=2"]);
        let names: Vec<&str> = response.headers().iter().map(|(name, _)| name.as_str()).collect();
        check!(names == ["Date", "Set-Cookie", "Content-Length", "set-cookie"]);
        check!(response.header("X-Missing").is_none());
    }

    #[test]
    fn response_status_checks() {
        check!(Response::new(301, Vec::new(), Bytes::new()).is_redirection());
        check!(Response::new(404, Vec::new(), Bytes::new()).is_client_error());
        check!(Response::new(500, Vec::new(), Bytes::new()).is_server_error());
    }

    #[test]
    fn response_json() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Echo {
            parts: usize,
            names: Vec<String>,
        }

        let body = Bytes::from(r#"{"parts":2,"names":["upfile","text"]}"#);
        let response = Response::new(200, Vec::new(), body);

        let echo: Echo = response.json().expect("deserialize");
        check!(
            echo == Echo {
                parts: 2,
                names: vec!["upfile".to_string(), "text".to_string()],
            }
        );
    }

    #[test]
    fn response_json_reports_path() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Echo {
            parts: usize,
        }

        let response = Response::new(200, Vec::new(), Bytes::from(r#"{"parts":"two"}"#));
        let_assert!(Err(Error::JsonDeserialization { path, .. }) = response.json::<Echo>());
        check!(path == "parts");
    }

    #[test]
    fn response_text() {
        let response = Response::new(200, Vec::new(), Bytes::from("Hello, World!"));
        check!(response.text().expect("text") == "Hello, World!");

        let response = Response::new(200, Vec::new(), Bytes::from_static(&[0xff, 0xfe]));
        let_assert!(Err(err) = response.text());
        check!(err.is_io());
    }

    #[test]
    fn error_for_status_keeps_body() {
        let response = Response::new(413, Vec::new(), Bytes::from("too large"));
        let_assert!(Err(err) = response.error_for_status());
        check!(err.status() == Some(413));
        check!(err.to_string().contains("too large"));

        let response = Response::new(201, Vec::new(), Bytes::new());
        check!(response.error_for_status().is_ok());
    }

    #[test]
    fn response_map_body() {
        let response = Response::new(200, Vec::new(), Bytes::from("test"));
        let mapped = response.map_body(|b| b.len());

        check!(mapped.status() == 200);
        check!(*mapped.body() == 4);
    }
}
