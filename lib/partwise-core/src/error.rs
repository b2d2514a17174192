//! Error types for partwise.
//!
//! Errors fall into three groups:
//! - usage errors: the request was put together incorrectly (mutating a built
//!   encoder, an empty body, a stream part read twice, ...);
//! - I/O errors: a file or stream backing a part failed while the body was read;
//! - transport errors: the HTTP exchange itself failed.

use derive_more::{Display, Error, From};

/// Main error type for partwise operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    // ------------------------------------------------------------------------
    // Encoder usage
    // ------------------------------------------------------------------------
    /// The encoder was mutated in a state that does not allow it.
    #[display("invalid encoder state: {_0}")]
    #[from(skip)]
    InvalidState(#[error(not(source))] String),

    /// `build()` was called on an encoder without parts.
    #[display("multipart body has no parts")]
    #[from(skip)]
    EmptyBody,

    /// A part could not be accepted (empty name, bad header, unencodable text).
    #[display("invalid part: {_0}")]
    #[from(skip)]
    InvalidPart(#[error(not(source))] String),

    /// A caller-supplied boundary breaks RFC 2046 rules.
    #[display("invalid boundary: {_0}")]
    #[from(skip)]
    InvalidBoundary(#[error(not(source))] String),

    /// A caller-supplied boundary occurs inside buffered part content.
    #[display("boundary occurs inside part content")]
    #[from(skip)]
    BoundaryCollision,

    /// The requested text charset cannot be encoded.
    #[display("unsupported charset: {_0}")]
    #[from(skip)]
    UnsupportedCharset(#[error(not(source))] String),

    /// A MIME type could not be parsed.
    #[display("invalid content type: {_0}")]
    #[from(skip)]
    InvalidContentType(#[error(not(source))] String),

    /// A stream-backed part was already consumed by an earlier read of the body.
    #[display("stream for part '{name}' was already consumed")]
    #[from(skip)]
    StreamExhausted {
        /// Name of the part whose stream is gone.
        name: String,
    },

    // ------------------------------------------------------------------------
    // Environment
    // ------------------------------------------------------------------------
    /// Reading a file or stream backing a part failed.
    #[display("I/O error: {_0}")]
    #[from]
    Io(std::io::Error),

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------
    /// HTTP-level errors (non-2xx status codes).
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "form.upfile").
        path: String,
        /// Error message.
        message: String,
    },
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Create an invalid part error.
    #[must_use]
    pub fn invalid_part(message: impl Into<String>) -> Self {
        Self::InvalidPart(message.into())
    }

    /// Create an invalid boundary error.
    #[must_use]
    pub fn invalid_boundary(message: impl Into<String>) -> Self {
        Self::InvalidBoundary(message.into())
    }

    /// Create a stream exhausted error for the given part.
    #[must_use]
    pub fn stream_exhausted(name: impl Into<String>) -> Self {
        Self::StreamExhausted { name: name.into() }
    }

    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if the error comes from building the request incorrectly.
    ///
    /// These are programmer errors: retrying the same call will fail the same way.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidState(_)
                | Self::EmptyBody
                | Self::InvalidPart(_)
                | Self::InvalidBoundary(_)
                | Self::BoundaryCollision
                | Self::UnsupportedCharset(_)
                | Self::InvalidContentType(_)
                | Self::StreamExhausted { .. }
        )
    }

    /// Returns `true` if a file or stream backing a part failed to read.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(inner) => inner,
            other => Self::other(other),
        }
    }
}
