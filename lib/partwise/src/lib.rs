//! Streaming `multipart/form-data` uploads for Rust.
//!
//! Build a body with [`MultipartEncoder`], then post it with [`HyperClient`].
//! File and stream parts are read while the request is written, so large
//! uploads never sit in memory.
//!
//! # Example
//!
//! ```no_run
//! use partwise::prelude::*;
//!
//! # async fn run() -> partwise::Result<()> {
//! let mut encoder = MultipartEncoder::with_mode(Mode::BrowserCompatible);
//! encoder
//!     .add_binary_body("upfile", b"binary code".to_vec(), ContentType::octet_stream(), "temp.txt")?
//!     .add_text_body("text", "This is a multipart post", None)?;
//!
//! let client = HyperClient::builder().with_logging().build();
//! let response = client
//!     .post_multipart("http://localhost:8080/echo", encoder.build()?)
//!     .await?;
//!
//! for (name, value) in response.headers() {
//!     println!("{name}: {value}");
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod connector;
pub mod middleware;
pub mod prelude;

pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use partwise_core::{
    BodyReader, ContentType, DEFAULT_CHUNK_SIZE, Error, HttpClient, HttpClientExt, Method, Mode,
    MultipartBody, MultipartEncoder, Part, PartSource, Request, RequestBody, RequestBuilder,
    Response, Result, from_json,
};

// Re-export http types for status codes and headers
pub use partwise_core::{StatusCode, header};

pub use url;
