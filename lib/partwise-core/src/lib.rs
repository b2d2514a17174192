//! Core types for partwise: a streaming `multipart/form-data` encoder and the
//! HTTP exchange types it plugs into.
//!
//! This crate provides:
//! - [`MultipartEncoder`] - accumulates [`Part`]s and builds a [`MultipartBody`]
//! - [`MultipartBody`] and [`BodyReader`] - lazy, chunked body serialization
//! - [`ContentType`] - MIME type with charset handling for text parts
//! - [`Request`], [`RequestBuilder`] and [`Response`] - HTTP exchange types
//! - [`HttpClient`] and [`HttpClientExt`] - the transport seam
//! - [`Error`] and [`Result`] - error handling
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//!
//! use partwise_core::{ContentType, MultipartEncoder, Part};
//!
//! let mut encoder = MultipartEncoder::new();
//! encoder
//!     .add_part(Part::file("upfile", "temp.txt", "file content"))?
//!     .add_text_body("text1", "This is message 1", None)?
//!     .add_text_body("text2", "This is message 2", Some(ContentType::text_plain_utf8()))?;
//!
//! let mut body = encoder.build()?;
//! let mut wire = String::new();
//! body.open()?.read_to_string(&mut wire)?;
//!
//! assert!(wire.contains("name=\"upfile\"; filename=\"temp.txt\""));
//! assert_eq!(body.content_length(), Some(wire.len() as u64));
//! # Ok::<(), partwise_core::Error>(())
//! ```

mod client;
mod content_type;
mod error;
mod multipart;
pub mod prelude;
mod request;
mod response;

pub use client::{HttpClient, HttpClientExt};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use multipart::{
    BodyReader, DEFAULT_CHUNK_SIZE, Mode, MultipartBody, MultipartEncoder, Part, PartSource,
};
pub use request::{Request, RequestBody, RequestBuilder};
pub use response::{Response, from_json};

// Re-export http crate types for methods, status codes and headers
pub use http::{Method, StatusCode, header};
