//! Multipart form data support for file uploads.
//!
//! [`MultipartEncoder`] collects named [`Part`]s and builds a
//! [`MultipartBody`]. The body is read lazily through a [`BodyReader`], so
//! large files and streams are never buffered whole.
//!
//! # Example
//!
//! ```
//! use partwise_core::{ContentType, Mode, MultipartEncoder, Part};
//!
//! let mut encoder = MultipartEncoder::with_mode(Mode::BrowserCompatible);
//! encoder
//!     .add_part(Part::file("upfile", "temp.txt", "file content"))?
//!     .add_text_body("text1", "This is message 1", None)?
//!     .add_text_body("text2", "This is message 2", None)?;
//!
//! let mut body = encoder.build()?;
//! let content_type = body.content_type();
//! let bytes = body.to_bytes()?;
//!
//! assert!(content_type.ends_with(body.boundary()));
//! assert!(String::from_utf8_lossy(&bytes).contains("name=\"text2\""));
//! # Ok::<(), partwise_core::Error>(())
//! ```

mod body;
mod boundary;
mod encoder;
mod frame;
mod part;

pub use body::{BodyReader, DEFAULT_CHUNK_SIZE, MultipartBody};
pub use encoder::{Mode, MultipartEncoder};
pub use part::{Part, PartSource};
