//! Prelude module for convenient imports.
//!
//! ```
//! use partwise_core::prelude::*;
//!
//! let mut encoder = MultipartEncoder::with_mode(Mode::BrowserCompatible);
//! encoder.add_text_body("text", "hello", None)?;
//! # Ok::<(), Error>(())
//! ```

pub use crate::{
    ContentType, Error, HttpClient, HttpClientExt, Method, Mode, MultipartBody,
    MultipartEncoder, Part, PartSource, Request, RequestBody, RequestBuilder, Response, Result,
};
