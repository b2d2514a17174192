//! Prelude module for convenient imports.
//!
//! ```
//! use partwise::prelude::*;
//!
//! let client = HyperClient::new();
//! let encoder = MultipartEncoder::with_mode(Mode::Strict);
//! # drop((client, encoder));
//! ```

pub use crate::{
    ClientConfig, ContentType, Error, HttpClient, HttpClientExt, HyperClient, Method, Mode,
    MultipartBody, MultipartEncoder, Part, PartSource, Request, RequestBuilder, Response, Result,
    StatusCode, header,
};
