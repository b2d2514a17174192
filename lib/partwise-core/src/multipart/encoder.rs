//! Accumulates parts and freezes them into a [`MultipartBody`].

use std::path::PathBuf;

use tracing::{debug, warn};

use super::body::MultipartBody;
use super::boundary;
use super::part::{Part, PartSource};
use crate::{ContentType, Error, Result};

/// Attempts at drawing a boundary absent from buffered content.
const BOUNDARY_ATTEMPTS: usize = 8;

/// Which per-part headers the encoder writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Full RFC 7578 framing: `Content-Type` on every typed part,
    /// `Content-Transfer-Encoding`, RFC 2231 `filename*` for non-ASCII names.
    #[default]
    Strict,
    /// Mimics browsers: only `Content-Disposition`, plus `Content-Type` for
    /// file parts or when set explicitly. Filenames are sent as raw UTF-8.
    BrowserCompatible,
}

/// Builder for `multipart/form-data` bodies.
///
/// Parts are appended in order and written in that order. No I/O happens
/// while parts are added; file and stream content is read only when the
/// built body is consumed.
///
/// # Example
///
/// ```
/// use partwise_core::{ContentType, Mode, MultipartEncoder};
///
/// let mut encoder = MultipartEncoder::with_mode(Mode::BrowserCompatible);
/// encoder
///     .add_binary_body("upfile", b"binary code".to_vec(), ContentType::octet_stream(), "temp.txt")?
///     .add_text_body("text", "This is a multipart post", None)?;
///
/// let mut body = encoder.build()?;
/// assert!(body.content_type().starts_with("multipart/form-data; boundary="));
/// let bytes = body.to_bytes()?;
/// assert!(bytes.ends_with(format!("--{}--\r\n", body.boundary()).as_bytes()));
/// # Ok::<(), partwise_core::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct MultipartEncoder {
    mode: Mode,
    boundary: Option<String>,
    parts: Vec<Part>,
    built: bool,
}

impl MultipartEncoder {
    /// Create a strict encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with the given mode.
    #[must_use]
    pub fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Use a fixed boundary instead of a random one.
    ///
    /// `build()` fails with [`Error::BoundaryCollision`] if the boundary
    /// occurs inside buffered part content.
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Result<Self> {
        let boundary = boundary.into();
        boundary::validate(&boundary)?;
        self.boundary = Some(boundary);
        Ok(self)
    }

    /// Change the mode. Only allowed before the first part is added.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.ensure_open()?;
        if !self.parts.is_empty() {
            return Err(Error::invalid_state(
                "mode must be set before any part is added",
            ));
        }
        self.mode = mode;
        Ok(())
    }

    /// Append a part.
    pub fn add_part(&mut self, part: Part) -> Result<&mut Self> {
        self.ensure_open()?;
        part.validate()?;
        self.parts.push(part);
        Ok(self)
    }

    /// Append a part assembled from its pieces.
    pub fn add_part_with<I>(
        &mut self,
        name: &str,
        source: impl Into<PartSource>,
        content_type: ContentType,
        filename: Option<&str>,
        headers: I,
    ) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.ensure_open()?;
        let mut part = Part::new(name, source).with_content_type(content_type);
        if let Some(filename) = filename {
            part = part.with_filename(filename);
        }
        for (header_name, value) in headers {
            part = part.with_header(&header_name, &value)?;
        }
        self.add_part(part)
    }

    /// Append a text part without filename.
    ///
    /// The text is encoded with the charset of `content_type`, UTF-8 when
    /// none is given. Defaults to `text/plain; charset=utf-8`.
    pub fn add_text_body(
        &mut self,
        name: &str,
        text: &str,
        content_type: Option<ContentType>,
    ) -> Result<&mut Self> {
        self.ensure_open()?;
        let part = match content_type {
            Some(content_type) => Part::text_with(name, text, content_type)?,
            None => Part::text(name, text),
        };
        self.add_part(part)
    }

    /// Append a binary part (buffer, file path or reader) with a filename.
    pub fn add_binary_body(
        &mut self,
        name: &str,
        source: impl Into<PartSource>,
        content_type: ContentType,
        filename: impl Into<String>,
    ) -> Result<&mut Self> {
        let part = Part::new(name, source)
            .with_content_type(content_type)
            .with_filename(filename);
        self.add_part(part)
    }

    /// Append a file from disk, named after its last path component.
    pub fn add_file(&mut self, name: &str, path: impl Into<PathBuf>) -> Result<&mut Self> {
        self.add_part(Part::path(name, path))
    }

    /// Freeze the parts into a [`MultipartBody`].
    ///
    /// The encoder cannot be used for new parts afterwards.
    pub fn build(&mut self) -> Result<MultipartBody> {
        self.ensure_open()?;
        if self.parts.is_empty() {
            return Err(Error::EmptyBody);
        }

        let boundary = match self.boundary.as_deref() {
            Some(custom) if self.buffered_contains(custom) => {
                return Err(Error::BoundaryCollision);
            }
            Some(custom) => custom.to_string(),
            None => self.fresh_boundary()?,
        };
        self.boundary = None;

        self.built = true;
        let parts = std::mem::take(&mut self.parts);
        debug!(
            mode = ?self.mode,
            parts = parts.len(),
            %boundary,
            "built multipart body"
        );

        Ok(MultipartBody::new(boundary, self.mode, parts))
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Parts added so far (empty once built).
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Number of parts added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` if no part was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Returns `true` once [`build`](Self::build) succeeded.
    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.built
    }

    fn ensure_open(&self) -> Result<()> {
        if self.built {
            return Err(Error::invalid_state("encoder was already built"));
        }
        Ok(())
    }

    fn buffered_contains(&self, boundary: &str) -> bool {
        self.parts
            .iter()
            .filter_map(|part| part.source().buffered())
            .any(|content| boundary::occurs_in(boundary, content))
    }

    fn fresh_boundary(&self) -> Result<String> {
        for _ in 0..BOUNDARY_ATTEMPTS {
            let candidate = boundary::generate();
            if !self.buffered_contains(&candidate) {
                return Ok(candidate);
            }
            warn!(%candidate, "generated boundary found in part content, drawing another");
        }
        Err(Error::BoundaryCollision)
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn default_mode_is_strict() {
        check!(MultipartEncoder::new().mode() == Mode::Strict);
        check!(Mode::default() == Mode::Strict);
    }

    #[test]
    fn set_mode_before_parts() {
        let mut encoder = MultipartEncoder::new();
        encoder.set_mode(Mode::BrowserCompatible).expect("set mode");
        check!(encoder.mode() == Mode::BrowserCompatible);
    }

    #[test]
    fn set_mode_after_part_fails() {
        let mut encoder = MultipartEncoder::new();
        encoder.add_text_body("text", "hello", None).expect("add");

        let_assert!(Err(Error::InvalidState(_)) = encoder.set_mode(Mode::BrowserCompatible));
        check!(encoder.mode() == Mode::Strict);
    }

    #[test]
    fn build_without_parts_fails() {
        let mut encoder = MultipartEncoder::new();
        let_assert!(Err(Error::EmptyBody) = encoder.build());
        check!(!encoder.is_built());
    }

    #[test]
    fn add_after_build_fails() {
        let mut encoder = MultipartEncoder::new();
        encoder.add_text_body("text", "hello", None).expect("add");
        encoder.build().expect("build");

        check!(encoder.is_built());
        let_assert!(Err(Error::InvalidState(_)) = encoder.add_text_body("late", "x", None));
        let_assert!(Err(Error::InvalidState(_)) = encoder.add_part(Part::text("late", "x")));
        let_assert!(Err(Error::InvalidState(_)) = encoder.set_mode(Mode::Strict));
        let_assert!(Err(Error::InvalidState(_)) = encoder.build());
    }

    #[test]
    fn state_is_checked_before_part_contents() {
        let mut encoder = MultipartEncoder::new();
        encoder.add_text_body("text", "hello", None).expect("add");
        encoder.build().expect("build");

        let ebcdic = ContentType::parse("text/plain; charset=EBCDIC").expect("parse");
        let_assert!(
            Err(Error::InvalidState(_)) = encoder.add_text_body("late", "x", Some(ebcdic))
        );
        let_assert!(
            Err(Error::InvalidState(_)) = encoder.add_part_with(
                "late",
                b"x".as_slice(),
                ContentType::octet_stream(),
                None,
                [("bad header".to_string(), "v".to_string())],
            )
        );
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut encoder = MultipartEncoder::new();
        let_assert!(Err(Error::InvalidPart(_)) = encoder.add_text_body("", "x", None));
        check!(encoder.is_empty());
    }

    #[test]
    fn parts_keep_insertion_order_and_duplicates() {
        let mut encoder = MultipartEncoder::new();
        encoder
            .add_text_body("b", "1", None)
            .and_then(|e| e.add_text_body("a", "2", None))
            .and_then(|e| e.add_text_body("b", "3", None))
            .expect("add");

        let names: Vec<&str> = encoder.parts().iter().map(Part::name).collect();
        check!(names == ["b", "a", "b"]);
        check!(encoder.len() == 3);
    }

    #[test]
    fn add_part_with_sets_all_pieces() {
        let mut encoder = MultipartEncoder::new();
        encoder
            .add_part_with(
                "upfile",
                b"abc".to_vec(),
                ContentType::octet_stream(),
                Some("temp.txt"),
                [("X-Origin".to_string(), "test".to_string())],
            )
            .expect("add");

        let_assert!([part] = encoder.parts());
        check!(part.filename() == Some("temp.txt"));
        check!(part.content_type() == Some(&ContentType::octet_stream()));
        check!(part.headers().len() == 1);
    }

    #[test]
    fn add_text_body_uses_charset() {
        let mut encoder = MultipartEncoder::new();
        let latin = ContentType::parse("text/plain; charset=ISO-8859-1").expect("latin");
        encoder
            .add_text_body("text", "déjà", Some(latin))
            .expect("add");

        let_assert!([part] = encoder.parts());
        check!(part.source().buffered().map(bytes::Bytes::as_ref) == Some(&b"d\xe9j\xe0"[..]));
    }

    #[test]
    fn add_file_does_no_io() {
        let mut encoder = MultipartEncoder::new();
        encoder
            .add_file("upfile", "/definitely/missing/image.jpg")
            .expect("adding a missing file is fine");

        let_assert!([part] = encoder.parts());
        check!(part.filename() == Some("image.jpg"));
        check!(part.content_type().map(ContentType::essence) == Some("image/jpeg"));
    }

    #[test]
    fn custom_boundary_is_used() {
        let mut encoder = MultipartEncoder::new()
            .with_boundary("boundary123")
            .expect("boundary");
        encoder.add_text_body("field", "value", None).expect("add");

        let body = encoder.build().expect("build");
        check!(body.boundary() == "boundary123");
        check!(body.content_type() == "multipart/form-data; boundary=boundary123");
    }

    #[test]
    fn custom_boundary_collision_is_detected() {
        let mut encoder = MultipartEncoder::new()
            .with_boundary("boundary123")
            .expect("boundary");
        encoder
            .add_text_body("field", "prefix --boundary123 suffix", None)
            .expect("add");

        let_assert!(Err(Error::BoundaryCollision) = encoder.build());
        // The failed build leaves the encoder untouched
        let_assert!(Err(Error::BoundaryCollision) = encoder.build());
        check!(!encoder.is_built());
        check!(encoder.len() == 1);
    }

    #[test]
    fn invalid_custom_boundary_is_rejected() {
        let_assert!(Err(Error::InvalidBoundary(_)) = MultipartEncoder::new().with_boundary("a;b"));
    }

    #[test]
    fn random_boundary_avoids_content() {
        let mut encoder = MultipartEncoder::new();
        encoder
            .add_text_body("field", "----partwise-------partwise-", None)
            .expect("add");

        let body = encoder.build().expect("build");
        check!(body.boundary().starts_with("----partwise-"));
        check!(!"----partwise-------partwise-".contains(body.boundary()));
    }
}
