//! Parts of a multipart form and the sources backing their content.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use http::{HeaderName, HeaderValue};

use crate::{ContentType, Error, Result};

/// Where the bytes of a part come from.
///
/// Only [`PartSource::Bytes`] is held in memory. Files are opened when the
/// body reaches them, and readers are pulled from exactly once.
pub enum PartSource {
    /// In-memory buffer, can be read any number of times.
    Bytes(Bytes),
    /// File on disk, opened lazily and closed once its content is read.
    File(PathBuf),
    /// Single-pass byte stream.
    Reader(Box<dyn Read + Send>),
}

impl PartSource {
    /// Buffer-backed source.
    #[must_use]
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Self::Bytes(data.into())
    }

    /// File-backed source. The file is not touched until the body is read.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Stream-backed source.
    #[must_use]
    pub fn reader<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::Reader(Box::new(reader))
    }

    /// Returns `true` if the source can only be consumed once.
    #[must_use]
    pub const fn is_stream(&self) -> bool {
        matches!(self, Self::Reader(_))
    }

    /// The buffered content, if this source lives in memory.
    #[must_use]
    pub const fn buffered(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::File(_) | Self::Reader(_) => None,
        }
    }
}

impl fmt::Debug for PartSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<Bytes> for PartSource {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for PartSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl From<&'static [u8]> for PartSource {
    fn from(bytes: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for PartSource {
    fn from(text: String) -> Self {
        Self::Bytes(text.into())
    }
}

impl From<&Path> for PartSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

impl From<PathBuf> for PartSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

/// What kind of content a part carries; drives the strict-mode
/// `Content-Transfer-Encoding` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PartKind {
    Text,
    Binary,
}

/// A single named part of a multipart form.
///
/// Build parts with [`Part::text`], [`Part::bytes`], [`Part::file`],
/// [`Part::path`] or [`Part::reader`], then hand them to
/// [`MultipartEncoder::add_part`](crate::MultipartEncoder::add_part).
#[derive(Debug)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<ContentType>,
    explicit_content_type: bool,
    kind: PartKind,
    source: PartSource,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl Part {
    /// Create a binary part without content type or filename.
    #[must_use]
    pub fn new(name: impl Into<String>, source: impl Into<PartSource>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            explicit_content_type: false,
            kind: PartKind::Binary,
            source: source.into(),
            headers: Vec::new(),
        }
    }

    /// Create a UTF-8 text part.
    ///
    /// Sets the content type to `text/plain; charset=utf-8`.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            content_type: Some(ContentType::text_plain_utf8()),
            kind: PartKind::Text,
            ..Self::new(name, PartSource::bytes(value.into()))
        }
    }

    /// Create a text part encoded with the charset of `content_type`.
    pub fn text_with(
        name: impl Into<String>,
        value: &str,
        content_type: ContentType,
    ) -> Result<Self> {
        let data = content_type.encode_text(value)?;
        Ok(Self {
            content_type: Some(content_type),
            explicit_content_type: true,
            kind: PartKind::Text,
            ..Self::new(name, PartSource::Bytes(data))
        })
    }

    /// Create a binary part.
    ///
    /// Sets the content type to `application/octet-stream`.
    #[must_use]
    pub fn bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            content_type: Some(ContentType::octet_stream()),
            ..Self::new(name, PartSource::bytes(data))
        }
    }

    /// Create an in-memory file part with filename.
    ///
    /// The content type is guessed from the filename extension.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let filename = filename.into();
        Self {
            content_type: Some(ContentType::from_filename(&filename)),
            filename: Some(filename),
            ..Self::new(name, PartSource::bytes(data))
        }
    }

    /// Create a part streamed from a file on disk.
    ///
    /// The filename is the last path component and the content type is
    /// guessed from its extension. The file is opened only when the body
    /// is read.
    #[must_use]
    pub fn path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|file_name| file_name.to_string_lossy().into_owned());
        Self {
            content_type: Some(ContentType::from_filename(&path)),
            filename,
            ..Self::new(name, PartSource::File(path))
        }
    }

    /// Create a part backed by a single-pass reader.
    ///
    /// Sets the content type to `application/octet-stream`.
    #[must_use]
    pub fn reader<R>(name: impl Into<String>, reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self {
            content_type: Some(ContentType::octet_stream()),
            ..Self::new(name, PartSource::reader(reader))
        }
    }

    /// Set the filename for this part.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the content type for this part.
    ///
    /// An explicitly set content type is written in every mode.
    #[must_use]
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self.explicit_content_type = true;
        self
    }

    /// Append an extra header, written after the generated ones.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| Error::invalid_part(format!("header name '{name}': {err}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|err| Error::invalid_part(format!("header '{name}' value: {err}")))?;

        self.headers.push((header_name, header_value));
        Ok(self)
    }

    /// Get the part name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the filename, if set.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Get the content type, if set.
    #[must_use]
    pub const fn content_type(&self) -> Option<&ContentType> {
        self.content_type.as_ref()
    }

    /// Get the extra headers, in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    /// Get the content source.
    #[must_use]
    pub const fn source(&self) -> &PartSource {
        &self.source
    }

    pub(crate) const fn has_explicit_content_type(&self) -> bool {
        self.explicit_content_type
    }

    pub(crate) const fn kind(&self) -> PartKind {
        self.kind
    }

    pub(crate) fn has_header(&self, name: &HeaderName) -> bool {
        self.headers.iter().any(|(existing, _)| existing == name)
    }

    pub(crate) fn into_source(self) -> PartSource {
        self.source
    }

    /// Check the part can be framed without corrupting the body.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_part("part name must not be empty"));
        }
        if has_line_break(&self.name) {
            return Err(Error::invalid_part(format!(
                "part name {:?} contains a line break",
                self.name
            )));
        }
        if let Some(filename) = self.filename.as_deref().filter(|f| has_line_break(f)) {
            return Err(Error::invalid_part(format!(
                "filename {filename:?} contains a line break"
            )));
        }
        Ok(())
    }
}

fn has_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn part_text() {
        let part = Part::text("text1", "This is message 1");
        check!(part.name() == "text1");
        check!(part.source().buffered().map(Bytes::as_ref) == Some(&b"This is message 1"[..]));
        check!(part.content_type() == Some(&ContentType::text_plain_utf8()));
        check!(part.filename().is_none());
        check!(part.kind() == PartKind::Text);
        check!(!part.has_explicit_content_type());
    }

    #[test]
    fn part_text_with_charset() {
        let latin = ContentType::parse("text/plain; charset=ISO-8859-1").expect("latin");
        let part = Part::text_with("text", "café", latin).expect("encode");
        check!(part.source().buffered().map(Bytes::as_ref) == Some(&b"caf\xe9"[..]));
        check!(part.has_explicit_content_type());
    }

    #[test]
    fn part_bytes() {
        let part = Part::bytes("upfile", b"binary code".as_slice());
        check!(part.source().buffered().map(Bytes::as_ref) == Some(&b"binary code"[..]));
        check!(part.content_type() == Some(&ContentType::octet_stream()));
        check!(part.kind() == PartKind::Binary);
    }

    #[test]
    fn part_file_guesses_content_type() {
        let part = Part::file("upfile", "image.jpg", vec![0xFF, 0xD8, 0xFF]);
        check!(part.filename() == Some("image.jpg"));
        check!(part.content_type().map(ContentType::essence) == Some("image/jpeg"));
    }

    #[test]
    fn part_path_is_lazy() {
        let part = Part::path("upfile", "/does/not/exist/zipFile.zip");
        check!(part.filename() == Some("zipFile.zip"));
        check!(part.content_type().map(ContentType::essence) == Some("application/zip"));
        let_assert!(PartSource::File(path) = part.source());
        check!(path == Path::new("/does/not/exist/zipFile.zip"));
    }

    #[test]
    fn part_reader_is_stream() {
        let part = Part::reader("upstream", std::io::Cursor::new(vec![1, 2, 3]));
        check!(part.source().is_stream());
        check!(part.source().buffered().is_none());
        check!(format!("{:?}", part.source()) == "Reader(..)");
    }

    #[test]
    fn part_with_modifiers() {
        let part = Part::new("field", b"data".as_slice())
            .with_filename("custom.bin")
            .with_content_type(ContentType::parse("application/custom").expect("mime"))
            .with_header("X-Checksum", "abc")
            .expect("header");
        check!(part.filename() == Some("custom.bin"));
        check!(part.content_type().map(ContentType::essence) == Some("application/custom"));
        check!(part.has_explicit_content_type());
        check!(part.headers().len() == 1);
        check!(part.has_header(&HeaderName::from_static("x-checksum")));
    }

    #[test]
    fn part_rejects_bad_headers() {
        let err = Part::text("a", "b")
            .with_header("bad header", "v")
            .expect_err("space in name");
        check!(matches!(err, Error::InvalidPart(_)));

        let err = Part::text("a", "b")
            .with_header("X-Ok", "line\r\nbreak")
            .expect_err("crlf in value");
        check!(matches!(err, Error::InvalidPart(_)));
    }

    #[test]
    fn validate_rejects_unframeable_names() {
        check!(Part::text("", "v").validate().is_err());
        check!(Part::text("a\r\nb", "v").validate().is_err());
        check!(Part::file("ok", "evil\n.txt", "v").validate().is_err());
        check!(Part::text("ok", "line\r\nbreaks are fine in content").validate().is_ok());
    }
}
