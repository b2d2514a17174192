//! Content types of multipart parts.

use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use mime::Mime;

use crate::{Error, Result};

/// MIME type (with optional parameters such as `charset`) of a single part.
///
/// Thin wrapper over [`mime::Mime`] with the values multipart uploads
/// commonly need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    mime: Mime,
}

impl ContentType {
    /// Wrap an already parsed MIME type.
    #[must_use]
    pub const fn new(mime: Mime) -> Self {
        Self { mime }
    }

    /// Parse a content type such as `application/zip` or `text/plain; charset=UTF-8`.
    pub fn parse(value: &str) -> Result<Self> {
        value
            .parse::<Mime>()
            .map(Self::new)
            .map_err(|err| Error::InvalidContentType(format!("'{value}': {err}")))
    }

    /// `application/octet-stream`, the default for binary parts.
    #[must_use]
    pub const fn octet_stream() -> Self {
        Self::new(mime::APPLICATION_OCTET_STREAM)
    }

    /// `text/plain` without a charset parameter.
    #[must_use]
    pub const fn text_plain() -> Self {
        Self::new(mime::TEXT_PLAIN)
    }

    /// `text/plain; charset=utf-8`, the default for text parts.
    #[must_use]
    pub const fn text_plain_utf8() -> Self {
        Self::new(mime::TEXT_PLAIN_UTF_8)
    }

    /// `multipart/form-data`.
    #[must_use]
    pub const fn multipart_form_data() -> Self {
        Self::new(mime::MULTIPART_FORM_DATA)
    }

    /// Guess the content type from a filename extension.
    ///
    /// Falls back to `application/octet-stream` for unknown or missing extensions.
    #[must_use]
    pub fn from_filename(filename: impl AsRef<Path>) -> Self {
        let extension = filename
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let essence = match extension.as_str() {
            // Images
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            "bmp" => "image/bmp",
            // Documents
            "pdf" => "application/pdf",
            "doc" => "application/msword",
            "xls" => "application/vnd.ms-excel",
            // Text
            "txt" => "text/plain",
            "html" | "htm" => "text/html",
            "css" => "text/css",
            "csv" => "text/csv",
            "md" => "text/markdown",
            "js" => "application/javascript",
            "json" => "application/json",
            "xml" => "application/xml",
            // Archives
            "zip" => "application/zip",
            "tar" => "application/x-tar",
            "gz" | "gzip" => "application/gzip",
            "7z" => "application/x-7z-compressed",
            // Audio/Video
            "mp3" => "audio/mpeg",
            "wav" => "audio/wav",
            "ogg" => "audio/ogg",
            "mp4" => "video/mp4",
            "webm" => "video/webm",
            _ => return Self::octet_stream(),
        };

        essence
            .parse()
            .map_or_else(|_| Self::octet_stream(), Self::new)
    }

    /// The wrapped MIME type.
    #[must_use]
    pub const fn mime(&self) -> &Mime {
        &self.mime
    }

    /// `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> &str {
        self.mime.essence_str()
    }

    /// The `charset` parameter, if any.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.mime.get_param(mime::CHARSET).map(|name| name.as_str())
    }

    /// Same type with the `charset` parameter set (other parameters are dropped).
    pub fn with_charset(&self, charset: &str) -> Result<Self> {
        Self::parse(&format!("{}; charset={charset}", self.essence()))
    }

    /// Returns `true` for `text/*` types.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.mime.type_() == mime::TEXT
    }

    /// Encode `text` with this content type's charset (UTF-8 when unset).
    ///
    /// `US-ASCII` and `ISO-8859-1` are supported besides UTF-8. Characters the
    /// charset cannot represent are rejected.
    pub fn encode_text(&self, text: &str) -> Result<Bytes> {
        let charset = self.charset().map(str::to_ascii_lowercase);

        match charset.as_deref() {
            None | Some("utf-8" | "utf8") => Ok(Bytes::copy_from_slice(text.as_bytes())),
            Some("us-ascii" | "ascii") => {
                if text.is_ascii() {
                    Ok(Bytes::copy_from_slice(text.as_bytes()))
                } else {
                    Err(Error::invalid_part("text is not representable in US-ASCII"))
                }
            }
            Some("iso-8859-1" | "latin1" | "latin-1") => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect::<Option<Vec<u8>>>()
                .map(Bytes::from)
                .ok_or_else(|| Error::invalid_part("text is not representable in ISO-8859-1")),
            Some(other) => Err(Error::UnsupportedCharset(other.to_string())),
        }
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::octet_stream()
    }
}

impl From<Mime> for ContentType {
    fn from(mime: Mime) -> Self {
        Self::new(mime)
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mime)
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn well_known_types() {
        check!(ContentType::octet_stream().to_string() == "application/octet-stream");
        check!(ContentType::text_plain().to_string() == "text/plain");
        check!(ContentType::multipart_form_data().essence() == "multipart/form-data");
        check!(ContentType::text_plain_utf8().charset() == Some("utf-8"));
        check!(ContentType::text_plain().charset().is_none());
    }

    #[test]
    fn parse_and_reject() {
        let zip = ContentType::parse("application/zip").expect("zip");
        check!(zip.essence() == "application/zip");
        check!(!zip.is_text());

        let err = ContentType::parse("not a mime").expect_err("should fail");
        check!(matches!(err, Error::InvalidContentType(_)));
    }

    #[test]
    fn with_charset_replaces_parameters() {
        let latin = ContentType::text_plain()
            .with_charset("ISO-8859-1")
            .expect("charset");
        check!(latin.essence() == "text/plain");
        check!(latin.charset().map(str::to_ascii_lowercase) == Some("iso-8859-1".to_string()));
    }

    #[test]
    fn encode_text_charsets() {
        let utf8 = ContentType::text_plain_utf8();
        check!(utf8.encode_text("héllo").expect("utf8").as_ref() == "héllo".as_bytes());

        // No charset parameter means UTF-8.
        let binary = ContentType::octet_stream();
        check!(binary.encode_text("é").expect("utf8").as_ref() == "é".as_bytes());

        let latin = ContentType::parse("text/plain; charset=ISO-8859-1").expect("latin");
        check!(latin.encode_text("héllo").expect("latin1").as_ref() == b"h\xe9llo");
        check!(latin.encode_text("€").is_err());

        let ascii = ContentType::parse("text/plain; charset=US-ASCII").expect("ascii");
        check!(ascii.encode_text("plain").expect("ascii").as_ref() == b"plain");
        check!(matches!(ascii.encode_text("é"), Err(Error::InvalidPart(_))));

        let ebcdic = ContentType::parse("text/plain; charset=IBM037").expect("ebcdic");
        check!(matches!(
            ebcdic.encode_text("x"),
            Err(Error::UnsupportedCharset(_))
        ));
    }

    #[test]
    fn from_filename_common() {
        check!(ContentType::from_filename("photo.jpg").essence() == "image/jpeg");
        check!(ContentType::from_filename("image.jpg").essence() == "image/jpeg");
        check!(ContentType::from_filename("zipFile.zip").essence() == "application/zip");
        check!(ContentType::from_filename("temp.txt").essence() == "text/plain");
        check!(ContentType::from_filename("data.json").essence() == "application/json");
        check!(ContentType::from_filename("unknown.xyz") == ContentType::octet_stream());
        check!(ContentType::from_filename("Makefile") == ContentType::octet_stream());
    }

    #[test]
    fn from_filename_case_insensitive() {
        check!(ContentType::from_filename("PHOTO.JPG").essence() == "image/jpeg");
        check!(ContentType::from_filename("/tmp/Image.PNG").essence() == "image/png");
    }
}
