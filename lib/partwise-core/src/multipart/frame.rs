//! Rendering of part delimiters and header blocks.

use bytes::{BufMut, Bytes, BytesMut};
use http::HeaderName;
use http::header::CONTENT_TYPE;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use super::Mode;
use super::part::{Part, PartKind};

/// Not among the `http` crate's well-known headers.
const CONTENT_TRANSFER_ENCODING: HeaderName =
    HeaderName::from_static("content-transfer-encoding");

/// RFC 5987 `attr-char`: everything outside it is percent-encoded in `filename*`.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Delimiter, headers and blank line that precede the content of `part`.
pub(crate) fn head(boundary: &str, mode: Mode, part: &Part) -> Bytes {
    let mut buf = BytesMut::new();

    buf.put_slice(b"--");
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(b"\r\n");

    put_disposition(&mut buf, mode, part);

    if let Some(content_type) = part.content_type() {
        let wanted = match mode {
            Mode::Strict => true,
            Mode::BrowserCompatible => {
                part.filename().is_some() || part.has_explicit_content_type()
            }
        };
        if wanted && !part.has_header(&CONTENT_TYPE) {
            buf.put_slice(b"Content-Type: ");
            buf.put_slice(content_type.to_string().as_bytes());
            buf.put_slice(b"\r\n");
        }
    }

    if mode == Mode::Strict && !part.has_header(&CONTENT_TRANSFER_ENCODING) {
        let encoding: &[u8] = match part.kind() {
            PartKind::Text => b"8bit",
            PartKind::Binary => b"binary",
        };
        buf.put_slice(b"Content-Transfer-Encoding: ");
        buf.put_slice(encoding);
        buf.put_slice(b"\r\n");
    }

    for (name, value) in part.headers() {
        buf.put_slice(name.as_str().as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(value.as_bytes());
        buf.put_slice(b"\r\n");
    }

    buf.put_slice(b"\r\n");
    buf.freeze()
}

/// Line ending that closes the content of every part.
pub(crate) const PART_END: &[u8] = b"\r\n";

/// Closing delimiter written after the last part.
pub(crate) fn tail(boundary: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(boundary.len() + 6);
    buf.put_slice(b"--");
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(b"--\r\n");
    buf.freeze()
}

fn put_disposition(buf: &mut BytesMut, mode: Mode, part: &Part) {
    buf.put_slice(b"Content-Disposition: form-data; name=\"");
    buf.put_slice(quote(mode, part.name()).as_bytes());
    buf.put_slice(b"\"");

    if let Some(filename) = part.filename() {
        buf.put_slice(b"; filename=\"");
        match mode {
            Mode::Strict if !filename.is_ascii() => {
                let fallback: String = filename
                    .chars()
                    .map(|c| if c.is_ascii() { c } else { '_' })
                    .collect();
                buf.put_slice(quote(mode, &fallback).as_bytes());
                buf.put_slice(b"\"; filename*=UTF-8''");
                buf.put_slice(utf8_percent_encode(filename, ATTR_CHAR).to_string().as_bytes());
            }
            Mode::Strict | Mode::BrowserCompatible => {
                buf.put_slice(quote(mode, filename).as_bytes());
                buf.put_slice(b"\"");
            }
        }
    }

    buf.put_slice(b"\r\n");
}

/// Escape a value for a quoted `Content-Disposition` parameter.
///
/// Strict mode uses RFC 822 quoted-pair escaping, browser mode follows what
/// browsers send and percent-encodes the double quote.
fn quote(mode: Mode, value: &str) -> String {
    match mode {
        Mode::Strict => value.replace('\\', "\\\\").replace('"', "\\\""),
        Mode::BrowserCompatible => value.replace('"', "%22"),
    }
}
