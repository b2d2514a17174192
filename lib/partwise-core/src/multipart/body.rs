//! Built multipart bodies and the lazy reader that serializes them.

use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace};

use super::boundary;
use super::encoder::Mode;
use super::frame;
use super::part::{Part, PartSource};
use crate::{Error, Result};

/// Default size of chunks yielded by [`BodyReader`] for file and stream parts.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A finalized `multipart/form-data` body.
///
/// Produced by [`MultipartEncoder::build`](crate::MultipartEncoder::build).
/// Call [`open`](Self::open) to get a [`BodyReader`] streaming the encoded
/// bytes. Bodies holding only buffers and file paths can be opened any
/// number of times; a body holding a stream part can be opened once.
pub struct MultipartBody {
    boundary: String,
    mode: Mode,
    parts: Vec<FrozenPart>,
    tail: Bytes,
    chunk_size: usize,
}

struct FrozenPart {
    name: String,
    head: Bytes,
    content: FrozenContent,
}

enum FrozenContent {
    Bytes(Bytes),
    File(PathBuf),
    Stream(Option<Box<dyn Read + Send>>),
}

impl MultipartBody {
    pub(crate) fn new(boundary: String, mode: Mode, parts: Vec<Part>) -> Self {
        let parts = parts
            .into_iter()
            .map(|part| {
                let head = frame::head(&boundary, mode, &part);
                let name = part.name().to_string();
                let content = match part.into_source() {
                    PartSource::Bytes(bytes) => FrozenContent::Bytes(bytes),
                    PartSource::File(path) => FrozenContent::File(path),
                    PartSource::Reader(reader) => FrozenContent::Stream(Some(reader)),
                };
                FrozenPart {
                    name,
                    head,
                    content,
                }
            })
            .collect();

        Self {
            tail: frame::tail(&boundary),
            boundary,
            mode,
            parts,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the size of chunks read from file and stream parts.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// The boundary delimiting parts.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> String {
        if boundary::needs_quoting(&self.boundary) {
            format!("multipart/form-data; boundary=\"{}\"", self.boundary)
        } else {
            format!("multipart/form-data; boundary={}", self.boundary)
        }
    }

    /// Mode the body was encoded with.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of parts.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Part names in body order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|part| part.name.as_str())
    }

    /// Returns `true` if the body can be opened again after a full read.
    #[must_use]
    pub fn is_repeatable(&self) -> bool {
        !self
            .parts
            .iter()
            .any(|part| matches!(part.content, FrozenContent::Stream(_)))
    }

    /// Encoded length in bytes, known when every part lives in memory.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        let mut total = self.tail.len();
        for part in &self.parts {
            let FrozenContent::Bytes(bytes) = &part.content else {
                return None;
            };
            total += part.head.len() + bytes.len() + frame::PART_END.len();
        }
        u64::try_from(total).ok()
    }

    /// Start reading the encoded body.
    ///
    /// Fails with [`Error::StreamExhausted`] if a stream part was taken by an
    /// earlier call. Nothing is consumed in that case.
    pub fn open(&mut self) -> Result<BodyReader> {
        if let Some(spent) = self
            .parts
            .iter()
            .find(|part| matches!(part.content, FrozenContent::Stream(None)))
        {
            return Err(Error::stream_exhausted(&spent.name));
        }

        let mut segments = VecDeque::with_capacity(self.parts.len() * 3 + 1);
        for part in &mut self.parts {
            segments.push_back(Segment::Bytes(part.head.clone()));
            let content = match &mut part.content {
                FrozenContent::Bytes(bytes) => Segment::Bytes(bytes.clone()),
                FrozenContent::File(path) => Segment::File {
                    name: part.name.clone(),
                    path: path.clone(),
                },
                FrozenContent::Stream(reader) => Segment::Stream {
                    name: part.name.clone(),
                    // Checked above: every stream is still present.
                    reader: reader.take().ok_or_else(|| Error::stream_exhausted(&part.name))?,
                },
            };
            segments.push_back(content);
            segments.push_back(Segment::Bytes(Bytes::from_static(frame::PART_END)));
        }
        segments.push_back(Segment::Bytes(self.tail.clone()));

        debug!(
            boundary = %self.boundary,
            parts = self.parts.len(),
            "opening multipart body"
        );

        Ok(BodyReader {
            segments,
            current: None,
            chunk_size: self.chunk_size,
            position: 0,
            failed: false,
        })
    }

    /// Read the whole encoded body into memory.
    pub fn to_bytes(&mut self) -> Result<Bytes> {
        let mut reader = self.open()?;
        let mut buf = BytesMut::new();
        for chunk in &mut reader {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl fmt::Debug for MultipartBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartBody")
            .field("boundary", &self.boundary)
            .field("mode", &self.mode)
            .field("parts", &self.parts.len())
            .field("repeatable", &self.is_repeatable())
            .finish_non_exhaustive()
    }
}

enum Segment {
    Bytes(Bytes),
    File { name: String, path: PathBuf },
    Stream { name: String, reader: Box<dyn Read + Send> },
}

enum Active {
    Bytes(Bytes),
    Reader {
        name: String,
        reader: Box<dyn Read + Send>,
    },
}

/// Lazy byte source over a [`MultipartBody`].
///
/// Implements [`Read`] for synchronous consumers and [`Iterator`] over
/// [`Bytes`] chunks for transports. Files are opened when their part is
/// reached and closed at the end of their content; dropping the reader
/// early closes whatever is still open.
pub struct BodyReader {
    segments: VecDeque<Segment>,
    current: Option<Active>,
    chunk_size: usize,
    position: u64,
    failed: bool,
}

impl BodyReader {
    /// Bytes produced so far.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Returns `true` once every byte of the body was produced.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.current.is_none() && self.segments.is_empty()
    }

    /// Move the next segment into `current`. Returns `false` at end of body.
    fn advance(&mut self) -> io::Result<bool> {
        let Some(segment) = self.segments.pop_front() else {
            return Ok(false);
        };

        self.current = Some(match segment {
            Segment::Bytes(bytes) => Active::Bytes(bytes),
            Segment::File { name, path } => {
                trace!(part = %name, path = %path.display(), "opening file part");
                let file = File::open(&path).map_err(|err| {
                    io::Error::new(
                        err.kind(),
                        format!("part '{name}': cannot open {}: {err}", path.display()),
                    )
                })?;
                Active::Reader {
                    name,
                    reader: Box::new(file),
                }
            }
            Segment::Stream { name, reader } => Active::Reader { name, reader },
        });
        Ok(true)
    }

    fn release_current(&mut self) {
        if let Some(Active::Reader { name, .. }) = self.current.take() {
            trace!(part = %name, "part source closed");
        }
    }

    fn fail(&mut self) {
        self.failed = true;
        self.current = None;
        self.segments.clear();
    }
}

impl Read for BodyReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.failed {
            return Ok(0);
        }

        loop {
            let read = match self.current.as_mut() {
                Some(Active::Bytes(bytes)) => {
                    let n = bytes.chunk().read(buf)?;
                    bytes.advance(n);
                    n
                }
                Some(Active::Reader { reader, .. }) => match reader.read(buf) {
                    Ok(n) => n,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => return Err(err),
                    Err(err) => {
                        self.fail();
                        return Err(err);
                    }
                },
                None => match self.advance() {
                    Ok(true) => continue,
                    Ok(false) => return Ok(0),
                    Err(err) => {
                        self.fail();
                        return Err(err);
                    }
                },
            };

            if read == 0 {
                self.release_current();
                continue;
            }
            self.position += read as u64;
            return Ok(read);
        }
    }
}

impl Iterator for BodyReader {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            match self.current.take() {
                Some(Active::Bytes(mut bytes)) => {
                    if bytes.is_empty() {
                        continue;
                    }
                    if bytes.len() > self.chunk_size {
                        let rest = bytes.split_off(self.chunk_size);
                        self.current = Some(Active::Bytes(rest));
                    }
                    self.position += bytes.len() as u64;
                    return Some(Ok(bytes));
                }
                Some(Active::Reader { name, mut reader }) => {
                    let mut buf = BytesMut::zeroed(self.chunk_size);
                    match reader.read(&mut buf) {
                        Ok(0) => {
                            trace!(part = %name, "part source closed");
                        }
                        Ok(n) => {
                            buf.truncate(n);
                            self.current = Some(Active::Reader { name, reader });
                            self.position += n as u64;
                            return Some(Ok(buf.freeze()));
                        }
                        Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                            self.current = Some(Active::Reader { name, reader });
                        }
                        Err(err) => {
                            debug!(part = %name, error = %err, "reading part failed");
                            self.fail();
                            return Some(Err(Error::Io(err)));
                        }
                    }
                }
                None => match self.advance() {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(err) => {
                        self.fail();
                        return Some(Err(Error::Io(err)));
                    }
                },
            }
        }
    }
}

impl Drop for BodyReader {
    fn drop(&mut self) {
        if !self.failed && !self.is_finished() {
            debug!(
                position = self.position,
                "multipart body reader dropped before end of body"
            );
        }
    }
}

impl fmt::Debug for BodyReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyReader")
            .field("position", &self.position)
            .field("remaining_segments", &self.segments.len())
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}
