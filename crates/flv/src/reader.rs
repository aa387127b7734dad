use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::buffer::TagBuffer;
use crate::error::FlvError;
use crate::framing::{self, PREV_TAG_SIZE_FIELD_SIZE, TAG_FOOTER_SIZE, TAG_HEADER_SIZE};
use crate::header::FlvHeader;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrevTagSizeMode {
    /// Ignore `PreviousTagSize` values (fastest, most tolerant).
    #[default]
    Ignore,
    /// Log mismatches but continue parsing.
    Warn,
    /// Treat any mismatch as an error.
    Strict,
}

/// Opens an FLV stream for reading. `None` or `-` selects standard input.
pub fn open_read(path: Option<&Path>) -> io::Result<FlvReader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = match path {
        Some(path) if path != Path::new("-") => Box::new(BufReader::new(File::open(path)?)),
        _ => Box::new(BufReader::new(io::stdin())),
    };
    Ok(FlvReader::new(reader))
}

/// Sequential reader of an FLV container: one header, then tags in order.
pub struct FlvReader<R> {
    reader: R,
    position: u64,
    prev_tag_size_mode: PrevTagSizeMode,
}

impl<R: Read> FlvReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            position: 0,
            prev_tag_size_mode: PrevTagSizeMode::default(),
        }
    }

    pub fn with_prev_tag_size_mode(mut self, mode: PrevTagSizeMode) -> Self {
        self.prev_tag_size_mode = mode;
        self
    }

    /// Byte offset of the next unread byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Reads the file header and `PreviousTagSize0`.
    pub fn read_header(&mut self) -> Result<FlvHeader, FlvError> {
        let header = FlvHeader::parse(&mut self.reader)?;
        let mut prev_tag_size = [0u8; PREV_TAG_SIZE_FIELD_SIZE];
        self.reader.read_exact(&mut prev_tag_size)?;
        self.position = (header.header_size() + PREV_TAG_SIZE_FIELD_SIZE) as u64;

        let prev_tag_size = framing::parse_prev_tag_size(prev_tag_size);
        if prev_tag_size != 0 {
            debug!(prev_tag_size, "Non-zero PreviousTagSize0");
        }
        debug!(
            has_audio = header.has_audio,
            has_video = header.has_video,
            version = header.version,
            "Read FLV header"
        );
        Ok(header)
    }

    /// Reads the next tag, including its trailing `PreviousTagSize`, into `tag`.
    ///
    /// Returns `Ok(false)` when the stream ends, cleanly or mid-tag. The
    /// buffer is left empty in that case; its allocation is kept.
    pub fn read_tag(&mut self, tag: &mut TagBuffer) -> Result<bool, FlvError> {
        tag.clear();

        let mut header = [0u8; TAG_HEADER_SIZE];
        if !read_or_eof(&mut self.reader, &mut header)? {
            return Ok(false);
        }
        let parsed = framing::parse_tag_header_bytes(header)?;

        let tag_size = TAG_HEADER_SIZE + parsed.data_size as usize;
        let total = tag_size + TAG_FOOTER_SIZE;
        tag.reserve(total);
        tag.data[..TAG_HEADER_SIZE].copy_from_slice(&header);
        if !read_or_eof(&mut self.reader, &mut tag.data[TAG_HEADER_SIZE..total])? {
            debug!(
                position = self.position,
                data_size = parsed.data_size,
                "Stream ended inside a tag"
            );
            return Ok(false);
        }
        tag.len = total;

        if let Some(prev_tag_size) = tag.prev_tag_size() {
            self.check_prev_tag_size(tag_size as u32, prev_tag_size)?;
        }

        trace!(
            tag_type = %parsed.tag_type,
            timestamp = parsed.timestamp_ms,
            data_size = parsed.data_size,
            position = self.position,
            "Read tag"
        );
        self.position += total as u64;
        Ok(true)
    }

    fn check_prev_tag_size(&self, expected: u32, got: u32) -> Result<(), FlvError> {
        if expected == got {
            return Ok(());
        }
        match self.prev_tag_size_mode {
            PrevTagSizeMode::Ignore => Ok(()),
            PrevTagSizeMode::Warn => {
                warn!(
                    expected,
                    got,
                    position = self.position,
                    "PreviousTagSize mismatch"
                );
                Ok(())
            }
            PrevTagSizeMode::Strict => Err(FlvError::PrevTagSizeMismatch { expected, got }),
        }
    }
}

/// `read_exact` that maps a short read to `Ok(false)`.
fn read_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}
