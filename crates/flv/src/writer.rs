use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::{debug, trace};

use crate::buffer::TagBuffer;
use crate::error::FlvError;
use crate::framing::{TAG_FOOTER_SIZE, TAG_HEADER_SIZE};
use crate::header::FlvHeader;

/// Opens an FLV stream for writing. `None` or `-` selects standard output.
pub fn open_write(path: Option<&Path>) -> io::Result<FlvWriter<Box<dyn Write>>> {
    let writer: Box<dyn Write> = match path {
        Some(path) if path != Path::new("-") => Box::new(BufWriter::new(File::create(path)?)),
        _ => Box::new(BufWriter::new(io::stdout())),
    };
    Ok(FlvWriter::new(writer))
}

/// Sequential writer of an FLV container.
pub struct FlvWriter<W: Write> {
    writer: W,
    bytes_written: u64,
    tags_written: u64,
}

impl<W: Write> FlvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            bytes_written: 0,
            tags_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn tags_written(&self) -> u64 {
        self.tags_written
    }

    /// Writes the 13-byte container header (file header plus `PreviousTagSize0`).
    pub fn write_header(&mut self, has_audio: bool, has_video: bool) -> Result<(), FlvError> {
        self.write_flv_header(&FlvHeader::new(has_audio, has_video))
    }

    pub fn write_flv_header(&mut self, header: &FlvHeader) -> Result<(), FlvError> {
        let bytes = header.encode();
        self.writer.write_all(&bytes)?;
        self.bytes_written += bytes.len() as u64;
        debug!(
            has_audio = header.has_audio,
            has_video = header.has_video,
            "Wrote FLV header"
        );
        Ok(())
    }

    /// Writes the tag header, its `DataSize` bytes and the trailing size.
    ///
    /// For a well-formed tag this is `header_length + payload_size + 4`.
    pub fn write_tag(&mut self, tag: &TagBuffer) -> Result<(), FlvError> {
        let size = TAG_HEADER_SIZE + tag.data_size() as usize + TAG_FOOTER_SIZE;
        let bytes = tag.as_bytes().get(..size).ok_or_else(|| {
            FlvError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Tag buffer holds {} bytes but its size fields describe {size}",
                    tag.len()
                ),
            ))
        })?;

        self.writer.write_all(bytes)?;
        self.bytes_written += size as u64;
        self.tags_written += 1;
        trace!(tag_type = %tag.tag_type(), size, "Wrote tag");
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), FlvError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and hands back the underlying stream.
    pub fn close(mut self) -> Result<W, FlvError> {
        self.writer.flush()?;
        debug!(
            tags = self.tags_written,
            bytes = self.bytes_written,
            "Closed FLV writer"
        );
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::FlvReader;
    use crate::video::VideoFrameType;
    use proptest::prelude::*;
    use std::io::Cursor;

    /// Accepts a fixed number of bytes, then refuses.
    struct LimitedSink {
        left: usize,
    }

    impl Write for LimitedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.left);
            self.left -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_header() {
        let mut writer = FlvWriter::new(Vec::new());
        writer.write_header(true, true).unwrap();
        let bytes = writer.close().unwrap();
        assert_eq!(bytes, vec![b'F', b'L', b'V', 1, 0x05, 0, 0, 0, 9, 0, 0, 0, 0]);
    }

    #[test]
    fn test_short_write_is_an_error() {
        let mut writer = FlvWriter::new(LimitedSink { left: 5 });
        assert!(writer.write_header(false, true).is_err());
    }

    #[test]
    fn test_write_tag_rejects_inconsistent_buffer() {
        let mut tag = TagBuffer::avc_access_unit(0, 0, VideoFrameType::KeyFrame).unwrap();
        tag.clear();
        let mut writer = FlvWriter::new(Vec::new());
        assert!(writer.write_tag(&tag).is_err());
    }

    #[test]
    fn test_write_tag_ignores_spare_capacity() {
        let mut tag = TagBuffer::avc_access_unit(0, 0, VideoFrameType::KeyFrame).unwrap();
        tag.append_nalu(&[0x65, 0x88]).unwrap();
        let mut writer = FlvWriter::new(Vec::new());
        writer.write_tag(&tag).unwrap();
        assert_eq!(writer.bytes_written(), (11 + 5 + 6 + 4) as u64);
        assert_eq!(writer.close().unwrap(), tag.as_bytes());
    }

    proptest! {
        #[test]
        fn prop_write_then_read_is_identical(
            timestamp in any::<u32>(),
            cts in -0x80_0000i32..0x80_0000,
            units in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..64), 0..6),
        ) {
            let mut tag =
                TagBuffer::avc_access_unit(timestamp, cts, VideoFrameType::InterFrame).unwrap();
            for unit in &units {
                tag.append_nalu(unit).unwrap();
            }

            let mut writer = FlvWriter::new(Vec::new());
            writer.write_header(false, true).unwrap();
            writer.write_tag(&tag).unwrap();
            let bytes = writer.close().unwrap();

            let mut reader = FlvReader::new(Cursor::new(bytes));
            reader.read_header().unwrap();
            let mut read_back = TagBuffer::new();
            prop_assert!(reader.read_tag(&mut read_back).unwrap());
            prop_assert_eq!(read_back.as_bytes(), tag.as_bytes());
            prop_assert_eq!(read_back.timestamp(), timestamp);
            prop_assert_eq!(read_back.composition_time(), cts);
        }
    }
}
