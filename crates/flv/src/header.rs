use std::fmt::Display;
use std::io::{self, Read};

use byteorder::{BigEndian, ReadBytesExt};
use tracing::debug;

use crate::error::FlvError;
use crate::framing::{CONTAINER_HEADER_SIZE, FLV_HEADER_SIZE};

const FLV_SIGNATURE: u32 = 0x464C56; // "FLV"
// DataOffset is a 32-bit header length field. In practice it is 9 for standard FLV.
// Extra header bytes are skipped only up to this bound.
const MAX_DATA_OFFSET: u32 = 64 * 1024;

const FLAG_AUDIO: u8 = 0b0000_0100;
const FLAG_VIDEO: u8 = 0b0000_0001;

// Struct representing the FLV header, 9 bytes in total
#[derive(Debug, Clone, PartialEq)]
pub struct FlvHeader {
    // The version of the FLV file format, 1 byte, usually 0x01
    pub version: u8,
    // Whether the FLV file contains audio data
    pub has_audio: bool,
    // Whether the FLV file contains video data
    pub has_video: bool,
    // Total size of the header, 4 bytes, always 0x09 on write
    pub data_offset: u32,
}

impl Display for FlvHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FLV Header: \n\
            Version: {}\n\
            Has Audio: {}\n\
            Has Video: {}\n\
            Data Offset: {}",
            self.version, self.has_audio, self.has_video, self.data_offset
        )
    }
}

impl FlvHeader {
    /// Creates a new `FlvHeader` with the specified audio and video flags.
    /// The version is always 0x01.
    pub fn new(has_audio: bool, has_video: bool) -> Self {
        FlvHeader {
            version: 0x01,
            has_audio,
            has_video,
            data_offset: FLV_HEADER_SIZE as u32,
        }
    }

    /// Bytes the header occupies in the stream, before `PreviousTagSize0`.
    ///
    /// A `DataOffset` below 9 reads as the standard 9-byte header.
    pub fn header_size(&self) -> usize {
        FLV_HEADER_SIZE + extra_header_bytes(self.data_offset)
    }

    pub fn flags(&self) -> u8 {
        let mut flags = 0u8;
        if self.has_audio {
            flags |= FLAG_AUDIO;
        }
        if self.has_video {
            flags |= FLAG_VIDEO;
        }
        flags
    }

    /// Parses the 9-byte FLV header from a byte stream.
    ///
    /// Only the signature is validated. Any extra header bytes announced by
    /// `DataOffset` are skipped, so the reader ends up positioned at
    /// `PreviousTagSize0`.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self, FlvError> {
        let signature = reader.read_u24::<BigEndian>()?;
        if signature != FLV_SIGNATURE {
            return Err(FlvError::InvalidSignature(signature));
        }

        let version = reader.read_u8()?;
        if version != 0x01 {
            debug!(version, "Unexpected FLV version, continuing");
        }

        let flags = reader.read_u8()?;
        let has_audio = (flags & FLAG_AUDIO) != 0;
        let has_video = (flags & FLAG_VIDEO) != 0;

        let data_offset = reader.read_u32::<BigEndian>()?;
        if data_offset < FLV_HEADER_SIZE as u32 {
            debug!(data_offset, "DataOffset below header size, reading as 9");
        } else if data_offset > MAX_DATA_OFFSET {
            debug!(data_offset, max = MAX_DATA_OFFSET, "DataOffset too large, skip capped");
        }

        let extra = extra_header_bytes(data_offset);
        if extra > 0 {
            let mut limited = reader.take(extra as u64);
            io::copy(&mut limited, &mut io::sink())?;
            if limited.limit() != 0 {
                return Err(FlvError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "Unexpected EOF while skipping extended FLV header bytes",
                )));
            }
        }

        Ok(FlvHeader {
            version,
            has_audio,
            has_video,
            data_offset,
        })
    }

    /// Serializes the header followed by a zero `PreviousTagSize0`.
    ///
    /// Only the standard 9-byte header is emitted; extended header bytes of a
    /// parsed stream are not preserved.
    pub fn encode(&self) -> [u8; CONTAINER_HEADER_SIZE] {
        let mut out = [0u8; CONTAINER_HEADER_SIZE];
        out[0] = b'F';
        out[1] = b'L';
        out[2] = b'V';
        out[3] = self.version;
        out[4] = self.flags();
        out[5..9].copy_from_slice(&(FLV_HEADER_SIZE as u32).to_be_bytes());
        out
    }
}

/// Extended header bytes between the 9-byte header and `PreviousTagSize0`.
fn extra_header_bytes(data_offset: u32) -> usize {
    (data_offset.min(MAX_DATA_OFFSET) as usize).saturating_sub(FLV_HEADER_SIZE)
}
