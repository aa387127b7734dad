//! AVC access units: building NALU tags and walking their length-prefixed NAL units.

use byteorder::{BigEndian, ByteOrder};
use tracing::trace;

use crate::buffer::TagBuffer;
use crate::error::FlvError;
use crate::framing::{MAX_TAG_DATA_SIZE, TAG_FOOTER_SIZE, TAG_HEADER_SIZE, offset};
use crate::tag::FlvTagType;
use crate::video::{AvcPacketType, NalUnitType, VideoCodecId, VideoFrameType};

/// Size of the NAL unit length prefix inside an AVC NALU payload.
pub const NALU_LENGTH_SIZE: usize = 4;
/// `FrameType|CodecID`, `AVCPacketType` and the 24-bit composition time.
pub const AVC_MEDIA_HEADER_SIZE: usize = 5;
/// Initial room for NAL units of a freshly built access unit.
const AVC_PREALLOC: usize = 2048;

impl TagBuffer {
    /// Creates an empty AVC NALU video tag.
    ///
    /// The buffer is preallocated for a typical access unit; appends still
    /// reserve what they need.
    pub fn avc_access_unit(
        dts: u32,
        cts: i32,
        frame_type: VideoFrameType,
    ) -> Result<Self, FlvError> {
        Self::avc_access_unit_raw(dts, cts, frame_type as u8)
    }

    /// Same as [`TagBuffer::avc_access_unit`] for a raw 4-bit frame type,
    /// including values outside [`VideoFrameType`].
    ///
    /// Command frames (5) carry no composition time, so their sub-header is
    /// two bytes and `DataSize` starts at 2 rather than 5.
    pub fn avc_access_unit_raw(dts: u32, cts: i32, frame_type: u8) -> Result<Self, FlvError> {
        let frame_type = frame_type & 0x0F;
        let mut tag = TagBuffer::with_capacity(
            TAG_HEADER_SIZE + AVC_MEDIA_HEADER_SIZE + TAG_FOOTER_SIZE + AVC_PREALLOC,
        );
        tag.data[offset::TAG_TYPE] = u8::from(FlvTagType::Video);
        tag.set_timestamp(dts);
        // StreamID stays zero.
        tag.data[offset::MEDIA_HEADER] = (frame_type << 4) | VideoCodecId::Avc as u8;
        tag.data[offset::PACKET_TYPE] = u8::from(AvcPacketType::Nalu);
        if frame_type == VideoFrameType::CommandFrame as u8 {
            tag.update_size(AVC_MEDIA_HEADER_SIZE - 3)?;
            return Ok(tag);
        }
        BigEndian::write_i24(
            &mut tag.data[offset::COMPOSITION_TIME..offset::COMPOSITION_TIME + 3],
            cts.clamp(-0x80_0000, 0x7F_FFFF),
        );
        tag.update_size(AVC_MEDIA_HEADER_SIZE)?;
        Ok(tag)
    }

    /// Appends one NAL unit with its 4-byte big-endian length prefix.
    ///
    /// The size fields are committed only after the bytes are in place; a
    /// unit that would overflow the 24-bit `DataSize` leaves the tag untouched.
    pub fn append_nalu(&mut self, nalu: &[u8]) -> Result<(), FlvError> {
        let data_size = self.data_size() as usize;
        let new_data_size = data_size + NALU_LENGTH_SIZE + nalu.len();
        if new_data_size > MAX_TAG_DATA_SIZE as usize {
            return Err(FlvError::TagTooLarge(new_data_size));
        }

        let start = TAG_HEADER_SIZE + data_size;
        self.reserve(TAG_HEADER_SIZE + new_data_size + TAG_FOOTER_SIZE);
        BigEndian::write_u32(
            &mut self.data[start..start + NALU_LENGTH_SIZE],
            nalu.len() as u32,
        );
        self.data[start + NALU_LENGTH_SIZE..start + NALU_LENGTH_SIZE + nalu.len()]
            .copy_from_slice(nalu);
        trace!(len = nalu.len(), data_size = new_data_size, "Appended NAL unit");
        self.update_size(new_data_size)
    }

    /// Iterates the length-prefixed NAL units of the payload.
    pub fn nalus(&self) -> NaluIter<'_> {
        NaluIter::new(self.payload())
    }
}

/// One NAL unit borrowed from an access unit, without its length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nalu<'a> {
    pub data: &'a [u8],
}

impl<'a> Nalu<'a> {
    /// Type from the low 5 bits of the first byte. An empty unit reads as type 0.
    pub fn nal_type(&self) -> NalUnitType {
        NalUnitType::from(self.data.first().copied().unwrap_or(0))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Walks `[u32 length][bytes]` records until the payload is exhausted.
///
/// A truncated prefix or a length running past the payload yields
/// [`FlvError::MalformedNalu`] once and ends the iteration.
pub struct NaluIter<'a> {
    payload: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> NaluIter<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            offset: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for NaluIter<'a> {
    type Item = Result<Nalu<'a>, FlvError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.payload.len() {
            return None;
        }

        let remaining = self.payload.len() - self.offset;
        if remaining < NALU_LENGTH_SIZE {
            self.failed = true;
            return Some(Err(FlvError::MalformedNalu {
                offset: self.offset,
                needed: NALU_LENGTH_SIZE,
                remaining,
            }));
        }

        let prefix = &self.payload[self.offset..self.offset + NALU_LENGTH_SIZE];
        let length = BigEndian::read_u32(prefix) as usize;
        let start = self.offset + NALU_LENGTH_SIZE;
        if length > self.payload.len() - start {
            self.failed = true;
            return Some(Err(FlvError::MalformedNalu {
                offset: self.offset,
                needed: NALU_LENGTH_SIZE + length,
                remaining,
            }));
        }

        self.offset = start + length;
        Some(Ok(Nalu {
            data: &self.payload[start..start + length],
        }))
    }
}
