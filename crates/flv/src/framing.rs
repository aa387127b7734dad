//! Wire-format constants and the fixed 11-byte tag header layout.

use byteorder::{BigEndian, ByteOrder};

use crate::error::FlvError;
use crate::tag::FlvTagType;

/// Size of the FLV file header without `PreviousTagSize0`.
pub const FLV_HEADER_SIZE: usize = 9;
pub const PREV_TAG_SIZE_FIELD_SIZE: usize = 4;
/// File header plus `PreviousTagSize0`.
pub const CONTAINER_HEADER_SIZE: usize = FLV_HEADER_SIZE + PREV_TAG_SIZE_FIELD_SIZE;
pub const TAG_HEADER_SIZE: usize = 11;
pub const TAG_FOOTER_SIZE: usize = PREV_TAG_SIZE_FIELD_SIZE;

pub const MAX_TAG_DATA_SIZE: u32 = 0xFF_FFFF;

/// Byte offsets inside a serialized tag.
pub(crate) mod offset {
    pub const TAG_TYPE: usize = 0;
    pub const DATA_SIZE: usize = 1;
    pub const TIMESTAMP: usize = 4;
    pub const TIMESTAMP_EXTENDED: usize = 7;
    pub const STREAM_ID: usize = 8;
    /// First byte after the tag header: sound format / frame type + codec id.
    pub const MEDIA_HEADER: usize = 11;
    /// AAC / AVC packet type.
    pub const PACKET_TYPE: usize = 12;
    pub const COMPOSITION_TIME: usize = 13;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTagHeader {
    pub tag_type: FlvTagType,
    pub is_filtered: bool,
    pub data_size: u32,
    pub timestamp_ms: u32,
    pub stream_id: u32,
}

pub fn parse_prev_tag_size(bytes: [u8; PREV_TAG_SIZE_FIELD_SIZE]) -> u32 {
    u32::from_be_bytes(bytes)
}

/// The timestamp is stored as UI24 followed by an extension byte holding bits 24..32.
pub(crate) fn read_timestamp(bytes: &[u8]) -> u32 {
    (u32::from(bytes[offset::TIMESTAMP_EXTENDED]) << 24)
        | BigEndian::read_u24(&bytes[offset::TIMESTAMP..offset::TIMESTAMP + 3])
}

pub(crate) fn write_timestamp(bytes: &mut [u8], timestamp_ms: u32) {
    BigEndian::write_u24(
        &mut bytes[offset::TIMESTAMP..offset::TIMESTAMP + 3],
        timestamp_ms & 0xFF_FFFF,
    );
    bytes[offset::TIMESTAMP_EXTENDED] = (timestamp_ms >> 24) as u8;
}

pub fn parse_tag_header_bytes(bytes: [u8; TAG_HEADER_SIZE]) -> Result<ParsedTagHeader, FlvError> {
    let tag_type_byte = bytes[offset::TAG_TYPE];
    let tag_type = FlvTagType::from(tag_type_byte & 0x1F);
    if let FlvTagType::Unknown(value) = tag_type {
        return Err(FlvError::UnknownTagType(value));
    }
    let is_filtered = (tag_type_byte & 0x20) != 0;

    let data_size = BigEndian::read_u24(&bytes[offset::DATA_SIZE..offset::DATA_SIZE + 3]);
    let timestamp_ms = read_timestamp(&bytes);
    let stream_id = BigEndian::read_u24(&bytes[offset::STREAM_ID..offset::STREAM_ID + 3]);

    Ok(ParsedTagHeader {
        tag_type,
        is_filtered,
        data_size,
        timestamp_ms,
        stream_id,
    })
}
