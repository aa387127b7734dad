use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::audio::SoundFormat;
use crate::buffer::TagBuffer;
use crate::error::FlvError;
use crate::framing::{self, MAX_TAG_DATA_SIZE, TAG_FOOTER_SIZE, TAG_HEADER_SIZE, offset};
use crate::video::{AvcPacketType, VideoCodecId, VideoFrameType};

/// Field access for a serialized tag.
///
/// All accessors read through bounds-checked slices. Fields that lie beyond
/// the used length read as zero.
impl TagBuffer {
    fn byte_at(&self, index: usize) -> u8 {
        self.as_bytes().get(index).copied().unwrap_or(0)
    }

    fn u24_at(&self, index: usize) -> u32 {
        self.as_bytes()
            .get(index..index + 3)
            .map(BigEndian::read_u24)
            .unwrap_or(0)
    }

    /// Decodes the fixed tag header, if the buffer holds one.
    pub fn parsed_header(&self) -> Option<framing::ParsedTagHeader> {
        let mut header = [0u8; TAG_HEADER_SIZE];
        header.copy_from_slice(self.as_bytes().get(..TAG_HEADER_SIZE)?);
        framing::parse_tag_header_bytes(header).ok()
    }

    pub fn tag_type(&self) -> FlvTagType {
        FlvTagType::from(self.byte_at(offset::TAG_TYPE) & 0x1F)
    }

    /// Whether the payload is filtered/encrypted (Filter bit set in tag header).
    pub fn is_filtered(&self) -> bool {
        self.byte_at(offset::TAG_TYPE) & 0x20 != 0
    }

    /// The 24-bit `DataSize` field: payload length including the media sub-header.
    pub fn data_size(&self) -> u32 {
        self.u24_at(offset::DATA_SIZE)
    }

    pub fn timestamp(&self) -> u32 {
        match self.as_bytes().get(..TAG_HEADER_SIZE) {
            Some(header) => framing::read_timestamp(header),
            None => 0,
        }
    }

    pub fn set_timestamp(&mut self, timestamp_ms: u32) {
        self.reserve(TAG_HEADER_SIZE);
        framing::write_timestamp(&mut self.data, timestamp_ms);
    }

    pub fn stream_id(&self) -> u32 {
        self.u24_at(offset::STREAM_ID)
    }

    pub fn is_audio_tag(&self) -> bool {
        self.tag_type() == FlvTagType::Audio
    }

    pub fn is_video_tag(&self) -> bool {
        self.tag_type() == FlvTagType::Video
    }

    pub fn is_script_tag(&self) -> bool {
        self.tag_type() == FlvTagType::ScriptData
    }

    pub fn sound_format(&self) -> Option<SoundFormat> {
        if !self.is_audio_tag() {
            return None;
        }
        SoundFormat::try_from(self.byte_at(offset::MEDIA_HEADER) >> 4).ok()
    }

    pub fn codec_id(&self) -> Option<VideoCodecId> {
        if !self.is_video_tag() {
            return None;
        }
        VideoCodecId::try_from(self.byte_at(offset::MEDIA_HEADER) & 0x0F).ok()
    }

    pub fn frame_type(&self) -> Option<VideoFrameType> {
        if !self.is_video_tag() {
            return None;
        }
        VideoFrameType::try_from(self.byte_at(offset::MEDIA_HEADER) >> 4).ok()
    }

    /// The raw 4-bit `FrameType` of a video tag, known to [`VideoFrameType`] or not.
    pub fn frame_type_bits(&self) -> Option<u8> {
        if !self.is_video_tag() {
            return None;
        }
        Some(self.byte_at(offset::MEDIA_HEADER) >> 4)
    }

    pub fn avc_packet_type(&self) -> Option<AvcPacketType> {
        if self.codec_id() != Some(VideoCodecId::Avc) {
            return None;
        }
        Some(AvcPacketType::from(self.byte_at(offset::PACKET_TYPE)))
    }

    /// Signed 24-bit composition time offset of an AVC tag.
    ///
    /// Command frames do not carry the field and report zero.
    pub fn composition_time(&self) -> i32 {
        if !self.has_composition_time() {
            return 0;
        }
        self.as_bytes()
            .get(offset::COMPOSITION_TIME..offset::COMPOSITION_TIME + 3)
            .map(BigEndian::read_i24)
            .unwrap_or(0)
    }

    fn has_composition_time(&self) -> bool {
        self.codec_id() == Some(VideoCodecId::Avc)
            && self.frame_type() != Some(VideoFrameType::CommandFrame)
    }

    pub fn is_key_frame(&self) -> bool {
        self.frame_type() == Some(VideoFrameType::KeyFrame)
    }

    /// True for AVC tags whose payload is a stream of length-prefixed NAL units.
    pub fn is_avc_nalu(&self) -> bool {
        self.has_composition_time() && self.avc_packet_type() == Some(AvcPacketType::Nalu)
    }

    /// Length of the tag header plus the codec-specific media sub-header.
    ///
    /// - audio: one byte, two for AAC (`AACPacketType`)
    /// - AVC video: five bytes (`AVCPacketType` + composition time), two for command frames
    /// - other video codecs: one byte
    pub fn header_length(&self) -> usize {
        let media_header = match self.tag_type() {
            FlvTagType::Audio => match self.sound_format() {
                Some(SoundFormat::Aac) => 2,
                _ => 1,
            },
            FlvTagType::Video => match self.codec_id() {
                Some(VideoCodecId::Avc) => {
                    // CommandFrame does not have a compositionTime
                    if self.frame_type() == Some(VideoFrameType::CommandFrame) {
                        2
                    } else {
                        5
                    }
                }
                _ => 1,
            },
            _ => 0,
        };
        TAG_HEADER_SIZE + media_header
    }

    pub fn payload_size(&self) -> usize {
        (TAG_HEADER_SIZE + self.data_size() as usize).saturating_sub(self.header_length())
    }

    /// The codec payload following the media sub-header.
    pub fn payload(&self) -> &[u8] {
        let start = self.header_length();
        self.as_bytes()
            .get(start..start + self.payload_size())
            .unwrap_or(&[])
    }

    /// The trailing `PreviousTagSize` field, if present.
    pub fn prev_tag_size(&self) -> Option<u32> {
        let start = TAG_HEADER_SIZE + self.data_size() as usize;
        self.as_bytes()
            .get(start..start + TAG_FOOTER_SIZE)
            .map(BigEndian::read_u32)
    }

    /// Commits a new `DataSize`.
    ///
    /// Rewrites the 3-byte size field and the trailing `PreviousTagSize`
    /// (`data_size + 11`), and sets the used length to the full tag.
    pub fn update_size(&mut self, data_size: usize) -> Result<(), FlvError> {
        if data_size > MAX_TAG_DATA_SIZE as usize {
            return Err(FlvError::TagTooLarge(data_size));
        }

        let tag_size = TAG_HEADER_SIZE + data_size;
        self.reserve(tag_size + TAG_FOOTER_SIZE);
        BigEndian::write_u24(
            &mut self.data[offset::DATA_SIZE..offset::DATA_SIZE + 3],
            data_size as u32,
        );
        BigEndian::write_u32(
            &mut self.data[tag_size..tag_size + TAG_FOOTER_SIZE],
            tag_size as u32,
        );
        self.len = tag_size + TAG_FOOTER_SIZE;
        Ok(())
    }
}

/// FLV Tag Type
///
/// This is the type of the tag.
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - FLV tags)
/// - video_file_format_spec_v10_1.pdf (Annex E.4.1 - FLV Tag)
///
/// The 3 types that are supported are:
/// - Audio(8)
/// - Video(9)
/// - ScriptData(18)
///
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlvTagType {
    Audio = 8,
    Video = 9,
    ScriptData = 18,
    Unknown(u8),
}

impl From<u8> for FlvTagType {
    fn from(value: u8) -> Self {
        match value {
            8 => FlvTagType::Audio,
            9 => FlvTagType::Video,
            18 => FlvTagType::ScriptData,
            _ => FlvTagType::Unknown(value),
        }
    }
}

impl From<FlvTagType> for u8 {
    fn from(value: FlvTagType) -> Self {
        match value {
            FlvTagType::Audio => 8,
            FlvTagType::Video => 9,
            FlvTagType::ScriptData => 18,
            FlvTagType::Unknown(val) => val,
        }
    }
}

impl fmt::Display for FlvTagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlvTagType::Audio => write!(f, "Audio"),
            FlvTagType::Video => write!(f, "Video"),
            FlvTagType::ScriptData => write!(f, "Script"),
            FlvTagType::Unknown(value) => write!(f, "Unknown({value})"),
        }
    }
}
