use std::fmt;

/// FLV legacy `CodecID`, the low nibble of the first VIDEODATA byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodecId {
    SorensonH263 = 2,
    ScreenVideo = 3,
    On2Vp6 = 4,
    On2Vp6Alpha = 5,
    ScreenVideoV2 = 6,
    /// H.264, payload is a stream of length-prefixed NAL units.
    Avc = 7,
    LegacyHevc = 12,
}

impl TryFrom<u8> for VideoCodecId {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(VideoCodecId::SorensonH263),
            3 => Ok(VideoCodecId::ScreenVideo),
            4 => Ok(VideoCodecId::On2Vp6),
            5 => Ok(VideoCodecId::On2Vp6Alpha),
            6 => Ok(VideoCodecId::ScreenVideoV2),
            7 => Ok(VideoCodecId::Avc),
            12 => Ok(VideoCodecId::LegacyHevc),
            _ => Err(value),
        }
    }
}

/// FLV `FrameType`, the high nibble of the first VIDEODATA byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFrameType {
    KeyFrame = 1,
    InterFrame = 2,
    DisposableInterFrame = 3,
    GeneratedKeyFrame = 4,
    /// Video info/command frame. AVC command frames carry no composition time.
    CommandFrame = 5,
}

impl TryFrom<u8> for VideoFrameType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VideoFrameType::KeyFrame),
            2 => Ok(VideoFrameType::InterFrame),
            3 => Ok(VideoFrameType::DisposableInterFrame),
            4 => Ok(VideoFrameType::GeneratedKeyFrame),
            5 => Ok(VideoFrameType::CommandFrame),
            _ => Err(value),
        }
    }
}

/// `AVCPacketType`, the byte following the codec byte for AVC tags.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvcPacketType {
    SequenceHeader = 0,
    Nalu = 1,
    EndOfSequence = 2,
    Unknown(u8),
}

impl From<u8> for AvcPacketType {
    fn from(value: u8) -> Self {
        match value {
            0 => AvcPacketType::SequenceHeader,
            1 => AvcPacketType::Nalu,
            2 => AvcPacketType::EndOfSequence,
            _ => AvcPacketType::Unknown(value),
        }
    }
}

impl From<AvcPacketType> for u8 {
    fn from(value: AvcPacketType) -> Self {
        match value {
            AvcPacketType::SequenceHeader => 0,
            AvcPacketType::Nalu => 1,
            AvcPacketType::EndOfSequence => 2,
            AvcPacketType::Unknown(val) => val,
        }
    }
}

/// H.264 `nal_unit_type`, the low 5 bits of the first NAL unit byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalUnitType {
    NonIdrSlice = 1,
    IdrSlice = 5,
    /// Supplemental enhancement information
    Sei = 6,
    Sps = 7,
    Pps = 8,
    AccessUnitDelimiter = 9,
    EndOfSequence = 10,
    Filler = 12,
    Other(u8),
}

impl From<u8> for NalUnitType {
    fn from(value: u8) -> Self {
        match value & 0x1F {
            1 => NalUnitType::NonIdrSlice,
            5 => NalUnitType::IdrSlice,
            6 => NalUnitType::Sei,
            7 => NalUnitType::Sps,
            8 => NalUnitType::Pps,
            9 => NalUnitType::AccessUnitDelimiter,
            10 => NalUnitType::EndOfSequence,
            12 => NalUnitType::Filler,
            other => NalUnitType::Other(other),
        }
    }
}

impl From<NalUnitType> for u8 {
    fn from(value: NalUnitType) -> Self {
        match value {
            NalUnitType::NonIdrSlice => 1,
            NalUnitType::IdrSlice => 5,
            NalUnitType::Sei => 6,
            NalUnitType::Sps => 7,
            NalUnitType::Pps => 8,
            NalUnitType::AccessUnitDelimiter => 9,
            NalUnitType::EndOfSequence => 10,
            NalUnitType::Filler => 12,
            NalUnitType::Other(val) => val,
        }
    }
}

impl fmt::Display for NalUnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NalUnitType::NonIdrSlice => write!(f, "NonIDR"),
            NalUnitType::IdrSlice => write!(f, "IDR"),
            NalUnitType::Sei => write!(f, "SEI"),
            NalUnitType::Sps => write!(f, "SPS"),
            NalUnitType::Pps => write!(f, "PPS"),
            NalUnitType::AccessUnitDelimiter => write!(f, "AUD"),
            NalUnitType::EndOfSequence => write!(f, "EOS"),
            NalUnitType::Filler => write!(f, "Filler"),
            NalUnitType::Other(value) => write!(f, "Other({value})"),
        }
    }
}
