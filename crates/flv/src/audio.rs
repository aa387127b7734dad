/// FLV `SoundFormat`, the high nibble of the first AUDIODATA byte.
///
/// Defined by video_file_format_spec_v10_1.pdf (Annex E.4.2.1 - AUDIODATA).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundFormat {
    LinearPcmPlatformEndian = 0,
    Adpcm = 1,
    Mp3 = 2,
    LinearPcmLittleEndian = 3,
    Nellymoser16KhzMono = 4,
    Nellymoser8KhzMono = 5,
    Nellymoser = 6,
    G711ALaw = 7,
    G711MuLaw = 8,
    /// AAC carries an extra `AACPacketType` byte.
    Aac = 10,
    Speex = 11,
    Mp38Khz = 14,
    DeviceSpecific = 15,
}

impl TryFrom<u8> for SoundFormat {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SoundFormat::LinearPcmPlatformEndian),
            1 => Ok(SoundFormat::Adpcm),
            2 => Ok(SoundFormat::Mp3),
            3 => Ok(SoundFormat::LinearPcmLittleEndian),
            4 => Ok(SoundFormat::Nellymoser16KhzMono),
            5 => Ok(SoundFormat::Nellymoser8KhzMono),
            6 => Ok(SoundFormat::Nellymoser),
            7 => Ok(SoundFormat::G711ALaw),
            8 => Ok(SoundFormat::G711MuLaw),
            10 => Ok(SoundFormat::Aac),
            11 => Ok(SoundFormat::Speex),
            14 => Ok(SoundFormat::Mp38Khz),
            15 => Ok(SoundFormat::DeviceSpecific),
            _ => Err(value),
        }
    }
}
