use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlvError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid FLV signature: 0x{0:06X}")]
    InvalidSignature(u32),

    #[error("Unknown tag type: {0}")]
    UnknownTagType(u8),

    #[error("PreviousTagSize mismatch (expected {expected}, got {got})")]
    PrevTagSizeMismatch { expected: u32, got: u32 },

    #[error("FLV tag data size ({0}) exceeds 24-bit limit")]
    TagTooLarge(usize),

    /// A NAL unit length prefix is truncated or runs past the end of the payload.
    #[error("Malformed NAL unit at payload offset {offset}: need {needed} bytes, {remaining} left")]
    MalformedNalu {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
}

impl FlvError {
    /// True if the error only means the stream ran out of bytes.
    pub fn is_eof(&self) -> bool {
        matches!(self, FlvError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}
