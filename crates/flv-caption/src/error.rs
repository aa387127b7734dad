use flv::FlvError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("FLV error: {0}")]
    Flv(#[from] FlvError),

    /// Captions can only be spliced into AVC NALU tags.
    #[error("Unsupported tag for caption injection: {0}")]
    UnsupportedCodec(String),
}

impl From<std::io::Error> for CaptionError {
    fn from(error: std::io::Error) -> Self {
        CaptionError::Flv(FlvError::Io(error))
    }
}
