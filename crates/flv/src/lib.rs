//! FLV container codec working on serialized tags.
//!
//! Tags are kept in their wire form inside a [`TagBuffer`]; header fields are
//! read and rewritten in place through named accessors. AVC access units can
//! be built from scratch and walked as length-prefixed NAL units.

pub mod audio;
pub mod avc;
pub mod buffer;
pub mod error;
pub mod framing;
pub mod header;
pub mod reader;
pub mod tag;
pub mod video;
pub mod writer;

pub use avc::{Nalu, NaluIter};
pub use buffer::TagBuffer;
pub use error::FlvError;
pub use header::FlvHeader;
pub use reader::{FlvReader, PrevTagSizeMode, open_read};
pub use tag::FlvTagType;
pub use video::{NalUnitType, VideoFrameType};
pub use writer::{FlvWriter, open_write};
