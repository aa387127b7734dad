//! Caption injection for FLV streams.
//!
//! Captions arrive as ready-made SEI NAL units from a [`CaptionRenderer`] and
//! are spliced into AVC access units without touching the coded pictures.
//!
//! ## Component Overview
//!
//! - `renderer`: the text to SEI interface
//! - `splice`: rebuilding one access unit with the caption in place
//! - `rewriter`: streaming a whole container with a caption schedule

mod error;
mod renderer;
mod rewriter;
mod splice;

pub use error::CaptionError;
pub use renderer::CaptionRenderer;
pub use rewriter::{CaptionCue, CaptionRewriter, RewriteConfig, RewriteStats};
pub use splice::inject_caption;
