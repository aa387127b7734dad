//! Streaming rewrite of a whole FLV container with scheduled captions.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::path::Path;

use flv::{FlvError, FlvReader, FlvWriter, PrevTagSizeMode, TagBuffer};
use tracing::{debug, info, warn};

use crate::error::CaptionError;
use crate::renderer::CaptionRenderer;
use crate::splice::inject_caption;

/// Initial tag buffer size; grows on demand.
const TAG_BUFFER_SIZE: usize = 64 * 1024;

/// Caption text due at a point of the video timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionCue {
    pub timestamp_ms: u32,
    pub text: String,
}

impl CaptionCue {
    pub fn new(timestamp_ms: u32, text: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RewriteConfig {
    /// How the trailing `PreviousTagSize` of input tags is checked.
    pub prev_tag_size_mode: PrevTagSizeMode,
    /// `(has_audio, has_video)` for the output header. Copied from the input when `None`.
    pub header_flags: Option<(bool, bool)>,
    /// Fail the rewrite on malformed NAL framing instead of passing the tag through.
    pub strict_nalu: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub tags: u64,
    pub video_tags: u64,
    pub captions_injected: u64,
    /// Tags a due caption could not be spliced into.
    pub tags_skipped: u64,
    pub bytes_written: u64,
}

/// Copies an FLV container tag by tag, splicing each caption cue into the
/// first AVC NALU tag at or after its timestamp.
pub struct CaptionRewriter<C> {
    renderer: C,
    config: RewriteConfig,
    cues: VecDeque<CaptionCue>,
}

impl<C: CaptionRenderer> CaptionRewriter<C> {
    pub fn new(renderer: C, config: RewriteConfig) -> Self {
        Self {
            renderer,
            config,
            cues: VecDeque::new(),
        }
    }

    /// Adds cues to the schedule. Cues are kept ordered by timestamp; equal
    /// timestamps keep their insertion order.
    pub fn with_cues(mut self, cues: impl IntoIterator<Item = CaptionCue>) -> Self {
        let mut all: Vec<_> = self.cues.drain(..).chain(cues).collect();
        all.sort_by_key(|cue| cue.timestamp_ms);
        self.cues = all.into();
        self
    }

    pub fn pending_cues(&self) -> usize {
        self.cues.len()
    }

    /// Rewrites between two paths; `None` or `-` selects stdin / stdout.
    pub fn run_paths(
        self,
        input: Option<&Path>,
        output: Option<&Path>,
    ) -> Result<RewriteStats, CaptionError> {
        let reader = flv::open_read(input)?;
        let writer = flv::open_write(output)?;
        self.rewrite(reader, writer)
    }

    pub fn run<R: Read, W: Write>(self, input: R, output: W) -> Result<RewriteStats, CaptionError> {
        self.rewrite(FlvReader::new(input), FlvWriter::new(output))
    }

    fn rewrite<R: Read, W: Write>(
        mut self,
        reader: FlvReader<R>,
        mut writer: FlvWriter<W>,
    ) -> Result<RewriteStats, CaptionError> {
        let mut reader = reader.with_prev_tag_size_mode(self.config.prev_tag_size_mode);
        let header = reader.read_header()?;
        let (has_audio, has_video) = self
            .config
            .header_flags
            .unwrap_or((header.has_audio, header.has_video));
        writer.write_header(has_audio, has_video)?;

        let mut stats = RewriteStats::default();
        let mut tag = TagBuffer::with_capacity(TAG_BUFFER_SIZE);

        // A short read is the end of the stream.
        while reader.read_tag(&mut tag)? {
            stats.tags += 1;
            if tag.is_video_tag() {
                stats.video_tags += 1;
                self.caption_tag(&mut tag, &mut stats)?;
            }
            writer.write_tag(&tag)?;
        }

        stats.bytes_written = writer.bytes_written();
        writer.close()?;

        if !self.cues.is_empty() {
            debug!(remaining = self.cues.len(), "Stream ended before all captions were due");
        }
        info!(
            tags = stats.tags,
            video_tags = stats.video_tags,
            captions = stats.captions_injected,
            skipped = stats.tags_skipped,
            bytes = stats.bytes_written,
            "Caption rewrite finished"
        );
        Ok(stats)
    }

    fn caption_tag(
        &mut self,
        tag: &mut TagBuffer,
        stats: &mut RewriteStats,
    ) -> Result<(), CaptionError> {
        let Some(cue) = self.cues.front() else {
            return Ok(());
        };
        if cue.timestamp_ms > tag.timestamp() {
            return Ok(());
        }
        if !tag.is_avc_nalu() {
            debug!(
                timestamp = tag.timestamp(),
                codec = ?tag.codec_id(),
                packet_type = ?tag.avc_packet_type(),
                "Video tag cannot carry a caption, passing through"
            );
            stats.tags_skipped += 1;
            return Ok(());
        }

        match inject_caption(tag, &cue.text, &self.renderer) {
            Ok(injected) => {
                if injected {
                    stats.captions_injected += 1;
                }
                debug!(
                    cue_ms = cue.timestamp_ms,
                    tag_ms = tag.timestamp(),
                    injected,
                    "Caption cue consumed"
                );
                self.cues.pop_front();
                Ok(())
            }
            Err(CaptionError::Flv(error @ FlvError::MalformedNalu { .. }))
                if !self.config.strict_nalu =>
            {
                warn!(
                    timestamp = tag.timestamp(),
                    %error,
                    "Malformed access unit, passing tag through"
                );
                stats.tags_skipped += 1;
                Ok(())
            }
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn renderer(text: &str) -> Bytes {
        Bytes::copy_from_slice(text.as_bytes())
    }

    #[test]
    fn test_cues_are_sorted() {
        let rewriter = CaptionRewriter::new(renderer, RewriteConfig::default())
            .with_cues([CaptionCue::new(500, "b"), CaptionCue::new(100, "a")])
            .with_cues([CaptionCue::new(300, "c"), CaptionCue::new(100, "d")]);
        let order: Vec<_> = rewriter.cues.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(order, vec!["a", "d", "c", "b"]);
        assert_eq!(rewriter.pending_cues(), 4);
    }
}
