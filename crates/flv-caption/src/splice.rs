//! Splicing a caption SEI into an AVC access unit.

use flv::{NalUnitType, TagBuffer};
use tracing::{debug, trace};

use crate::error::CaptionError;
use crate::renderer::CaptionRenderer;

/// Injects the rendered caption for `text` into an AVC NALU tag.
///
/// The SEI goes right before the first NAL unit that is not an access unit
/// delimiter, or at the end when there is no such unit. Every original unit
/// is copied unchanged and in order. The tag is rebuilt in fresh storage and
/// swapped in only once the new access unit is complete.
///
/// Returns `Ok(false)` without touching the tag when the renderer produces
/// nothing. Tags other than AVC NALU tags, and AVC command frames, are
/// rejected with [`CaptionError::UnsupportedCodec`], also untouched. Frame
/// types outside the known set are carried over as-is.
pub fn inject_caption<R>(
    tag: &mut TagBuffer,
    text: &str,
    renderer: &R,
) -> Result<bool, CaptionError>
where
    R: CaptionRenderer + ?Sized,
{
    let frame_type = match tag.frame_type_bits() {
        Some(frame_type) if tag.is_avc_nalu() => frame_type,
        _ => return Err(CaptionError::UnsupportedCodec(describe(tag))),
    };

    let record = renderer.render(text);
    if record.is_empty() {
        debug!(timestamp = tag.timestamp(), "Caption rendered empty, tag left as is");
        return Ok(false);
    }

    let mut rebuilt =
        TagBuffer::avc_access_unit_raw(tag.timestamp(), tag.composition_time(), frame_type)?;
    let mut pending = Some(&record[..]);

    for nalu in tag.nalus() {
        let nalu = nalu?;
        if nalu.nal_type() != NalUnitType::AccessUnitDelimiter
            && let Some(sei) = pending.take()
        {
            rebuilt.append_nalu(sei)?;
        }
        rebuilt.append_nalu(nalu.data)?;
    }

    // Empty access unit or delimiters only.
    if let Some(sei) = pending.take() {
        rebuilt.append_nalu(sei)?;
    }

    trace!(
        timestamp = tag.timestamp(),
        sei_len = record.len(),
        data_size = rebuilt.data_size(),
        "Spliced caption into access unit"
    );
    tag.replace(rebuilt);
    Ok(true)
}

fn describe(tag: &TagBuffer) -> String {
    format!(
        "{} tag (codec {:?}, packet type {:?}, frame type {:?})",
        tag.tag_type(),
        tag.codec_id(),
        tag.avc_packet_type(),
        tag.frame_type_bits()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use flv::{FlvError, VideoFrameType};
    use std::cell::Cell;

    const SEI: &[u8] = &[0x06, 0x04, 0x02, 0xB5, 0x00, 0x80];

    fn sei_renderer(_text: &str) -> Bytes {
        Bytes::from_static(SEI)
    }

    fn empty_renderer(_text: &str) -> Bytes {
        Bytes::new()
    }

    fn access_unit(units: &[&[u8]]) -> TagBuffer {
        let mut tag = TagBuffer::avc_access_unit(3_000, 80, VideoFrameType::KeyFrame).unwrap();
        for unit in units {
            tag.append_nalu(unit).unwrap();
        }
        tag
    }

    fn unit_types(tag: &TagBuffer) -> Vec<u8> {
        tag.nalus().map(|n| u8::from(n.unwrap().nal_type())).collect()
    }

    fn unit_data(tag: &TagBuffer) -> Vec<Vec<u8>> {
        tag.nalus().map(|n| n.unwrap().data.to_vec()).collect()
    }

    const AUD: &[u8] = &[0x09, 0xF0];
    const SPS: &[u8] = &[0x67, 0x64, 0x00, 0x1F];
    const PPS: &[u8] = &[0x68, 0xEE, 0x3C, 0x80];
    const IDR: &[u8] = &[0x65, 0x88, 0x84, 0x00, 0x33];

    #[test]
    fn test_caption_goes_after_delimiter() {
        let mut tag = access_unit(&[AUD, SPS, PPS, IDR]);
        assert!(inject_caption(&mut tag, "HELLO", &sei_renderer).unwrap());

        assert_eq!(unit_types(&tag), vec![9, 6, 7, 8, 5]);
        assert_eq!(
            unit_data(&tag),
            vec![AUD.to_vec(), SEI.to_vec(), SPS.to_vec(), PPS.to_vec(), IDR.to_vec()]
        );
        assert_eq!(tag.timestamp(), 3_000);
        assert_eq!(tag.composition_time(), 80);
        assert!(tag.is_key_frame());
        let data_size = 5 + [AUD, SEI, SPS, PPS, IDR].iter().map(|u| 4 + u.len()).sum::<usize>();
        assert_eq!(tag.data_size() as usize, data_size);
        assert_eq!(tag.prev_tag_size(), Some(data_size as u32 + 11));
    }

    #[test]
    fn test_caption_without_delimiter_goes_first() {
        let mut tag = access_unit(&[IDR]);
        assert!(inject_caption(&mut tag, "HELLO", &sei_renderer).unwrap());
        assert_eq!(unit_types(&tag), vec![6, 5]);
    }

    #[test]
    fn test_caption_after_all_leading_delimiters() {
        let mut tag = access_unit(&[AUD, AUD, &[0x41, 0x9A]]);
        assert!(inject_caption(&mut tag, "HELLO", &sei_renderer).unwrap());
        assert_eq!(unit_types(&tag), vec![9, 9, 6, 1]);
    }

    #[test]
    fn test_caption_is_inserted_once() {
        let mut tag = access_unit(&[AUD, IDR, AUD, IDR]);
        assert!(inject_caption(&mut tag, "HELLO", &sei_renderer).unwrap());
        assert_eq!(unit_types(&tag), vec![9, 6, 5, 9, 5]);
    }

    #[test]
    fn test_delimiter_only_access_unit() {
        let mut tag = access_unit(&[AUD]);
        assert!(inject_caption(&mut tag, "HELLO", &sei_renderer).unwrap());
        assert_eq!(unit_types(&tag), vec![9, 6]);
    }

    #[test]
    fn test_empty_access_unit() {
        let mut tag = access_unit(&[]);
        assert!(inject_caption(&mut tag, "HELLO", &sei_renderer).unwrap());
        assert_eq!(unit_data(&tag), vec![SEI.to_vec()]);
    }

    #[test]
    fn test_empty_render_leaves_tag() {
        let mut tag = access_unit(&[AUD, SPS, PPS, IDR]);
        let before = tag.as_bytes().to_vec();
        assert!(!inject_caption(&mut tag, "", &empty_renderer).unwrap());
        assert_eq!(tag.as_bytes(), &before[..]);
        assert_eq!(unit_types(&tag), vec![9, 7, 8, 5]);
    }

    #[test]
    fn test_renders_once() {
        let calls = Cell::new(0);
        let renderer = |_: &str| {
            calls.set(calls.get() + 1);
            Bytes::from_static(SEI)
        };
        let mut tag = access_unit(&[AUD, SPS, PPS, IDR]);
        inject_caption(&mut tag, "HELLO", &renderer).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_reserved_frame_type_is_spliced() {
        let mut bytes = access_unit(&[AUD, IDR]).as_bytes().to_vec();
        bytes[11] = 0x77;
        let mut tag = TagBuffer::from_slice(&bytes);
        assert!(inject_caption(&mut tag, "HELLO", &sei_renderer).unwrap());

        assert_eq!(tag.as_bytes()[11], 0x77);
        assert_eq!(tag.composition_time(), 80);
        assert_eq!(unit_types(&tag), vec![9, 6, 5]);
    }

    #[test]
    fn test_command_frame_is_rejected() {
        let mut tag = TagBuffer::avc_access_unit(0, 0, VideoFrameType::CommandFrame).unwrap();
        let before = tag.as_bytes().to_vec();
        assert!(matches!(
            inject_caption(&mut tag, "HELLO", &sei_renderer),
            Err(CaptionError::UnsupportedCodec(_))
        ));
        assert_eq!(tag.as_bytes(), &before[..]);
    }

    #[test]
    fn test_unsupported_codec_is_untouched() {
        // VP6 inter frame
        let mut vp6 = TagBuffer::from_slice(&[
            9, 0, 0, 3, 0, 0, 0, 0, 0, 0, 0, 0x24, 0xAA, 0xBB, 0, 0, 0, 14,
        ]);
        let before = vp6.as_bytes().to_vec();
        assert!(matches!(
            inject_caption(&mut vp6, "HELLO", &sei_renderer),
            Err(CaptionError::UnsupportedCodec(_))
        ));
        assert_eq!(vp6.as_bytes(), &before[..]);
    }

    #[test]
    fn test_sequence_header_is_rejected() {
        let mut tag = access_unit(&[SPS]);
        // AVCPacketType 0
        let mut bytes = tag.as_bytes().to_vec();
        bytes[12] = 0;
        tag = TagBuffer::from_slice(&bytes);
        assert!(matches!(
            inject_caption(&mut tag, "HELLO", &sei_renderer),
            Err(CaptionError::UnsupportedCodec(_))
        ));
        assert_eq!(tag.as_bytes(), &bytes[..]);
    }

    #[test]
    fn test_audio_tag_is_rejected() {
        let mut aac = TagBuffer::from_slice(&[
            8, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0xAF, 0x01, 0, 0, 0, 13,
        ]);
        assert!(inject_caption(&mut aac, "HELLO", &sei_renderer).is_err());
    }

    #[test]
    fn test_malformed_access_unit_is_untouched() {
        let mut bytes = access_unit(&[AUD, IDR]).as_bytes().to_vec();
        // Second length prefix claims more than the payload holds.
        bytes[16 + 4 + AUD.len() + 3] = 0x40;
        let mut tag = TagBuffer::from_slice(&bytes);
        assert!(matches!(
            inject_caption(&mut tag, "HELLO", &sei_renderer),
            Err(CaptionError::Flv(FlvError::MalformedNalu { .. }))
        ));
        assert_eq!(tag.as_bytes(), &bytes[..]);
    }
}
