use std::io::Cursor;

use flv::{FlvReader, FlvTagType, FlvWriter, TagBuffer};
use proptest::prelude::*;

fn tag(tag_type: u8, timestamp: u32, data: &[u8]) -> TagBuffer {
    let mut bytes = vec![tag_type, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    bytes.extend_from_slice(data);
    bytes.extend_from_slice(&[0; 4]);
    let mut tag = TagBuffer::from_slice(&bytes);
    tag.set_timestamp(timestamp);
    tag.update_size(data.len()).unwrap();
    tag
}

fn arb_tag() -> impl Strategy<Value = TagBuffer> {
    (
        prop::sample::select(vec![8u8, 9, 18]),
        any::<u32>(),
        prop::collection::vec(any::<u8>(), 1..256),
    )
        .prop_map(|(tag_type, timestamp, data)| tag(tag_type, timestamp, &data))
}

proptest! {
    #[test]
    fn prop_container_round_trip(
        has_audio in any::<bool>(),
        has_video in any::<bool>(),
        tags in prop::collection::vec(arb_tag(), 0..16),
    ) {
        let mut writer = FlvWriter::new(Vec::new());
        writer.write_header(has_audio, has_video).unwrap();
        for tag in &tags {
            writer.write_tag(tag).unwrap();
        }
        let bytes = writer.close().unwrap();

        let mut reader = FlvReader::new(Cursor::new(bytes.clone()));
        let header = reader.read_header().unwrap();
        prop_assert_eq!(header.has_audio, has_audio);
        prop_assert_eq!(header.has_video, has_video);

        let mut read_back = TagBuffer::new();
        let mut rewritten = FlvWriter::new(Vec::new());
        rewritten.write_header(has_audio, has_video).unwrap();
        for expected in &tags {
            prop_assert!(reader.read_tag(&mut read_back).unwrap());
            prop_assert_eq!(read_back.as_bytes(), expected.as_bytes());
            prop_assert_eq!(read_back.prev_tag_size(), Some(11 + expected.data_size()));
            rewritten.write_tag(&read_back).unwrap();
        }
        prop_assert!(!reader.read_tag(&mut read_back).unwrap());
        prop_assert_eq!(rewritten.close().unwrap(), bytes);
    }
}

#[test]
fn test_tag_kinds() {
    assert_eq!(tag(8, 0, &[0x2F]).tag_type(), FlvTagType::Audio);
    assert_eq!(tag(9, 0, &[0x17]).tag_type(), FlvTagType::Video);
    assert_eq!(tag(18, 0, &[0x02]).tag_type(), FlvTagType::ScriptData);
}
