#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Property tests for chunk rotation

use proptest::prelude::*;
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;
use tlstream_chunker::{ChunkConfig, ChunkWriter, chunk_path};
use tlstream_ogg::OggPageBuilder;

fn build_stream(sizes: &[usize]) -> Vec<Vec<u8>> {
    sizes
        .iter()
        .enumerate()
        .map(|(seq, &size)| {
            OggPageBuilder::new(9, seq as u32)
                .packet(&vec![seq as u8; size])
                .unwrap()
                .build()
                .unwrap()
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rotation_preserves_bytes_and_page_alignment(
        sizes in prop::collection::vec(0usize..4000, 0..30),
        target in 1u64..10_000,
    ) {
        let pages = build_stream(&sizes);
        let dir = TempDir::new().unwrap();

        let writer = ChunkWriter::open(dir.path(), ChunkConfig::default().with_target_chunk_size(target)).unwrap();
        let summary = writer.run(Cursor::new(pages.concat())).unwrap();

        // Walk the chunks and match them against the page sequence
        let mut next_page = 0;
        for index in 0..=summary.last_index {
            let data = fs::read(chunk_path(dir.path(), index)).unwrap();
            let mut offset = 0;
            while offset < data.len() {
                let page = &pages[next_page];
                prop_assert_eq!(&data[offset..offset + page.len()], page.as_slice());
                offset += page.len();
                next_page += 1;
            }
            if index < summary.last_index {
                prop_assert!(data.len() as u64 >= target);
            }
        }
        prop_assert_eq!(next_page, pages.len());

        let sentinel = fs::metadata(chunk_path(dir.path(), summary.sentinel_index)).unwrap();
        prop_assert_eq!(sentinel.len(), 0);
        prop_assert!(!chunk_path(dir.path(), summary.sentinel_index + 1).exists());
    }
}
