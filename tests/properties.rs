use proptest::prelude::*;
use uuid::Uuid;

use docqa_agent::domain::{split_text, ChunkParams, Embedding, IndexMetadata, Segment, VectorIndex};

fn params() -> impl Strategy<Value = ChunkParams> {
    (1usize..64)
        .prop_flat_map(|max| (Just(max), 0..max))
        .prop_map(|(max, overlap)| ChunkParams::new(max, overlap).unwrap())
}

proptest! {
    #[test]
    fn chunks_respect_size_and_overlap(text in "[a-zé🙂 ]{0,300}", params in params()) {
        let chunks = split_text(&text, params);
        let chars: Vec<char> = text.chars().collect();

        if chars.is_empty() {
            prop_assert!(chunks.is_empty());
        }
        for chunk in &chunks {
            prop_assert!(chunk.chars().count() <= params.max_chunk_size());
            prop_assert!(!chunk.is_empty());
        }
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            let overlap = params.overlap().min(next.len());
            prop_assert_eq!(&prev[prev.len() - overlap..], &next[..overlap]);
        }
    }

    #[test]
    fn chunks_reconstruct_text(text in "[a-z0-9 \n]{1,300}", params in params()) {
        let chunks = split_text(&text, params);
        let step = params.max_chunk_size() - params.overlap();

        let mut rebuilt = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i + 1 == chunks.len() {
                rebuilt.push_str(chunk);
            } else {
                rebuilt.extend(chunk.chars().take(step));
            }
        }
        prop_assert_eq!(rebuilt, text);
    }

    #[test]
    fn search_returns_min_k_n_in_descending_order(
        rows in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 4), 1..40),
        query in prop::collection::vec(-1.0f32..1.0, 4),
        k in 1usize..50,
    ) {
        let mut index = VectorIndex::new(IndexMetadata {
            model_id: "prop".to_string(),
            dimension: 4,
            chunk_size: 10,
            chunk_overlap: 0,
        });
        let segments = (0..rows.len())
            .map(|i| Segment::new(Uuid::nil(), "prop.txt", i, format!("row {i}")))
            .collect();
        let embeddings = rows.into_iter().map(Embedding::new).collect::<Vec<_>>();
        let n = embeddings.len();
        index.append(segments, embeddings).unwrap();

        let hits = index.search(&Embedding::new(query).normalized(), k).unwrap();

        prop_assert_eq!(hits.len(), k.min(n));
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                prop_assert!(pair[0].segment.position < pair[1].segment.position);
            }
        }
    }
}
