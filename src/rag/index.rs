use std::sync::Arc;

use crate::docs::types::DocumentChunk;

/// Brute-force cosine similarity index over chunk embeddings.
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<(Arc<DocumentChunk>, Vec<f32>)>,
}

impl VectorIndex {
    pub fn new(chunks: &[Arc<DocumentChunk>], embeddings: Vec<Vec<f32>>) -> Self {
        Self {
            entries: chunks.iter().cloned().zip(embeddings).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `k` chunks most similar to `query`, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(&DocumentChunk, f32)> {
        let mut scored: Vec<(&DocumentChunk, f32)> = self
            .entries
            .iter()
            .map(|(chunk, embedding)| (chunk.as_ref(), cosine_similarity(embedding, query)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> Arc<DocumentChunk> {
        Arc::new(DocumentChunk::new("test", 0, text.to_string()))
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let chunks = vec![chunk("fire"), chunk("water"), chunk("grass")];
        let index = VectorIndex::new(
            &chunks,
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.7, 0.7, 0.0]],
        );
        let hits = index.search(&[1.0, 0.1, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.content, "fire");
        assert_eq!(hits[1].0.content, "grass");
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn test_search_empty_index() {
        let index = VectorIndex::default();
        assert!(index.is_empty());
        assert!(index.search(&[1.0], 4).is_empty());
    }

    #[test]
    fn test_cosine_handles_zero_and_mismatch() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
