use serde::{Deserialize, Serialize};

/// Content-addressed chunk ID (blake3 hex hash).
pub type ChunkId = String;

/// A whole document as fetched, before splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// e.g. "https://example.com/page" or "./data/poisoning/evil.txt"
    pub source: String,
    pub text: String,
}

/// A unit of retrievable text. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub source: String,
    pub content: String,
    pub loaded_at: i64,
}

impl DocumentChunk {
    /// `position` is the chunk's index within its source document.
    pub fn new(source: &str, position: usize, content: String) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(source.as_bytes());
        hasher.update(&(position as u64).to_le_bytes());
        hasher.update(content.as_bytes());

        Self {
            id: hasher.finalize().to_hex().to_string(),
            source: source.to_string(),
            content,
            loaded_at: chrono::Utc::now().timestamp(),
        }
    }
}
