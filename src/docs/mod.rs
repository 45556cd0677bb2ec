pub mod loader;
pub mod splitter;
pub mod types;

use std::sync::Arc;

use types::DocumentChunk;

pub type DocumentSet = Vec<Arc<DocumentChunk>>;

/// The two chunk sets of a session.
///
/// `active` is what answers are computed from. `training` is the clean
/// baseline: it only grows through [`DocumentStore::add_training`] and is
/// what [`DocumentStore::restore_training`] resets `active` to.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    active: DocumentSet,
    training: DocumentSet,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &[Arc<DocumentChunk>] {
        &self.active
    }

    pub fn training(&self) -> &[Arc<DocumentChunk>] {
        &self.training
    }

    /// Append to both sets.
    pub fn add_training(&mut self, chunks: &[Arc<DocumentChunk>]) {
        self.active.extend(chunks.iter().cloned());
        self.training.extend(chunks.iter().cloned());
    }

    /// Append to `active` only.
    pub fn add_poison(&mut self, chunks: &[Arc<DocumentChunk>]) {
        self.active.extend(chunks.iter().cloned());
    }

    /// Replace `active` with a copy of `training`. The two sets stay
    /// independent afterwards.
    pub fn restore_training(&mut self) {
        self.active = self.training.clone();
    }

    /// Number of `active` chunks that did not come from training.
    pub fn poisoned_count(&self) -> usize {
        self.active
            .iter()
            .filter(|c| !self.training.iter().any(|t| Arc::ptr_eq(t, c)))
            .count()
    }
}
