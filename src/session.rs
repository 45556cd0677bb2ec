use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{help_message, Instruction, UiMode};
use crate::config::AssistantProfile;
use crate::docs::loader::DocumentLoader;
use crate::docs::splitter::TextSplitter;
use crate::docs::types::DocumentChunk;
use crate::docs::DocumentStore;
use crate::error::PokebotError;
use crate::rag::{Answerer, IndexBuilder};

const DONE: &str = "Done";

/// Which document configuration is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Base,
    Trained,
    Poisoned,
    /// Poison reverted; same content as `Trained`.
    Clean,
}

impl Phase {
    fn after_train(self) -> Self {
        match self {
            Phase::Poisoned => Phase::Poisoned,
            _ => Phase::Trained,
        }
    }

    fn after_unpoison(self, has_training: bool) -> Self {
        match self {
            _ if !has_training => Phase::Base,
            Phase::Poisoned => Phase::Clean,
            other => other,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Base => "base",
            Phase::Trained => "trained",
            Phase::Poisoned => "poisoned",
            Phase::Clean => "clean",
        };
        f.write_str(name)
    }
}

/// Owns the document sets and the current index, and runs one instruction
/// per turn.
///
/// Mutations are staged: the next store is built aside, indexed, and only
/// committed together with the new index once the rebuild succeeded and the
/// turn was not cancelled. A failed turn leaves store, index and phase as
/// they were.
pub struct Session {
    profile: AssistantProfile,
    poisoning_dir: PathBuf,
    loader: Arc<dyn DocumentLoader>,
    builder: Arc<dyn IndexBuilder>,
    splitter: TextSplitter,
    store: DocumentStore,
    index: Option<Arc<dyn Answerer>>,
    phase: Phase,
}

impl Session {
    pub fn new(
        profile: AssistantProfile,
        poisoning_dir: PathBuf,
        loader: Arc<dyn DocumentLoader>,
        builder: Arc<dyn IndexBuilder>,
        splitter: TextSplitter,
    ) -> Self {
        Self {
            profile,
            poisoning_dir,
            loader,
            builder,
            splitter,
            store: DocumentStore::new(),
            index: None,
            phase: Phase::Base,
        }
    }

    pub fn profile(&self) -> &AssistantProfile {
        &self.profile
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_initialized(&self) -> bool {
        self.index.is_some()
    }

    /// Train on the profile's seed URLs, then make sure an index exists so
    /// chat works from the first turn. Seed URLs that fail to load are skipped.
    pub async fn initialize(&mut self, cancel: &CancellationToken) -> Result<(), PokebotError> {
        let seeds = self.profile.seed_urls.clone();
        info!(count = seeds.len(), "Loading initial training data");

        for url in &seeds {
            match self.train(url, cancel).await {
                Ok(_) => {}
                Err(PokebotError::Cancelled) => return Err(PokebotError::Cancelled),
                Err(e) => warn!(url = %url, "Skipping seed URL: {}", e),
            }
        }

        if self.index.is_none() {
            self.rebuild(self.store.clone(), self.phase, cancel).await?;
        }

        info!(
            phase = %self.phase,
            active = self.store.active().len(),
            "Session initialized"
        );
        Ok(())
    }

    /// Run one turn. `mode` other than chat takes `text` as the argument
    /// verbatim; chat mode also accepts typed `!COMMANDS`.
    pub async fn execute(
        &mut self,
        text: &str,
        mode: UiMode,
        cancel: &CancellationToken,
    ) -> String {
        self.execute_instruction(Instruction::resolve(text, mode), cancel)
            .await
    }

    /// Like [`Session::execute`] for an already resolved instruction. Never
    /// fails: errors come back as the answer text.
    pub async fn execute_instruction(
        &mut self,
        instruction: Instruction,
        cancel: &CancellationToken,
    ) -> String {
        debug!(?instruction, "Handling instruction");
        let mode = instruction.mode();

        match self.run(instruction, cancel).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(%mode, "Turn failed: {}", e);
                e.user_message()
            }
        }
    }

    async fn run(
        &mut self,
        instruction: Instruction,
        cancel: &CancellationToken,
    ) -> Result<String, PokebotError> {
        match instruction {
            Instruction::Help => Ok(help_message()),
            Instruction::Train(url) => {
                self.train(&url, cancel).await?;
                Ok(DONE.to_string())
            }
            Instruction::Poison(pattern) => {
                self.poison(&pattern, cancel).await?;
                Ok(DONE.to_string())
            }
            Instruction::Unpoison => {
                self.unpoison(cancel).await?;
                Ok(DONE.to_string())
            }
            Instruction::Chat(text) => self.chat(&text, cancel).await,
        }
    }

    /// Load `url` into both the active and training sets.
    pub async fn train(
        &mut self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Arc<DocumentChunk>>, PokebotError> {
        let doc = cancellable(cancel, self.loader.load_url(url)).await?;
        let chunks = self.splitter.split_document(&doc);

        let mut next = self.store.clone();
        next.add_training(&chunks);
        self.rebuild(next, self.phase.after_train(), cancel).await?;

        info!(url, chunks = chunks.len(), "Trained");
        Ok(chunks)
    }

    /// Inject poisoning files matching `pattern` (or the profile's default)
    /// into the active set only. Returns the injected chunks; no match is a
    /// no-op.
    pub async fn poison(
        &mut self,
        pattern: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Arc<DocumentChunk>>, PokebotError> {
        let pattern = if pattern.is_empty() {
            self.profile.poison_file_pattern.clone()
        } else {
            pattern.to_string()
        };

        let docs = cancellable(
            cancel,
            self.loader.load_matching(&self.poisoning_dir, &pattern),
        )
        .await?;
        let chunks: Vec<_> = docs
            .iter()
            .flat_map(|doc| self.splitter.split_document(doc))
            .collect();

        if chunks.is_empty() {
            info!(pattern = %pattern, "No poisoning documents matched");
            return Ok(chunks);
        }

        let mut next = self.store.clone();
        next.add_poison(&chunks);
        self.rebuild(next, Phase::Poisoned, cancel).await?;

        info!(
            pattern = %pattern,
            files = docs.len(),
            chunks = chunks.len(),
            "Poisoned"
        );
        Ok(chunks)
    }

    /// Reset the active set to a copy of the training set.
    pub async fn unpoison(&mut self, cancel: &CancellationToken) -> Result<(), PokebotError> {
        let mut next = self.store.clone();
        next.restore_training();
        let phase = self.phase.after_unpoison(!next.training().is_empty());
        self.rebuild(next, phase, cancel).await?;

        info!(active = self.store.active().len(), "Unpoisoned");
        Ok(())
    }

    /// Ask the current index. Empty text is passed through like any question.
    pub async fn chat(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PokebotError> {
        let index = self.index.as_ref().ok_or(PokebotError::NotInitialized)?;
        cancellable(cancel, index.answer(text)).await
    }

    async fn rebuild(
        &mut self,
        next: DocumentStore,
        phase: Phase,
        cancel: &CancellationToken,
    ) -> Result<(), PokebotError> {
        let index = cancellable(cancel, self.builder.build(next.active())).await?;
        if cancel.is_cancelled() {
            return Err(PokebotError::Cancelled);
        }

        self.store = next;
        self.index = Some(index);
        self.phase = phase;
        debug!(
            phase = %phase,
            active = self.store.active().len(),
            training = self.store.training().len(),
            "Index replaced"
        );
        Ok(())
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, PokebotError>>,
) -> Result<T, PokebotError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PokebotError::Cancelled),
        result = fut => result,
    }
}
