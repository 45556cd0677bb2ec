//! Scripted collaborators for session and state tests.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::AssistantProfile;
use crate::docs::loader::{DocumentLoader, WebLoader};
use crate::docs::splitter::TextSplitter;
use crate::docs::types::{DocumentChunk, RawDocument};
use crate::error::PokebotError;
use crate::rag::{Answerer, IndexBuilder};
use crate::session::Session;

pub const FAILING_URL: &str = "http://unreachable.invalid/";

/// Serves `content of <url>` for every URL except [`FAILING_URL`], and reads
/// poisoning files from disk.
pub struct ScriptedLoader {
    disk: WebLoader,
    patterns: Mutex<Vec<String>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self {
            disk: WebLoader::new(5).unwrap(),
            patterns: Mutex::new(Vec::new()),
        }
    }

    /// Patterns passed to `load_matching`, in call order.
    pub fn patterns(&self) -> Vec<String> {
        self.patterns.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentLoader for ScriptedLoader {
    async fn load_url(&self, url: &str) -> Result<RawDocument, PokebotError> {
        if url == FAILING_URL || url.is_empty() {
            return Err(PokebotError::load(url, "connection refused"));
        }
        Ok(RawDocument {
            source: url.to_string(),
            text: format!("content of {}", url),
        })
    }

    async fn load_matching(
        &self,
        dir: &Path,
        pattern: &str,
    ) -> Result<Vec<RawDocument>, PokebotError> {
        self.patterns.lock().unwrap().push(pattern.to_string());
        self.disk.load_matching(dir, pattern).await
    }
}

/// Records the chunk contents of every build. Its answers echo the question
/// and the whole indexed corpus: `"<question> <- [a, b]"`.
#[derive(Default)]
pub struct RecordingBuilder {
    builds: Mutex<Vec<Vec<String>>>,
    pub fail_build: AtomicBool,
    pub hang_build: AtomicBool,
    pub answer_error: Arc<AtomicBool>,
}

impl RecordingBuilder {
    pub fn builds(&self) -> Vec<Vec<String>> {
        self.builds.lock().unwrap().clone()
    }
}

#[async_trait]
impl IndexBuilder for RecordingBuilder {
    async fn build(
        &self,
        chunks: &[Arc<DocumentChunk>],
    ) -> Result<Arc<dyn Answerer>, PokebotError> {
        if self.hang_build.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_build.load(Ordering::SeqCst) {
            return Err(PokebotError::Index("embeddings returned 500".to_string()));
        }

        let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        self.builds.lock().unwrap().push(contents.clone());
        Ok(Arc::new(EchoAnswerer {
            contents,
            fail: self.answer_error.clone(),
        }))
    }
}

struct EchoAnswerer {
    contents: Vec<String>,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl Answerer for EchoAnswerer {
    async fn answer(&self, question: &str) -> Result<String, PokebotError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PokebotError::Synthesis("rate limited".to_string()));
        }
        Ok(format!("{} <- [{}]", question, self.contents.join(", ")))
    }
}

pub fn session_with(
    profile: AssistantProfile,
    poisoning_dir: &Path,
) -> (Session, Arc<ScriptedLoader>, Arc<RecordingBuilder>) {
    let loader = Arc::new(ScriptedLoader::new());
    let builder = Arc::new(RecordingBuilder::default());
    let session = Session::new(
        profile,
        poisoning_dir.to_path_buf(),
        loader.clone(),
        builder.clone(),
        TextSplitter::new(4000, 200).unwrap(),
    );
    (session, loader, builder)
}
