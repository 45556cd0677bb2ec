pub mod index;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::docs::types::DocumentChunk;
use crate::error::PokebotError;
use crate::llm::{LlmClient, Message};
use index::VectorIndex;

/// A built index that can answer questions from the chunks it was built over.
#[async_trait]
pub trait Answerer: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String, PokebotError>;
}

/// Builds a fresh [`Answerer`] from a complete chunk set. There is no
/// incremental update: every mutation of the active set rebuilds from scratch.
#[async_trait]
pub trait IndexBuilder: Send + Sync {
    async fn build(
        &self,
        chunks: &[Arc<DocumentChunk>],
    ) -> Result<Arc<dyn Answerer>, PokebotError>;
}

/// Embeds chunks through the LLM backend and answers with a
/// retrieve-then-stuff prompt.
pub struct LlmIndexBuilder {
    llm: Arc<LlmClient>,
    top_k: usize,
}

impl LlmIndexBuilder {
    pub fn new(llm: Arc<LlmClient>, top_k: usize) -> Self {
        Self { llm, top_k }
    }
}

#[async_trait]
impl IndexBuilder for LlmIndexBuilder {
    async fn build(
        &self,
        chunks: &[Arc<DocumentChunk>],
    ) -> Result<Arc<dyn Answerer>, PokebotError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self
            .llm
            .embed(&texts)
            .await
            .map_err(|e| PokebotError::Index(format!("{:#}", e)))?;

        let index = VectorIndex::new(chunks, embeddings);
        info!(chunks = index.len(), "index rebuilt");

        Ok(Arc::new(RetrievalChain {
            llm: self.llm.clone(),
            index,
            top_k: self.top_k,
        }))
    }
}

struct RetrievalChain {
    llm: Arc<LlmClient>,
    index: VectorIndex,
    top_k: usize,
}

impl RetrievalChain {
    async fn retrieve(&self, question: &str) -> anyhow::Result<Vec<&DocumentChunk>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }
        let query = self
            .llm
            .embed(&[question.to_string()])
            .await?
            .pop()
            .unwrap_or_default();

        let hits = self.index.search(&query, self.top_k);
        for (chunk, score) in &hits {
            debug!(source = %chunk.source, chunk_id = %&chunk.id[..12], score, "retrieved");
        }
        Ok(hits.into_iter().map(|(chunk, _)| chunk).collect())
    }
}

#[async_trait]
impl Answerer for RetrievalChain {
    async fn answer(&self, question: &str) -> Result<String, PokebotError> {
        let context = self
            .retrieve(question)
            .await
            .map_err(|e| PokebotError::Synthesis(format!("{:#}", e)))?;

        let prompt = prompts::render_answer_prompt(&context, question);
        let answer = self
            .llm
            .chat(&[Message::user(prompt)])
            .await
            .map_err(|e| PokebotError::Synthesis(format!("{:#}", e)))?;

        if answer.trim().is_empty() {
            return Err(PokebotError::Synthesis(
                "the model returned an empty answer".to_string(),
            ));
        }
        Ok(answer)
    }
}
