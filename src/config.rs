use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_POISONING_DIR: &str = "./data/poisoning/";

/// The assistant persona the bot is launched with.
#[derive(Debug, Clone, Default)]
pub struct AssistantProfile {
    pub name: String,
    /// Trained on, in order, before the first turn.
    pub seed_urls: Vec<String>,
    /// Used by `!POISON` when no pattern is given. Empty matches every file.
    pub poison_file_pattern: String,
}

/// Credentials and model identifiers for the OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            chunk_size: 4000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PokebotConfig {
    pub profile: AssistantProfile,
    pub poisoning_dir: PathBuf,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
}

impl PokebotConfig {
    /// Read every setting once. Call after `dotenv::dotenv()`.
    pub fn from_env() -> Result<Self> {
        let profile = AssistantProfile {
            name: dotenv::var("POKEBOT_ROLE_NAME").unwrap_or_else(|_| "Pokebot".to_string()),
            seed_urls: split_list(&dotenv::var("POKEBOT_SEED_URLS").unwrap_or_default()),
            poison_file_pattern: dotenv::var("POKEBOT_POISON_PATTERN").unwrap_or_default(),
        };

        let poisoning_dir = dotenv::var("POKEBOT_POISONING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_POISONING_DIR));

        let defaults = LlmConfig::default();
        let llm = LlmConfig {
            base_url: dotenv::var("LLM_BASE_URL").unwrap_or(defaults.base_url),
            model: dotenv::var("LLM_MODEL").unwrap_or(defaults.model),
            embedding_model: dotenv::var("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            api_key: dotenv::var("LLM_API_KEY")
                .or_else(|_| dotenv::var("OPENAI_API_KEY"))
                .ok()
                .filter(|k| !k.is_empty()),
            timeout_secs: parse_var("LLM_TIMEOUT_SECS", defaults.timeout_secs)?,
        };

        let defaults = RetrievalConfig::default();
        let retrieval = RetrievalConfig {
            top_k: parse_var("RAG_TOP_K", defaults.top_k)?,
            chunk_size: parse_var("RAG_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: parse_var("RAG_CHUNK_OVERLAP", defaults.chunk_overlap)?,
        };
        anyhow::ensure!(
            retrieval.chunk_overlap < retrieval.chunk_size,
            "RAG_CHUNK_OVERLAP ({}) must be smaller than RAG_CHUNK_SIZE ({})",
            retrieval.chunk_overlap,
            retrieval.chunk_size
        );

        Ok(Self {
            profile,
            poisoning_dir,
            llm,
            retrieval,
        })
    }
}

/// Split a comma-separated setting, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match dotenv::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_drops_blanks() {
        let urls = split_list(" https://a.example/x , ,https://b.example/y,");
        assert_eq!(urls, vec!["https://a.example/x", "https://b.example/y"]);
    }

    #[test]
    fn test_split_list_empty() {
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_retrieval_defaults() {
        let cfg = RetrievalConfig::default();
        assert_eq!(cfg.top_k, 4);
        assert!(cfg.chunk_overlap < cfg.chunk_size);
    }
}
