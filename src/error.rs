use thiserror::Error;

/// Failures a single turn can run into. None of them end the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PokebotError {
    #[error("failed to load {target}: {reason}")]
    Load { target: String, reason: String },
    #[error("failed to rebuild the index: {0}")]
    Index(String),
    #[error("failed to synthesize an answer: {0}")]
    Synthesis(String),
    #[error("the knowledge base has not been initialized yet")]
    NotInitialized,
    #[error("turn cancelled")]
    Cancelled,
}

impl PokebotError {
    pub fn load(target: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Load {
            target: target.into(),
            reason: err.to_string(),
        }
    }

    /// Text shown in the transcript in place of an answer.
    pub fn user_message(&self) -> String {
        match self {
            Self::Load { target, reason } => {
                format!("Sorry, I could not load `{}`: {}", target, reason)
            }
            Self::Index(reason) => format!(
                "Sorry, rebuilding the knowledge base failed, nothing was changed: {}",
                reason
            ),
            Self::Synthesis(reason) => format!(
                "Sorry, I could not come up with an answer right now: {}",
                reason
            ),
            Self::NotInitialized => {
                "My knowledge base is not built yet. Train me first with `!TRAIN <url>`.".to_string()
            }
            Self::Cancelled => "Stopped. Nothing was changed.".to_string(),
        }
    }
}
