use std::collections::HashSet;

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::command::Instruction;
use crate::session::Session;

/// One exchange as shown in the conversation.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub author: String,
    pub user_text: String,
    pub response_text: String,
}

pub struct AppState {
    /// Held for the whole turn, so turns run one at a time.
    pub session: Mutex<Session>,
    in_flight: Mutex<Option<CancellationToken>>,
    transcript: RwLock<Vec<ConversationTurn>>,
    pub admin_ids: HashSet<u64>,
}

impl AppState {
    pub fn new(session: Session, admin_ids: HashSet<u64>) -> Self {
        Self {
            session: Mutex::new(session),
            in_flight: Mutex::new(None),
            transcript: RwLock::new(Vec::new()),
            admin_ids,
        }
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Without configured admins anyone may train and poison.
    pub fn may_mutate(&self, user_id: u64) -> bool {
        self.admin_ids.is_empty() || self.is_admin(user_id)
    }

    /// Run one instruction to completion, or until [`AppState::stop`].
    pub async fn run_turn(&self, instruction: Instruction) -> String {
        let mut session = self.session.lock().await;
        let cancel = CancellationToken::new();
        *self.in_flight.lock().await = Some(cancel.clone());

        let answer = session.execute_instruction(instruction, &cancel).await;

        self.in_flight.lock().await.take();
        answer
    }

    /// Cancel the running turn. Returns false when nothing was running.
    pub async fn stop(&self) -> bool {
        match self.in_flight.lock().await.as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn record(&self, turn: ConversationTurn) {
        self.transcript.write().await.push(turn);
    }

    /// Drop the transcript, returning how many turns it held.
    pub async fn clear_transcript(&self) -> usize {
        let mut transcript = self.transcript.write().await;
        let n = transcript.len();
        transcript.clear();
        n
    }

    /// The last `limit` turns, oldest first.
    /// The last `limit` turns, oldest first. Always at least one when any exist.
    pub async fn recent_turns(&self, limit: usize) -> Vec<ConversationTurn> {
        let transcript = self.transcript.read().await;
        let start = transcript.len().saturating_sub(limit.max(1));
        transcript[start..].to_vec()
    }

    pub async fn transcript_len(&self) -> usize {
        self.transcript.read().await.len()
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssistantProfile;
    use crate::error::PokebotError;
    use crate::testing::session_with;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;

    fn turn(text: &str) -> ConversationTurn {
        ConversationTurn {
            author: "ash".to_string(),
            user_text: text.to_string(),
            response_text: format!("re: {}", text),
        }
    }

    #[tokio::test]
    async fn test_stop_cancels_running_turn() {
        let dir = tempdir().unwrap();
        let (mut session, _loader, builder) = session_with(AssistantProfile::default(), dir.path());
        session.initialize(&CancellationToken::new()).await.unwrap();
        builder.hang_build.store(true, Ordering::SeqCst);
        let state = Arc::new(AppState::new(session, HashSet::new()));

        let running = {
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .run_turn(Instruction::Train("http://example.com/a".to_string()))
                    .await
            })
        };

        let mut stopped = false;
        for _ in 0..100 {
            if state.stop().await {
                stopped = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(stopped);

        let answer = running.await.unwrap();
        assert_eq!(answer, PokebotError::Cancelled.user_message());
        assert!(!state.stop().await);
        assert!(state.session.lock().await.store().active().is_empty());
    }

    #[tokio::test]
    async fn test_stop_when_idle() {
        let dir = tempdir().unwrap();
        let (session, _loader, _builder) = session_with(AssistantProfile::default(), dir.path());
        let state = AppState::new(session, HashSet::new());
        assert!(!state.stop().await);
    }

    #[tokio::test]
    async fn test_transcript_record_and_clear() {
        let dir = tempdir().unwrap();
        let (session, _loader, _builder) = session_with(AssistantProfile::default(), dir.path());
        let state = AppState::new(session, HashSet::new());

        for text in ["one", "two", "three"] {
            state.record(turn(text)).await;
        }
        let recent = state.recent_turns(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].user_text, "two");
        assert_eq!(recent[1].response_text, "re: three");

        let latest = state.recent_turns(0).await;
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].user_text, "three");

        assert_eq!(state.clear_transcript().await, 3);
        assert_eq!(state.transcript_len().await, 0);
    }

    #[test]
    fn test_may_mutate() {
        let dir = tempdir().unwrap();
        let (session, _loader, _builder) = session_with(AssistantProfile::default(), dir.path());
        let open = AppState::new(session, HashSet::new());
        assert!(open.may_mutate(42));

        let (session, _loader, _builder) = session_with(AssistantProfile::default(), dir.path());
        let locked = AppState::new(session, HashSet::from([7]));
        assert!(locked.may_mutate(7));
        assert!(!locked.may_mutate(42));
    }
}
