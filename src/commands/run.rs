use tracing::info;

use super::send_chunked;
use crate::command::{Instruction, UiMode};
use crate::state::{ConversationTurn, Context};

/// The mode dropdown.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ModeChoice {
    Chat,
    Train,
    Poison,
    Unpoison,
}

impl From<ModeChoice> for UiMode {
    fn from(choice: ModeChoice) -> Self {
        match choice {
            ModeChoice::Chat => UiMode::Chat,
            ModeChoice::Train => UiMode::Train,
            ModeChoice::Poison => UiMode::Poison,
            ModeChoice::Unpoison => UiMode::Unpoison,
        }
    }
}

/// Ask Pokebot something, or type !HELP
#[poise::command(slash_command, guild_only)]
pub async fn run(
    ctx: Context<'_>,
    #[description = "Your prompt, or a command such as !TRAIN <url>"] prompt: String,
    #[description = "Mode (default: Chat)"] mode: Option<ModeChoice>,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;

    let mode = mode.map(UiMode::from).unwrap_or_default();
    let instruction = Instruction::resolve(&prompt, mode);

    let user_id = ctx.author().id.get();
    if instruction.mutates_corpus() && !ctx.data().may_mutate(user_id) {
        ctx.say("Changing the knowledge base is admin-only.").await?;
        return Ok(());
    }

    info!(
        user = %ctx.author().name,
        %mode,
        instruction = %instruction.mode(),
        "Turn started"
    );

    let answer = ctx.data().run_turn(instruction).await;

    info!(answer_len = answer.len(), "Turn complete");

    ctx.data()
        .record(ConversationTurn {
            author: ctx.author().name.clone(),
            user_text: prompt.clone(),
            response_text: answer.clone(),
        })
        .await;

    let full = format!("**{}:** {}\n\n{}", ctx.author().name, prompt, answer);
    send_chunked(&ctx, &full).await
}
