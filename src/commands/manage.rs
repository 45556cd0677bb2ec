use super::send_chunked;
use crate::command::help_message;
use crate::state::Context;

/// Show usage help and example prompts
#[poise::command(slash_command, guild_only)]
pub async fn help(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    send_chunked(&ctx, &help_message()).await
}

/// Stop the turn that is currently running
#[poise::command(slash_command, guild_only)]
pub async fn stop(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    if ctx.data().stop().await {
        ctx.say("Stopping the current turn.").await?;
    } else {
        ctx.say("Nothing is running.").await?;
    }
    Ok(())
}

/// Clear the conversation
#[poise::command(slash_command, guild_only)]
pub async fn clear(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let n = ctx.data().clear_transcript().await;
    ctx.say(format!("Conversation cleared ({} turns).", n)).await?;
    Ok(())
}

/// Show the most recent turns
#[poise::command(slash_command, guild_only)]
pub async fn history(
    ctx: Context<'_>,
    #[description = "Max turns to show"] limit: Option<u32>,
) -> Result<(), anyhow::Error> {
    let limit = limit.unwrap_or(5) as usize;
    let turns = ctx.data().recent_turns(limit).await;

    if turns.is_empty() {
        ctx.say("No conversation yet. Try `/pokebot run !HELP`.").await?;
        return Ok(());
    }

    let mut output = String::from("**Conversation**\n\n");
    for turn in &turns {
        let answer: String = turn.response_text.chars().take(300).collect();
        let ellipsis = if answer.len() < turn.response_text.len() { "…" } else { "" };
        output.push_str(&format!(
            "**{}:** {}\n> {}{}\n\n",
            turn.author,
            turn.user_text,
            answer.replace('\n', "\n> "),
            ellipsis
        ));
    }

    send_chunked(&ctx, &output).await
}
