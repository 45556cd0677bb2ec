use std::collections::BTreeMap;

use crate::state::Context;

/// Show which documents Pokebot is answering from
#[poise::command(slash_command, guild_only)]
pub async fn status(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let Ok(session) = ctx.data().session.try_lock() else {
        ctx.say("Busy with a turn right now, try again when it's done.")
            .await?;
        return Ok(());
    };

    let store = session.store();

    // Chunk counts per source
    let mut by_source: BTreeMap<&str, usize> = BTreeMap::new();
    for chunk in store.active() {
        *by_source.entry(chunk.source.as_str()).or_default() += 1;
    }

    let mut output = format!(
        "**{}** is in the **{}** state{}\n\
         Active chunks: {} ({} poisoned) | Training chunks: {} | Turns: {}\n",
        session.profile().name,
        session.phase(),
        if session.is_initialized() { "" } else { " (no index yet)" },
        store.active().len(),
        store.poisoned_count(),
        store.training().len(),
        ctx.data().transcript_len().await,
    );

    if !by_source.is_empty() {
        output.push_str("\n**Sources:**\n");
        for (source, count) in &by_source {
            output.push_str(&format!("- {} ({} chunks)\n", source, count));
        }
    }
    drop(session);

    super::send_chunked(&ctx, &output).await
}
