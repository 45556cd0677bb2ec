mod command;
mod commands;
mod config;
mod docs;
mod error;
mod llm;
mod rag;
mod session;
mod state;
#[cfg(test)]
mod testing;

use std::collections::HashSet;
use std::sync::Arc;

use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};

use config::PokebotConfig;
use docs::loader::WebLoader;
use docs::splitter::TextSplitter;
use llm::LlmClient;
use rag::LlmIndexBuilder;
use session::Session;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    // Load env
    let _ = dotenv::dotenv();
    let token = dotenv::var("DISCORD_TOKEN")
        .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN required"))?;
    let guild_id: Option<serenity::GuildId> = dotenv::var("DISCORD_GUILD_ID")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(serenity::GuildId::new);

    let config = PokebotConfig::from_env()?;
    info!(
        role = %config.profile.name,
        seeds = config.profile.seed_urls.len(),
        poisoning_dir = %config.poisoning_dir.display(),
        "Configuration loaded"
    );

    // Init LLM client
    let llm_client = Arc::new(LlmClient::new(&config.llm)?);
    info!(
        model = %config.llm.model,
        embedding_model = %config.llm.embedding_model,
        "LLM client initialized"
    );

    let loader = Arc::new(WebLoader::new(config.llm.timeout_secs)?);
    let builder = Arc::new(LlmIndexBuilder::new(llm_client, config.retrieval.top_k));
    let mut session = Session::new(
        config.profile.clone(),
        config.poisoning_dir.clone(),
        loader,
        builder,
        TextSplitter::from_config(&config.retrieval)?,
    );

    if let Err(e) = session.initialize(&CancellationToken::new()).await {
        warn!("Starting without an index: {}", e);
    }

    // Parse admin user IDs from env
    let admin_ids: HashSet<u64> =
        config::split_list(&dotenv::var("ADMIN_USER_IDS").unwrap_or_default())
            .iter()
            .filter_map(|s| s.parse::<u64>().ok())
            .collect();
    if !admin_ids.is_empty() {
        info!(count = admin_ids.len(), "Admin users configured");
    }

    let app_state = AppState::new(session, admin_ids);

    let intents = serenity::GatewayIntents::GUILDS;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::pokebot()],
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                info!("Registering {} top-level command(s):", commands.len());
                for cmd in commands {
                    info!("  /{} ({} subcommands)", cmd.name, cmd.subcommands.len());
                    for sub in &cmd.subcommands {
                        info!("    /{} {}", cmd.name, sub.name);
                    }
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(
                        ctx,
                        &framework.options().commands,
                        gid,
                    )
                    .await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(
                        ctx,
                        &framework.options().commands,
                    )
                    .await?;
                }

                Ok(app_state)
            })
        })
        .build();

    info!("Launching Pokebot...");

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    Ok(())
}
