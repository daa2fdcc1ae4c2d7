mod cli;
mod commands;
mod logger;
mod watch;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use ganster_client::{ApiClient, Config, QuestionQuery};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=ganster_client=debug shows every request the client makes.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    // The base URL is fixed here for the rest of the run.
    let config = Config::load().context("Could not read ganster config")?;
    let base_url = config.resolve_base_url(cli.api_url.as_deref())?;
    let store = config
        .session_backend
        .open()
        .context("Could not open session storage")?;
    log::debug!("using API at {}", base_url);
    let client = ApiClient::new(base_url, store);

    match cli.command {
        Commands::Register => commands::register(&client).await?,
        Commands::Login => commands::login(&client).await?,
        Commands::Logout => commands::logout(&client)?,
        Commands::Whoami => commands::whoami(&client)?,
        Commands::Questions { skip, limit, tag } => {
            let query = QuestionQuery { skip, limit, tag };
            commands::questions(&client, query).await?
        }
        Commands::Show { id } => commands::show(&client, &id).await?,
        Commands::Ask {
            title,
            description,
            tags,
        } => commands::ask(&client, title, description, tags).await?,
        Commands::Delete { id, yes } => commands::delete(&client, &id, yes).await?,
        Commands::Answer {
            question_id,
            content,
        } => commands::answer(&client, &question_id, content).await?,
        Commands::AiAnswer { question_id } => commands::ai_answer(&client, &question_id).await?,
        Commands::Search { query } => commands::search(&client, &query).await?,
        Commands::Vote {
            answer_id,
            direction,
        } => commands::vote(&client, &answer_id, direction.into()).await?,
        Commands::Accept { answer_id } => commands::accept(&client, &answer_id).await?,
        Commands::DeleteAnswer { answer_id, yes } => {
            commands::delete_answer(&client, &answer_id, yes).await?
        }
        Commands::Notifications { unread, limit } => {
            commands::notifications(&client, limit, unread).await?
        }
        Commands::Read { notification_id } => {
            commands::mark_read(&client, &notification_id).await?
        }
        Commands::ReadAll => commands::mark_all_read(&client).await?,
        Commands::Watch { tag, interval } => {
            let every = interval
                .map(|secs| Duration::from_secs(secs.max(1)))
                .unwrap_or_else(|| config.poll_interval());
            watch::watch(&client, tag, every).await?
        }
    }

    Ok(())
}
