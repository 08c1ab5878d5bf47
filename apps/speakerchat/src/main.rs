use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    CommentsBackend, GraphQlBackend, MissingCommentsBackend, RenderFormat, TalkThread,
};
use shared::domain::{Identity, TalkId};
use storage::Storage;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, normalize_database_url, Settings};

#[derive(Parser, Debug)]
#[command(name = "speakerchat", about = "Read and post comments on conference talks")]
struct Cli {
    /// GraphQL endpoint serving listCommentsForTalk / createComment.
    #[arg(long, global = true)]
    graphql_url: Option<String>,
    #[arg(long, global = true)]
    api_key: Option<String>,
    /// Local comment cache.
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the comment thread for a talk.
    Show {
        #[arg(long)]
        talk_id: String,
        #[arg(long)]
        talk_name: Option<String>,
        #[arg(long)]
        plain: bool,
    },
    /// Post a comment to a talk, then print the thread.
    Comment {
        #[arg(long)]
        talk_id: String,
        #[arg(long)]
        talk_name: Option<String>,
        #[arg(long)]
        plain: bool,
        text: String,
    },
    /// Show or set the username attached to new comments.
    Profile { username: Option<String> },
}

fn render_format(plain: bool) -> RenderFormat {
    if plain {
        RenderFormat::Plain
    } else {
        RenderFormat::Html
    }
}

fn build_backend(settings: &Settings) -> Result<Arc<dyn CommentsBackend>> {
    match settings.graphql_url.as_deref() {
        Some(url) => {
            let backend = GraphQlBackend::new(url, settings.api_key.clone())?;
            info!(endpoint = %backend.endpoint(), "using graphql backend");
            Ok(Arc::new(backend))
        }
        None => {
            warn!("no graphql endpoint configured; only cached comments are available");
            Ok(Arc::new(MissingCommentsBackend))
        }
    }
}

async fn mount_thread(
    settings: &Settings,
    storage: Storage,
    talk_id: String,
) -> Result<Arc<TalkThread>> {
    let backend = build_backend(settings)?;
    let identity = Identity::new(storage.profile_username().await?);
    Ok(TalkThread::mount(TalkId::new(talk_id), identity, storage, backend).await)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings()?;
    if let Some(url) = cli.graphql_url {
        settings.graphql_url = Some(url);
    }
    if let Some(key) = cli.api_key {
        settings.api_key = Some(key);
    }
    if let Some(url) = cli.database_url {
        settings.database_url = url;
    }

    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url)
        .await
        .with_context(|| format!("failed to open comment cache at {database_url}"))?;
    storage.health_check().await?;

    match cli.command {
        Command::Show {
            talk_id,
            talk_name,
            plain,
        } => {
            let talk_name = talk_name.unwrap_or_else(|| talk_id.clone());
            let thread = mount_thread(&settings, storage, talk_id).await?;
            print!("{}", thread.render(&talk_name, render_format(plain)).await);
        }
        Command::Comment {
            talk_id,
            talk_name,
            plain,
            text,
        } => {
            let talk_name = talk_name.unwrap_or_else(|| talk_id.clone());
            let thread = mount_thread(&settings, storage, talk_id).await?;
            thread.toggle_modal().await;
            let submission = thread.create_comment(&text).await?;
            print!("{}", thread.render(&talk_name, render_format(plain)).await);
            // Keep the runtime alive until the remote create settles.
            submission.remote.await?;
        }
        Command::Profile { username } => match username {
            Some(username) => {
                storage.set_profile_username(&username).await?;
                println!("profile username set to {username}");
            }
            None => match storage.profile_username().await? {
                Some(username) => println!("{username}"),
                None => println!("no profile username set"),
            },
        },
    }

    Ok(())
}
