use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod cli;
mod handler;
mod input;
mod tui;
mod ui;

use app::App;
use cli::{CliContext, Commands};
use inquiro_core::{Config, FileSessionStore, InquiroApi, SessionEvents};

#[derive(Parser)]
#[command(name = "inquiro")]
#[command(about = "Study your documents: upload, ask questions, and drill flashcards")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides INQUIRO_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Run a single command instead of the terminal UI
    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|err| {
        eprintln!("warning: {}, using defaults", err);
        Config::new()
    });
    init_logging(&config, cli.command.is_none())?;

    let (base_url, source) = config
        .resolve_base_url(cli.api_url.as_deref())
        .context("invalid backend URL")?;
    info!("using backend {} (from {})", base_url, source);

    let session = FileSessionStore::open_default().context("failed to locate session file")?;
    let events = SessionEvents::default();

    match cli.command {
        Some(command) => {
            let api = InquiroApi::new(&base_url, Arc::new(session.clone()), events);
            let ctx = CliContext {
                api: &api,
                config: &config,
                base_url: &base_url,
                base_url_source: source,
                session: &session,
            };
            cli::run(command, &ctx).await
        }
        None => {
            let api = InquiroApi::new(&base_url, Arc::new(session), events.clone());
            run_tui(api, events, &config).await
        }
    }
}

/// The terminal UI owns stderr, so its logs go to a file.
fn init_logging(config: &Config, tui: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::new(config.log_filter());

    if tui {
        let path = Config::log_path().context("failed to locate log file")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

async fn run_tui(api: InquiroApi, events: SessionEvents, config: &Config) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut handler = tui::EventHandler::new(events.subscribe());
    let mut app = App::new(api, config.notification_duration());

    let result = async {
        loop {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            let Some(event) = handler.next().await else {
                break;
            };
            handler::handle_event(&mut app, event).await?;

            if app.should_quit {
                break;
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}
