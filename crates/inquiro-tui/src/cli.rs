//! Scriptable subcommands sharing the terminal UI's session file.

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input, Password, Select};
use inquiro_core::{
    ApiError, Config, DocumentSelection, FileSessionStore, FlashcardDeck, InquiroApi,
    DEFAULT_FLASHCARDS,
};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the access token
    Login {
        /// Username (prompted when omitted)
        username: Option<String>,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        username: String,
        email: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the stored access token
    Logout,
    /// Show backend and session status
    Status,
    /// List uploaded documents
    Documents,
    /// Upload a document
    Upload {
        /// Path to the file
        path: PathBuf,
    },
    /// Ask a question about a document
    Ask {
        /// Your question
        question: String,
        /// Document id (defaults to the first document)
        #[arg(short, long)]
        doc: Option<String>,
    },
    /// Generate flashcards, or show saved ones
    Flashcards {
        /// Document id (defaults to the first document)
        #[arg(short, long)]
        doc: Option<String>,
        /// Number of cards to generate (1-20)
        #[arg(short = 'n', long, default_value_t = DEFAULT_FLASHCARDS)]
        count: u32,
        /// Show previously generated cards instead of generating new ones
        #[arg(long)]
        saved: bool,
        /// Step through the cards interactively
        #[arg(long)]
        study: bool,
    },
}

pub struct CliContext<'a> {
    pub api: &'a InquiroApi,
    pub config: &'a Config,
    pub base_url: &'a str,
    pub base_url_source: &'a str,
    pub session: &'a FileSessionStore,
}

pub async fn run(command: Commands, ctx: &CliContext<'_>) -> Result<()> {
    let api = ctx.api;
    match command {
        Commands::Login { username, password } => {
            let username = match username {
                Some(username) => username,
                None => Input::with_theme(&ColorfulTheme::default())
                    .with_prompt("Username")
                    .interact_text()?,
            };
            let password = match password {
                Some(password) => password,
                None => Password::with_theme(&ColorfulTheme::default())
                    .with_prompt("Password")
                    .interact()?,
            };
            api.login(&username, &password).await.map_err(explain)?;
            println!("{}", "Login successful!".green().bold());
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => Password::with_theme(&ColorfulTheme::default())
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords do not match")
                    .interact()?,
            };
            let registration = api
                .register(&username, &email, &password)
                .await
                .map_err(explain)?;
            let message = registration
                .message
                .unwrap_or_else(|| "Registration successful!".to_string());
            println!("{}", message.green().bold());
            println!("Log in with: inquiro login {}", username);
        }
        Commands::Logout => {
            api.logout().map_err(explain)?;
            println!("{}", "Logged out".green());
        }
        Commands::Status => {
            println!("{} {} ({})", "Backend:".bold(), ctx.base_url, ctx.base_url_source);
            println!("{} {}", "Session file:".bold(), ctx.session.path().display());
            if let Ok(path) = Config::config_path() {
                println!("{} {}", "Config file:".bold(), path.display());
            }
            println!("{} {}", "Log filter:".bold(), ctx.config.log_filter());
            if api.is_authenticated() {
                println!("{} {}", "Session:".bold(), "logged in".green());
            } else {
                println!("{} {}", "Session:".bold(), "logged out".yellow());
            }
        }
        Commands::Documents => {
            let documents = api.list_documents().await.map_err(explain)?;
            if documents.is_empty() {
                println!("{}", "No documents uploaded yet.".yellow());
            }
            for doc in documents {
                println!("{}  {}", doc.id.dimmed(), doc.title.bold());
            }
        }
        Commands::Upload { path } => {
            let doc = api.upload_document(Some(&path)).await.map_err(explain)?;
            println!("{}", "Document uploaded successfully!".green().bold());
            println!("{}  {}", doc.id.dimmed(), doc.title);
        }
        Commands::Ask { question, doc } => {
            let doc_id = resolve_document(api, doc).await?;
            let answer = api
                .query(&question, Some(&doc_id))
                .await
                .map_err(explain)?;
            println!("{}", "AI:".yellow().bold());
            println!("{}", answer.answer);
            if !answer.documents.is_empty() {
                let titles: Vec<&str> = answer.documents.iter().map(|d| d.title.as_str()).collect();
                println!("\n{} {}", "Sources:".dimmed(), titles.join(", ").dimmed());
            }
        }
        Commands::Flashcards {
            doc,
            count,
            saved,
            study,
        } => {
            let doc_id = resolve_document(api, doc).await?;
            let cards = if saved {
                api.fetch_flashcards(Some(&doc_id)).await.map_err(explain)?
            } else {
                let batch = api
                    .generate_flashcards(Some(&doc_id), count)
                    .await
                    .map_err(explain)?;
                println!(
                    "{}",
                    batch
                        .message
                        .unwrap_or_else(|| "Flashcards generated successfully!".to_string())
                        .green()
                );
                batch.flashcards
            };

            let mut deck = FlashcardDeck::new();
            deck.load(cards);
            if study {
                study_deck(&mut deck)?;
            } else {
                print_deck(&deck);
            }
        }
    }
    Ok(())
}

/// Pick the requested document, or the first one the backend lists.
async fn resolve_document(api: &InquiroApi, requested: Option<String>) -> Result<String> {
    if let Some(id) = requested {
        return Ok(id);
    }
    let mut selection = DocumentSelection::new();
    selection.replace(api.list_documents().await.map_err(explain)?);
    match selection.selected_id() {
        Some(id) => Ok(id.to_string()),
        None => bail!("No document selected. Please upload or select a document."),
    }
}

fn print_deck(deck: &FlashcardDeck) {
    if deck.is_empty() {
        println!("{}", "No flashcards.".yellow());
        return;
    }
    for (i, card) in deck.cards().iter().enumerate() {
        println!("{} {}", format!("{}.", i + 1).cyan().bold(), card.question.bold());
        println!("   {}", card.answer);
    }
}

fn study_deck(deck: &mut FlashcardDeck) -> Result<()> {
    if deck.is_empty() {
        println!("{}", "No flashcards.".yellow());
        return Ok(());
    }
    let actions = ["Flip", "Next", "Previous", "Quit"];
    loop {
        if let (Some((current, total)), Some(face)) = (deck.position(), deck.face()) {
            let side = if deck.is_flipped() { "Answer" } else { "Question" };
            println!("\n{}", format!("Card {} of {} ({})", current, total, side).dimmed());
            println!("{}", face.bold());
        }
        let choice = Select::with_theme(&ColorfulTheme::default())
            .items(&actions)
            .default(0)
            .interact()?;
        match choice {
            0 => deck.flip(),
            1 => deck.next(),
            2 => deck.previous(),
            _ => return Ok(()),
        }
    }
}

/// Turn an API failure into a message that tells the user what to do next.
fn explain(err: ApiError) -> anyhow::Error {
    match err {
        ApiError::AuthenticationMissing => {
            anyhow::anyhow!("Not authenticated. Please run `inquiro login` first.")
        }
        ApiError::AuthenticationExpired => {
            anyhow::anyhow!("Session expired. Please run `inquiro login` again.")
        }
        other => anyhow::Error::new(other).context("Request failed"),
    }
}
