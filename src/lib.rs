pub mod chat;
pub mod cli;
pub mod clipboard;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod store;

use chrono::{ Local, TimeZone };
use cli::{ Args, Command };
use config::StoreConfig;
use log::info;
use std::error::Error;
use std::io::{ self, BufRead, Write };
use std::sync::Arc;
use storage::{ create_backend, BackendKind };

pub use chat::{ ChatSurface, MessageHandler, SendOutcome, SurfaceOptions };
pub use config::{ MessageLimits, Tier };
pub use error::{ StorageError, StoreError };
pub use models::{ ChatBubble, Exchange, MessageKind };
pub use storage::KeyValueBackend;
pub use store::{ ConversationStore, MessageProvider };

pub async fn open_store(args: &Args) -> Result<ConversationStore, StoreError> {
    let config = StoreConfig::from_args(args)?;
    let kind: BackendKind = args.backend_type.parse()?;
    let backend = create_backend(kind, &args.backend_host, &args.redis_prefix)?;
    Ok(ConversationStore::open(config, backend).await)
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Store Configuration ---");
    info!("Backend Type: {}", args.backend_type);
    info!("Backend Host: {}", args.backend_host);
    info!("Storage Key: {}", args.storage_key);
    info!("Tier: {}", args.tier);
    info!("Serialize Writes: {}", args.serialize_writes);
    info!("---------------------------");

    let store = Arc::new(open_store(&args).await?);
    let provider = MessageProvider::with_store(store);
    let store = provider.use_messages()?;

    match &args.command {
        Command::List { json } => {
            let messages = store.get_display_messages();
            if *json {
                println!("{}", serde_json::to_string_pretty(&messages)?);
            } else if messages.is_empty() {
                println!("No messages.");
            } else {
                for exchange in &messages {
                    println!("[{}] {}", format_timestamp(exchange.timestamp), exchange.id);
                    println!("  Q: {}", exchange.question);
                    println!("  A: {}", exchange.answer);
                }
            }
        }
        Command::Add { question, answer } => {
            if question.trim().is_empty() || answer.trim().is_empty() {
                return Err("question and answer must not be empty".into());
            }
            if !store.add_message(question.trim(), answer.trim()).await {
                return Err("exchange recorded in memory but could not be persisted".into());
            }
            println!("Saved.");
        }
        Command::Clear { yes } => {
            if !*yes && !confirm_on_stdin("Are you sure you want to clear the entire conversation?")? {
                println!("Cancelled.");
                return Ok(());
            }
            if !store.clear_messages().await {
                return Err("failed to remove the stored conversation".into());
            }
            println!("Conversation cleared.");
        }
        Command::Quota => {
            match store.remaining_quota() {
                Some(remaining) =>
                    println!(
                        "{} of {} messages left today",
                        remaining,
                        store.config().limits.max_daily_messages
                    ),
                None => println!("Unlimited ({} tier)", store.tier()),
            }
        }
        Command::Check => {
            if store.can_send_message().await {
                println!("Allowed.");
            } else {
                return Err("daily message limit reached".into());
            }
        }
    }

    Ok(())
}

fn confirm_on_stdin(question: &str) -> io::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn format_timestamp(millis: i64) -> String {
    Local.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["ai-chat", "--backend-type", "memory"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn check_reports_exhausted_quota_as_an_error() {
        let result = run(args(&["--max-daily-messages", "0", "check"])).await;
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "daily message limit reached");
    }

    #[tokio::test]
    async fn check_succeeds_while_quota_remains() {
        assert!(run(args(&["--max-daily-messages", "1", "check"])).await.is_ok());
        assert!(run(args(&["--tier", "premium", "--max-daily-messages", "0", "check"])).await.is_ok());
    }

    #[tokio::test]
    async fn add_rejects_blank_text() {
        let result = run(args(&["add", "--question", " ", "--answer", "a"])).await;
        assert!(result.is_err());
    }
}
