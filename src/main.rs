//! Claims Chat - terminal client for the Claims AI pipeline
//!
//! Streams assistant replies from the backend's `/chat` endpoint into a
//! local transcript and stages CSV claim files for bulk upload through
//! `/upload-claims`. The REPL below is deliberately thin; everything with
//! behavior lives in the library modules.

use std::io::Write as _;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod client;
mod config;
mod conversation;
mod preview;
mod stream;
mod upload;

use client::{ChatClient, ClientError};
use config::Config;
use conversation::Conversation;
use upload::{StagedFile, UploadQueue};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "claims_chat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let client = ChatClient::new(&config);
    let mut conversation = Conversation::new();
    let mut queue = UploadQueue::new();

    println!("Claims AI chat - backend at {}", config.api_url);
    println!("Type a message, or: /stage <files..>  /unstage <name>  /queue  /preview <name>  /upload  /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(args) = input.strip_prefix("/stage ") {
            stage_files(&mut queue, args);
        } else if let Some(name) = input.strip_prefix("/unstage ") {
            let name = name.trim();
            if queue.remove_file(name) {
                println!("Removed {name}");
            } else {
                println!("{name} is not staged");
            }
        } else if input == "/queue" {
            if queue.is_empty() {
                println!("No files staged");
            }
            for file in queue.files() {
                println!("  {}", file.name);
            }
        } else if let Some(name) = input.strip_prefix("/preview ") {
            show_preview(&queue, name.trim()).await;
        } else if input == "/upload" {
            match queue.commit(&client, &mut conversation).await {
                Ok(message) => println!("{message}"),
                Err(err) => println!("{err}"),
            }
        } else if input == "/quit" || input == "/exit" {
            break;
        } else {
            send(&client, &mut conversation, input).await;
        }
    }

    Ok(())
}

/// Stage every argument that passes the `.csv` filter (the browser build's
/// `accept=".csv"` picker, applied here by hand).
fn stage_files(queue: &mut UploadQueue, args: &str) {
    let mut candidates = Vec::new();
    for raw in args.split_whitespace() {
        let path = Path::new(raw);
        if !upload::is_csv(path) {
            println!("Skipping {raw}: only .csv files can be uploaded");
            continue;
        }
        if !path.is_file() {
            println!("Skipping {raw}: not a readable file");
            continue;
        }
        candidates.push(StagedFile::from_path(path));
    }

    let added = queue.add_files(candidates);
    println!("{added} file(s) staged, {} in queue", queue.len());
}

async fn show_preview(queue: &UploadQueue, name: &str) {
    let Some(file) = queue.get(name) else {
        println!("{name} is not staged");
        return;
    };

    match preview::preview_file(&file.path).await {
        Ok(Some(table)) => {
            println!("{}", table.headers.join(" | "));
            for row in &table.rows {
                println!("{}", row.join(" | "));
            }
        }
        Ok(None) => println!("{name} has nothing to show"),
        Err(err) => println!("Could not read {name}: {err}"),
    }
}

async fn send(client: &ChatClient, conversation: &mut Conversation, message: &str) {
    let mut printed = 0;
    let outcome = client
        .send_message(conversation, message, |snapshot| {
            // snapshots only ever extend; print the unseen suffix in place
            if let Some(delta) = snapshot.get(printed..) {
                print!("{delta}");
                let _ = std::io::stdout().flush();
                printed = snapshot.len();
            }
        })
        .await;
    println!();

    match outcome {
        Ok(_) => {}
        Err(ClientError::EmptyMessage | ClientError::SessionNotStarted) => {
            // cannot happen from this loop: input is non-empty and the
            // conversation came from Conversation::new()
        }
        Err(_) => {
            if let Some(notice) = conversation.last_text() {
                println!("{notice}");
            }
        }
    }
}
