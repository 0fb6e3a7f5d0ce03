mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use fileserver::{FileServer, FsResolver, HandleRegistry, ServerConfig};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::Command;
use crate::error::UserMessage;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.server_config(ServerConfig::from_env());
    tracing::info!("Configured to listen on {}:{}", config.host, config.port);

    let mut registry = HandleRegistry::new(FileServer::new(config, FsResolver::new()));

    println!("1) Connect this machine and the receiving device to the same network.");
    println!("2) Share files with `share <path>...` (or pass them on the command line).");
    println!("3) Open the printed URL in a browser on the receiving device.");
    println!("Type `help` for all commands.\n");

    if !cli.files.is_empty() {
        let reply = commands::handle(&mut registry, Command::Share(cli.files.clone())).await;
        println!("{}", reply.text);
    }

    let mut lines = spawn_stdin_reader();

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        let reply = commands::handle(&mut registry, command).await;
                        println!("{}", reply.text);
                        if reply.quit {
                            return;
                        }
                    }
                    Err(e) => println!("{}", e.user_message()),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    registry.clear().await;
    println!("Server stopped.");
}

/// Read stdin lines on a dedicated thread
///
/// A blocked read would otherwise keep the runtime from shutting down after
/// Ctrl-C.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
