//! Front-end commands driving the handle registry

use std::path::Path;
use std::str::FromStr;

use fileserver::{FileResolver, HandleRegistry};

use crate::error::{CliError, CliResult, UserMessage};
use crate::utils;

/// Usage text printed by `help`
pub const HELP: &str = "These commands are supported:
  share <path>...   share the given files (quote paths containing spaces)
  stop              stop sharing and clear the selection
  list              show the selected files
  status            show whether the server is running and its URL
  help              display this text
  quit              stop sharing and exit";

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Share(Vec<String>),
    Stop,
    List,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut args = utils::parse_args(line).into_iter();
        let name = args.next().unwrap_or_default().to_lowercase();

        match name.as_str() {
            "share" => {
                let paths: Vec<String> = args.collect();
                if paths.is_empty() {
                    return Err(CliError::InvalidArguments(
                        "Usage: share <path>...".to_string(),
                    ));
                }
                Ok(Command::Share(paths))
            }
            "stop" => Ok(Command::Stop),
            "list" | "ls" => Ok(Command::List),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            _ => Err(CliError::UnknownCommand(name)),
        }
    }
}

/// Text to show after a command, and whether to exit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub quit: bool,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

/// Run one command against the registry
///
/// Errors are turned into user-facing text; nothing here ends the session
/// except `quit`.
pub async fn handle<R: FileResolver>(registry: &mut HandleRegistry<R>, command: Command) -> Reply {
    let result = match command {
        Command::Share(paths) => share(registry, &paths).await,
        Command::Stop => Ok(stop(registry).await),
        Command::List => Ok(list(registry).await),
        Command::Status => Ok(status(registry)),
        Command::Help => Ok(HELP.to_string()),
        Command::Quit => {
            registry.clear().await;
            return Reply {
                text: "Server stopped. Bye!".to_string(),
                quit: true,
            };
        }
    };

    match result {
        Ok(text) => Reply::text(text),
        Err(e) => {
            tracing::debug!("Command failed: {}", e);
            Reply::text(e.user_message())
        }
    }
}

/// Share a new selection
async fn share<R: FileResolver>(registry: &mut HandleRegistry<R>, paths: &[String]) -> CliResult<String> {
    if registry.is_listening() {
        return Err(CliError::InvalidArguments(
            "Server is already running. Use `stop` before sharing a new selection.".to_string(),
        ));
    }

    let mut keys = Vec::new();
    let mut skipped = Vec::new();
    for path in paths {
        match shareable_key(path).await {
            Ok(key) => keys.push(key),
            Err(reason) => skipped.push(format!("Skipped {}: {}", path, reason)),
        }
    }

    if keys.is_empty() {
        return Err(CliError::InvalidArguments(format!(
            "No shareable files.\n{}",
            skipped.join("\n")
        )));
    }

    let addr = registry.replace(keys).await?;

    let mut text = format!(
        "Sharing {} file(s). Open {} in a browser on the receiving device.",
        registry.handles().len(),
        utils::share_url(addr, utils::local_ip())
    );
    for line in skipped {
        text.push('\n');
        text.push_str(&line);
    }
    Ok(text)
}

/// Canonical key for a path the user picked, if it names a regular file
async fn shareable_key(path: &str) -> Result<String, String> {
    let canonical = tokio::fs::canonicalize(Path::new(path))
        .await
        .map_err(|e| e.to_string())?;
    let metadata = tokio::fs::metadata(&canonical)
        .await
        .map_err(|e| e.to_string())?;
    if !metadata.is_file() {
        return Err("not a regular file".to_string());
    }
    Ok(canonical.to_string_lossy().into_owned())
}

async fn stop<R: FileResolver>(registry: &mut HandleRegistry<R>) -> String {
    if !registry.is_listening() && registry.handles().is_empty() {
        return "Server is not running.".to_string();
    }
    registry.clear().await;
    "Server stopped.".to_string()
}

/// Numbered display names with sizes as the resolver reports them
async fn list<R: FileResolver>(registry: &HandleRegistry<R>) -> String {
    if registry.handles().is_empty() {
        return "No files selected.".to_string();
    }

    let resolver = registry.server().resolver();
    let mut lines = vec!["Selected files:".to_string()];
    for (index, handle) in registry.handles().iter().enumerate() {
        let size = match resolver.length(handle).await {
            Some(len) => utils::format_size(len),
            None => "unavailable".to_string(),
        };
        lines.push(format!("{}. {} ({})", index + 1, handle.display_name(), size));
    }
    lines.join("\n")
}

fn status<R: FileResolver>(registry: &HandleRegistry<R>) -> String {
    match registry.local_addr() {
        Some(addr) => format!(
            "Listening on {} with {} file(s).",
            utils::share_url(addr, utils::local_ip()),
            registry.handles().len()
        ),
        None => "Stopped.".to_string(),
    }
}
