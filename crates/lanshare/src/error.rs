use fileserver::ServerError;
use thiserror::Error;

/// Errors raised while handling a front-end command
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

/// Result type alias for command handling
pub type CliResult<T> = Result<T, CliError>;

/// Helper trait to convert errors into user-facing messages
pub trait UserMessage {
    fn user_message(&self) -> String;
}

impl UserMessage for CliError {
    fn user_message(&self) -> String {
        match self {
            CliError::UnknownCommand(cmd) => {
                format!("Unknown command '{}'. Type `help` for the list of commands.", cmd)
            }
            CliError::InvalidArguments(msg) => msg.clone(),
            CliError::Server(e) if e.is_addr_in_use() => {
                format!("Could not start the server: the port is already in use ({})", e)
            }
            CliError::Server(e) => format!("Could not start the server: {}", e),
        }
    }
}
