use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("No wharf.toml found in '{0}' or any parent directory")]
    ProjectNotFound(PathBuf),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Build task is required")]
    TaskRequired,

    #[error("Unterminated quote in command: {0}")]
    UnterminatedQuote(String),

    #[error("Empty command")]
    EmptyCommand,

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Resolving context for service '{service}'")]
    ContextResolution {
        service: String,
        #[source]
        source: Box<Error>,
    },

    #[error("running build command")]
    BuildCommand(#[source] Box<Error>),

    #[error("Build command exited with {0}")]
    CommandFailed(std::process::ExitStatus),
}

pub type Result<T> = std::result::Result<T, Error>;
