use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the tool registry itself. Capability failures never
/// surface here; they are folded into an error observation at dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("unknown tool '{0}'")]
    UnknownTool(String),
}

/// Errors that prevent a run from starting. Nothing else crosses the run
/// boundary as a failure except a broken model service.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("database file '{}' not found", .0.display())]
    DatabaseMissing(PathBuf),

    #[error("failed to open database '{}'", .path.display())]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to read database schema: {0}")]
    Schema(String),

    #[error("model provider misconfigured: {0}")]
    Provider(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
