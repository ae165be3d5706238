//! Registry error types.

use thiserror::Error;

/// Errors reported by registry operations.
///
/// Lookup misses and empty launch commands are explicit variants so callers
/// can tell "report to the user" apart from real I/O failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No home directory could be resolved for the current user. Fatal at
    /// startup: both the user entry directory and the scratch directory
    /// need it.
    #[error("no home directory available for the current user")]
    NoHomeDir,

    /// Lookup target does not exist in the current registry snapshot.
    #[error("application '{0}' not found")]
    NotFound(String),

    /// The entry exists but its launch command tokenizes to nothing.
    #[error("application '{0}' has an empty launch command")]
    EmptyCommand(String),

    /// Write/delete failure during a mutation. The registry keeps its
    /// previous snapshot because the reload never ran.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
