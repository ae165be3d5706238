//! appdex-registry: launcher entry registry for Linux desktops.
//!
//! Provides the engine behind the `appdex` CLI:
//! - Desktop entry parsing from .desktop files, with Exec field expansion
//! - Launch command tokenization
//! - An in-memory registry with filtering and name lookup
//! - Create/remove of user-scoped entries, followed by a full reload
//!
//! Network and process concerns (fetching web-app metadata, spawning
//! launched applications) live in the binary, not here.

mod desktop_entry;
mod error;
mod exec;
mod paths;
mod registry;

pub use desktop_entry::{ApplicationEntry, ParseError, parse_desktop_file};
pub use error::RegistryError;
pub use exec::{expand_exec_command, split_exec_command};
pub use registry::{ListFilter, Registry};
