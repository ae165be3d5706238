//! The in-memory registry and its mutation protocol.

use std::fs;
use std::path::PathBuf;

use log::{info, warn};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::desktop_entry::{ApplicationEntry, parse_desktop_file};
use crate::error::RegistryError;
use crate::exec::split_exec_command;
use crate::paths;

const NATIVE_DEFAULT_CATEGORIES: &str = "Utility;";
const WEBAPP_DEFAULT_CATEGORIES: &str = "Network;WebBrowser;";

/// Optional query constraints, combined with AND semantics.
/// An unset field places no constraint on that dimension.
#[derive(Clone, Debug, Default)]
pub struct ListFilter {
    /// Verbatim membership in the entry's category list.
    pub category: Option<String>,
    /// Case-insensitive substring of name or comment.
    pub search: Option<String>,
    /// Exact match on the web-app flag when set.
    pub webapp: Option<bool>,
}

/// Queryable snapshot of all launcher entries on the system.
///
/// The snapshot is rebuilt wholesale by [`Registry::load`]; mutations write
/// to the user directory and then reload, so callers never observe a
/// partially updated state. The scratch directory stages downloaded icon
/// assets and lives exactly as long as the registry.
pub struct Registry {
    scan_dirs: Vec<PathBuf>,
    user_dir: PathBuf,
    entries: Vec<ApplicationEntry>,
    // Only vacated in drop, so cleanup failures can be downgraded to
    // warnings instead of aborting teardown.
    scratch: Option<TempDir>,
}

impl Registry {
    /// Build a registry over the standard system and user entry
    /// directories and run the initial scan.
    ///
    /// Fails when no home directory can be resolved or the scratch
    /// directory cannot be created; both are unrecoverable at startup.
    pub fn new() -> Result<Self, RegistryError> {
        let user_dir = paths::user_applications_dir()?;
        Self::with_directories(paths::application_directories()?, user_dir)
    }

    /// Build a registry over explicit directories. `user_dir` is where
    /// mutations write; include it in `scan_dirs` if created entries
    /// should show up in the snapshot.
    pub fn with_directories(
        scan_dirs: Vec<PathBuf>,
        user_dir: PathBuf,
    ) -> Result<Self, RegistryError> {
        let scratch = TempDir::new()?;
        let mut registry = Self {
            scan_dirs,
            user_dir,
            entries: Vec::new(),
            scratch: Some(scratch),
        };
        registry.load();
        Ok(registry)
    }

    /// Rebuild the snapshot from disk.
    ///
    /// Directories that do not exist are skipped silently. Files that fail
    /// to parse are logged and skipped; files that are not launchable
    /// application records are skipped without logging. Entries are
    /// appended in directory order, then sorted filename order within each
    /// directory, so repeated loads over an unchanged tree yield an
    /// identical sequence.
    pub fn load(&mut self) {
        self.entries.clear();

        for dir in &self.scan_dirs {
            if !dir.exists() {
                continue;
            }

            let walker = WalkDir::new(dir).max_depth(1).sort_by_file_name();
            for file in walker.into_iter().filter_map(|e| e.ok()) {
                let path = file.path();
                if path.extension().and_then(|e| e.to_str()) != Some("desktop") {
                    continue;
                }

                match parse_desktop_file(path) {
                    Ok(Some(entry)) => self.entries.push(entry),
                    Ok(None) => {}
                    Err(err) => warn!("failed to load {}: {}", path.display(), err),
                }
            }
        }

        info!("loaded {} launcher entries", self.entries.len());
    }

    /// The current snapshot, in scan order.
    pub fn entries(&self) -> &[ApplicationEntry] {
        &self.entries
    }

    /// Entries matching every supplied filter.
    pub fn list(&self, filter: &ListFilter) -> Vec<&ApplicationEntry> {
        let search = filter.search.as_ref().map(|s| s.to_lowercase());

        self.entries
            .iter()
            .filter(|entry| {
                if let Some(category) = &filter.category {
                    if !entry.categories.iter().any(|c| c == category) {
                        return false;
                    }
                }
                if let Some(needle) = &search {
                    if !entry.name.to_lowercase().contains(needle)
                        && !entry.comment.to_lowercase().contains(needle)
                    {
                        return false;
                    }
                }
                if let Some(webapp) = filter.webapp {
                    if entry.is_webapp != webapp {
                        return false;
                    }
                }
                true
            })
            .collect()
    }

    /// Entries whose name or comment contains `text`, case-insensitively.
    pub fn search(&self, text: &str) -> Vec<&ApplicationEntry> {
        self.list(&ListFilter {
            search: Some(text.to_string()),
            ..ListFilter::default()
        })
    }

    /// Case-insensitive exact name lookup; first match in scan order.
    pub fn find_by_name(&self, name: &str) -> Option<&ApplicationEntry> {
        let needle = name.to_lowercase();
        self.entries.iter().find(|e| e.name.to_lowercase() == needle)
    }

    /// Tokenized launch command for the named entry, ready for spawning.
    pub fn launch_arguments(&self, name: &str) -> Result<Vec<String>, RegistryError> {
        let entry = self
            .find_by_name(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        let arguments = split_exec_command(&entry.exec);
        if arguments.is_empty() {
            return Err(RegistryError::EmptyCommand(entry.name.clone()));
        }
        Ok(arguments)
    }

    /// Directory for staging downloaded icon assets. Contents are removed
    /// when the registry is dropped.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch
            .as_ref()
            .map(|t| t.path().to_path_buf())
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Create a native application entry in the user directory and reload.
    ///
    /// Overwrites any existing file with the same derived name
    /// (last-writer-wins). Returns the path written.
    pub fn create_native(
        &mut self,
        name: &str,
        exec: &str,
        categories: Option<&str>,
        icon: Option<&str>,
        comment: &str,
    ) -> Result<PathBuf, RegistryError> {
        let categories = normalize_categories(categories, NATIVE_DEFAULT_CATEGORIES);
        let contents = render_desktop_file(
            name,
            comment,
            exec,
            icon.unwrap_or(""),
            &categories,
            None,
        );
        self.write_entry_file(&derived_file_name(name, false), &contents)
    }

    /// Create a web application entry: the launch command opens `url` via
    /// xdg-open, with the URL embedded verbatim.
    ///
    /// Metadata (name, comment, icon) must already be resolved; the
    /// registry never touches the network. The URL is not escaped, a known
    /// limitation inherited from the record format's usage.
    pub fn create_webapp(
        &mut self,
        url: &str,
        name: &str,
        comment: &str,
        categories: Option<&str>,
        icon: &str,
    ) -> Result<PathBuf, RegistryError> {
        let categories = normalize_categories(categories, WEBAPP_DEFAULT_CATEGORIES);
        let exec = format!("xdg-open {url}");
        let contents = render_desktop_file(name, comment, &exec, icon, &categories, Some(url));
        self.write_entry_file(&derived_file_name(name, true), &contents)
    }

    /// Delete the named entry's backing file and reload.
    ///
    /// Not-found is reported as [`RegistryError::NotFound`], never a panic.
    /// On delete failure the snapshot is left untouched.
    pub fn remove(&mut self, name: &str) -> Result<PathBuf, RegistryError> {
        let entry = self
            .find_by_name(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        let path = entry.source_path.clone();
        fs::remove_file(&path)?;
        self.load();
        Ok(path)
    }

    fn write_entry_file(
        &mut self,
        file_name: &str,
        contents: &str,
    ) -> Result<PathBuf, RegistryError> {
        fs::create_dir_all(&self.user_dir)?;
        let path = self.user_dir.join(file_name);
        fs::write(&path, contents)?;
        self.load();
        Ok(path)
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            if let Err(err) = scratch.close() {
                warn!("failed to clean up scratch directory: {err}");
            }
        }
    }
}

/// Lower-case the display name and map every character outside
/// `[a-zA-Z0-9]` to `_`; web apps get a `webapp-` prefix.
fn derived_file_name(name: &str, webapp: bool) -> String {
    let stem: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if webapp {
        format!("webapp-{stem}.desktop")
    } else {
        format!("{stem}.desktop")
    }
}

fn normalize_categories(categories: Option<&str>, default: &str) -> String {
    match categories {
        None | Some("") => default.to_string(),
        Some(c) if c.ends_with(';') => c.to_string(),
        Some(c) => format!("{c};"),
    }
}

/// Deterministic serialization: fixed key order, `Icon` only when set,
/// marker and URL keys only for web apps.
fn render_desktop_file(
    name: &str,
    comment: &str,
    exec: &str,
    icon: &str,
    categories: &str,
    webapp_url: Option<&str>,
) -> String {
    let mut out = String::new();
    out.push_str("[Desktop Entry]\n");
    out.push_str(&format!("Name={name}\n"));
    out.push_str(&format!("Comment={comment}\n"));
    out.push_str(&format!("Exec={exec}\n"));
    if !icon.is_empty() {
        out.push_str(&format!("Icon={icon}\n"));
    }
    out.push_str("Terminal=false\n");
    out.push_str("Type=Application\n");
    out.push_str(&format!("Categories={categories}\n"));
    if let Some(url) = webapp_url {
        out.push_str("X-WebApp=true\n");
        out.push_str(&format!("X-URL={url}\n"));
    }
    out
}
