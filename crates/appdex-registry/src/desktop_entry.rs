//! Desktop entry parsing.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::exec::expand_exec_command;

/// One launchable application parsed from a .desktop file.
///
/// Entries are immutable snapshots: the registry rebuilds them wholesale on
/// every reload and never edits one in place.
#[derive(Clone, Debug, Serialize)]
pub struct ApplicationEntry {
    /// Display name, the case-insensitive lookup key.
    pub name: String,
    /// Optional description; empty if unset.
    pub comment: String,
    /// Launch command with placeholder tokens already expanded away.
    pub exec: String,
    /// Icon name or path; empty if unset.
    pub icon: String,
    /// Ordered category list, split on `;` with empty segments dropped.
    pub categories: Vec<String>,
    /// Absolute path to the backing file, the ownership key for
    /// overwrite/delete.
    pub source_path: PathBuf,
    /// True when the record carries the `X-WebApp` marker key.
    pub is_webapp: bool,
}

/// A file that could not be read or decoded. Reported per-file by the scan,
/// which logs and moves on.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ParseError(#[from] std::io::Error);

/// Parse one .desktop file.
///
/// `Ok(None)` means "not applicable": the file is valid enough to read but
/// does not describe a visible launchable application (wrong `Type`,
/// `NoDisplay=true`, missing `[Desktop Entry]` section, or empty `Name`).
/// Those are skipped silently, unlike `Err` which the caller logs.
pub fn parse_desktop_file(path: &Path) -> Result<Option<ApplicationEntry>, ParseError> {
    let content = fs::read_to_string(path)?;
    Ok(parse_desktop_content(&content, path))
}

fn parse_desktop_content(content: &str, path: &Path) -> Option<ApplicationEntry> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut in_desktop_entry = false;
    let mut saw_desktop_entry = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            in_desktop_entry = line == "[Desktop Entry]";
            saw_desktop_entry |= in_desktop_entry;
            continue;
        }

        if in_desktop_entry {
            if let Some((key, value)) = line.split_once('=') {
                // Keys are case-sensitive. No interpolation: percent
                // sequences are handled by expand_exec_command alone.
                fields.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }

    if !saw_desktop_entry {
        return None;
    }
    if fields.get("Type").map(String::as_str) != Some("Application") {
        return None;
    }
    if fields.get("NoDisplay").is_some_and(|v| parse_bool(v)) {
        return None;
    }

    let name = fields.get("Name").cloned().unwrap_or_default();
    if name.is_empty() {
        return None;
    }

    let categories = fields
        .get("Categories")
        .map(|s| {
            s.split(';')
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Some(ApplicationEntry {
        name,
        comment: fields.get("Comment").cloned().unwrap_or_default(),
        exec: expand_exec_command(fields.get("Exec").map(String::as_str).unwrap_or("")),
        icon: fields.get("Icon").cloned().unwrap_or_default(),
        categories,
        source_path: path.to_path_buf(),
        // Marker presence alone decides; the value is ignored.
        is_webapp: fields.contains_key("X-WebApp"),
    })
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "yes" | "on" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Option<ApplicationEntry> {
        parse_desktop_content(content, Path::new("/tmp/test.desktop"))
    }

    #[test]
    fn parses_a_full_entry() {
        let entry = parse(
            "[Desktop Entry]\n\
             Name=Firefox\n\
             Comment=Browse the web\n\
             Exec=firefox %u\n\
             Icon=firefox\n\
             Type=Application\n\
             Categories=Network;WebBrowser;\n",
        )
        .expect("entry");

        assert_eq!(entry.name, "Firefox");
        assert_eq!(entry.comment, "Browse the web");
        assert_eq!(entry.exec, "firefox ");
        assert_eq!(entry.icon, "firefox");
        assert_eq!(entry.categories, vec!["Network", "WebBrowser"]);
        assert!(!entry.is_webapp);
    }

    #[test]
    fn rejects_missing_desktop_entry_section() {
        assert!(parse("[Other Section]\nName=X\nType=Application\n").is_none());
    }

    #[test]
    fn rejects_non_application_types() {
        assert!(parse("[Desktop Entry]\nName=X\nType=Link\nExec=x\n").is_none());
        assert!(parse("[Desktop Entry]\nName=X\nExec=x\n").is_none());
    }

    #[test]
    fn rejects_no_display_entries() {
        for value in ["true", "True", "yes", "1", "on"] {
            let content = format!(
                "[Desktop Entry]\nName=X\nType=Application\nNoDisplay={value}\n"
            );
            assert!(parse(&content).is_none(), "NoDisplay={value}");
        }

        let visible = parse("[Desktop Entry]\nName=X\nType=Application\nNoDisplay=false\n");
        assert!(visible.is_some());
    }

    #[test]
    fn rejects_empty_names() {
        assert!(parse("[Desktop Entry]\nType=Application\nExec=x\n").is_none());
        assert!(parse("[Desktop Entry]\nName=\nType=Application\nExec=x\n").is_none());
    }

    #[test]
    fn marker_key_presence_flags_webapps() {
        let content = "[Desktop Entry]\nName=X\nType=Application\nX-WebApp=whatever\n";
        assert!(parse(content).expect("entry").is_webapp);
    }

    #[test]
    fn only_the_desktop_entry_section_is_read() {
        let entry = parse(
            "[Desktop Entry]\n\
             Name=Real\n\
             Type=Application\n\
             [Desktop Action new-window]\n\
             Name=Shadowed\n",
        )
        .expect("entry");
        assert_eq!(entry.name, "Real");
    }

    #[test]
    fn categories_drop_empty_segments() {
        let entry = parse(
            "[Desktop Entry]\nName=X\nType=Application\nCategories=Game;;Utility;\n",
        )
        .expect("entry");
        assert_eq!(entry.categories, vec!["Game", "Utility"]);
    }

    #[test]
    fn exec_placeholders_are_expanded_away() {
        let entry = parse(
            "[Desktop Entry]\nName=X\nType=Application\nExec=run %f %U %k --flag\n",
        )
        .expect("entry");
        assert!(!entry.exec.contains('%'));
        assert_eq!(
            crate::exec::split_exec_command(&entry.exec),
            vec!["run", "--flag"]
        );
    }

    #[test]
    fn unreadable_file_is_a_parse_error() {
        assert!(parse_desktop_file(Path::new("/nonexistent/nope.desktop")).is_err());
    }
}
