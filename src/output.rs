//! Table and JSON rendering for list/info commands.

use appdex_registry::ApplicationEntry;

const NAME_WIDTH: usize = 30;
const COMMENT_WIDTH: usize = 40;

pub fn print_table(entries: &[&ApplicationEntry]) {
    println!("{:<NAME_WIDTH$} {:<COMMENT_WIDTH$}", "Name", "Description");
    println!("{}", "-".repeat(NAME_WIDTH + COMMENT_WIDTH));
    for entry in entries {
        println!(
            "{:<NAME_WIDTH$} {:<COMMENT_WIDTH$}",
            clip(&entry.name, NAME_WIDTH),
            clip(&entry.comment, COMMENT_WIDTH)
        );
    }
}

pub fn print_json(entries: &[&ApplicationEntry]) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(entries)
        .map_err(|e| format!("Failed to render JSON: {e}"))?;
    println!("{rendered}");
    Ok(())
}

pub fn print_info(entry: &ApplicationEntry) {
    println!("Name: {}", entry.name);
    if !entry.comment.is_empty() {
        println!("Description: {}", entry.comment);
    }
    println!("Command: {}", entry.exec);
    println!("Icon: {}", entry.icon);
    println!("Categories: {}", entry.categories.join(", "));
    println!("File Path: {}", entry.source_path.display());
    if entry.is_webapp {
        println!("Type: Web Application");
    } else {
        println!("Type: Native Application");
    }
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut clipped: String = text.chars().take(max - 3).collect();
        clipped.push_str("...");
        clipped
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::clip;

    #[test]
    fn clip_leaves_short_text_alone() {
        assert_eq!(clip("short", 30), "short");
        assert_eq!(clip(&"x".repeat(30), 30), "x".repeat(30));
    }

    #[test]
    fn clip_truncates_with_ellipsis() {
        let clipped = clip(&"y".repeat(31), 30);
        assert_eq!(clipped.chars().count(), 30);
        assert!(clipped.ends_with("..."));
    }
}
