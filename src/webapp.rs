//! Web-app creation collaborators: page fetch, best-effort HTML metadata
//! extraction, and favicon download.
//!
//! Everything here feeds the registry's create-webapp operation; the
//! registry itself never touches the network. Extraction is a forgiving
//! hand-rolled scan, not a full HTML parser: pages in the wild are messy
//! and a miss only costs a fallback name or icon.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use log::warn;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
const PAGE_TIMEOUT: Duration = Duration::from_secs(10);
const ICON_TIMEOUT: Duration = Duration::from_secs(5);
const FALLBACK_ICON: &str = "applications-internet";

/// Favicon `rel` values, in lookup priority order.
const FAVICON_RELS: [&[&str]; 3] = [&["icon"], &["shortcut", "icon"], &["apple-touch-icon"]];

/// Resolved fields for a new web application entry.
pub struct WebAppMetadata {
    pub name: String,
    pub comment: String,
    pub icon: String,
}

/// Fetch the page at `url` and resolve name, description and icon,
/// honoring caller overrides. Downloaded icons are staged under `scratch`.
///
/// Network failure on the page fetch aborts the whole creation; icon
/// failures degrade to the generic fallback icon with a warning.
pub fn resolve_metadata(
    url: &str,
    name_override: Option<String>,
    icon_override: Option<String>,
    scratch: &Path,
) -> Result<WebAppMetadata, String> {
    let origin = UrlParts::parse(url).ok_or_else(|| {
        "Invalid URL format. Please provide a complete URL (e.g., https://example.com)"
            .to_string()
    })?;

    let html = fetch_page(url)?;

    let name = name_override
        .filter(|n| !n.trim().is_empty())
        .or_else(|| extract_title(&html))
        .unwrap_or_else(|| origin.host.clone());

    let comment = extract_meta_description(&html).unwrap_or_default();

    let icon = if let Some(icon_url) = icon_override {
        download_icon(scratch, &icon_url)
    } else {
        extract_favicon_href(&html)
            .map(|href| origin.absolutize(&href))
            .and_then(|icon_url| download_icon(scratch, &icon_url))
    }
    .unwrap_or_else(|| FALLBACK_ICON.to_string());

    Ok(WebAppMetadata {
        name,
        comment,
        icon,
    })
}

fn fetch_page(url: &str) -> Result<String, String> {
    let agent = ureq::AgentBuilder::new().timeout(PAGE_TIMEOUT).build();
    let response = agent
        .get(url)
        .set("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| format!("Failed to fetch {url}: {e}"))?;
    response
        .into_string()
        .map_err(|e| format!("Failed to read response from {url}: {e}"))
}

/// Download an icon into the scratch directory, guessing the extension
/// from the Content-Type header. Returns the staged file path, or None
/// (with a warning) on any failure.
fn download_icon(scratch: &Path, icon_url: &str) -> Option<String> {
    let agent = ureq::AgentBuilder::new().timeout(ICON_TIMEOUT).build();
    let response = match agent.get(icon_url).set("User-Agent", USER_AGENT).call() {
        Ok(response) => response,
        Err(err) => {
            warn!("failed to download icon from {icon_url}: {err}");
            return None;
        }
    };

    let extension = extension_for_content_type(response.header("Content-Type").unwrap_or(""));

    let mut bytes = Vec::new();
    if let Err(err) = response.into_reader().read_to_end(&mut bytes) {
        warn!("failed to read icon from {icon_url}: {err}");
        return None;
    }

    let path = scratch.join(format!("icon{extension}"));
    if let Err(err) = fs::write(&path, &bytes) {
        warn!("failed to stage icon at {}: {}", path.display(), err);
        return None;
    }

    Some(path.to_string_lossy().to_string())
}

fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type.split(';').next().unwrap_or("").trim() {
        "image/jpeg" => ".jpg",
        "image/gif" => ".gif",
        "image/svg+xml" => ".svg",
        "image/webp" => ".webp",
        "image/x-icon" | "image/vnd.microsoft.icon" => ".ico",
        _ => ".png",
    }
}

/// Scheme and host of an http(s) URL, used for validation and for
/// absolutizing relative favicon hrefs.
struct UrlParts {
    scheme: String,
    host: String,
}

impl UrlParts {
    fn parse(url: &str) -> Option<Self> {
        let (scheme, rest) = url.split_once("://")?;
        if scheme != "http" && scheme != "https" {
            return None;
        }
        let host = rest.split(['/', '?', '#']).next().unwrap_or("");
        if host.is_empty() {
            return None;
        }
        Some(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
        })
    }

    fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    fn absolutize(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if let Some(rest) = href.strip_prefix("//") {
            format!("{}://{}", self.scheme, rest)
        } else if href.starts_with('/') {
            format!("{}{}", self.origin(), href)
        } else {
            format!("{}/{}", self.origin(), href)
        }
    }
}

fn extract_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let start = lower.find("<title")?;
    let open_end = start + lower[start..].find('>')? + 1;
    let close = open_end + lower[open_end..].find("</title")?;

    let title = collapse_whitespace(&decode_entities(html[open_end..close].trim()));
    (!title.is_empty()).then_some(title)
}

fn extract_meta_description(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    for tag in find_tags(html, &lower, "meta") {
        let attrs = tag_attrs(tag);
        let is_description = attrs
            .iter()
            .any(|(key, value)| key == "name" && value.eq_ignore_ascii_case("description"));
        if !is_description {
            continue;
        }
        if let Some((_, content)) = attrs.iter().find(|(key, _)| key == "content") {
            let content = decode_entities(content.trim());
            if !content.is_empty() {
                return Some(content);
            }
        }
    }
    None
}

/// Best-effort favicon href from `<link rel=...>` tags. `rel` is treated
/// as a whitespace-separated token list, so `rel="shortcut icon"` matches
/// an `icon` lookup.
fn extract_favicon_href(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let links: Vec<Vec<(String, String)>> = find_tags(html, &lower, "link")
        .into_iter()
        .map(tag_attrs)
        .collect();

    for wanted in FAVICON_RELS {
        for attrs in &links {
            let rel_tokens: Vec<String> = match attrs.iter().find(|(key, _)| key == "rel") {
                Some((_, value)) => value
                    .to_ascii_lowercase()
                    .split_whitespace()
                    .map(String::from)
                    .collect(),
                None => continue,
            };
            if !wanted.iter().all(|t| rel_tokens.iter().any(|r| r == t)) {
                continue;
            }
            if let Some((_, href)) = attrs
                .iter()
                .find(|(key, value)| key == "href" && !value.is_empty())
            {
                return Some(href.clone());
            }
        }
    }
    None
}

/// Attribute text of every `<tag ...>` occurrence. `lower` must be the
/// ASCII-lowercased copy of `html` so byte offsets line up.
fn find_tags<'a>(html: &'a str, lower: &str, tag: &str) -> Vec<&'a str> {
    let needle = format!("<{tag}");
    let mut tags = Vec::new();
    let mut pos = 0;

    while let Some(found) = lower[pos..].find(&needle) {
        let after = pos + found + needle.len();
        match lower.as_bytes().get(after) {
            Some(b' ' | b'\t' | b'\n' | b'\r' | b'>' | b'/') => {}
            // e.g. "<linkage" when looking for "<link"
            _ => {
                pos = after;
                continue;
            }
        }
        let Some(end) = lower[after..].find('>') else {
            break;
        };
        tags.push(&html[after..after + end]);
        pos = after + end + 1;
    }

    tags
}

/// Split a tag's attribute text into (name, value) pairs. Handles
/// double-quoted, single-quoted and bare values; names are lowercased.
fn tag_attrs(tag: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut chars = tag.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == '/') {
            chars.next();
        }

        let mut name = String::new();
        while matches!(chars.peek(), Some(c) if !c.is_whitespace() && *c != '=' && *c != '/') {
            name.push(chars.next().unwrap_or_default());
        }
        if name.is_empty() {
            break;
        }

        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'=') {
            chars.next();
            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }
            match chars.peek().copied() {
                Some(quote @ ('"' | '\'')) => {
                    chars.next();
                    for c in chars.by_ref() {
                        if c == quote {
                            break;
                        }
                        value.push(c);
                    }
                }
                _ => {
                    while matches!(chars.peek(), Some(c) if !c.is_whitespace()) {
                        value.push(chars.next().unwrap_or_default());
                    }
                }
            }
        }

        attrs.push((name.to_ascii_lowercase(), value));
    }

    attrs
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_parsing_requires_scheme_and_host() {
        assert!(UrlParts::parse("https://example.com").is_some());
        assert!(UrlParts::parse("http://example.com/path?q=1").is_some());
        assert!(UrlParts::parse("example.com").is_none());
        assert!(UrlParts::parse("ftp://example.com").is_none());
        assert!(UrlParts::parse("https:///no-host").is_none());

        let parts = UrlParts::parse("https://example.com/deep/path").unwrap();
        assert_eq!(parts.host, "example.com");
        assert_eq!(parts.origin(), "https://example.com");
    }

    #[test]
    fn absolutize_handles_each_href_shape() {
        let parts = UrlParts::parse("https://example.com/app").unwrap();
        assert_eq!(
            parts.absolutize("https://cdn.io/i.png"),
            "https://cdn.io/i.png"
        );
        assert_eq!(parts.absolutize("//cdn.io/i.png"), "https://cdn.io/i.png");
        assert_eq!(
            parts.absolutize("/favicon.ico"),
            "https://example.com/favicon.ico"
        );
        assert_eq!(
            parts.absolutize("favicon.ico"),
            "https://example.com/favicon.ico"
        );
    }

    #[test]
    fn title_is_extracted_and_cleaned() {
        assert_eq!(
            extract_title("<html><head><TITLE>  My\n  App </TITLE></head>"),
            Some("My App".to_string())
        );
        assert_eq!(
            extract_title("<title>Ben &amp; Jerry</title>"),
            Some("Ben & Jerry".to_string())
        );
        assert_eq!(extract_title("<title></title>"), None);
        assert_eq!(extract_title("<body>no title</body>"), None);
    }

    #[test]
    fn meta_description_is_extracted() {
        let html = r#"<meta charset="utf-8"><meta name="Description" content="A fine app">"#;
        assert_eq!(
            extract_meta_description(html),
            Some("A fine app".to_string())
        );
        assert_eq!(extract_meta_description("<meta name=\"author\">"), None);
    }

    #[test]
    fn favicon_lookup_honors_rel_priority() {
        let html = r#"
            <link rel="stylesheet" href="style.css">
            <link rel="apple-touch-icon" href="/touch.png">
            <link rel="shortcut icon" href="/fav.ico">
        "#;
        // "shortcut icon" carries the icon token, so it wins over
        // apple-touch-icon despite appearing later.
        assert_eq!(extract_favicon_href(html), Some("/fav.ico".to_string()));

        let touch_only = r#"<link rel="apple-touch-icon" href="/touch.png">"#;
        assert_eq!(
            extract_favicon_href(touch_only),
            Some("/touch.png".to_string())
        );

        assert_eq!(extract_favicon_href("<link rel=\"icon\">"), None);
    }

    #[test]
    fn attrs_parse_quoted_and_bare_values() {
        let attrs = tag_attrs(r#" rel='icon' href=/f.ico sizes="32x32" async"#);
        assert!(attrs.contains(&("rel".to_string(), "icon".to_string())));
        assert!(attrs.contains(&("href".to_string(), "/f.ico".to_string())));
        assert!(attrs.contains(&("sizes".to_string(), "32x32".to_string())));
        assert!(attrs.contains(&("async".to_string(), String::new())));
    }

    #[test]
    fn find_tags_skips_prefix_collisions() {
        let html = "<linkage x=1><link rel=icon href=/a.ico>";
        let lower = html.to_ascii_lowercase();
        let tags = find_tags(html, &lower, "link");
        assert_eq!(tags.len(), 1);
        assert!(tags[0].contains("rel=icon"));
    }

    #[test]
    fn content_types_map_to_extensions() {
        assert_eq!(extension_for_content_type("image/png"), ".png");
        assert_eq!(
            extension_for_content_type("image/jpeg; charset=binary"),
            ".jpg"
        );
        assert_eq!(extension_for_content_type("image/x-icon"), ".ico");
        assert_eq!(extension_for_content_type("image/svg+xml"), ".svg");
        assert_eq!(extension_for_content_type(""), ".png");
        assert_eq!(extension_for_content_type("text/html"), ".png");
    }
}
