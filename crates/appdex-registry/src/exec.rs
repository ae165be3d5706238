//! Exec field expansion and launch command tokenization.

/// Strip placeholder tokens (`%f`, `%U`, `%k`, ...) from an Exec command.
///
/// Every `%` followed by an ASCII letter is removed; any other
/// `%`-sequence (`%%`, `%1`, a bare trailing `%`) is left untouched.
/// Real file/URL arguments are never substituted: launch commands in the
/// registry are expected to be self-contained.
pub fn expand_exec_command(command: &str) -> String {
    let mut expanded = String::with_capacity(command.len());
    let mut chars = command.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '%' && chars.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            chars.next();
        } else {
            expanded.push(ch);
        }
    }

    expanded
}

/// Split a launch command into an argument vector.
///
/// Whitespace outside quotes separates tokens. A backslash escapes the next
/// character regardless of quote state. A `"` or `'` opens a quoted region
/// closed only by the same character. An unterminated quote is tolerated:
/// the accumulated token is still emitted, so malformed commands degrade
/// instead of blocking listing. Rejecting a command that tokenizes to
/// nothing is the run operation's job, not the tokenizer's.
pub fn split_exec_command(command: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quote: Option<char> = None;
    let mut escape = false;

    for ch in command.chars() {
        if escape {
            current.push(ch);
            escape = false;
        } else if ch == '\\' {
            escape = true;
        } else if let Some(quote) = in_quote {
            if ch == quote {
                in_quote = None;
            } else {
                current.push(ch);
            }
        } else if ch == '"' || ch == '\'' {
            in_quote = Some(ch);
        } else if ch.is_whitespace() {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}
