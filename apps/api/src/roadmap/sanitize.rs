// Markdown fence stripping for model output.

const FENCE: &str = "```";

/// Removes markdown code fences wrapped around `text`.
///
/// Strips a leading fence (with optional language tag) and a trailing fence,
/// repeating until nothing changes, so the result is a fixed point: running it
/// again returns the same text. Everything between the fences is untouched.
pub fn strip_code_fences(text: &str) -> &str {
    let mut current = text.trim();
    loop {
        let next = strip_once(current);
        if next.len() == current.len() {
            return current;
        }
        current = next;
    }
}

fn strip_once(text: &str) -> &str {
    let mut rest = text;
    if let Some(after) = rest.strip_prefix(FENCE) {
        rest = skip_language_tag(after);
    }
    if let Some(before) = rest.strip_suffix(FENCE) {
        rest = before;
    }
    rest.trim()
}

/// Skips an info string such as `json` right after an opening fence. The tag
/// only counts when followed by a line break, whitespace or the payload start.
fn skip_language_tag(text: &str) -> &str {
    let tag_len = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
        .unwrap_or(text.len());
    if tag_len == 0 {
        return text;
    }
    let after = &text[tag_len..];
    match after.chars().next() {
        Some(c) if c.is_whitespace() || c == '{' || c == '[' => after,
        _ => text,
    }
}
