//! Load-mode extraction: pick the preamble out of its fenced block and the
//! injection fragment out of a thread file.

use std::sync::LazyLock;

use regex::Regex;

static FIRST_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[\w-]*\n(.*?)\n```").unwrap());

static INJECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[\w-]*\n(<thread>.*?</today_focus>.*?)\n```").unwrap()
});

/// Contents of the first fenced block, or the whole document.
pub fn extract_preamble(doc: &str) -> &str {
    FIRST_FENCE
        .captures(doc)
        .and_then(|c| c.get(1))
        .map_or(doc, |m| m.as_str())
}

/// The fenced `<thread> ... </today_focus>` fragment, or the whole document.
pub fn extract_injection(doc: &str) -> &str {
    INJECTION
        .captures(doc)
        .and_then(|c| c.get(1))
        .map_or(doc, |m| m.as_str())
}

pub fn assemble_context(preamble: &str, fragment: &str) -> String {
    format!("{preamble}\n\n{fragment}")
}
