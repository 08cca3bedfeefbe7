//! Structural lookups into a thread document.
//!
//! Regions are found by heading or tag text, never by offset, so a caller
//! can re-run a lookup after every edit. A missing region is `None`.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Byte range into the document.
pub type Span = Range<usize>;

static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(\d+)\.").unwrap());
static TOP_LEVEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(\d+)\.").unwrap());

/// Body of a `## <heading>` section: from after the heading line (and one
/// optional blank line) up to the next `##` line or the end of the text.
pub fn heading_section(doc: &str, heading: &str) -> Option<Span> {
    let pattern = format!(
        r"(?ms)^## {}[ \t]*\r?\n(?:[ \t]*\r?\n)?(.*?)(?:^##|\z)",
        regex::escape(heading)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(doc).and_then(|c| c.get(1)).map(|m| m.range())
}

/// Content between `<tag>` and the first `</tag>` after it.
pub fn tagged_block(doc: &str, tag: &str) -> Option<Span> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = doc.find(&open)? + open.len();
    let end = start + doc[start..].find(&close)?;
    Some(start..end)
}

/// Highest `<n>.` prefix at column 0 among the lines of `body`. Indented
/// sub-lists do not count.
pub fn numbered_max(body: &str) -> Option<u64> {
    TOP_LEVEL
        .captures_iter(body)
        .filter_map(|c| c[1].parse::<u64>().ok())
        .max()
}

/// Offset just past the text of the last numbered line (before its line ending).
/// Indented numbered lines count here so a sub-list stays under its parent.
pub fn numbered_end(body: &str) -> Option<usize> {
    let last = NUMBERED.find_iter(body).last()?;
    let rest = &body[last.end()..];
    let line = &rest[..rest.find('\n').unwrap_or(rest.len())];
    let line = line.strip_suffix('\r').unwrap_or(line);
    Some(last.end() + line.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
# Thread: demo

## Decisions Made

1. first
2. second

### Notes
sub

## Rejected Ideas

## Last Session

**Date:** 2026-01-01
";

    #[test]
    fn heading_section_stops_at_next_heading() {
        let span = heading_section(DOC, "Decisions Made").unwrap();
        assert_eq!(&DOC[span], "1. first\n2. second\n\n");
    }

    #[test]
    fn empty_heading_section() {
        let span = heading_section(DOC, "Rejected Ideas").unwrap();
        assert_eq!(&DOC[span], "");
    }

    #[test]
    fn last_section_runs_to_end() {
        let span = heading_section(DOC, "Last Session").unwrap();
        assert_eq!(&DOC[span], "**Date:** 2026-01-01\n");
    }

    #[test]
    fn missing_heading_is_none() {
        assert!(heading_section(DOC, "Open Questions").is_none());
        // a deeper heading with the same text is not a match
        assert!(heading_section("### Decisions Made\n\n1. x\n", "Decisions Made").is_none());
    }

    #[test]
    fn tagged_block_span() {
        let doc = "a <active_decisions>\n1. x\n</active_decisions> b";
        let span = tagged_block(doc, "active_decisions").unwrap();
        assert_eq!(&doc[span], "\n1. x\n");
        assert!(tagged_block(doc, "rejected_ideas").is_none());
        assert!(tagged_block("<open_questions> never closed", "open_questions").is_none());
    }

    #[test]
    fn numbering_helpers() {
        let body = "1. a\n  7. b\ntext\n3. c\r\ntrailing\n";
        assert_eq!(numbered_max(body), Some(3));
        assert_eq!(&body[..numbered_end(body).unwrap()], "1. a\n  7. b\ntext\n3. c");
        assert_eq!(numbered_max("no numbers"), None);
        assert_eq!(numbered_end(""), None);
    }

    #[test]
    fn indented_sublist_does_not_raise_max() {
        let body = "1. parent
   7. detail
   8. more
2. next
";
        assert_eq!(numbered_max(body), Some(2));
        assert_eq!(&body[..numbered_end(body).unwrap()], "1. parent
   7. detail
   8. more
2. next");
        assert_eq!(numbered_max("  4. only indented
"), None);
    }
}
