//! STATE PATCH parser.
//!
//! The patch text comes from a chat model and is never validated upstream,
//! so parsing is total: anything unrecognised is dropped and recorded in the
//! [`ParseReport`] instead of failing.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::changeset::PatchChangeSet;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Thread:\s*(.*?)\s*\|\s*Date:\s*([\d-]+)").unwrap()
});

const BULLETS: [char; 3] = ['•', '-', '*'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    AddDecisions,
    AddRejected,
    AddQuestions,
    ResolveQuestions,
    Status,
    Next,
}

/// Checked in order, before bullet detection.
const MARKERS: [(&str, Section); 6] = [
    ("[ADD] DECISIONS MADE", Section::AddDecisions),
    ("[ADD] REJECTED IDEAS", Section::AddRejected),
    ("[ADD] OPEN QUESTIONS", Section::AddQuestions),
    ("[REMOVE] OPEN QUESTIONS", Section::ResolveQuestions),
    ("[UPDATE] STATUS", Section::Status),
    ("[NEXT]", Section::Next),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Bullet line seen before any section marker.
    OutsideSection,
    /// `[UPDATE] STATUS` item with no `key: value` split.
    StatusWithoutColon,
    /// Bullet with nothing after the glyphs.
    EmptyItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedLine {
    /// 1-based.
    pub line_no: usize,
    pub text: String,
    pub reason: DropReason,
}

/// How much of a patch was understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseOutcome {
    /// No edit was recognised. Applying it is a no-op.
    Empty,
    /// Edits recognised and every bullet line was used.
    Complete,
    /// Edits recognised but some bullet lines were dropped.
    Partial,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub changes: PatchChangeSet,
    pub dropped: Vec<DroppedLine>,
}

impl ParseReport {
    pub fn outcome(&self) -> ParseOutcome {
        if self.changes.is_empty() {
            ParseOutcome::Empty
        } else if self.dropped.is_empty() {
            ParseOutcome::Complete
        } else {
            ParseOutcome::Partial
        }
    }
}

/// Parse a STATE PATCH into a change-set. Never fails.
pub fn parse(raw: &str) -> PatchChangeSet {
    parse_report(raw).changes
}

/// Parse a STATE PATCH and keep track of the bullet lines that were dropped.
pub fn parse_report(raw: &str) -> ParseReport {
    let mut report = ParseReport::default();
    let changes = &mut report.changes;

    if let Some(caps) = HEADER.captures(raw) {
        changes.thread_name = caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .filter(|s| !s.is_empty());
        changes.date = caps.get(2).map(|m| m.as_str().to_string());
    }

    let mut section: Option<Section> = None;

    for (idx, raw_line) in raw.lines().enumerate() {
        let line = raw_line.trim();

        if let Some((_, next)) = MARKERS.iter().find(|(marker, _)| line.contains(marker)) {
            section = Some(*next);
            continue;
        }

        if !line.starts_with(BULLETS) {
            continue;
        }

        let item = line
            .trim_start_matches(|c: char| BULLETS.contains(&c) || c == ' ')
            .trim();
        let dropped_line = |reason| DroppedLine {
            line_no: idx + 1,
            text: line.to_string(),
            reason,
        };

        if item.is_empty() {
            report.dropped.push(dropped_line(DropReason::EmptyItem));
            continue;
        }

        let target = match section {
            None => {
                report.dropped.push(dropped_line(DropReason::OutsideSection));
                continue;
            }
            Some(Section::Status) => {
                match item.split_once(':') {
                    Some((key, value)) => {
                        changes
                            .status_updates
                            .insert(key.trim().to_string(), value.trim().to_string());
                    }
                    None => report.dropped.push(dropped_line(DropReason::StatusWithoutColon)),
                }
                continue;
            }
            Some(Section::AddDecisions) => &mut changes.decisions_to_add,
            Some(Section::AddRejected) => &mut changes.rejected_to_add,
            Some(Section::AddQuestions) => &mut changes.questions_to_add,
            Some(Section::ResolveQuestions) => &mut changes.questions_to_resolve,
            Some(Section::Next) => &mut changes.next_actions,
        };
        target.push(item.to_string());
    }

    if !report.dropped.is_empty() {
        tracing::debug!(dropped = report.dropped.len(), "patch lines ignored");
    }
    report
}

/// Whether clipboard text plausibly holds a STATE PATCH.
pub fn looks_like_patch(text: &str) -> bool {
    text.contains("STATE PATCH") || text.contains("[ADD]") || text.contains("[UPDATE]")
}
