//! Document mutator: applies a [`PatchChangeSet`] to thread-state text.
//!
//! Every field is an independent regional edit. Each edit looks its region up
//! again on the current text, so edits can run in any order and a missing
//! region only skips that one edit.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::changeset::PatchChangeSet;
use crate::clock::{format_date, Clock};
use crate::region::{self, Span};

pub const LAST_SESSION_HEADING: &str = "Last Session";
pub const LAST_SESSION_SUMMARY: &str = "[Auto-updated via ctxp patch]";

static LAST_UPDATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(Last Updated:(?:\*\*)?)[^\r\n]*").unwrap());

static OPEN_CHECKBOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*[-*] \[) \]([^\n]*)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemStyle {
    Plain,
    Struck,
}

impl ItemStyle {
    fn render(self, text: &str) -> String {
        match self {
            ItemStyle::Plain => text.to_string(),
            ItemStyle::Struck => format!("~~{text}~~"),
        }
    }
}

/// One logical numbered list, mirrored in a tagged block and/or a section.
#[derive(Debug, Clone, Copy)]
struct ListTarget {
    edit: EditKind,
    tag: &'static str,
    heading: &'static str,
    style: ItemStyle,
}

const DECISIONS: ListTarget = ListTarget {
    edit: EditKind::Decisions,
    tag: "active_decisions",
    heading: "Decisions Made",
    style: ItemStyle::Plain,
};

const REJECTED: ListTarget = ListTarget {
    edit: EditKind::Rejected,
    tag: "rejected_ideas",
    heading: "Rejected Ideas",
    style: ItemStyle::Struck,
};

const OPEN_QUESTIONS: ListTarget = ListTarget {
    edit: EditKind::OpenQuestions,
    tag: "open_questions",
    heading: "Open Questions",
    style: ItemStyle::Plain,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    LastUpdated,
    Decisions,
    Rejected,
    OpenQuestions,
    ResolveQuestion,
    Status,
    NextActions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No heading or tag for this edit exists in the document.
    RegionNotFound,
    /// Status key has neither a `**key:**` line nor a table row.
    KeyNotFound,
    /// No unchecked checklist line contains the substring.
    NoMatch,
    /// The list's next number would not fit in a `u64`.
    NumberingExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Applied {
    pub edit: EditKind,
    pub target: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub edit: EditKind,
    pub target: String,
    pub reason: SkipReason,
}

/// New document text plus what was and was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub text: String,
    pub applied: Vec<Applied>,
    pub skipped: Vec<Skipped>,
}

impl Mutation {
    fn unchanged(doc: &str) -> Self {
        Self {
            text: doc.to_string(),
            applied: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn record_applied(&mut self, edit: EditKind, target: impl Into<String>, count: usize) {
        self.applied.push(Applied {
            edit,
            target: target.into(),
            count,
        });
    }

    fn record_skipped(&mut self, edit: EditKind, target: impl Into<String>, reason: SkipReason) {
        let target = target.into();
        tracing::debug!(?edit, %target, ?reason, "edit skipped");
        self.skipped.push(Skipped {
            edit,
            target,
            reason,
        });
    }
}

pub struct Mutator<'c> {
    clock: &'c dyn Clock,
}

impl<'c> Mutator<'c> {
    pub fn new(clock: &'c dyn Clock) -> Self {
        Self { clock }
    }

    pub fn apply(&self, doc: &str, changes: &PatchChangeSet) -> Mutation {
        let mut m = Mutation::unchanged(doc);
        if changes.is_empty() {
            return m;
        }
        let today = format_date(self.clock.today());

        touch_last_updated(&mut m, &today);
        add_items(&mut m, DECISIONS, &changes.decisions_to_add);
        add_items(&mut m, REJECTED, &changes.rejected_to_add);
        add_items(&mut m, OPEN_QUESTIONS, &changes.questions_to_add);
        resolve_questions(&mut m, &changes.questions_to_resolve);
        update_status(&mut m, &changes.status_updates);
        replace_last_session(&mut m, &changes.next_actions, &today);
        m
    }
}

/// Apply `changes` to `doc` and return the new text.
pub fn apply(doc: &str, changes: &PatchChangeSet, clock: &dyn Clock) -> String {
    Mutator::new(clock).apply(doc, changes).text
}

fn touch_last_updated(m: &mut Mutation, today: &str) {
    let count = LAST_UPDATED.find_iter(&m.text).count();
    if count == 0 {
        m.record_skipped(EditKind::LastUpdated, "Last Updated", SkipReason::RegionNotFound);
        return;
    }
    m.text = LAST_UPDATED
        .replace_all(&m.text, |c: &Captures| format!("{} {today}", &c[1]))
        .into_owned();
    m.record_applied(EditKind::LastUpdated, "Last Updated", count);
}

#[derive(Debug, Clone, Copy)]
enum RegionKind {
    Tag,
    Heading,
}

fn add_items(m: &mut Mutation, target: ListTarget, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let mut found = false;

    if let Some(span) = region::tagged_block(&m.text, target.tag) {
        let label = format!("<{}>", target.tag);
        match append_numbered(&m.text, span, items, target.style, RegionKind::Tag) {
            Some(text) => {
                m.text = text;
                m.record_applied(target.edit, label, items.len());
            }
            None => m.record_skipped(target.edit, label, SkipReason::NumberingExhausted),
        }
        found = true;
    }
    if let Some(span) = region::heading_section(&m.text, target.heading) {
        let label = format!("## {}", target.heading);
        match append_numbered(&m.text, span, items, target.style, RegionKind::Heading) {
            Some(text) => {
                m.text = text;
                m.record_applied(target.edit, label, items.len());
            }
            None => m.record_skipped(target.edit, label, SkipReason::NumberingExhausted),
        }
        found = true;
    }
    if !found {
        m.record_skipped(target.edit, target.heading, SkipReason::RegionNotFound);
    }
}

/// Append `items` as numbered lines after the last numbered line of `span`,
/// continuing from that region's highest number. `None` when the numbers
/// would run past `u64::MAX`.
fn append_numbered(
    text: &str,
    span: Span,
    items: &[String],
    style: ItemStyle,
    kind: RegionKind,
) -> Option<String> {
    let body = &text[span.clone()];
    let first = match region::numbered_max(body) {
        Some(n) => n.checked_add(1)?,
        None => 1,
    };
    let last = first.checked_add(items.len().saturating_sub(1) as u64)?;
    let block = items
        .iter()
        .zip(first..=last)
        .map(|(item, n)| format!("{n}. {}", style.render(item)))
        .collect::<Vec<_>>()
        .join("\n");

    let trimmed = body.trim_end();
    let (at, insert) = if let Some(end) = region::numbered_end(body) {
        (span.start + end, format!("\n{block}"))
    } else if !trimmed.trim_start().is_empty() {
        (span.start + trimmed.len(), format!("\n{block}"))
    } else {
        match kind {
            RegionKind::Tag => {
                let after_newline = body.find('\n').map_or(0, |i| i + 1);
                (span.start + after_newline, format!("{block}\n"))
            }
            RegionKind::Heading => {
                let spacer = if body.is_empty() && span.end < text.len() {
                    "\n"
                } else {
                    ""
                };
                (span.start, format!("{block}\n{spacer}"))
            }
        }
    };

    let mut out = String::with_capacity(text.len() + insert.len());
    out.push_str(&text[..at]);
    out.push_str(&insert);
    out.push_str(&text[at..]);
    Some(out)
}

fn resolve_questions(m: &mut Mutation, needles: &[String]) {
    for needle in needles {
        let lowered = needle.to_lowercase();
        if lowered.is_empty() {
            m.record_skipped(EditKind::ResolveQuestion, needle.as_str(), SkipReason::NoMatch);
            continue;
        }
        let mut flipped = 0usize;
        let next = OPEN_CHECKBOX
            .replace_all(&m.text, |c: &Captures| {
                if c[2].to_lowercase().contains(&lowered) {
                    flipped += 1;
                    format!("{}x]{}", &c[1], &c[2])
                } else {
                    c[0].to_string()
                }
            })
            .into_owned();
        if flipped == 0 {
            m.record_skipped(EditKind::ResolveQuestion, needle.as_str(), SkipReason::NoMatch);
        } else {
            m.text = next;
            m.record_applied(EditKind::ResolveQuestion, needle.as_str(), flipped);
        }
    }
}

fn update_status(m: &mut Mutation, updates: &BTreeMap<String, String>) {
    for (key, value) in updates {
        if key.is_empty() {
            m.record_skipped(EditKind::Status, key.as_str(), SkipReason::KeyNotFound);
            continue;
        }
        let key_re = regex::escape(key);
        let (Ok(field), Ok(row)) = (
            Regex::new(&format!(r"(?i)(\*\*{key_re}:\*\*)[^\r\n]*")),
            Regex::new(&format!(
                r"(?mi)^(\|[ \t]*{key_re}[ \t]*\|)(?:\\\||[^|\r\n])*(\|)"
            )),
        ) else {
            m.record_skipped(EditKind::Status, key.as_str(), SkipReason::KeyNotFound);
            continue;
        };

        let count = field.find_iter(&m.text).count() + row.find_iter(&m.text).count();
        if count == 0 {
            m.record_skipped(EditKind::Status, key.as_str(), SkipReason::KeyNotFound);
            continue;
        }

        let cell = value.replace('|', "\\|");
        let text = field
            .replace_all(&m.text, |c: &Captures| format!("{} {value}", &c[1]))
            .into_owned();
        m.text = row
            .replace_all(&text, |c: &Captures| format!("{} {cell} {}", &c[1], &c[2]))
            .into_owned();
        m.record_applied(EditKind::Status, key.as_str(), count);
    }
}

fn replace_last_session(m: &mut Mutation, actions: &[String], today: &str) {
    if actions.is_empty() {
        return;
    }
    let Some(span) = region::heading_section(&m.text, LAST_SESSION_HEADING) else {
        m.record_skipped(
            EditKind::NextActions,
            LAST_SESSION_HEADING,
            SkipReason::RegionNotFound,
        );
        return;
    };

    let old = &m.text[span.clone()];
    let tail = match &old[old.trim_end().len()..] {
        "" => "\n",
        ws => ws,
    };
    let mut body = format!(
        "**Date:** {today}\n**Summary:** {LAST_SESSION_SUMMARY}\n**Next Actions:**"
    );
    for (n, action) in (1..).zip(actions) {
        body.push_str(&format!("\n{n}. {action}"));
    }
    body.push_str(tail);

    m.text.replace_range(span, &body);
    m.record_applied(EditKind::NextActions, LAST_SESSION_HEADING, actions.len());
}
