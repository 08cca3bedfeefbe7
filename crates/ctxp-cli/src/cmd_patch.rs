use std::io::Write;
use std::path::Path;

use anyhow::Context;
use ctxp_core::clock::format_date;
use ctxp_core::parse::looks_like_patch;
use ctxp_core::sanitize::commit_message;
use ctxp_core::{parse_report, Clock, Mutator, ParseOutcome, ParseReport};

use crate::clipboard::Clipboard;
use crate::input::{self, LineSource};
use crate::vcs::{self, VersionControl};

/// Where the patch text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchSource<'a> {
    /// Clipboard, falling back to terminal paste.
    Clipboard,
    /// Standard input until EOF.
    Stdin,
    File(&'a Path),
}

impl<'a> PatchSource<'a> {
    pub fn from_arg(arg: Option<&'a str>) -> Self {
        match arg {
            None => PatchSource::Clipboard,
            Some("-") => PatchSource::Stdin,
            Some(path) => PatchSource::File(Path::new(path)),
        }
    }
}

pub struct PatchParams<'a> {
    pub thread_file: &'a Path,
    pub source: PatchSource<'a>,
    /// Skip confirmation and always commit.
    pub auto: bool,
    /// Print the patched document instead of writing it.
    pub dry_run: bool,
    pub no_commit: bool,
    /// Commit without asking even when not `auto`.
    pub auto_commit: bool,
}

/// Collaborators for one patch run.
pub struct PatchIo<'a> {
    pub clock: &'a dyn Clock,
    pub clipboard: Option<&'a mut dyn Clipboard>,
    pub lines: &'a mut dyn LineSource,
    pub vcs: &'a dyn VersionControl,
    pub out: &'a mut dyn Write,
}

/// Obtain raw patch text from `source`.
pub fn read_patch_text(
    source: PatchSource<'_>,
    clipboard: Option<&mut dyn Clipboard>,
    lines: &mut dyn LineSource,
    out: &mut dyn Write,
) -> anyhow::Result<String> {
    match source {
        PatchSource::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading patch from {}", path.display())),
        PatchSource::Stdin => Ok(input::read_all(lines)),
        PatchSource::Clipboard => {
            if let Some(text) = clipboard.and_then(|cb| cb.paste()) {
                if looks_like_patch(&text) {
                    return Ok(text);
                }
                writeln!(out, "Clipboard doesn't contain a STATE PATCH.")?;
            }
            writeln!(out, "Paste your STATE PATCH below (press Enter twice when done):")?;
            writeln!(out)?;
            out.flush()?;
            Ok(input::read_pasted(lines))
        }
    }
}

fn print_parsed(out: &mut dyn Write, report: &ParseReport) -> anyhow::Result<()> {
    let cs = &report.changes;
    writeln!(out)?;
    writeln!(out, "Parsed STATE PATCH:")?;
    writeln!(out, "  Thread: {}", cs.thread_name.as_deref().unwrap_or("(none)"))?;
    writeln!(out, "  Date: {}", cs.date.as_deref().unwrap_or("(none)"))?;
    writeln!(out, "  Decisions: {}", cs.decisions_to_add.len())?;
    writeln!(out, "  Rejected: {}", cs.rejected_to_add.len())?;
    writeln!(
        out,
        "  Open questions: +{} / -{}",
        cs.questions_to_add.len(),
        cs.questions_to_resolve.len()
    )?;
    let keys: Vec<&str> = cs.status_updates.keys().map(String::as_str).collect();
    writeln!(out, "  Status updates: [{}]", keys.join(", "))?;
    writeln!(out, "  Next actions: {}", cs.next_actions.len())?;
    for d in &report.dropped {
        tracing::warn!(line = d.line_no, reason = ?d.reason, text = %d.text, "ignored patch line");
    }
    Ok(())
}

/// `ctxp patch <thread-file>`
pub fn execute(params: &PatchParams<'_>, io: PatchIo<'_>) -> anyhow::Result<()> {
    let PatchIo {
        clock,
        clipboard,
        lines,
        vcs,
        out,
    } = io;

    if !params.thread_file.is_file() {
        let missing = params.thread_file.to_path_buf();
        return Err(ctxp_store::StoreError::ThreadNotFound(missing).into());
    }
    writeln!(out, "Thread file: {}", params.thread_file.display())?;
    writeln!(out, "{}", "-".repeat(40))?;

    let raw = read_patch_text(params.source, clipboard, lines, out)?;
    if raw.trim().is_empty() {
        anyhow::bail!("No patch content provided");
    }

    let report = parse_report(&raw);
    print_parsed(out, &report)?;

    writeln!(out)?;
    writeln!(out, "Applying changes to {}:", params.thread_file.display())?;
    if report.outcome() == ParseOutcome::Empty {
        writeln!(out, "  (no changes to apply)")?;
        return Ok(());
    }
    for line in report.changes.summary_lines() {
        writeln!(out, "  {line}")?;
    }
    if report.outcome() == ParseOutcome::Partial {
        writeln!(out, "  ({} patch line(s) ignored)", report.dropped.len())?;
    }

    if !params.auto && !params.dry_run {
        writeln!(out)?;
        if !input::confirm(out, lines, "Apply these changes?") {
            writeln!(out, "Cancelled")?;
            return Ok(());
        }
    }

    let doc = ctxp_store::read_thread(params.thread_file)?;
    let mutation = Mutator::new(clock).apply(&doc, &report.changes);
    for s in &mutation.skipped {
        tracing::warn!(edit = ?s.edit, target = %s.target, reason = ?s.reason, "change not applied");
    }

    if params.dry_run {
        writeln!(out)?;
        write!(out, "{}", mutation.text)?;
        return Ok(());
    }

    ctxp_store::write_atomic(params.thread_file, mutation.text.as_bytes())
        .with_context(|| format!("writing {}", params.thread_file.display()))?;
    writeln!(out)?;
    writeln!(out, "Updated {}", params.thread_file.display())?;

    if params.no_commit {
        return Ok(());
    }
    let commit = params.auto
        || params.auto_commit
        || input::confirm(out, lines, "Git commit?");
    if commit {
        let message = commit_message(report.changes.thread_name.as_deref(), clock.today());
        if vcs::commit_checkpoint(vcs, params.thread_file, &message) {
            writeln!(out, "Committed: {message}")?;
        } else {
            writeln!(out, "Not committed (see warning above)")?;
        }
    }
    tracing::info!(
        applied = mutation.applied.len(),
        skipped = mutation.skipped.len(),
        date = %format_date(clock.today()),
        "patch applied"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::input::Blocking;
    use crate::vcs::RecordingVcs;
    use ctxp_core::FixedClock;
    use std::fs;
    use std::io::Cursor;
    use time::{Date, Month};

    const THREAD: &str = "\
# Thread: infra

**Last Updated:** 2026-01-01
**Stage:** draft

## Decisions Made

1. Keep cron

## Last Session

**Date:** 2026-01-01
**Next Actions:**
1. kickoff
";

    const PATCH: &str = "\
=== STATE PATCH ===
Thread: infra | Date: 2026-10-19
[ADD] DECISIONS MADE
- Use Postgres
[UPDATE] STATUS
- Stage: review
[NEXT]
- write script
";

    struct Harness {
        _tmp: tempfile::TempDir,
        thread: std::path::PathBuf,
        clipboard: MemoryClipboard,
        vcs: RecordingVcs,
        out: Vec<u8>,
    }

    impl Harness {
        fn new(clip: Option<&str>) -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let thread = tmp.path().join("infra.md");
            fs::write(&thread, THREAD).unwrap();
            Self {
                _tmp: tmp,
                thread,
                clipboard: MemoryClipboard {
                    contents: clip.map(str::to_string),
                    ..Default::default()
                },
                vcs: RecordingVcs::default(),
                out: Vec::new(),
            }
        }

        fn run(&mut self, params: &PatchParams<'_>, typed: &str) -> anyhow::Result<()> {
            let clock = FixedClock(Date::from_calendar_date(2026, Month::October, 19).unwrap());
            let mut lines = Blocking(Cursor::new(typed.as_bytes().to_vec()));
            execute(
                params,
                PatchIo {
                    clock: &clock,
                    clipboard: Some(&mut self.clipboard),
                    lines: &mut lines,
                    vcs: &self.vcs,
                    out: &mut self.out,
                },
            )
        }

        fn doc(&self) -> String {
            fs::read_to_string(&self.thread).unwrap()
        }

        fn output(&self) -> String {
            String::from_utf8_lossy(&self.out).into_owned()
        }
    }

    fn params(thread: &Path) -> PatchParams<'_> {
        PatchParams {
            thread_file: thread,
            source: PatchSource::Clipboard,
            auto: false,
            dry_run: false,
            no_commit: false,
            auto_commit: false,
        }
    }

    #[test]
    fn auto_applies_and_commits() {
        let mut h = Harness::new(Some(PATCH));
        let thread = h.thread.clone();
        let p = PatchParams {
            auto: true,
            ..params(&thread)
        };
        h.run(&p, "").unwrap();

        let doc = h.doc();
        assert!(doc.contains("**Last Updated:** 2026-10-19"));
        assert!(doc.contains("1. Keep cron\n2. Use Postgres\n"));
        assert!(doc.contains("**Stage:** review"));
        assert!(doc.contains("1. write script\n"));
        assert_eq!(
            *h.vcs.calls.borrow(),
            vec![
                format!("add {}", thread.display()),
                "commit [infra] checkpoint: 2026-10-19".to_string()
            ]
        );
        assert!(h.output().contains("+ Adding 1 decision(s)"));
    }

    #[test]
    fn interactive_confirm_then_decline_commit() {
        let mut h = Harness::new(Some(PATCH));
        let thread = h.thread.clone();
        h.run(&params(&thread), "y\nn\n").unwrap();
        assert!(h.doc().contains("2. Use Postgres"));
        assert!(h.vcs.calls.borrow().is_empty());
    }

    #[test]
    fn cancelled_leaves_file_untouched() {
        let mut h = Harness::new(Some(PATCH));
        let thread = h.thread.clone();
        h.run(&params(&thread), "n\n").unwrap();
        assert_eq!(h.doc(), THREAD);
        assert!(h.output().contains("Cancelled"));
    }

    #[test]
    fn falls_back_to_terminal_paste() {
        let mut h = Harness::new(Some("not a patch at all"));
        let thread = h.thread.clone();
        let p = PatchParams {
            auto: true,
            no_commit: true,
            ..params(&thread)
        };
        h.run(&p, "[ADD] DECISIONS MADE\n- typed decision\n\n\n").unwrap();
        assert!(h.output().contains("Clipboard doesn't contain a STATE PATCH."));
        assert!(h.doc().contains("2. typed decision\n"));
        assert!(h.vcs.calls.borrow().is_empty());
    }

    #[test]
    fn empty_input_is_an_error() {
        let mut h = Harness::new(None);
        let thread = h.thread.clone();
        let err = h.run(&params(&thread), "\n\n").unwrap_err();
        assert!(err.to_string().contains("No patch content"));
        assert_eq!(h.doc(), THREAD);
    }

    #[test]
    fn no_recognised_changes_is_a_noop() {
        let mut h = Harness::new(None);
        let thread = h.thread.clone();
        let p = PatchParams {
            auto: true,
            ..params(&thread)
        };
        h.run(&p, "just chatting\n\n\n").unwrap();
        assert!(h.output().contains("(no changes to apply)"));
        assert_eq!(h.doc(), THREAD);
    }

    #[test]
    fn dry_run_prints_without_writing() {
        let mut h = Harness::new(Some(PATCH));
        let thread = h.thread.clone();
        let p = PatchParams {
            dry_run: true,
            ..params(&thread)
        };
        h.run(&p, "").unwrap();
        assert_eq!(h.doc(), THREAD);
        assert!(h.output().contains("2. Use Postgres"));
        assert!(h.vcs.calls.borrow().is_empty());
    }

    #[test]
    fn reads_patch_from_file() {
        let mut h = Harness::new(None);
        let thread = h.thread.clone();
        let patch_path = thread.with_file_name("patch.txt");
        fs::write(&patch_path, PATCH).unwrap();
        let p = PatchParams {
            source: PatchSource::File(&patch_path),
            auto: true,
            no_commit: true,
            ..params(&thread)
        };
        h.run(&p, "").unwrap();
        assert!(h.doc().contains("**Stage:** review"));
    }

    #[test]
    fn commit_failure_is_not_fatal() {
        let mut h = Harness::new(Some(PATCH));
        h.vcs.fail_stage = true;
        let thread = h.thread.clone();
        let p = PatchParams {
            auto: true,
            ..params(&thread)
        };
        h.run(&p, "").unwrap();
        assert!(h.doc().contains("2. Use Postgres"));
        assert!(h.output().contains("Not committed"));
    }

    #[test]
    fn missing_thread_file_fails_before_reading_input() {
        let mut h = Harness::new(Some(PATCH));
        let missing = h.thread.with_file_name("missing.md");
        let err = h.run(&params(&missing), "").unwrap_err();
        assert!(err.to_string().contains("could not find thread file"));
        assert!(h.output().is_empty());
    }

    #[test]
    fn patch_source_from_arg() {
        assert_eq!(PatchSource::from_arg(None), PatchSource::Clipboard);
        assert_eq!(PatchSource::from_arg(Some("-")), PatchSource::Stdin);
        assert_eq!(
            PatchSource::from_arg(Some("p.txt")),
            PatchSource::File(Path::new("p.txt"))
        );
    }
}
