use std::io::Write;

use ctxp_core::parse_report;
use serde_json::json;

use crate::clipboard::Clipboard;
use crate::cmd_patch::{read_patch_text, PatchSource};
use crate::input::LineSource;

/// `ctxp parse`: print what a patch would change, as JSON.
pub fn execute(
    source: PatchSource<'_>,
    clipboard: Option<&mut dyn Clipboard>,
    lines: &mut dyn LineSource,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut prompt = std::io::stderr();
    let raw = read_patch_text(source, clipboard, lines, &mut prompt)?;
    let report = parse_report(&raw);
    let doc = json!({
        "outcome": report.outcome(),
        "changes": report.changes,
        "dropped": report.dropped,
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
    Ok(())
}
