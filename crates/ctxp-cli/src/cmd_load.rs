use std::io::Write;
use std::path::Path;

use ctxp_core::fragment::{assemble_context, extract_injection, extract_preamble};

use crate::clipboard::Clipboard;

pub struct LoadParams<'a> {
    pub thread_file: &'a Path,
    pub preamble: &'a Path,
    /// Print the context instead of copying it.
    pub stdout: bool,
}

/// Preamble fence contents + thread injection fragment.
pub fn build_context(preamble: &Path, thread_file: &Path) -> anyhow::Result<String> {
    let core_doc = ctxp_store::read_preamble(preamble)?;
    let thread_doc = ctxp_store::read_thread(thread_file)?;
    Ok(assemble_context(
        extract_preamble(&core_doc),
        extract_injection(&thread_doc),
    ))
}

/// `ctxp load <thread-file>`
pub fn execute(
    params: &LoadParams<'_>,
    clipboard: Option<&mut dyn Clipboard>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let context = build_context(params.preamble, params.thread_file)?;
    tracing::debug!(chars = context.chars().count(), "context assembled");

    if params.stdout {
        write!(out, "{context}")?;
        if !context.ends_with('\n') {
            writeln!(out)?;
        }
        return Ok(());
    }

    if let Some(cb) = clipboard {
        if cb.copy(&context) {
            writeln!(out, "Loaded to clipboard!")?;
            writeln!(out, "  Core prompt: {}", file_name(params.preamble))?;
            writeln!(out, "  Thread state: {}", params.thread_file.display())?;
            writeln!(out, "  {} characters copied", context.chars().count())?;
            writeln!(out)?;
            writeln!(out, "Paste into your assistant to start the session")?;
            return Ok(());
        }
        tracing::warn!("could not copy to clipboard, printing instead");
    }

    let rule = "=".repeat(60);
    writeln!(out, "{rule}")?;
    writeln!(out, "{context}")?;
    writeln!(out, "{rule}")?;
    writeln!(out)?;
    writeln!(out, "Copy the above to start your session")?;
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
