mod clipboard;
mod cmd_config;
mod cmd_load;
mod cmd_parse;
mod cmd_patch;
mod config;
mod input;
mod vcs;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ctxp_core::SystemClock;

use crate::clipboard::Clipboard;
use crate::cmd_config::ConfigCmd;
use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "ctxp",
    version,
    about = "Load thread state into an assistant session and apply STATE PATCH checkpoints"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy the core prompt plus a thread's state to the clipboard
    Load {
        /// Thread state file (markdown)
        thread_file: PathBuf,
        /// Print to stdout instead of copying
        #[arg(long)]
        stdout: bool,
        /// Preamble file (defaults to CORE_PROMPT.md lookup)
        #[arg(long)]
        preamble: Option<PathBuf>,
    },
    /// Apply a STATE PATCH to a thread state file
    Patch {
        /// Thread state file (markdown)
        thread_file: PathBuf,
        /// Apply without confirmation and commit
        #[arg(long)]
        auto: bool,
        /// Read the patch from a file ("-" for stdin) instead of the clipboard
        #[arg(long)]
        input: Option<String>,
        /// Print the patched document without writing it
        #[arg(long)]
        dry_run: bool,
        /// Never commit
        #[arg(long)]
        no_commit: bool,
    },
    /// Parse a STATE PATCH and print the change-set as JSON
    Parse {
        /// Read the patch from a file ("-" for stdin) instead of the clipboard
        #[arg(long)]
        input: Option<String>,
    },
    /// Get and set ctxp config values
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("CTXP_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn borrow_clipboard(cb: &mut Option<Box<dyn Clipboard>>) -> Option<&mut dyn Clipboard> {
    cb.as_mut().map(|b| b.as_mut() as &mut dyn Clipboard)
}

fn resolve_preamble(
    cli_path: Option<&Path>,
    config: &Config,
    cwd: &Path,
) -> anyhow::Result<PathBuf> {
    let explicit = cli_path.or(config.preamble.as_deref());
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let candidates = ctxp_store::preamble_candidates(exe_dir.as_deref(), cwd);
    Ok(ctxp_store::find_preamble(explicit, &candidates)?)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;
    let config = Config::load(&cwd)?;
    let mut stdout = std::io::stdout();

    match cli.cmd {
        Command::Load {
            thread_file,
            stdout: to_stdout,
            preamble,
        } => {
            let preamble = resolve_preamble(preamble.as_deref(), &config, &cwd)?;
            let mut clipboard = if to_stdout {
                None
            } else {
                clipboard::system(config.clipboard)
            };
            cmd_load::execute(
                &cmd_load::LoadParams {
                    thread_file: &thread_file,
                    preamble: &preamble,
                    stdout: to_stdout,
                },
                borrow_clipboard(&mut clipboard),
                &mut stdout,
            )
        }
        Command::Patch {
            thread_file,
            auto,
            input: patch_input,
            dry_run,
            no_commit,
        } => {
            let source = cmd_patch::PatchSource::from_arg(patch_input.as_deref());
            let mut clipboard = match source {
                cmd_patch::PatchSource::Clipboard => clipboard::system(config.clipboard),
                _ => None,
            };
            let mut lines = input::stdin_lines(config.prompt_timeout());
            let git = vcs::GitCli::new(&cwd, config.git_timeout());
            cmd_patch::execute(
                &cmd_patch::PatchParams {
                    thread_file: &thread_file,
                    source,
                    auto,
                    dry_run,
                    no_commit,
                    auto_commit: config.auto_commit,
                },
                cmd_patch::PatchIo {
                    clock: &SystemClock,
                    clipboard: borrow_clipboard(&mut clipboard),
                    lines: lines.as_mut(),
                    vcs: &git,
                    out: &mut stdout,
                },
            )
        }
        Command::Parse { input: patch_input } => {
            let source = cmd_patch::PatchSource::from_arg(patch_input.as_deref());
            let mut clipboard = match source {
                cmd_patch::PatchSource::Clipboard => clipboard::system(config.clipboard),
                _ => None,
            };
            let mut lines = input::stdin_lines(config.prompt_timeout());
            cmd_parse::execute(
                source,
                borrow_clipboard(&mut clipboard),
                lines.as_mut(),
                &mut stdout,
            )
        }
        Command::Config { cmd } => cmd_config::run(cmd, &cwd, &mut stdout),
    }
}
