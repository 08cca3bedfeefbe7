//! Interactive terminal input: confirmation prompts and manual patch paste.

use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

/// Line-at-a-time input. `None` means end of input or a timed-out read.
pub trait LineSource {
    fn next_line(&mut self) -> Option<String>;
}

/// Blocks until a line arrives.
pub struct Blocking<R>(pub R);

impl<R: BufRead> LineSource for Blocking<R> {
    fn next_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.0.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(trim_newline(line)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read input");
                None
            }
        }
    }
}

/// Stdin read on a helper thread so a read can give up after `timeout`.
pub struct Timed {
    rx: Receiver<String>,
    timeout: Duration,
}

impl Timed {
    pub fn stdin(timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self { rx, timeout }
    }
}

impl LineSource for Timed {
    fn next_line(&mut self) -> Option<String> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(line) => Some(line),
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(secs = self.timeout.as_secs(), "timed out waiting for input");
                None
            }
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Stdin line source: blocking unless a timeout is configured.
pub fn stdin_lines(timeout: Option<Duration>) -> Box<dyn LineSource> {
    match timeout {
        Some(t) => Box::new(Timed::stdin(t)),
        None => Box::new(Blocking(std::io::stdin().lock())),
    }
}

fn trim_newline(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

/// Ask a y/n question. Anything but `y`/`yes`, including no answer, is no.
pub fn confirm(out: &mut dyn Write, lines: &mut dyn LineSource, question: &str) -> bool {
    let _ = write!(out, "{question} (y/n): ");
    let _ = out.flush();
    lines
        .next_line()
        .is_some_and(|answer| matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Read pasted text until two consecutive empty lines or end of input.
/// The two terminating empty lines are not part of the result.
pub fn read_pasted(lines: &mut dyn LineSource) -> String {
    let mut collected: Vec<String> = Vec::new();
    let mut empty_run = 0;
    while let Some(line) = lines.next_line() {
        if line.is_empty() {
            empty_run += 1;
        } else {
            empty_run = 0;
        }
        collected.push(line);
        if empty_run == 2 {
            collected.truncate(collected.len() - 2);
            break;
        }
    }
    collected.join("\n")
}

/// Drain the source to end of input.
pub fn read_all(lines: &mut dyn LineSource) -> String {
    let mut collected = Vec::new();
    while let Some(line) = lines.next_line() {
        collected.push(line);
    }
    collected.join("\n")
}
