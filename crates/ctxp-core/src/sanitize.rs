use time::Date;

use crate::clock::format_date;

const MAX_SUMMARY_CHARS: usize = 50;
const FALLBACK_SUMMARY: &str = "update";

/// Characters that could change the meaning of a shell-invoked argument.
const UNSAFE_CHARS: [char; 10] = ['"', '\'', '`', '\n', '\r', '$', '\\', ';', '&', '|'];

/// Make a commit summary safe to hand to the version-control tool.
pub fn sanitize_commit_summary(summary: &str) -> String {
    let cleaned: String = summary.chars().filter(|c| !UNSAFE_CHARS.contains(c)).collect();
    let truncated: String = cleaned.trim().chars().take(MAX_SUMMARY_CHARS).collect();
    let truncated = truncated.trim_end();
    if truncated.is_empty() {
        FALLBACK_SUMMARY.to_string()
    } else {
        truncated.to_string()
    }
}

/// `[<thread>] checkpoint: <date>`
pub fn commit_message(thread_name: Option<&str>, today: Date) -> String {
    let summary = sanitize_commit_summary(thread_name.unwrap_or(FALLBACK_SUMMARY));
    format!("[{summary}] checkpoint: {}", format_date(today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn strips_quotes_ampersand_pipe() {
        let out = sanitize_commit_summary(r#"feat: "quotes" & pipes|here"#);
        assert!(!out.contains('"'));
        assert!(!out.contains('&'));
        assert!(!out.contains('|'));
        assert!(out.chars().count() <= 50);
        assert_eq!(out, "feat: quotes  pipeshere");
    }

    #[test]
    fn strips_shell_metacharacters() {
        let out = sanitize_commit_summary("a`rm -rf`;b$HOME\\c\nd\re'f");
        assert_eq!(out, "arm -rfbHOMEcdef");
    }

    #[test]
    fn truncates_to_fifty_chars() {
        let long = "x".repeat(80);
        assert_eq!(sanitize_commit_summary(&long).len(), 50);
        let wide = "é".repeat(60);
        assert_eq!(sanitize_commit_summary(&wide).chars().count(), 50);
    }

    #[test]
    fn empty_falls_back() {
        assert_eq!(sanitize_commit_summary(""), "update");
        assert_eq!(sanitize_commit_summary("\"'&|;"), "update");
        assert_eq!(sanitize_commit_summary("   "), "update");
    }

    #[test]
    fn message_uses_thread_or_fallback() {
        let d = Date::from_calendar_date(2026, Month::October, 19).unwrap();
        assert_eq!(
            commit_message(Some("infra"), d),
            "[infra] checkpoint: 2026-10-19"
        );
        assert_eq!(commit_message(None, d), "[update] checkpoint: 2026-10-19");
    }
}
