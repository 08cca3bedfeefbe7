use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured result of parsing one STATE PATCH.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchChangeSet {
    pub thread_name: Option<String>,
    pub date: Option<String>,
    pub decisions_to_add: Vec<String>,
    pub rejected_to_add: Vec<String>,
    pub questions_to_add: Vec<String>,
    pub questions_to_resolve: Vec<String>,
    pub status_updates: BTreeMap<String, String>,
    pub next_actions: Vec<String>,
}

impl PatchChangeSet {
    /// True when applying this change-set would edit nothing.
    ///
    /// The header fields are metadata only and do not count.
    pub fn is_empty(&self) -> bool {
        self.decisions_to_add.is_empty()
            && self.rejected_to_add.is_empty()
            && self.questions_to_add.is_empty()
            && self.questions_to_resolve.is_empty()
            && self.status_updates.is_empty()
            && self.next_actions.is_empty()
    }

    /// One line per populated field, for confirmation prompts.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.decisions_to_add.is_empty() {
            lines.push(format!(
                "+ Adding {} decision(s)",
                self.decisions_to_add.len()
            ));
        }
        if !self.rejected_to_add.is_empty() {
            lines.push(format!(
                "+ Adding {} rejected idea(s)",
                self.rejected_to_add.len()
            ));
        }
        if !self.questions_to_add.is_empty() {
            lines.push(format!(
                "+ Adding {} open question(s)",
                self.questions_to_add.len()
            ));
        }
        if !self.questions_to_resolve.is_empty() {
            lines.push(format!(
                "- Resolving {} open question(s)",
                self.questions_to_resolve.len()
            ));
        }
        if !self.status_updates.is_empty() {
            let keys: Vec<&str> = self.status_updates.keys().map(String::as_str).collect();
            lines.push(format!("~ Updating status ({})", keys.join(", ")));
        }
        if !self.next_actions.is_empty() {
            lines.push(format!(
                "~ Updating next actions ({} items)",
                self.next_actions.len()
            ));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let cs = PatchChangeSet::default();
        assert!(cs.is_empty());
        assert!(cs.summary_lines().is_empty());
    }

    #[test]
    fn header_alone_is_still_empty() {
        let cs = PatchChangeSet {
            thread_name: Some("infra".into()),
            date: Some("2026-01-02".into()),
            ..Default::default()
        };
        assert!(cs.is_empty());
    }

    #[test]
    fn summary_lists_status_keys() {
        let mut cs = PatchChangeSet::default();
        cs.status_updates.insert("Stage".into(), "review".into());
        cs.status_updates.insert("Owner".into(), "sam".into());
        cs.decisions_to_add.push("use sqlite".into());
        let lines = cs.summary_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "+ Adding 1 decision(s)");
        assert_eq!(lines[1], "~ Updating status (Owner, Stage)");
    }
}
