//! End-of-run summary.
//!
//! Aggregates the three terminal buckets of a completed run into counts,
//! per-resource status lines and the debug output of everything that did not
//! succeed. Rendering only decides the wording; colour and layout belong to
//! whoever prints the lines.

use crate::context::Operation;
use serde::{Deserialize, Serialize};

/// Structured summary of one completed watch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploySummary {
    /// Verb of the run, e.g. `deploy`
    pub operation: String,
    /// Lower-case action sentences, e.g. `successfully deployed 2 resources`
    pub actions: Vec<String>,
    /// `pretty_status()` of every succeeded resource
    pub succeeded: Vec<String>,
    /// `pretty_status()` of every failed resource
    pub failed: Vec<String>,
    /// `pretty_status()` of every resource that timed out on its own
    pub timed_out: Vec<String>,
    /// Debug messages of failed and timed-out resources
    pub debug_messages: Vec<String>,
}

impl DeploySummary {
    pub(crate) fn new(
        operation: &Operation,
        succeeded: Vec<String>,
        failed: Vec<String>,
        timed_out: Vec<String>,
        debug_messages: Vec<String>,
    ) -> Self {
        let mut actions = Vec::new();
        if !succeeded.is_empty() {
            actions.push(format!(
                "successfully {} {}",
                operation.past_tense(),
                pluralize(succeeded.len(), "resource")
            ));
        }
        if !timed_out.is_empty() {
            actions.push(format!(
                "timed out waiting for {} to {}",
                pluralize(timed_out.len(), "resource"),
                operation.name()
            ));
        }
        if !failed.is_empty() {
            actions.push(format!(
                "failed to {} {}",
                operation.name(),
                pluralize(failed.len(), "resource")
            ));
        }

        Self {
            operation: operation.name().to_string(),
            actions,
            succeeded,
            failed,
            timed_out,
            debug_messages,
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn timed_out_count(&self) -> usize {
        self.timed_out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty() && self.timed_out.is_empty()
    }

    /// Render the summary as plain lines.
    ///
    /// `success` picks the headline; the body is the same either way.
    #[must_use]
    pub fn render(&self, success: bool) -> Vec<String> {
        let mut lines = vec![if success { "Result: SUCCESS" } else { "Result: FAILURE" }.to_string()];

        if self.actions.is_empty() {
            lines.push(format!("No actions taken during {}", self.operation));
        } else {
            lines.push(capitalize(&self.actions.join(" and ")));
        }

        if !self.succeeded.is_empty() {
            lines.push(String::new());
            lines.push("Successful resources".to_string());
            lines.extend(self.succeeded.iter().cloned());
        }
        if !self.timed_out.is_empty() {
            lines.push(String::new());
            lines.push("Timed out resources".to_string());
            lines.extend(self.timed_out.iter().cloned());
        }
        if !self.failed.is_empty() {
            lines.push(String::new());
            lines.push("Failed resources".to_string());
            lines.extend(self.failed.iter().cloned());
        }
        for message in &self.debug_messages {
            lines.push(String::new());
            lines.extend(message.lines().map(str::to_string));
        }

        lines
    }
}

/// `1 resource`, `2 resources`
pub(crate) fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn capitalize(sentence: &str) -> String {
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
