//! Progress reporting while a question is being answered

use crate::cli::commands::OutputFormat;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use moviegraph_application::ports::progress::RetrievalProgress;
use moviegraph_domain::{QueryAttempt, QueryOutcome};
use std::sync::Mutex;
use std::time::Duration;

/// Printed whenever a generated query is not valid Cypher
pub const SYNTAX_NOTICE: &str = "System: System error, cannot provide additional data";

/// The notice to show the user for a finished query, if any.
///
/// Only syntax errors are announced; other failures stay internal.
pub fn notice_for(attempt: &QueryAttempt) -> Option<&'static str> {
    matches!(attempt.outcome, QueryOutcome::SyntaxInvalid).then_some(SYNTAX_NOTICE)
}

fn round_message(round: usize, rag_question: &str) -> String {
    format!("Searching the movie graph (round {round}): {rag_question}")
}

/// Reports progress with a spinner
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn set_message(&self, message: String) {
        let Ok(mut spinner) = self.spinner.lock() else {
            return;
        };
        let bar = spinner.get_or_insert_with(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(Self::spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        bar.set_message(message);
    }

    /// Print a line without tearing the spinner
    fn println(&self, line: &str) {
        match self.spinner.lock().ok().as_deref().and_then(Option::as_ref) {
            Some(bar) => bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }

    /// Remove the spinner once the answer is ready.
    pub fn finish(&self) {
        if let Ok(mut spinner) = self.spinner.lock()
            && let Some(bar) = spinner.take()
        {
            bar.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.finish();
    }
}

impl RetrievalProgress for ProgressReporter {
    fn on_answer_start(&self) {
        self.set_message("Thinking...".dimmed().to_string());
    }

    fn on_round_start(&self, round: usize, rag_question: &str) {
        self.set_message(round_message(round, rag_question).cyan().to_string());
    }

    fn on_queries_generated(&self, _round: usize, queries: &[String]) {
        self.set_message(format!("Running {} queries...", queries.len()));
    }

    fn on_query_complete(&self, _round: usize, attempt: &QueryAttempt) {
        if let Some(notice) = notice_for(attempt) {
            self.println(&notice.yellow().to_string());
        }
    }

    fn on_exhausted(&self, rounds: usize) {
        self.println(
            &format!("No grounded answer after {rounds} rounds")
                .dimmed()
                .to_string(),
        );
    }
}

/// How much progress single-question mode shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Spinner plus notices
    Spinner,
    /// Notices only ([`SimpleProgress`])
    Notices,
    /// Nothing on stdout besides the answer document
    Silent,
}

impl ProgressMode {
    pub fn select(output: OutputFormat, quiet: bool) -> Self {
        match output {
            // stdout carries exactly one JSON document; attempts record syntax failures
            OutputFormat::Json => ProgressMode::Silent,
            OutputFormat::Text if quiet => ProgressMode::Notices,
            OutputFormat::Text => ProgressMode::Spinner,
        }
    }
}

/// Plain progress without a spinner; only user-facing notices are printed
pub struct SimpleProgress;

impl RetrievalProgress for SimpleProgress {
    fn on_query_complete(&self, _round: usize, attempt: &QueryAttempt) {
        if let Some(notice) = notice_for(attempt) {
            println!("{notice}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_syntax_errors_are_announced() {
        let attempt = |outcome| QueryAttempt::new("MATCH (m) RETURN m", outcome);

        assert_eq!(
            notice_for(&attempt(QueryOutcome::SyntaxInvalid)),
            Some("System: System error, cannot provide additional data")
        );
        assert_eq!(notice_for(&attempt(QueryOutcome::Empty)), None);
        assert_eq!(
            notice_for(&attempt(QueryOutcome::Failed {
                reason: "connection reset".to_string()
            })),
            None
        );
        assert_eq!(
            notice_for(&attempt(QueryOutcome::Success {
                context: "[]".to_string()
            })),
            None
        );
    }

    #[test]
    fn test_progress_mode_selection() {
        assert_eq!(
            ProgressMode::select(OutputFormat::Text, false),
            ProgressMode::Spinner
        );
        assert_eq!(
            ProgressMode::select(OutputFormat::Text, true),
            ProgressMode::Notices
        );
        assert_eq!(
            ProgressMode::select(OutputFormat::Json, false),
            ProgressMode::Silent
        );
        assert_eq!(
            ProgressMode::select(OutputFormat::Json, true),
            ProgressMode::Silent
        );
    }

    #[test]
    fn test_round_message() {
        assert_eq!(
            round_message(2, "Who directed Heat?"),
            "Searching the movie graph (round 2): Who directed Heat?"
        );
    }

    #[test]
    fn test_finish_without_spinner_is_noop() {
        let reporter = ProgressReporter::new();
        reporter.finish();
        reporter.finish();
    }
}
