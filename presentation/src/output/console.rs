//! Console output formatting for answers

use colored::Colorize;
use moviegraph_application::RetrievalOutcome;
use moviegraph_domain::{Model, QueryAttempt, QueryOutcome};
use serde::Serialize;

/// JSON document printed by `--output json`
#[derive(Debug, Serialize)]
struct JsonAnswer<'a> {
    question: &'a str,
    model: &'a str,
    answer: &'a str,
    exhausted: bool,
    rounds: usize,
    context: &'a [String],
    queries: &'a [QueryAttempt],
}

/// Formats answers and session chrome for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// The answer line of the chat
    pub fn format_answer(answer: &str) -> String {
        format!("{} {}", "Bot:".green().bold(), answer)
    }

    /// Answer, context and executed queries as pretty JSON
    pub fn format_json(question: &str, model: &Model, outcome: &RetrievalOutcome) -> String {
        let document = JsonAnswer {
            question,
            model: model.as_str(),
            answer: &outcome.answer,
            exhausted: outcome.exhausted,
            rounds: outcome.rounds,
            context: &outcome.context,
            queries: &outcome.attempts,
        };
        serde_json::to_string_pretty(&document).unwrap_or_else(|_| "{}".to_string())
    }

    /// The queries behind an answer, one per line
    pub fn format_attempts(outcome: &RetrievalOutcome) -> String {
        if outcome.attempts.is_empty() {
            return format!("{}", "(answered without querying the graph)".dimmed());
        }

        let mut output = Self::section_header(&format!(
            "Queries ({} rounds)",
            outcome.rounds
        ));
        for attempt in &outcome.attempts {
            let status = match &attempt.outcome {
                QueryOutcome::Success { .. } => "ok".green(),
                QueryOutcome::Empty => "empty".yellow(),
                QueryOutcome::SyntaxInvalid => "syntax".red(),
                QueryOutcome::Failed { .. } => "failed".red(),
            };
            output.push_str(&format!("[{:>6}] {}\n", status, attempt.query));
        }
        output
    }

    /// Banner shown at start and after `restart`
    pub fn banner(greeting: &str, model: &Model) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("moviegraph"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Model:".dimmed(), model));
        output.push_str(&format!(
            "{}\n\n",
            "Type `restart` to start over, `exit` to leave, `/help` for help.".dimmed()
        ));
        output.push_str(&Self::format_answer(greeting));
        output
    }

    pub fn help() -> String {
        let mut output = String::from("Commands:\n");
        output.push_str("  restart          - Forget the conversation and clear the screen\n");
        output.push_str("  exit, quit       - Leave the chat\n");
        output.push_str("  /help, /h, /?    - Show this help\n");
        output.push_str("Anything else is a question about movies.");
        output
    }

    pub fn format_error(message: &str) -> String {
        format!("{} {}", "Error:".red().bold(), message)
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(50);
        format!("{}\n{:^50}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }
}
