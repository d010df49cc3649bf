//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::ConsoleFormatter;
use crate::config::ReplConfig;
use crate::progress::reporter::{ProgressReporter, SimpleProgress};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use moviegraph_application::{ConversationSession, SessionError};
use moviegraph_domain::Model;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::io::stdout;
use tracing::warn;

/// One line of user input, interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Blank line
    Empty,
    /// `exit` / `quit`
    Exit,
    /// `restart`: forget the conversation
    Restart,
    /// `/help`
    Help,
    /// A slash command we do not know
    Unknown(String),
    /// Anything else
    Question(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }

        match line.to_lowercase().as_str() {
            "exit" | "quit" | "/exit" | "/quit" | "/q" => ReplCommand::Exit,
            "restart" | "/restart" => ReplCommand::Restart,
            "/help" | "/h" | "/?" => ReplCommand::Help,
            _ if line.starts_with('/') => ReplCommand::Unknown(line.to_string()),
            _ => ReplCommand::Question(line.to_string()),
        }
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    session: ConversationSession,
    model: Model,
    config: ReplConfig,
}

impl ChatRepl {
    /// Create a new ChatRepl around a started session
    pub fn new(session: ConversationSession, model: Model) -> Self {
        Self {
            session,
            model,
            config: ReplConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the interactive REPL until the user leaves
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        // Try to load history
        let history_path = self.config.history_path();
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline("You: ") {
                Ok(line) => match ReplCommand::parse(&line) {
                    ReplCommand::Empty => continue,
                    ReplCommand::Exit => break,
                    ReplCommand::Restart => {
                        self.session.restart();
                        let _ = execute!(stdout(), Clear(ClearType::All), MoveTo(0, 0));
                        self.print_welcome();
                    }
                    ReplCommand::Help => {
                        println!();
                        println!("{}", ConsoleFormatter::help());
                        println!();
                    }
                    ReplCommand::Unknown(cmd) => {
                        println!("Unknown command: {}", cmd);
                        println!("Type /help for available commands");
                    }
                    ReplCommand::Question(question) => {
                        let _ = rl.add_history_entry(question.as_str());
                        self.process_question(&question).await;
                    }
                },
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        self.session.end();
        println!("Bye!");

        // Save history
        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!(
            "{}",
            ConsoleFormatter::banner(self.session.greeting(), &self.model)
        );
        println!();
    }

    async fn process_question(&mut self, question: &str) {
        let result = if self.config.show_progress {
            let progress = ProgressReporter::new();
            let result = self.session.ask_with_progress(question, &progress).await;
            progress.finish();
            result
        } else {
            self.session.ask_with_progress(question, &SimpleProgress).await
        };

        match result {
            Ok(outcome) => println!("{}", ConsoleFormatter::format_answer(&outcome.answer)),
            Err(SessionError::InvalidQuestion(e)) => {
                println!("{}", ConsoleFormatter::format_error(&e.to_string()));
            }
            Err(e) => {
                warn!("Question failed: {}", e);
                eprintln!("{}", ConsoleFormatter::format_error(&e.to_string()));
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_words() {
        for input in ["exit", "quit", "  EXIT ", "Quit", "/quit", "/q"] {
            assert_eq!(ReplCommand::parse(input), ReplCommand::Exit, "{input}");
        }
    }

    #[test]
    fn test_restart_and_help() {
        assert_eq!(ReplCommand::parse("restart"), ReplCommand::Restart);
        assert_eq!(ReplCommand::parse("Restart "), ReplCommand::Restart);
        assert_eq!(ReplCommand::parse("/help"), ReplCommand::Help);
        assert_eq!(ReplCommand::parse("/?"), ReplCommand::Help);
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        assert_eq!(ReplCommand::parse(""), ReplCommand::Empty);
        assert_eq!(ReplCommand::parse("   \t"), ReplCommand::Empty);
    }

    #[test]
    fn test_questions_keep_their_text() {
        assert_eq!(
            ReplCommand::parse("  Who directed Inception? "),
            ReplCommand::Question("Who directed Inception?".to_string())
        );
        assert_eq!(
            ReplCommand::parse("exit the matrix: who starred?"),
            ReplCommand::Question("exit the matrix: who starred?".to_string())
        );
    }

    #[test]
    fn test_unknown_slash_command() {
        assert_eq!(
            ReplCommand::parse("/models"),
            ReplCommand::Unknown("/models".to_string())
        );
    }
}
