//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for single-question mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// The answer as plain text
    #[default]
    Text,
    /// Answer, context and executed queries as JSON
    Json,
}

/// CLI arguments for moviegraph
#[derive(Parser, Debug)]
#[command(name = "moviegraph")]
#[command(author, version, about = "Chat with a movie knowledge graph")]
#[command(long_about = r#"
moviegraph answers questions about movies using a language model and a
Neo4j movie graph. When the model lacks the facts it needs, it writes
Cypher queries, runs them, and answers from the results.

Without a question, an interactive chat starts. Type `restart` to forget
the conversation, `exit` or `quit` to leave.

Configuration files are loaded from (in priority order):
1. MOVIEGRAPH_* environment variables (e.g. MOVIEGRAPH_GRAPH__URI)
2. --config <path>       Explicit config file
3. ./moviegraph.toml     Project-level config
4. ~/.config/moviegraph/config.toml   Global config
5. HF_TOKEN, MODEL, URI, USER, PASSWORD, DB_NAME

Example:
  moviegraph
  moviegraph "Who directed Inception?"
  moviegraph --output json --max-rounds 3 "Which movies did Michael Mann direct?"
"#)]
pub struct Cli {
    /// Ask one question and exit (starts the interactive chat when omitted)
    pub question: Option<String>,

    /// Model to answer with (overrides llm.model)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Maximum query rounds per question (overrides retrieval.max_rounds)
    #[arg(long, value_name = "N")]
    pub max_rounds: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration sources and the effective configuration, then exit
    #[arg(long)]
    pub show_config: bool,
}
