//! CLI entrypoint for moviegraph
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use clap::Parser;
use moviegraph_application::{
    ConversationLogger, ConversationSession, GraphStore, LlmGateway, NoConversationLogger,
    NoProgress, RetrievalLoopUseCase,
};
use moviegraph_domain::{Identifier, Model, PromptBuilder};
use moviegraph_infrastructure::{
    ChatCompletionsConfig, ChatCompletionsGateway, ConfigLoader, FileConfig,
    JsonlConversationLogger, Neo4jGraphStore, Neo4jSettings, PromptFileLoader,
};
use moviegraph_presentation::{
    ChatRepl, Cli, ConsoleFormatter, OutputFormat, ProgressMode, ProgressReporter, ReplConfig,
    SimpleProgress,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.no_config {
        ConfigLoader::load_env_only()?
    } else {
        ConfigLoader::load(cli.config.as_ref())?
    };
    apply_overrides(&mut config, &cli);

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("{line}");
        }
        println!();
        println!("{}", toml::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    let _log_guard = init_logging(&cli, &config)?;
    info!("Starting moviegraph");

    let (config, warnings) = ConfigLoader::check(config)?;
    for issue in &warnings {
        warn!("{}", issue);
        eprintln!("{}", issue);
    }

    // === Dependency Injection ===
    let templates = PromptFileLoader::load(config.prompts.path.as_deref())?;
    let prompts = Arc::new(PromptBuilder::new(templates)?);

    let settings = Neo4jSettings::from_config(&config.graph)?;
    let graph = Arc::new(
        Neo4jGraphStore::connect(&settings)
            .await
            .context("Failed to connect to Neo4j")?,
    );
    check_movies_loaded(graph.as_ref()).await;

    let llm_config = ChatCompletionsConfig::from_config(&config.llm);
    let model = llm_config.model.clone();
    let gateway: Arc<dyn LlmGateway> = Arc::new(
        ChatCompletionsGateway::new(llm_config).context("Failed to create HTTP client")?,
    );

    let conversation_logger: Arc<dyn ConversationLogger> = match &config.logging.conversation_log
    {
        Some(path) => match JsonlConversationLogger::try_open(path) {
            Some(logger) => {
                info!("Conversation log: {}", logger.path().display());
                Arc::new(logger)
            }
            None => Arc::new(NoConversationLogger),
        },
        None => Arc::new(NoConversationLogger),
    };

    let retrieval = RetrievalLoopUseCase::new(
        gateway,
        graph.clone(),
        prompts,
        config.to_retrieval_params(),
    )
    .with_conversation_logger(conversation_logger);
    let session = ConversationSession::start(retrieval);

    let result = match cli.question.as_deref() {
        Some(question) => answer_once(session, question, &model, &cli).await,
        None => {
            let repl_config = ReplConfig {
                show_progress: config.repl.show_progress && !cli.quiet,
                history_file: config.repl.history_file.clone(),
            };
            let mut repl = ChatRepl::new(session, model).with_config(repl_config);
            repl.run().await.map_err(anyhow::Error::from)
        }
    };

    if let Ok(store) = Arc::try_unwrap(graph) {
        store.close();
    }

    result
}

/// Single-question mode
async fn answer_once(
    mut session: ConversationSession,
    question: &str,
    model: &Model,
    cli: &Cli,
) -> Result<()> {
    let outcome = match ProgressMode::select(cli.output, cli.quiet) {
        ProgressMode::Spinner => {
            let progress = ProgressReporter::new();
            let outcome = session.ask_with_progress(question, &progress).await;
            progress.finish();
            outcome?
        }
        ProgressMode::Notices => session.ask_with_progress(question, &SimpleProgress).await?,
        ProgressMode::Silent => session.ask_with_progress(question, &NoProgress).await?,
    };
    session.end();

    match cli.output {
        OutputFormat::Text => {
            if cli.verbose > 0 {
                println!("{}", ConsoleFormatter::format_attempts(&outcome));
            }
            println!("{}", ConsoleFormatter::format_answer(&outcome.answer));
        }
        OutputFormat::Json => {
            println!(
                "{}",
                ConsoleFormatter::format_json(question, model, &outcome)
            );
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    if let Some(max_rounds) = cli.max_rounds {
        config.retrieval.max_rounds = max_rounds;
    }
}

/// Initialize logging based on verbosity level; `RUST_LOG` wins when set.
///
/// Logs go to `logging.file` when configured, stderr otherwise. The returned
/// guard must live until exit so buffered lines are flushed.
fn init_logging(cli: &Cli, config: &FileConfig) -> Result<Option<WorkerGuard>> {
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match &config.logging.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(directory)
                .with_context(|| format!("Cannot create log directory {}", directory.display()))?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

/// Warn when the graph holds no movies (the import has not run yet).
async fn check_movies_loaded(graph: &dyn GraphStore) {
    let Ok(label) = Identifier::new("Movie") else {
        return;
    };
    match graph.node_count(&label).await {
        Ok(0) => {
            warn!("The graph contains no Movie nodes");
            eprintln!("warning: the graph contains no Movie nodes; answers will not be grounded");
        }
        Ok(count) => info!("Graph contains {} movies", count),
        Err(e) => warn!("Could not count Movie nodes: {}", e),
    }
}
