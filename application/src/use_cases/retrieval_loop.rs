//! Retrieval loop use case
//!
//! Answers one question, retrieving data from the graph for as many
//! rounds as the model asks for (up to the configured bound).
//!
//! ```text
//! AwaitingAnswer ──(NO_CONTEXT follow-up)──▶ GeneratingQueries ──▶ ExecutingQueries
//!       ▲                                                                │
//!       └────────────────────────── context / failures ──────────────────┘
//!       │
//!       └──(no marker)──▶ Done
//! ```

use crate::config::RetrievalParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::graph_store::{GraphStore, GraphStoreError};
use crate::ports::llm_gateway::{CompletionRequest, GatewayError, LlmGateway};
use crate::ports::progress::RetrievalProgress;
use moviegraph_domain::core::string::{normalize_for_comparison, truncate};
use moviegraph_domain::{
    AnswerOutcome, ConversationHistory, PromptBuilder, PromptTemplates, QueryAttempt,
    QueryOutcome, Question, ResultClass, RetrievalState, classify_rows, parse_answer,
    parse_query_list,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while answering a question.
///
/// Query failures are not errors: they are recorded and fed back to the
/// model. Only a failing model call aborts the question.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),
}

/// Result of answering one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievalOutcome {
    /// Text to show the user
    pub answer: String,
    /// Context the answer was generated from, in retrieval order
    pub context: Vec<String>,
    /// Every query executed, in execution order
    pub attempts: Vec<QueryAttempt>,
    /// Number of query rounds run
    pub rounds: usize,
    /// True when the loop gave up and `answer` is the fallback answer
    pub exhausted: bool,
}

/// Why the loop stopped asking the model for more context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    RoundLimit,
    Stalled,
}

/// Use case driving the retrieval state machine for one question.
pub struct RetrievalLoopUseCase {
    gateway: Arc<dyn LlmGateway>,
    graph: Arc<dyn GraphStore>,
    prompts: Arc<PromptBuilder>,
    params: RetrievalParams,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl RetrievalLoopUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        graph: Arc<dyn GraphStore>,
        prompts: Arc<PromptBuilder>,
        params: RetrievalParams,
    ) -> Self {
        Self {
            gateway,
            graph,
            prompts,
            params,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn params(&self) -> &RetrievalParams {
        &self.params
    }

    /// Answer `question` given the conversation so far.
    pub async fn execute(
        &self,
        question: &Question,
        history: &ConversationHistory,
        progress: &dyn RetrievalProgress,
    ) -> Result<RetrievalOutcome, RetrievalError> {
        info!("Answering question: {}", truncate(question.content(), 100));

        let mut state = RetrievalState::new(question.content());
        let mut previous_followup: Option<String> = None;
        let mut last_round_progressed = true;

        let mut answer = self.generate_answer(&state, history, progress).await?;

        loop {
            let followup = match parse_answer(&answer) {
                AnswerOutcome::Final(text) => return Ok(self.finish(text, state, false)),
                AnswerOutcome::NeedsContext(followup) if followup.is_empty() => {
                    question.content().to_string()
                }
                AnswerOutcome::NeedsContext(followup) => followup,
            };

            let normalized = normalize_for_comparison(&followup);
            let stop = if state.rounds() >= self.params.max_rounds {
                Some(StopReason::RoundLimit)
            } else if !last_round_progressed
                && previous_followup.as_deref() == Some(normalized.as_str())
            {
                Some(StopReason::Stalled)
            } else {
                None
            };

            if let Some(reason) = stop {
                warn!(
                    rounds = state.rounds(),
                    ?reason,
                    "Giving up on retrieval for: {}",
                    truncate(question.content(), 100)
                );
                progress.on_exhausted(state.rounds());
                let fallback = self.params.fallback_answer.clone();
                return Ok(self.finish(fallback, state, true));
            }

            let context_before = state.accumulated_context().len();
            let tried_before: HashSet<String> =
                state.attempts().iter().map(|a| a.query.clone()).collect();
            let round = state.begin_round(followup);
            debug!(round, rag_question = %state.rag_question(), "Starting query round");
            progress.on_round_start(round, state.rag_question());

            let queries = self.generate_queries(&state).await?;
            progress.on_queries_generated(round, &queries);

            let attempts = self.execute_queries(queries).await;
            let tried_new_query = attempts.iter().any(|a| !tried_before.contains(&a.query));
            for attempt in attempts {
                progress.on_query_complete(round, &attempt);
                self.conversation_logger.log(ConversationEvent::new(
                    "query_executed",
                    serde_json::json!({
                        "round": round,
                        "attempt": &attempt,
                    }),
                ));
                state.record(attempt);
            }
            progress.on_round_complete(round);

            last_round_progressed =
                tried_new_query || state.accumulated_context().len() > context_before;
            previous_followup = Some(normalized);
            info!(
                round,
                succeeded = state.succeeded_queries().len(),
                failed = state.failed_queries().len(),
                "Query round complete"
            );

            answer = self.generate_answer(&state, history, progress).await?;
        }
    }

    fn finish(&self, answer: String, state: RetrievalState, exhausted: bool) -> RetrievalOutcome {
        let attempts = state.attempts().to_vec();
        let rounds = state.rounds();

        self.conversation_logger.log(ConversationEvent::new(
            "answer",
            serde_json::json!({
                "question": state.question(),
                "rounds": rounds,
                "exhausted": exhausted,
                "text": &answer,
            }),
        ));
        info!(rounds, exhausted, "Question answered");

        RetrievalOutcome {
            answer,
            context: state.into_context(),
            attempts,
            rounds,
            exhausted,
        }
    }

    /// AwaitingAnswer: ask the model to answer from the current context
    async fn generate_answer(
        &self,
        state: &RetrievalState,
        history: &ConversationHistory,
        progress: &dyn RetrievalProgress,
    ) -> Result<String, RetrievalError> {
        progress.on_answer_start();
        let prompt =
            self.prompts
                .build_answer_prompt(state.question(), state.accumulated_context(), history);
        self.complete("answer", PromptTemplates::answer_system(), prompt)
            .await
    }

    /// GeneratingQueries: ask the model for Cypher answering the follow-up
    async fn generate_queries(&self, state: &RetrievalState) -> Result<Vec<String>, RetrievalError> {
        let prompt = self.prompts.build_query_prompt(
            state.rag_question(),
            state.failed_queries(),
            state.succeeded_queries(),
        );
        let raw = self
            .complete("cypher", PromptTemplates::query_system(), prompt)
            .await?;

        let queries = parse_query_list(&raw);
        debug!("Model generated {} candidate queries", queries.len());
        Ok(queries)
    }

    async fn complete(
        &self,
        purpose: &'static str,
        system: &str,
        prompt: String,
    ) -> Result<String, RetrievalError> {
        let request = CompletionRequest::new(system, prompt)
            .with_max_tokens(self.params.max_tokens)
            .with_temperature(self.params.temperature);

        self.conversation_logger.log(ConversationEvent::new(
            "llm_request",
            serde_json::json!({
                "purpose": purpose,
                "model": self.gateway.model().to_string(),
                "system": &request.system,
                "prompt": &request.prompt,
            }),
        ));

        let text = match self.params.llm_timeout {
            Some(limit) => tokio::time::timeout(limit, self.gateway.complete(&request))
                .await
                .map_err(|_| GatewayError::Timeout)??,
            None => self.gateway.complete(&request).await?,
        };

        self.conversation_logger.log(ConversationEvent::new(
            "llm_response",
            serde_json::json!({
                "purpose": purpose,
                "model": self.gateway.model().to_string(),
                "bytes": text.len(),
                "text": &text,
            }),
        ));

        Ok(text)
    }

    /// ExecutingQueries: run every distinct candidate, in candidate order.
    async fn execute_queries(&self, queries: Vec<String>) -> Vec<QueryAttempt> {
        let mut seen = HashSet::new();
        let distinct: Vec<String> = queries
            .into_iter()
            .filter(|query| {
                let fresh = seen.insert(query.clone());
                if !fresh {
                    debug!("Skipping duplicate query in round: {}", truncate(query, 100));
                }
                fresh
            })
            .collect();

        if self.params.parallel_queries {
            // join_all yields results in input order
            futures::future::join_all(distinct.into_iter().map(|query| self.run_query(query)))
                .await
        } else {
            let mut attempts = Vec::with_capacity(distinct.len());
            for query in distinct {
                attempts.push(self.run_query(query).await);
            }
            attempts
        }
    }

    async fn run_query(&self, query: String) -> QueryAttempt {
        let result = match self.params.query_timeout {
            Some(limit) => tokio::time::timeout(limit, self.graph.execute(&query))
                .await
                .unwrap_or(Err(GraphStoreError::Timeout(limit))),
            None => self.graph.execute(&query).await,
        };

        let outcome = match result {
            Ok(rows) => match classify_rows(&rows) {
                ResultClass::Data(context) => QueryOutcome::Success { context },
                ResultClass::Empty => QueryOutcome::Empty,
            },
            Err(e) if e.is_syntax_error() => {
                debug!("Invalid Cypher from model: {}", e);
                QueryOutcome::SyntaxInvalid
            }
            Err(e) => {
                warn!("Query execution failed: {}", e);
                QueryOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        QueryAttempt::new(query, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::NoProgress;
    use async_trait::async_trait;
    use moviegraph_domain::{
        INVALID_SYNTAX_PREFIX, Identifier, Model, NO_DATA_PREFIX, Row, Statement,
    };
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    // ==================== Test Mocks ====================

    /// Replays scripted completions and records every request
    struct ScriptedGateway {
        model: Model,
        responses: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedGateway {
        fn new(responses: &[&str]) -> Self {
            Self {
                model: Model::new("test/model"),
                responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn query_prompts(&self) -> Vec<String> {
            self.requests()
                .into_iter()
                .filter(|r| r.system == PromptTemplates::query_system())
                .map(|r| r.prompt)
                .collect()
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        fn model(&self) -> &Model {
            &self.model
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| GatewayError::Other("No more responses".to_string()))
        }
    }

    enum Canned {
        Rows(Vec<Row>),
        SyntaxError,
        Slow,
    }

    /// Answers known queries from a map; unknown queries return no rows
    struct MapGraphStore {
        answers: HashMap<String, Canned>,
        executed: Mutex<Vec<String>>,
    }

    impl MapGraphStore {
        fn new() -> Self {
            Self {
                answers: HashMap::new(),
                executed: Mutex::new(Vec::new()),
            }
        }

        fn with(mut self, query: &str, canned: Canned) -> Self {
            self.answers.insert(query.to_string(), canned);
            self
        }

        fn executed(&self) -> Vec<String> {
            self.executed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GraphStore for MapGraphStore {
        async fn execute(&self, query: &str) -> Result<Vec<Row>, GraphStoreError> {
            self.executed.lock().unwrap().push(query.to_string());
            match self.answers.get(query) {
                Some(Canned::Rows(rows)) => Ok(rows.clone()),
                Some(Canned::SyntaxError) => {
                    Err(GraphStoreError::Syntax("Invalid input".to_string()))
                }
                Some(Canned::Slow) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(vec![])
                }
                None => Ok(vec![]),
            }
        }

        async fn execute_statement(
            &self,
            statement: &Statement,
        ) -> Result<Vec<Row>, GraphStoreError> {
            self.execute(statement.text()).await
        }
    }

    fn rows(value: serde_json::Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    fn use_case(
        gateway: &Arc<ScriptedGateway>,
        graph: &Arc<MapGraphStore>,
        params: RetrievalParams,
    ) -> RetrievalLoopUseCase {
        let prompts = Arc::new(PromptBuilder::new(PromptTemplates::default()).unwrap());
        RetrievalLoopUseCase::new(gateway.clone(), graph.clone(), prompts, params)
    }

    fn question(text: &str) -> Question {
        Question::try_new(text).unwrap()
    }

    const NOLAN_QUERY: &str =
        "MATCH (p:Person)-[:DIRECTED]->(m:Movie {title:'Inception'}) RETURN p.name";

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_final_first_answer_runs_no_queries() {
        let gateway = Arc::new(ScriptedGateway::new(&["Hello! Ask me about movies."]));
        let graph = Arc::new(MapGraphStore::new());
        let uc = use_case(&gateway, &graph, RetrievalParams::default());

        let outcome = uc
            .execute(&question("Hi"), &ConversationHistory::new(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Hello! Ask me about movies.");
        assert_eq!(outcome.rounds, 0);
        assert!(outcome.attempts.is_empty());
        assert!(graph.executed().is_empty());
        assert_eq!(gateway.requests().len(), 1);
        assert_eq!(gateway.requests()[0].system, "You are movie chatbot");
    }

    #[tokio::test]
    async fn test_inception_single_round() {
        let list = format!("[\"{NOLAN_QUERY}\"]");
        let gateway = Arc::new(ScriptedGateway::new(&[
            "NO_CONTEXT Who directed the movie Inception?",
            &list,
            "Inception was directed by Christopher Nolan.",
        ]));
        let graph = Arc::new(MapGraphStore::new().with(
            NOLAN_QUERY,
            Canned::Rows(rows(json!([{"p.name": "Christopher Nolan"}]))),
        ));
        let uc = use_case(&gateway, &graph, RetrievalParams::default());

        let outcome = uc
            .execute(
                &question("Who directed Inception?"),
                &ConversationHistory::new(),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Inception was directed by Christopher Nolan.");
        assert_eq!(outcome.rounds, 1);
        assert!(!outcome.exhausted);
        assert_eq!(outcome.context, vec![r#"[{"p.name":"Christopher Nolan"}]"#]);
        assert_eq!(graph.executed(), vec![NOLAN_QUERY]);

        let requests = gateway.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].system, "You are an expert Neo4j Cypher generator.");
        assert!(requests[1].prompt.contains("Who directed the movie Inception?"));
        assert!(requests[2].prompt.contains("Christopher Nolan"));
        assert!((requests[0].temperature - 0.1).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_syntax_error_is_fed_back_to_next_round() {
        let typo = "MATCH (p:Person)-[:DIRECTED]->(m:Movie {title:'Inception'} RETURN p.name";
        let gateway = Arc::new(ScriptedGateway::new(&[
            "NO_CONTEXT Who directed the movie Inception?",
            typo,
            "NO_CONTEXT Who directed the movie Inception?",
            NOLAN_QUERY,
            "Christopher Nolan.",
        ]));
        let graph = Arc::new(
            MapGraphStore::new()
                .with(typo, Canned::SyntaxError)
                .with(
                    NOLAN_QUERY,
                    Canned::Rows(rows(json!([{"p.name": "Christopher Nolan"}]))),
                ),
        );
        let uc = use_case(&gateway, &graph, RetrievalParams::default());

        let outcome = uc
            .execute(
                &question("Who directed Inception?"),
                &ConversationHistory::new(),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Christopher Nolan.");
        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.attempts[0].outcome, QueryOutcome::SyntaxInvalid);
        assert_eq!(outcome.context.len(), 1);

        let query_prompts = gateway.query_prompts();
        assert_eq!(query_prompts.len(), 2);
        let annotated = format!("Invalid syntax of this query: {typo}");
        assert!(!query_prompts[0].contains(&annotated));
        assert!(query_prompts[1].contains(&annotated));
    }

    #[tokio::test]
    async fn test_bare_string_generation_is_one_query() {
        let gateway = Arc::new(ScriptedGateway::new(&[
            "NO_CONTEXT any movie",
            "MATCH (n) RETURN n LIMIT 1",
            "Here is one.",
        ]));
        let graph = Arc::new(MapGraphStore::new().with(
            "MATCH (n) RETURN n LIMIT 1",
            Canned::Rows(rows(json!([{"n": {"title": "Heat"}}]))),
        ));
        let uc = use_case(&gateway, &graph, RetrievalParams::default());

        let outcome = uc
            .execute(&question("Any movie?"), &ConversationHistory::new(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(graph.executed(), vec!["MATCH (n) RETURN n LIMIT 1"]);
        assert!(outcome.attempts[0].is_success());
    }

    #[tokio::test]
    async fn test_empty_result_is_recorded_as_no_data() {
        let gateway = Arc::new(ScriptedGateway::new(&[
            "NO_CONTEXT budget of Heat",
            "['MATCH (m:Movie {title: \"Heat\"}) RETURN m.budget', 'RETURN 1 AS one']",
            "NO_CONTEXT budget of Heat",
            "MATCH (m:Movie) WHERE toLower(m.title) = 'heat' RETURN m.budget",
            "I could not find the budget.",
        ]));
        let graph = Arc::new(
            MapGraphStore::new().with("RETURN 1 AS one", Canned::Rows(rows(json!([{"one": 1}])))),
        );
        let uc = use_case(&gateway, &graph, RetrievalParams::default());

        let outcome = uc
            .execute(
                &question("What was Heat's budget?"),
                &ConversationHistory::new(),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(outcome.attempts.len(), 3);
        assert_eq!(outcome.attempts[0].outcome, QueryOutcome::Empty);
        assert_eq!(outcome.attempts[2].outcome, QueryOutcome::Empty);

        let second_prompt = &gateway.query_prompts()[1];
        assert!(second_prompt.contains(
            "No data generated for this query: MATCH (m:Movie {title: \"Heat\"}) RETURN m.budget"
        ));
        assert!(second_prompt.contains("- RETURN 1 AS one"));
    }

    #[tokio::test]
    async fn test_context_pairs_with_succeeded_queries_and_failures_are_annotated() {
        let gateway = Arc::new(ScriptedGateway::new(&[
            "NO_CONTEXT cast of Heat",
            "['Q_OK_1', 'Q_BAD', 'Q_EMPTY', 'Q_OK_2']",
            "Al Pacino and Robert De Niro.",
        ]));
        let graph = Arc::new(
            MapGraphStore::new()
                .with("Q_OK_1", Canned::Rows(rows(json!([{"name": "Al Pacino"}]))))
                .with("Q_BAD", Canned::SyntaxError)
                .with("Q_OK_2", Canned::Rows(rows(json!([{"name": "Robert De Niro"}])))),
        );
        let uc = use_case(&gateway, &graph, RetrievalParams::default());

        let outcome = uc
            .execute(&question("Who starred in Heat?"), &ConversationHistory::new(), &NoProgress)
            .await
            .unwrap();

        let succeeded: Vec<_> = outcome.attempts.iter().filter(|a| a.is_success()).collect();
        assert_eq!(outcome.context.len(), succeeded.len());
        assert!(outcome.context[0].contains("Al Pacino"));
        assert!(outcome.context[1].contains("Robert De Niro"));

        for failed in outcome.attempts.iter().filter_map(|a| a.failure_annotation()) {
            let syntax = failed.starts_with(INVALID_SYNTAX_PREFIX);
            let no_data = failed.starts_with(NO_DATA_PREFIX);
            assert!(syntax ^ no_data, "bad annotation: {failed}");
        }
    }

    #[tokio::test]
    async fn test_duplicate_candidates_run_once_per_round() {
        let gateway = Arc::new(ScriptedGateway::new(&[
            "NO_CONTEXT x",
            "['Q_BAD', 'Q_BAD', 'Q_BAD']",
            "done",
        ]));
        let graph = Arc::new(MapGraphStore::new().with("Q_BAD", Canned::SyntaxError));
        let uc = use_case(&gateway, &graph, RetrievalParams::default());

        let outcome = uc
            .execute(&question("x?"), &ConversationHistory::new(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(graph.executed(), vec!["Q_BAD"]);
        assert_eq!(outcome.attempts.len(), 1);
    }

    #[tokio::test]
    async fn test_round_limit_returns_fallback() {
        let gateway = Arc::new(ScriptedGateway::new(&[
            "NO_CONTEXT first",
            "Q1",
            "NO_CONTEXT second",
            "Q2",
            "NO_CONTEXT third",
        ]));
        let graph = Arc::new(MapGraphStore::new());
        let params = RetrievalParams::default()
            .with_max_rounds(2)
            .with_fallback_answer("Sorry, no answer.");
        let uc = use_case(&gateway, &graph, params);

        let outcome = uc
            .execute(&question("?"), &ConversationHistory::new(), &NoProgress)
            .await
            .unwrap();

        assert!(outcome.exhausted);
        assert_eq!(outcome.answer, "Sorry, no answer.");
        assert_eq!(outcome.rounds, 2);
        assert_eq!(graph.executed(), vec!["Q1", "Q2"]);
        assert_eq!(gateway.requests().len(), 5);
    }

    #[tokio::test]
    async fn test_zero_rounds_never_queries() {
        let gateway = Arc::new(ScriptedGateway::new(&["NO_CONTEXT anything"]));
        let graph = Arc::new(MapGraphStore::new());
        let uc = use_case(&gateway, &graph, RetrievalParams::default().with_max_rounds(0));

        let outcome = uc
            .execute(&question("?"), &ConversationHistory::new(), &NoProgress)
            .await
            .unwrap();

        assert!(outcome.exhausted);
        assert!(graph.executed().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_followup_without_progress_stops_early() {
        let gateway = Arc::new(ScriptedGateway::new(&[
            "NO_CONTEXT Who   directed Heat?",
            "Q1",
            "NO_CONTEXT who directed heat?",
            "Q1",
            "NO_CONTEXT who directed heat?",
        ]));
        let graph = Arc::new(MapGraphStore::new());
        let uc = use_case(&gateway, &graph, RetrievalParams::default().with_max_rounds(10));

        let outcome = uc
            .execute(&question("Who directed Heat?"), &ConversationHistory::new(), &NoProgress)
            .await
            .unwrap();

        assert!(outcome.exhausted);
        assert_eq!(outcome.rounds, 2);
        assert_eq!(graph.executed(), vec!["Q1", "Q1"]);
    }

    #[tokio::test]
    async fn test_repeated_followup_with_progress_continues() {
        let gateway = Arc::new(ScriptedGateway::new(&[
            "NO_CONTEXT cast of Heat",
            "Q_OK_1",
            "NO_CONTEXT cast of Heat",
            "Q_OK_2",
            "Pacino and De Niro.",
        ]));
        let graph = Arc::new(
            MapGraphStore::new()
                .with("Q_OK_1", Canned::Rows(rows(json!([{"name": "Al Pacino"}]))))
                .with("Q_OK_2", Canned::Rows(rows(json!([{"name": "Robert De Niro"}])))),
        );
        let uc = use_case(&gateway, &graph, RetrievalParams::default());

        let outcome = uc
            .execute(&question("Cast of Heat?"), &ConversationHistory::new(), &NoProgress)
            .await
            .unwrap();

        assert!(!outcome.exhausted);
        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.context.len(), 2);
    }

    #[tokio::test]
    async fn test_bare_marker_uses_original_question() {
        let gateway = Arc::new(ScriptedGateway::new(&["NO_CONTEXT", "Q1", "ok"]));
        let graph = Arc::new(MapGraphStore::new());
        let uc = use_case(&gateway, &graph, RetrievalParams::default());

        uc.execute(
            &question("Which genres does Heat have?"),
            &ConversationHistory::new(),
            &NoProgress,
        )
        .await
        .unwrap();

        assert!(gateway.query_prompts()[0].contains("Which genres does Heat have?"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_timeout_is_recorded_as_failure() {
        let gateway = Arc::new(ScriptedGateway::new(&["NO_CONTEXT x", "Q_SLOW", "gave up"]));
        let graph = Arc::new(MapGraphStore::new().with("Q_SLOW", Canned::Slow));
        let params = RetrievalParams::default().with_query_timeout(Some(Duration::from_secs(1)));
        let uc = use_case(&gateway, &graph, params);

        let outcome = uc
            .execute(&question("x?"), &ConversationHistory::new(), &NoProgress)
            .await
            .unwrap();

        assert!(matches!(
            outcome.attempts[0].outcome,
            QueryOutcome::Failed { .. }
        ));
        assert_eq!(
            outcome.attempts[0].failure_annotation().as_deref(),
            Some("Query failed to execute: Q_SLOW")
        );
        assert_eq!(outcome.answer, "gave up");
    }

    #[tokio::test]
    async fn test_parallel_execution_preserves_candidate_order() {
        let gateway = Arc::new(ScriptedGateway::new(&[
            "NO_CONTEXT x",
            "['Q_OK_1', 'Q_BAD', 'Q_OK_2']",
            "done",
        ]));
        let graph = Arc::new(
            MapGraphStore::new()
                .with("Q_OK_1", Canned::Rows(rows(json!([{"v": 1}]))))
                .with("Q_BAD", Canned::SyntaxError)
                .with("Q_OK_2", Canned::Rows(rows(json!([{"v": 2}])))),
        );
        let uc = use_case(
            &gateway,
            &graph,
            RetrievalParams::default().with_parallel_queries(true),
        );

        let outcome = uc
            .execute(&question("x?"), &ConversationHistory::new(), &NoProgress)
            .await
            .unwrap();

        let queries: Vec<_> = outcome.attempts.iter().map(|a| a.query.as_str()).collect();
        assert_eq!(queries, vec!["Q_OK_1", "Q_BAD", "Q_OK_2"]);
        assert_eq!(outcome.context, vec![r#"[{"v":1}]"#, r#"[{"v":2}]"#]);
    }

    #[tokio::test]
    async fn test_gateway_failure_aborts_question() {
        let gateway = Arc::new(ScriptedGateway::new(&[]));
        let graph = Arc::new(MapGraphStore::new());
        let uc = use_case(&gateway, &graph, RetrievalParams::default());

        let result = uc
            .execute(&question("x?"), &ConversationHistory::new(), &NoProgress)
            .await;

        assert!(matches!(result, Err(RetrievalError::GatewayError(_))));
    }

    #[tokio::test]
    async fn test_history_reaches_answer_prompt() {
        let gateway = Arc::new(ScriptedGateway::new(&["It was released in 2010."]));
        let graph = Arc::new(MapGraphStore::new());
        let uc = use_case(&gateway, &graph, RetrievalParams::default());

        let mut history = ConversationHistory::new();
        history.push_exchange("Who directed Inception?", vec![], "Christopher Nolan.");

        uc.execute(&question("When was it released?"), &history, &NoProgress)
            .await
            .unwrap();

        assert!(gateway.requests()[0].prompt.contains("user: Who directed Inception?"));
    }

    #[tokio::test]
    async fn test_node_count_reads_count_column() {
        let graph = MapGraphStore::new().with(
            "MATCH (n:Movie) RETURN count(n) AS count",
            Canned::Rows(rows(json!([{"count": 45433}]))),
        );
        let label = Identifier::new("Movie").unwrap();
        assert_eq!(graph.node_count(&label).await.unwrap(), 45433);
    }
}
