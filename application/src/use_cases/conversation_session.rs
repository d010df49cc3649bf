//! Conversation session use case
//!
//! Owns the chat history of one user and answers their questions through
//! the retrieval loop. History survives between questions and is only
//! cleared by [`ConversationSession::restart`].

use crate::ports::progress::{NoProgress, RetrievalProgress};
use crate::use_cases::retrieval_loop::{RetrievalError, RetrievalLoopUseCase, RetrievalOutcome};
use moviegraph_domain::{ConversationHistory, DomainError, Question};
use thiserror::Error;
use tracing::{debug, info};

/// Banner shown when a session starts or restarts
pub const GREETING: &str =
    "Hi, I'm a movie chatbot. Ask me anything about movies, their cast and crew.";

/// Errors returned by [`ConversationSession::ask`]
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The conversation has ended")]
    Ended,

    #[error(transparent)]
    InvalidQuestion(#[from] DomainError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// A chat session with the movie assistant.
///
/// Lifecycle: `start` → `ask`* (interleaved with `restart`) → `end`.
pub struct ConversationSession {
    retrieval: RetrievalLoopUseCase,
    history: ConversationHistory,
    ended: bool,
}

impl ConversationSession {
    /// Start a session with an empty history.
    pub fn start(retrieval: RetrievalLoopUseCase) -> Self {
        info!("Conversation started");
        Self {
            retrieval,
            history: ConversationHistory::new(),
            ended: false,
        }
    }

    /// Answer one question and append the exchange to the history.
    pub async fn ask(&mut self, question: &str) -> Result<RetrievalOutcome, SessionError> {
        self.ask_with_progress(question, &NoProgress).await
    }

    /// Like [`ask`](Self::ask), reporting retrieval progress.
    ///
    /// The history is only modified when an answer was produced.
    pub async fn ask_with_progress(
        &mut self,
        question: &str,
        progress: &dyn RetrievalProgress,
    ) -> Result<RetrievalOutcome, SessionError> {
        if self.ended {
            return Err(SessionError::Ended);
        }
        let question = Question::try_new(question)?;

        let outcome = self
            .retrieval
            .execute(&question, &self.history, progress)
            .await?;

        self.history.push_exchange(
            question.into_content(),
            outcome.context.clone(),
            outcome.answer.clone(),
        );
        debug!(exchanges = self.history.exchange_count(), "History updated");

        Ok(outcome)
    }

    /// Forget the conversation so far.
    pub fn restart(&mut self) {
        if self.history.is_empty() {
            return;
        }
        info!(
            exchanges = self.history.exchange_count(),
            "Conversation restarted"
        );
        self.history.clear();
    }

    /// End the session, dropping its history. Further questions are rejected.
    pub fn end(&mut self) {
        self.restart();
        if !self.ended {
            info!("Conversation ended");
        }
        self.ended = true;
    }

    /// Text to greet the user with
    pub fn greeting(&self) -> &'static str {
        GREETING
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn retrieval(&self) -> &RetrievalLoopUseCase {
        &self.retrieval
    }
}
