//! Progress notification port
//!
//! Defines the interface for reporting progress while a question is
//! being answered.

use moviegraph_domain::QueryAttempt;

/// Callbacks fired by the retrieval loop.
///
/// Implementations live in the presentation layer. All methods default
/// to no-ops.
pub trait RetrievalProgress: Send + Sync {
    /// The model is about to be asked for an answer
    fn on_answer_start(&self) {}

    /// A query round starts for `rag_question`
    fn on_round_start(&self, _round: usize, _rag_question: &str) {}

    /// The model produced the candidate queries of a round
    fn on_queries_generated(&self, _round: usize, _queries: &[String]) {}

    /// One candidate query finished
    fn on_query_complete(&self, _round: usize, _attempt: &QueryAttempt) {}

    /// All candidate queries of a round finished
    fn on_round_complete(&self, _round: usize) {}

    /// The loop gave up without a grounded answer
    fn on_exhausted(&self, _rounds: usize) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl RetrievalProgress for NoProgress {}
