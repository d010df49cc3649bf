//! Answer parsing for the retrieval loop.
//!
//! The answer prompt instructs the model to reply with the reserved
//! [`MISSING_DATA_MARKER`] followed by a follow-up question whenever it
//! cannot answer from the supplied context. [`parse_answer`] turns that
//! free-form convention into an explicit [`AnswerOutcome`].

/// Reserved token signalling that an answer needs retrieved context
pub const MISSING_DATA_MARKER: &str = "NO_CONTEXT";

/// Result of interpreting one model answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The answer can be shown to the user as-is
    Final(String),
    /// The model needs data; carries the follow-up question to retrieve for.
    /// May be empty when the model emitted the marker with nothing after it.
    NeedsContext(String),
}

impl AnswerOutcome {
    pub fn is_final(&self) -> bool {
        matches!(self, AnswerOutcome::Final(_))
    }
}

/// Parse a model answer into an [`AnswerOutcome`].
///
/// The follow-up question is the trimmed text after the *last* marker
/// occurrence (a leading `:` is dropped), so answers like `"NO_CONTEXT ... NO_CONTEXT Who directed X?"`
/// yield `"Who directed X?"`.
///
/// # Examples
///
/// ```
/// use moviegraph_domain::retrieval::answer::{parse_answer, AnswerOutcome};
///
/// assert_eq!(
///     parse_answer("NO_CONTEXT Who directed the movie Inception?"),
///     AnswerOutcome::NeedsContext("Who directed the movie Inception?".to_string())
/// );
/// assert!(parse_answer("Christopher Nolan.").is_final());
/// ```
pub fn parse_answer(text: &str) -> AnswerOutcome {
    match text.rfind(MISSING_DATA_MARKER) {
        Some(pos) => {
            let followup = &text[pos + MISSING_DATA_MARKER.len()..];
            let followup = followup.trim().trim_start_matches(':').trim_start();
            AnswerOutcome::NeedsContext(followup.to_string())
        }
        None => AnswerOutcome::Final(text.to_string()),
    }
}
