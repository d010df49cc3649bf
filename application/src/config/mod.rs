//! Application-level configuration.
//!
//! - [`RetrievalParams`]: retrieval loop control (round bound, timeouts,
//!   sampling parameters)

pub mod retrieval_params;

pub use retrieval_params::RetrievalParams;
