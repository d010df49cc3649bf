//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: identifier of the chat model answering questions
//! - [`question::Question`]: a validated user question
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
pub mod question;
pub mod string;
