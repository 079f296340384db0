//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, error types and the state machine trait
//! that form the vocabulary of the webhook domain.

mod errors;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
