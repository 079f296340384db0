//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (timestamps, errors, state machine trait)
//! - `subscription` - Webhook notification model, lifecycle and verification

pub mod foundation;
pub mod subscription;
