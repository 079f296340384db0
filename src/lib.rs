//! Subscription Webhooks - Signed subscription webhook receiver
//!
//! Verifies HMAC-SHA256 signed deliveries from the payment provider, applies
//! the subscription lifecycle event they carry, and tells the customer (or,
//! on failure, the operator) what happened.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
