//! HTTP request handlers.
//!
//! - [`health`]: liveness check
//! - [`relay`]: batch relay of AI server outputs into object storage
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts into the status code and
//! `{"message", "error"}` JSON body callers expect.

pub mod health;
pub mod relay;
