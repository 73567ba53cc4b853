//! API request and response data models.
//!
//! Field names are the snake_case JSON names existing callers send and parse.

pub mod relay;
