//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - `GET /test`: liveness check used by the AI server's workflow nodes
//! - `POST /save-oss`: relay a batch of generated files into object storage
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`; the document is
//! served at `/api-docs/openapi.json`.

pub mod handlers;
pub mod models;
