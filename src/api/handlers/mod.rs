//! API request handlers.

/// Health and OpenAPI document handlers.
pub mod health;
/// Split/embed and retrieve/query handlers.
pub mod rag;
