//! HTTP request handlers (route handlers).

/// Service health endpoint
pub mod health;
