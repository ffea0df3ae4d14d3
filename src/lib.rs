//! Database wiring for the quotes web application.
//!
//! Loads the connection settings for the active environment (`APP_ENV`,
//! `.env.dev` / `.env.prod`, `DB_*` variables), connects to PostgreSQL with
//! sqlx, and prepares the schema for the managed entities.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;
