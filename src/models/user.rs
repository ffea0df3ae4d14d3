//! User model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::Entity;

/// Represents a user record from the database.
///
/// Maps to the `users` table. `username` and `email` are unique.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct User {
    pub id: Uuid,

    pub username: String,

    pub email: String,

    /// Never serialized into API responses
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    const NAME: &'static str = "User";
    const TABLE: &'static str = "users";
}
