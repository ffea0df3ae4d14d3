//! Quote model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::Entity;

/// Represents a quote record from the database.
///
/// # Database Table
///
/// Maps to the `quotes` table. Each quote belongs to the user who submitted it
/// (via `user_id`, deleted together with the user).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Quote {
    /// Unique identifier for this quote
    pub id: Uuid,

    /// The quoted text
    pub text: String,

    /// Person the quote is attributed to
    pub author: String,

    /// Foreign key to the user who submitted the quote
    pub user_id: Uuid,

    /// Timestamp when the quote was created
    pub created_at: DateTime<Utc>,
}

impl Entity for Quote {
    const NAME: &'static str = "Quote";
    const TABLE: &'static str = "quotes";
}
