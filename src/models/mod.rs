//! Data models representing database entities.
//!
//! Every model that lives in its own table implements [`Entity`] and is
//! registered in [`managed_entities`], which is what the connection settings
//! hand to the database layer.

use serde::Serialize;

/// Quote model
pub mod quote;
/// User account model
pub mod user;

pub use quote::Quote;
pub use user::User;

/// A record type backed by a table.
pub trait Entity {
    /// Type name used in logs and error messages
    const NAME: &'static str;

    /// Table the records are stored in
    const TABLE: &'static str;
}

/// Type-erased description of an [`Entity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityDescriptor {
    pub name: &'static str,
    pub table: &'static str,
}

impl EntityDescriptor {
    pub fn of<E: Entity>() -> Self {
        Self {
            name: E::NAME,
            table: E::TABLE,
        }
    }
}

/// Entities registered with the connection, in registration order.
pub fn managed_entities() -> Vec<EntityDescriptor> {
    vec![EntityDescriptor::of::<Quote>(), EntityDescriptor::of::<User>()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_quote_then_user() {
        assert_eq!(
            managed_entities(),
            vec![
                EntityDescriptor {
                    name: "Quote",
                    table: "quotes"
                },
                EntityDescriptor {
                    name: "User",
                    table: "users"
                },
            ]
        );
    }
}
