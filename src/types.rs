/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Access levels that gate route authorization.
///
/// Access levels are rows in the database, so callers may hold names that are
/// not listed here; those simply never satisfy a route allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "adm")]
    Admin,
    #[serde(rename = "Vendedor")]
    Seller,
    #[serde(rename = "Comprador")]
    Buyer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Seller, Role::Buyer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "adm",
            Role::Seller => "Vendedor",
            Role::Buyer => "Comprador",
        }
    }

    pub fn from_name(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_str() == name)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Route allow-lists
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const SELLERS: &[Role] = &[Role::Admin, Role::Seller];
pub const BUYERS: &[Role] = &[Role::Admin, Role::Buyer];
pub const EVERYONE: &[Role] = &[Role::Admin, Role::Seller, Role::Buyer];

/// True when any of the caller's role names appears in the allow-list
pub fn roles_permit<S: AsRef<str>>(held: &[S], allowed: &[Role]) -> bool {
    held.iter()
        .any(|name| allowed.iter().any(|role| role.as_str() == name.as_ref()))
}
