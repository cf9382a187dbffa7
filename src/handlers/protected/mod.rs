// handlers/protected/mod.rs - handlers behind the role guard
//
// Every route here is wrapped by `middleware::require_roles`, so handlers can
// rely on an `AuthUser` extension being present.
pub mod access_levels;
pub mod addresses;
pub mod products;
pub mod sales;
pub mod stores;
pub mod users;
pub mod utils;
