// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and self-registration. Every input is validated here
// since there is no trusted user context.
pub mod auth;
pub mod user;

pub use auth::sign_in;
pub use user::create_user;
