pub mod auth;
pub mod response;
pub mod validated;

pub use auth::{require_roles, AuthUser, RoleGuard};
pub use response::{ApiResponse, ApiResult};
pub use validated::ValidJson;
