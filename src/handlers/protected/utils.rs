use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Body returned by delete endpoints
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

impl Message {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Parse a path id, reporting the parameter name on failure
pub fn parse_id(raw: &str, param: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::field_error(param, "Must be a valid UUID"))
}

/// Only the owner may act on the resource
pub fn ensure_owner(owner_id: Uuid, user: &AuthUser, message: &str) -> Result<(), ApiError> {
    if owner_id != user.id {
        tracing::warn!("User {} is not the owner ({})", user.id, message);
        return Err(ApiError::bad_request(message));
    }
    Ok(())
}

/// The owner or an administrator may act on the resource
pub fn ensure_owner_or_admin(owner_id: Uuid, user: &AuthUser, message: &str) -> Result<(), ApiError> {
    if user.is_admin() {
        return Ok(());
    }
    ensure_owner(owner_id, user, message)
}
