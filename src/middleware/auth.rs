use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{Claims, TokenKeys};
use crate::error::ApiError;
use crate::types::{roles_permit, Role};

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            roles: claims.roles,
        }
    }
}

/// Per-route allow-list, attached with `middleware::from_fn_with_state`
#[derive(Clone)]
pub struct RoleGuard {
    tokens: TokenKeys,
    allowed: &'static [Role],
}

impl RoleGuard {
    pub fn new(tokens: &TokenKeys, allowed: &'static [Role]) -> Self {
        Self {
            tokens: tokens.clone(),
            allowed,
        }
    }
}

/// Decodes the bearer token, checks the caller's roles against the route's
/// allow-list and injects [`AuthUser`] into the request
pub async fn require_roles(
    State(guard): State<RoleGuard>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers).map_err(ApiError::unauthorized)?;

    let claims = guard.tokens.decode(token).map_err(|e| {
        tracing::warn!("Rejected bearer token: {}", e);
        ApiError::from(e)
    })?;

    if !roles_permit(&claims.roles, guard.allowed) {
        tracing::warn!(
            "User {} with roles {:?} denied {} {}",
            claims.sub,
            claims.roles,
            request.method(),
            request.uri().path()
        );
        return Err(ApiError::forbidden("You do not have permission to access this resource"));
    }

    let auth_user = AuthUser::from(claims);
    tracing::debug!("Authorized user {} for {}", auth_user.id, request.uri().path());
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or("Authorization header must use Bearer token format")?
        .trim();

    if token.is_empty() {
        return Err("Empty bearer token");
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer(&headers_with("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        assert!(extract_bearer(&HeaderMap::new()).is_err());
        assert!(extract_bearer(&headers_with("Basic dXNlcjpwYXNz")).is_err());
        assert!(extract_bearer(&headers_with("Bearer   ")).is_err());
    }

    #[test]
    fn admin_detection_uses_role_names() {
        let user = AuthUser { id: Uuid::new_v4(), roles: vec!["adm".into()] };
        assert!(user.is_admin());
        let user = AuthUser { id: Uuid::new_v4(), roles: vec!["Vendedor".into()] };
        assert!(!user.is_admin());
        assert!(user.has_role(Role::Seller));
    }
}
