//! Authentication middleware
//!
//! Bearer JWT verification. Tokens are issued elsewhere; this server only
//! needs the actor and tenant they carry plus the granted permissions.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub permissions: Vec<String>,
}

impl AuthUser {
    /// Check if user has a specific permission (`resource:action`)
    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        let permission = format!("{}:{}", resource, action);
        self.permissions.contains(&permission)
    }

    /// Fail with `InsufficientPermissions` unless the permission is granted
    pub fn require(&self, resource: &str, action: &str) -> Result<(), AppError> {
        if self.has_permission(resource, action) {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions(format!("{}:{}", resource, action)))
        }
    }
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match authenticate(request.headers(), &state.config.jwt.secret) {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(user);

    next.run(request).await
}

/// Resolve the bearer token of a request into the acting user
fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthUser, AppError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized("Missing or invalid Authorization header".to_string())
        })?;

    let claims = decode_jwt(token, secret).map_err(|msg| {
        tracing::debug!("Rejected bearer token: {}", msg);
        AppError::Unauthorized(msg)
    })?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))?;
    let tenant_id = Uuid::parse_str(&claims.tenant_id)
        .map_err(|_| AppError::Unauthorized("Invalid tenant ID in token".to_string()))?;

    Ok(AuthUser {
        user_id,
        tenant_id,
        permissions: claims.permissions,
    })
}

/// JWT claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: String,
    pub tenant_id: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, claims: &Claims) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn claims() -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub: Uuid::new_v4().to_string(),
            tenant_id: Uuid::new_v4().to_string(),
            permissions: vec!["inventory:adjust".to_string()],
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn test_decode_valid_token() {
        let claims = claims();
        let decoded = decode_jwt(&token("s3cret", &claims), "s3cret").unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.permissions, vec!["inventory:adjust".to_string()]);
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        assert!(decode_jwt(&token("s3cret", &claims()), "other").is_err());
    }

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_authenticate_valid_bearer() {
        let claims = claims();
        let headers = bearer(&format!("Bearer {}", token("s3cret", &claims)));
        let user = authenticate(&headers, "s3cret").unwrap();
        assert_eq!(user.user_id.to_string(), claims.sub);
        assert!(user.has_permission("inventory", "adjust"));
    }

    #[test]
    fn test_authenticate_rejects_missing_header() {
        assert!(matches!(
            authenticate(&HeaderMap::new(), "s3cret"),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authenticate(&bearer("Basic abc"), "s3cret"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_authenticate_rejects_bad_subject() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            ..claims()
        };
        let headers = bearer(&format!("Bearer {}", token("s3cret", &claims)));
        assert!(matches!(
            authenticate(&headers, "s3cret"),
            Err(AppError::Unauthorized(ref msg)) if msg == "Invalid user ID in token"
        ));
    }

    #[test]
    fn test_permission_check() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            permissions: vec!["sales:write".to_string()],
        };
        assert!(user.require("sales", "write").is_ok());
        assert!(matches!(
            user.require("inventory", "adjust"),
            Err(AppError::InsufficientPermissions(_))
        ));
    }
}
