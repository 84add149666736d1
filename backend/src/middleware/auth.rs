//! Authentication middleware
//!
//! Validates JWT access tokens and exposes the authenticated account to handlers

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use uuid::Uuid;

use crate::error::{ErrorDetail, ErrorResponse};
use crate::services::auth::Claims;
use crate::AppState;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub business_id: Uuid,
}

/// Authentication middleware that validates JWT tokens from the Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return unauthorized_response("Missing or invalid Authorization header"),
    };

    let auth_user = match decode_token(token, &state.config.jwt.secret) {
        Ok(user) => user,
        Err(msg) => return unauthorized_response(msg),
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

/// Decode and validate an access token into the user it identifies
pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, &'static str> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => "Token has expired",
        _ => "Invalid token",
    })?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;
    let business_id =
        Uuid::parse_str(&claims.business_id).map_err(|_| "Invalid business ID in token")?;

    Ok(AuthUser {
        user_id,
        business_id,
    })
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message_en: message.to_string(),
            message_pt: "Não autorizado".to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
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
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message_en: "Authentication required".to_string(),
                        message_pt: "É necessário entrar na sua conta".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-key-0123456789";

    fn token(business_id: &str, exp_offset_secs: i64) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            exp: (now + Duration::seconds(exp_offset_secs)).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_decodes() {
        let business_id = Uuid::new_v4();
        let user = decode_token(&token(&business_id.to_string(), 3600), SECRET).unwrap();
        assert_eq!(user.business_id, business_id);
    }

    #[test]
    fn test_expired_token_rejected() {
        let result = decode_token(&token(&Uuid::new_v4().to_string(), -3600), SECRET);
        assert_eq!(result.unwrap_err(), "Token has expired");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let result = decode_token(&token(&Uuid::new_v4().to_string(), 3600), "another-secret");
        assert_eq!(result.unwrap_err(), "Invalid token");
    }

    #[test]
    fn test_malformed_business_id_rejected() {
        let result = decode_token(&token("not-a-uuid", 3600), SECRET);
        assert_eq!(result.unwrap_err(), "Invalid business ID in token");
    }
}
