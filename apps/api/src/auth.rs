use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// The authenticated caller, extracted from the `Authorization: Bearer` header.
/// Session issuance lives in the auth service; this side only verifies the
/// HS256 signature and reads the user id out of the `sub` claim.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Uuid,
}

/// Verifies an HS256 bearer token and returns the caller's user id.
pub fn verify_bearer(token: &str, secret: &[u8]) -> Option<Uuid> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Tokens from the auth provider carry an `aud` we don't pin here.
    validation.validate_aud = false;
    let data =
        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
            .ok()?;
    Some(data.claims.sub)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;

        verify_bearer(token, state.config.jwt_secret.as_bytes())
            .map(|user_id| AuthUser { user_id })
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: Uuid,
        exp: usize,
    }

    fn make_token(sub: Uuid, secret: &[u8]) -> String {
        let claims = TestClaims {
            sub,
            exp: 4_102_444_800, // 2100-01-01, far enough out for tests
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = make_token(user_id, b"secret");
        assert_eq!(verify_bearer(&token, b"secret"), Some(user_id));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = make_token(Uuid::new_v4(), b"secret");
        assert_eq!(verify_bearer(&token, b"other-secret"), None);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert_eq!(verify_bearer("not-a-jwt", b"secret"), None);
    }
}
