use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use super::jwt::{peek_claims, AUTH_TOKEN_TYPE};
use crate::db::AppState;
use crate::error::AppError;
use crate::store::StoreError;

/// Token from the Authorization header. The store's own SDK sends the bare
/// token; a `Bearer ` prefix is accepted too.
pub fn extract_token(req: &HttpRequest) -> Option<String> {
    let value = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())?
        .trim();

    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    };
    (!token.is_empty()).then(|| token.to_string())
}

/// Staff user behind the request, confirmed by the record store.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
}

impl AuthenticatedUser {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Check `token` locally, then have the store resolve it to a user record.
pub async fn authenticate_token(state: &AppState, token: &str) -> Result<AuthenticatedUser, AppError> {
    let claims = peek_claims(token).map_err(|e| {
        log::warn!("Token validation failed: {:?}", e);
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;
    if claims.token_type != AUTH_TOKEN_TYPE {
        return Err(AppError::Unauthorized("Invalid token type".to_string()));
    }

    match state.store.authenticate(token).await {
        Ok(record) => Ok(AuthenticatedUser {
            email: record.get_string("email"),
            id: record.id,
        }),
        Err(StoreError::Status { status, body }) if (400..500).contains(&status) => {
            log::warn!("Record store rejected token for {}: {} {}", claims.id, status, body);
            Err(AppError::Unauthorized("Invalid or expired token".to_string()))
        }
        Err(source) => {
            log::error!("Failed to confirm session with the record store: {}", source);
            Err(AppError::Query {
                what: "user session",
                source,
            })
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = extract_token(req);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let token = token
                .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;
            let Some(state) = state else {
                log::error!("AppState missing while authenticating request");
                return Err(AppError::Unauthorized("Authentication unavailable".to_string()));
            };
            authenticate_token(&state, &token).await
        })
    }
}
