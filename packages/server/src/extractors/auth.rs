use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::CookieJar;
use sea_orm::EntityTrait;

use crate::entity::{Role, user};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::{cookie::TOKEN_COOKIE, jwt};

/// Authenticated user, resolved from the `token` cookie or an
/// `Authorization: Bearer <token>` header.
///
/// The user row is reloaded on every request, so role changes and deleted
/// accounts take effect immediately. Role checks happen in the handler body
/// via [`AuthUser::require_writer`].
pub struct AuthUser {
    pub user_id: i32,
    pub role: Role,
    pub user: user::Model,
}

impl AuthUser {
    pub fn is_writer(&self) -> bool {
        self.role == Role::Writer
    }

    /// Returns `Ok(())` for writers, `Err(PermissionDenied)` otherwise.
    pub fn require_writer(&self) -> Result<(), AppError> {
        if self.is_writer() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

/// Cookie first, then bearer header.
fn token_from_parts(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(TOKEN_COOKIE)
        && !cookie.value().is_empty()
    {
        return Some(cookie.value().to_owned());
    }

    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or(AppError::TokenMissing)?;
        let claims = jwt::verify(&token, &state.config.auth.jwt_secret)?;

        let user = user::Entity::find_by_id(claims.uid)
            .one(&state.db)
            .await?
            .ok_or(AppError::UserGone)?;

        Ok(AuthUser {
            user_id: user.id,
            role: user.role,
            user,
        })
    }
}

/// Optional authentication: a missing or unusable token yields `None`
/// instead of rejecting the request.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match <AuthUser as FromRequestParts<AppState>>::from_request_parts(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::Internal(detail)) => Err(AppError::Internal(detail)),
            Err(_) => Ok(None),
        }
    }
}
