use axum::{extract::State, response::IntoResponse};
use axum_extra::extract::CookieJar;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{Role, UpgradeStatus, upgrade_request, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::*;
use crate::models::shared::PublicUser;
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::utils::{cookie, hash, jwt};

/// Sign a token for `user_id` and attach it to the jar as the session cookie.
fn start_session(state: &AppState, jar: CookieJar, user_id: i32) -> Result<CookieJar, AppError> {
    let auth = &state.config.auth;
    let token = jwt::sign(user_id, &auth.jwt_secret, chrono::Duration::days(auth.token_ttl_days))
        .map_err(|e| AppError::Internal(format!("Token signing error: {e}")))?;
    Ok(jar.add(cookie::session_cookie(
        token,
        auth.token_ttl_days,
        auth.cookie_secure,
    )))
}

fn email_taken_on_unique(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Email race: unique constraint caught on write");
            AppError::EmailTaken
        }
        _ => AppError::from(e),
    }
}

async fn email_in_use<C: ConnectionTrait>(
    db: &C,
    email: &str,
    except: Option<i32>,
) -> Result<bool, DbErr> {
    let mut select = user::Entity::find().filter(user::Column::Email.eq(email));
    if let Some(id) = except {
        select = select.filter(user::Column::Id.ne(id));
    }
    Ok(select.count(db).await? > 0)
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new account",
    description = "Creates an account and starts a session by setting the `token` cookie. `role` may be `reader` (default) or `writer`.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = ApiResponse<PublicUser>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let email = normalize_email(&payload.email);
    if email_in_use(&state.db, &email, None).await? {
        return Err(AppError::EmailTaken);
    }

    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let now = chrono::Utc::now();
    let new_user = user::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        password: Set(hash),
        role: Set(payload.role.unwrap_or_default()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let user = new_user
        .insert(&state.db)
        .await
        .map_err(email_taken_on_unique)?;

    tracing::info!(user_id = user.id, role = %user.role, "User registered");

    let jar = start_session(&state, jar, user.id)?;
    Ok((
        jar,
        ApiResponse::created("User registered successfully", PublicUser::from(user)),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in",
    description = "Verifies credentials and sets the `token` session cookie.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<PublicUser>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid email or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_login_request(&payload)?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(&payload.email)))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let jar = start_session(&state, jar, user.id)?;
    Ok((jar, ApiResponse::ok("Login successful", PublicUser::from(user))))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Log out",
    description = "Overwrites the `token` cookie with an empty, expired one. Does not require a session.",
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<Empty>),
    ),
)]
#[instrument(skip(state, jar))]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (
        jar.add(cookie::cleared_cookie(state.config.auth.cookie_secure)),
        ApiResponse::message("Logged out successfully"),
    )
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getMe",
    summary = "Get the current user",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<PublicUser>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(auth_user: AuthUser) -> ApiResponse<PublicUser> {
    ApiResponse::ok("User retrieved", PublicUser::from(auth_user.user))
}

#[utoipa::path(
    put,
    path = "/profile",
    tag = "Auth",
    operation_id = "updateProfile",
    summary = "Update own profile",
    description = "Updates any of name, email and password. Absent fields are unchanged.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<PublicUser>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    validate_update_profile(&payload)?;

    let current = auth_user.user;
    let mut active: user::ActiveModel = current.clone().into();

    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(email) = payload.email {
        let email = normalize_email(&email);
        if email != current.email {
            if email_in_use(&state.db, &email, Some(current.id)).await? {
                return Err(AppError::EmailTaken);
            }
            active.email = Set(email);
        }
    }
    if let Some(password) = payload.password {
        let hash = hash::hash_password(&password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;
        active.password = Set(hash);
    }
    active.updated_at = Set(chrono::Utc::now());

    let updated = active
        .update(&state.db)
        .await
        .map_err(email_taken_on_unique)?;

    Ok(ApiResponse::ok("Profile updated", PublicUser::from(updated)))
}

#[utoipa::path(
    post,
    path = "/upgrade-request",
    tag = "Auth",
    operation_id = "requestUpgrade",
    summary = "Request the writer role",
    description = "Files a pending upgrade request for review by a writer. Only one pending request per user.",
    request_body = UpgradeRequestBody,
    responses(
        (status = 201, description = "Request submitted", body = ApiResponse<UpgradeRequestResponse>),
        (status = 400, description = "Already a writer or message too long (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 409, description = "A request is already pending (CONFLICT)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn request_upgrade(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpgradeRequestBody>,
) -> Result<impl IntoResponse, AppError> {
    if auth_user.is_writer() {
        return Err(AppError::Validation("You are already a writer".into()));
    }
    let message = payload
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());
    validate_upgrade_message(message.as_deref())?;

    let txn = state.db.begin().await?;

    // Serializes concurrent requests from the same user.
    user::Entity::find_by_id(auth_user.user_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::UserGone)?;

    let pending = upgrade_request::Entity::find()
        .filter(upgrade_request::Column::UserId.eq(auth_user.user_id))
        .filter(upgrade_request::Column::Status.eq(UpgradeStatus::Pending))
        .count(&txn)
        .await?;
    if pending > 0 {
        return Err(AppError::Conflict(
            "You already have a pending upgrade request".into(),
        ));
    }

    let request = upgrade_request::ActiveModel {
        user_id: Set(auth_user.user_id),
        message: Set(message),
        status: Set(UpgradeStatus::Pending),
        reviewed_by: Set(None),
        reviewed_at: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    Ok(ApiResponse::created(
        "Upgrade request submitted",
        UpgradeRequestResponse::from(request),
    ))
}

#[utoipa::path(
    post,
    path = "/become-writer",
    tag = "Auth",
    operation_id = "becomeWriter",
    summary = "Switch own role to writer",
    description = "Self-service upgrade to the writer role. Idempotent.",
    responses(
        (status = 200, description = "Role is now writer", body = ApiResponse<PublicUser>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn become_writer(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    if auth_user.is_writer() {
        return Ok(ApiResponse::ok(
            "You are already a writer",
            PublicUser::from(auth_user.user),
        ));
    }

    let mut active: user::ActiveModel = auth_user.user.into();
    active.role = Set(Role::Writer);
    active.updated_at = Set(chrono::Utc::now());
    let updated = active.update(&state.db).await?;

    tracing::info!(user_id = updated.id, "User switched to writer role");

    Ok(ApiResponse::ok(
        "Congratulations! You are now a writer",
        PublicUser::from(updated),
    ))
}
