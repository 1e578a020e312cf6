use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Role, UpgradeStatus, upgrade_request};
use crate::error::AppError;

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Display name (2-50 characters).
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    /// Email address, stored lower-cased.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Password (6-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    /// Requested role. Defaults to `reader`.
    pub role: Option<Role>,
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpgradeRequestBody {
    /// Why the user wants to write (up to 500 characters).
    #[schema(example = "I'd like to publish a series on compilers.")]
    pub message: Option<String>,
}

/// Created upgrade request.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequestResponse {
    pub id: i32,
    pub user_id: i32,
    pub message: Option<String>,
    pub status: UpgradeStatus,
    pub created_at: DateTime<Utc>,
}

impl From<upgrade_request::Model> for UpgradeRequestResponse {
    fn from(m: upgrade_request::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            message: m.message,
            status: m.status,
            created_at: m.created_at,
        }
    }
}

/// Trim and lower-case an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Shape check only: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.ends_with('.')
}

pub fn validate_name(name: &str) -> Result<(), AppError> {
    let len = name.trim().chars().count();
    if !(2..=50).contains(&len) {
        return Err(AppError::Validation("Name must be 2-50 characters".into()));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if !is_valid_email(&normalize_email(email)) {
        return Err(AppError::Validation(
            "Please provide a valid email".into(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 6 || password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 6-128 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    validate_name(&payload.name)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    validate_email(&payload.email)?;
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

pub fn validate_update_profile(payload: &UpdateProfileRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_name(name)?;
    }
    if let Some(ref email) = payload.email {
        validate_email(email)?;
    }
    if let Some(ref password) = payload.password {
        validate_password(password)?;
    }
    Ok(())
}

pub fn validate_upgrade_message(message: Option<&str>) -> Result<(), AppError> {
    if let Some(msg) = message
        && msg.chars().count() > 500
    {
        return Err(AppError::Validation(
            "Message cannot be more than 500 characters".into(),
        ));
    }
    Ok(())
}
