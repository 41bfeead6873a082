//! Registration and credential check handlers.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::password;
use crate::config::{MAX_AGE, MIN_AGE, USERNAME_MAX_LEN, USERNAME_MIN_LEN};
use crate::db;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Number or numeric string
    pub age: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CheckLoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Trimmed username, None when blank
fn username_field(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Password exactly as sent; whitespace is part of the credential
fn password_field(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// POST /register - Create an account with fresh progress for every subject
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(username), Some(password), Some(age)) =
        (username_field(&req.username), password_field(&req.password), req.age.as_ref())
    else {
        return Err(ApiError::InvalidInput(
            "username, password and age are required".to_string(),
        ));
    };

    if !is_valid_username(username) {
        return Err(ApiError::InvalidInput(format!(
            "username must be {}-{} letters, digits or underscores",
            USERNAME_MIN_LEN, USERNAME_MAX_LEN
        )));
    }

    let age = parse_age(age).ok_or_else(|| {
        ApiError::InvalidInput(format!("age must be between {} and {}", MIN_AGE, MAX_AGE))
    })?;

    let password_hash = password::hash_password(password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::Server(e.to_string())
    })?;

    let conn = db::try_lock(&state.db)?;
    if !db::create_user(&conn, username, &password_hash, age, state.now())? {
        return Err(ApiError::UsernameTaken);
    }

    tracing::info!(user = username, age, "Registered new user");
    Ok(Json(json!({ "success": true, "username": username })))
}

/// POST /check-login - Report whether the credentials match.
///
/// A wrong username or password is a normal answer (`ok: false` with a
/// reason), not an HTTP error.
pub async fn check_login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CheckLoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(username), Some(password)) = (username_field(&req.username), password_field(&req.password))
    else {
        return Err(ApiError::InvalidInput(
            "username and password are required".to_string(),
        ));
    };

    let stored = {
        let conn = db::try_lock(&state.db)?;
        db::get_password_hash(&conn, username)?
    };

    let body = match stored {
        None => json!({ "ok": false, "reason": "NO_USER" }),
        Some(hash) if !password::verify_password(password, &hash) => {
            json!({ "ok": false, "reason": "BAD_PASS" })
        }
        Some(_) => json!({ "ok": true }),
    };
    Ok(Json(body))
}

/// Validate username: letters, digits or underscore, within length bounds
fn is_valid_username(username: &str) -> bool {
    let len = username.chars().count();
    (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len)
        && username.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Integer age in range, given as a JSON number or a numeric string
fn parse_age(value: &Value) -> Option<u8> {
    let age = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    if (MIN_AGE..=MAX_AGE).contains(&age) {
        u8::try_from(age).ok()
    } else {
        None
    }
}
