// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{CreateUserRequest, LoginRequest, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Inserts an account. Shared by self-registration and admin creation.
pub async fn insert_user(
    pool: &PgPool,
    account: &CreateUserRequest,
    is_admin: bool,
) -> Result<User, AppError> {
    let password_hash = hash_password(&account.password)?;

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password_hash, is_admin)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, email, password_hash, is_admin, created_at
        "#,
    )
    .bind(&account.username)
    .bind(&account.email)
    .bind(&password_hash)
    .bind(is_admin)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!(
                "Username '{}' or email already exists",
                account.username
            ))
        } else {
            tracing::error!("Failed to create user: {:?}", e);
            AppError::from(e)
        }
    })
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = insert_user(&pool, &payload, false).await?;
    tracing::info!("Registered user {}", user.username);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Every successful login opens a new session id; quiz start times are
/// tracked per session.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, is_admin, created_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await?;

    // Same message for unknown user and bad password.
    let invalid = || AppError::AuthError("Invalid username or password.".to_string());

    let user = user.ok_or_else(invalid)?;
    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(invalid());
    }

    let session_id = Uuid::new_v4();
    let token = sign_jwt(
        user.id,
        &user.username,
        user.is_admin,
        session_id,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    tracing::info!("User {} logged in", user.username);

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "is_admin": user.is_admin
    })))
}
