//! Account handlers: registration, login and the current user.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use blogicum_core::domain::User;
use blogicum_core::forms::ProfileInput;
use blogicum_shared::dto::{
    AuthResponse, LoginPageParams, LoginRequest, RegisterUserRequest, UserResponse,
};

use super::pages;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Serialize)]
struct LoginPage {
    next: Option<String>,
}

fn token_response(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let token = state
        .tokens
        .generate_token(user.id, &user.username, vec!["user".to_string()])
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    })
}

/// POST /auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    // Same username and email rules as the profile form
    let account = ProfileInput {
        username: req.username,
        email: req.email,
        ..Default::default()
    }
    .clean()
    .map_err(|errors| {
        AppError::BadRequest(
            serde_json::to_string(&errors).unwrap_or_else(|_| "Invalid account".to_string()),
        )
    })?;

    if account.email.is_empty() {
        return Err(AppError::BadRequest("Email address is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let users = state.users();
    if users.find_by_username(&account.username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }
    if users.find_by_email(&account.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = state
        .passwords
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = users
        .insert(User::new(account.username, account.email, password_hash))
        .await?;
    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(HttpResponse::Created().json(token_response(&state, &user)?))
}

/// GET /auth/login
pub async fn login_page(query: web::Query<LoginPageParams>) -> HttpResponse {
    pages::render(
        pages::LOGIN,
        LoginPage {
            next: query.into_inner().next,
        },
    )
}

/// POST /auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users()
        .find_by_username(&req.username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = state
        .passwords
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        tracing::debug!(username = %req.username, "Rejected login");
        return Err(AppError::Unauthorized);
    }

    Ok(HttpResponse::Ok().json(token_response(&state, &user)?))
}

/// GET /auth/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    tracing::debug!(user_id = %identity.user_id, roles = ?identity.roles, "Current user");

    let user = state
        .users()
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id.to_string(),
        username: user.username,
        email: user.email,
        created_at: user.created_at.to_rfc3339(),
    }))
}
