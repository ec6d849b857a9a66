//! Authentication extractors.
//!
//! Tokens travel as `Authorization: Bearer <jwt>`. Three extractors cover the
//! three kinds of route:
//! - [`Identity`] for API routes: missing or bad tokens are a 401 problem.
//! - [`OptionalIdentity`] for pages anyone may read.
//! - [`LoginRequired`] for pages that change data: anonymous requesters are
//!   sent to the login page with the path they came from.

use actix_web::{
    Error, FromRequest, HttpRequest, HttpResponse, ResponseError,
    dev::Payload,
    http::{StatusCode, header},
    web,
};
use std::future::{Ready, ready};
use uuid::Uuid;

use blogicum_core::ports::{AuthError, TokenClaims};
use blogicum_shared::ErrorResponse;

use crate::middleware::error::AppError;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/auth/login";

/// Authenticated user identity.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            roles: claims.roles,
        }
    }
}

/// Error type for authentication failures on API routes.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct AuthenticationError(pub AuthError);

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AuthError::TokenExpired | AuthError::InvalidToken(_) | AuthError::MissingAuth => {
                StatusCode::UNAUTHORIZED
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your authentication token has expired. Please login again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
            _ => ErrorResponse::internal_error(),
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

fn app_state(req: &HttpRequest) -> Result<&web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AppError::Internal("Server configuration error".to_string())
    })
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

fn authenticate(state: &AppState, req: &HttpRequest) -> Result<Identity, AuthError> {
    let token = bearer_token(req)?;
    state.tokens.validate_token(token).map(Identity::from)
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result: Result<Self, Error> = match app_state(req) {
            Ok(state) => authenticate(state, req).map_err(|e| AuthenticationError(e).into()),
            Err(e) => Err(e.into()),
        };
        ready(result)
    }
}

/// Optional identity extractor - anonymous when the token is absent or bad.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|identity| identity.user_id)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result: Result<Self, Error> = match app_state(req) {
            Ok(state) => Ok(OptionalIdentity(authenticate(state, req).ok())),
            Err(e) => Err(e.into()),
        };
        ready(result)
    }
}

/// Identity of a page request that needs a logged-in user.
pub struct LoginRequired(pub Identity);

impl LoginRequired {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }
}

/// Sends an anonymous requester to the login page, remembering where they were going.
#[derive(Debug, thiserror::Error)]
#[error("login required for {next}")]
pub struct LoginRedirect {
    pub next: String,
}

impl LoginRedirect {
    pub fn location(&self) -> String {
        format!("{}?next={}", LOGIN_PATH, urlencoding::encode(&self.next))
    }
}

impl ResponseError for LoginRedirect {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((header::LOCATION, self.location()))
            .finish()
    }
}

impl FromRequest for LoginRequired {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = match app_state(req) {
            Ok(state) => state,
            Err(e) => return ready(Err(e.into())),
        };

        let result: Result<Self, Error> = match authenticate(state, req) {
            Ok(identity) => Ok(LoginRequired(identity)),
            Err(e) => {
                tracing::debug!("Login required: {}", e);
                let next = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| req.path().to_string());
                Err(LoginRedirect { next }.into())
            }
        };
        ready(result)
    }
}
