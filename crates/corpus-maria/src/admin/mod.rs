//! Back-office login and the bearer-token guard placed in front of admin routes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AdminConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminAuthError {
    #[error("admin login is not configured")]
    Disabled,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid or revoked session")]
    InvalidToken,
    #[error("session expired")]
    Expired,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AdminAuthError::Disabled => StatusCode::SERVICE_UNAVAILABLE,
            AdminAuthError::InvalidCredentials
            | AdminAuthError::MissingToken
            | AdminAuthError::InvalidToken
            | AdminAuthError::Expired => StatusCode::UNAUTHORIZED,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and checks back-office sessions. Cloning shares the session table.
#[derive(Debug, Clone)]
pub struct AdminAuthenticator {
    config: Arc<AdminConfig>,
    sessions: Arc<Mutex<HashMap<Uuid, DateTime<Utc>>>>,
}

impl AdminAuthenticator {
    pub fn new(config: AdminConfig) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Arc::default(),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<Uuid, DateTime<Utc>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminSession, AdminAuthError> {
        let (Some(expected_email), Some(expected_password)) =
            (self.config.email.as_deref(), self.config.password.as_deref())
        else {
            return Err(AdminAuthError::Disabled);
        };

        let email_matches = email.trim().eq_ignore_ascii_case(expected_email);
        let password_matches: bool = password
            .as_bytes()
            .ct_eq(expected_password.as_bytes())
            .into();
        if !(email_matches && password_matches) {
            warn!("admin login refused");
            return Err(AdminAuthError::InvalidCredentials);
        }

        let token = Uuid::new_v4();
        let expires_at = now + Duration::minutes(self.config.session_ttl_minutes);
        let mut sessions = self.sessions();
        sessions.retain(|_, expiry| *expiry > now);
        sessions.insert(token, expires_at);
        info!(%expires_at, "admin session opened");

        Ok(AdminSession {
            token: token.to_string(),
            expires_at,
        })
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<(), AdminAuthError> {
        let token = Uuid::parse_str(token.trim()).map_err(|_| AdminAuthError::InvalidToken)?;
        let mut sessions = self.sessions();
        match sessions.get(&token).copied() {
            None => Err(AdminAuthError::InvalidToken),
            Some(expires_at) if expires_at <= now => {
                sessions.remove(&token);
                Err(AdminAuthError::Expired)
            }
            Some(_) => Ok(()),
        }
    }

    /// Returns whether a live session was revoked.
    pub fn logout(&self, token: &str) -> bool {
        Uuid::parse_str(token.trim())
            .map(|token| self.sessions().remove(&token).is_some())
            .unwrap_or(false)
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware rejecting requests without a live admin session.
pub async fn require_admin(
    State(admin): State<AdminAuthenticator>,
    request: Request,
    next: Next,
) -> Response {
    let verdict = match bearer_token(request.headers()) {
        Some(token) => admin.verify(token, Utc::now()),
        None => Err(AdminAuthError::MissingToken),
    };

    match verdict {
        Ok(()) => next.run(request).await,
        Err(error) => error.into_response(),
    }
}

/// `POST /api/admin/login` and `POST /api/admin/logout`.
pub fn admin_router(admin: AdminAuthenticator) -> Router {
    Router::new()
        .route("/api/admin/login", post(login_handler))
        .route("/api/admin/logout", post(logout_handler))
        .with_state(admin)
}

async fn login_handler(
    State(admin): State<AdminAuthenticator>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AdminSession>, AdminAuthError> {
    admin
        .login(&request.email, &request.password, Utc::now())
        .map(Json)
}

async fn logout_handler(State(admin): State<AdminAuthenticator>, headers: HeaderMap) -> Response {
    match bearer_token(&headers) {
        Some(token) => {
            let revoked = admin.logout(token);
            (StatusCode::OK, Json(json!({ "revoked": revoked }))).into_response()
        }
        None => AdminAuthError::MissingToken.into_response(),
    }
}
