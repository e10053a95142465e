//! Route handlers and shared application state.
//!
//! The account store is an in-memory map behind the same handler contract
//! a database-backed store would have; persistence is out of scope for
//! this crate. Everything secret-shaped (token signer, cookie policy)
//! arrives via `AppState`, injected once at startup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use crate::auth::{TokenSigner, hash_password, verify_password};
use crate::config::SessionConfig;
use crate::datasource::{self, DataSourceKind};
use crate::executor::{CodeExecutor, Scope};
use crate::pipeline::{Stage, fail_fast_pipeline, stage};

/// Largest accepted script, in bytes.
const MAX_CODE_LEN: usize = 64 * 1024;

const SESSION_COOKIE: &str = "prism.sid";

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub tokens: TokenSigner,
    pub executor: Box<dyn CodeExecutor>,
    pub session: SessionConfig,
    pub users: Mutex<HashMap<String, UserRecord>>,
}

pub type SharedState = Arc<AppState>;

/// A registered account, keyed by email in the store.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

// ── Request / response payload types ──────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize)]
pub struct TestDataSourceRequest {
    pub kind: DataSourceKind,
    pub connection_string: String,
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TestDataSourceResponse {
    pub success: bool,
}

#[derive(Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
    #[serde(default)]
    pub context: Scope,
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/me", get(me_handler))
        .route("/api/data-sources/test", post(test_data_source_handler))
        .route("/api/execute", post(execute_handler))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_handler() -> &'static str {
    "OK"
}

async fn register_handler(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    if !req.email.contains('@') {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "invalid email address");
    }
    if req.password.len() < 8 {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "password must be at least 8 characters",
        );
    }

    let record = UserRecord {
        id: Uuid::new_v4(),
        email: req.email.clone(),
        password_hash: hash_password(&req.password),
    };

    let mut users = state.users.lock().expect("user store lock poisoned");
    if users.contains_key(&req.email) {
        return error_response(StatusCode::CONFLICT, "email already registered");
    }
    let response = UserResponse { id: record.id, email: record.email.clone() };
    users.insert(req.email, record);
    drop(users);

    info!(email = %response.email, "Registered account");
    (StatusCode::CREATED, Json(response)).into_response()
}

async fn login_handler(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Response {
    let record = {
        let users = state.users.lock().expect("user store lock poisoned");
        users.get(&req.email).cloned()
    };

    let Some(record) = record else {
        return error_response(StatusCode::UNAUTHORIZED, "invalid credentials");
    };
    if !verify_password(&req.password, &record.password_hash) {
        return error_response(StatusCode::UNAUTHORIZED, "invalid credentials");
    }

    let mut claims = serde_json::Map::new();
    claims.insert("userId".to_string(), json!(record.id));
    claims.insert("email".to_string(), json!(record.email));

    let token = match state.tokens.sign(&claims) {
        Ok(token) => token,
        Err(err) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("failed to issue token: {err:#}"),
            );
        }
    };

    let cookie = session_cookie(&token, &state.session);
    (
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse { token }),
    )
        .into_response()
}

async fn me_handler(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token.and_then(|token| state.tokens.verify(token)) {
        Some(claims) => Json(Value::Object(claims)).into_response(),
        None => error_response(StatusCode::UNAUTHORIZED, "missing or invalid token"),
    }
}

async fn test_data_source_handler(Json(req): Json<TestDataSourceRequest>) -> Response {
    let success = datasource::probe(
        req.kind,
        &req.connection_string,
        &req.username,
        &req.password,
    )
    .await;
    Json(TestDataSourceResponse { success }).into_response()
}

async fn execute_handler(
    State(state): State<SharedState>,
    Json(req): Json<ExecuteRequest>,
) -> Response {
    let mut job = ExecJob { code: req.code, scope: req.context };
    let stages = vec![validate_stage(), run_stage(state.clone())];

    match fail_fast_pipeline(&stages, Value::Null, &mut job).await {
        Ok(result) => Json(json!({ "result": result })).into_response(),
        Err(err) => error_response(StatusCode::UNPROCESSABLE_ENTITY, &format!("{err:#}")),
    }
}

// ── Execute pipeline stages ───────────────────────────────────────────

/// Data bag for one execute request.
struct ExecJob {
    code: String,
    scope: Scope,
}

fn validate_stage() -> Stage<Value, ExecJob> {
    stage(|_input: &Value, job: &mut ExecJob| {
        let empty = job.code.trim().is_empty();
        let oversized = job.code.len() > MAX_CODE_LEN;
        Box::pin(async move {
            if empty {
                anyhow::bail!("code must not be empty");
            }
            if oversized {
                anyhow::bail!("code exceeds {MAX_CODE_LEN} bytes");
            }
            Ok(Value::Null)
        })
    })
}

fn run_stage(state: SharedState) -> Stage<Value, ExecJob> {
    stage(move |_input: &Value, job: &mut ExecJob| {
        let state = state.clone();
        Box::pin(async move {
            let ExecJob { code, scope } = job;
            let value = state.executor.execute(code, scope).await?;
            Ok(value)
        })
    })
}

// ── Helpers ───────────────────────────────────────────────────────────

fn session_cookie(token: &str, session: &SessionConfig) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    if session.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    fn session(secure: bool) -> SessionConfig {
        SessionConfig {
            secret: "s".to_string(),
            resave: false,
            save_uninitialized: false,
            secure_cookies: secure,
        }
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", &session(false));
        assert_eq!(cookie, "prism.sid=tok; Path=/; HttpOnly; SameSite=Lax");
    }

    #[test]
    fn test_session_cookie_secure_in_production() {
        let cookie = session_cookie("tok", &session(true));
        assert!(cookie.ends_with("; Secure"));
    }
}
