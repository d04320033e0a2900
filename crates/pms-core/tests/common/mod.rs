//! In-process stand-in for the backend, bound to an ephemeral local port.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{json, Value};

pub const PASSWORD: &str = "correct-horse";
pub const TAKEN_EMAIL: &str = "taken@example.com";

/// What the fixture has been asked so far, plus switches to change its answers.
#[derive(Default)]
pub struct Recorded {
    pub token_requests: usize,
    pub refresh_tokens: Vec<String>,
    pub authorization: Vec<Option<String>>,
    pub register_fields: Vec<(String, String)>,
    pub reset_requests: Vec<Value>,
    pub reset_completions: Vec<Value>,
    pub marked_read: Vec<Value>,
    /// Refresh answers 401 for every token
    pub revoked: bool,
    issued: u32,
}

type Shared = Arc<Mutex<Recorded>>;

pub struct Fixture {
    pub base_url: String,
    pub state: Shared,
}

impl Fixture {
    pub fn recorded<T>(&self, read: impl FnOnce(&Recorded) -> T) -> T {
        read(&self.state.lock().unwrap())
    }

    pub fn revoke_refresh_tokens(&self) {
        self.state.lock().unwrap().revoked = true;
    }
}

pub fn access_token(user_id: i64, serial: u32) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = json!({
        "token_type": "access",
        "exp": 4_102_444_800i64,
        "jti": format!("jti-{}", serial),
        "user_id": user_id,
        "email": "amina@example.com",
        "first_name": "Amina",
        "last_name": "Otieno",
        "user_type": "tenant",
        "profile_picture": null,
    });
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.sig", header, body)
}

pub async fn spawn() -> Fixture {
    let state: Shared = Arc::new(Mutex::new(Recorded::default()));

    let router = Router::new()
        .route("/api/token/", post(obtain_pair))
        .route("/api/token/refresh/", post(refresh_pair))
        .route("/api/register/", post(register))
        .route("/api/request-reset-email/", post(request_reset))
        .route("/api/password-reset-complete", patch(complete_reset))
        .route("/api/properties/", get(properties))
        .route("/api/tenant-info/", get(tenant_info))
        .route("/api/notifications/", get(notifications))
        .route("/api/notifications-edit/", patch(mark_read))
        .route("/api/maintenance-requests/", get(maintenance_requests))
        .route("/api/applications/", get(broken))
        .route("/api/landlord/", get(forbidden))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Fixture {
        base_url: format!("http://{}/", addr),
        state,
    }
}

fn unauthorized(detail: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail })))
}

async fn obtain_pair(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut recorded = state.lock().unwrap();
    recorded.token_requests += 1;
    if body["password"] != PASSWORD {
        return unauthorized("No active account found with the given credentials");
    }
    recorded.issued += 1;
    let serial = recorded.issued;
    (
        StatusCode::OK,
        Json(json!({
            "access": access_token(1, serial),
            "refresh": format!("R{}", serial),
        })),
    )
}

async fn refresh_pair(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut recorded = state.lock().unwrap();
    let refresh = body["refresh"].as_str().unwrap_or_default().to_string();
    recorded.refresh_tokens.push(refresh.clone());
    if recorded.revoked || !refresh.starts_with('R') {
        return unauthorized("Token is invalid or expired");
    }
    recorded.issued += 1;
    let serial = recorded.issued;
    (
        StatusCode::OK,
        Json(json!({
            "access": access_token(1, serial),
            "refresh": format!("R{}", serial),
        })),
    )
}

async fn register(State(state): State<Shared>, mut form: Multipart) -> (StatusCode, Json<Value>) {
    let mut fields = Vec::new();
    while let Some(field) = form.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.unwrap();
        fields.push((name, value));
    }

    let taken = fields.iter().any(|(k, v)| k == "email" && v == TAKEN_EMAIL);
    state.lock().unwrap().register_fields = fields;
    if taken {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "email": ["user with this email already exists."] })),
        );
    }
    (StatusCode::CREATED, Json(json!({ "message": "Account created" })))
}

async fn request_reset(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    state.lock().unwrap().reset_requests.push(body);
    Json(json!({ "success": "We have sent you a link to reset your password" }))
}

async fn complete_reset(State(state): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    state.lock().unwrap().reset_completions.push(body);
    StatusCode::OK
}

/// Record the Authorization header and refuse anonymous callers.
fn check_bearer(state: &Shared, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let ok = authorization.is_some();
    state.lock().unwrap().authorization.push(authorization);
    if ok {
        Ok(())
    } else {
        Err(unauthorized("Authentication credentials were not provided."))
    }
}

async fn properties(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    check_bearer(&state, &headers)?;
    Ok(Json(json!([
        {
            "id": 4,
            "landlord": 2,
            "title": "Garden flat",
            "description": "Two rooms near the market",
            "address": "12 Moi Avenue",
            "bedrooms": 2,
            "bathrooms": 1,
            "parking": 1,
            "rent_price": "15000.00",
            "available": true,
            "image1": "/media/p/4a.jpg",
            "image2": null,
            "image3": null,
            "created_at": "2024-03-01T09:00:00Z",
            "updated_at": "2024-03-02T09:00:00Z"
        }
    ])))
}

async fn tenant_info(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    check_bearer(&state, &headers)?;
    Ok(Json(json!({
        "user": { "id": 1, "email": "amina@example.com", "first_name": "Amina", "last_name": "Otieno" },
        "property": null,
        "rent_status": "paid",
        "arrears": "0.00",
        "invoices": []
    })))
}

async fn notifications(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    check_bearer(&state, &headers)?;
    Ok(Json(json!([
        {
            "title": "Water outage",
            "message": "Water will be off on Saturday",
            "date": "2024-03-05T08:00:00Z",
            "id": 7,
            "read": false,
            "notification_type": "general"
        }
    ])))
}

/// Only notification 7 exists.
async fn mark_read(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    check_bearer(&state, &headers)?;
    let known = body["notification"] == 7;
    state.lock().unwrap().marked_read.push(body);
    if !known {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Notification not found." })),
        ));
    }
    Ok(Json(json!({ "message": "Notification marked as read." })))
}

async fn maintenance_requests(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    check_bearer(&state, &headers)?;
    Ok(Json(json!([
        {
            "type": "Plumbing",
            "description": "Kitchen sink leaks",
            "status": "Pending",
            "severity": "High",
            "submitted_at": "2024-03-04T12:00:00Z",
            "budget": null
        }
    ])))
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

async fn forbidden() -> (StatusCode, Json<Value>) {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "detail": "You do not have permission to perform this action." })),
    )
}
