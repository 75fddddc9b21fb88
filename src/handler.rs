use axum::{
    Json, Router,
    extract::{ConnectInfo, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_macros::debug_handler;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use std::{any::Any, net::SocketAddr, sync::Arc};

use crate::{
    dto::{ApiResponse, SendVerificationRequest, StatusResponse},
    service::{EmailService, MailError},
};

const API_KEY_HEADER: &str = "x-api-key";

/// Shared secret expected in the `x-api-key` header.
#[derive(Clone)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    fn matches(&self, presented: &str) -> bool {
        *self.0 == *presented
    }
}

pub fn router(service: Arc<EmailService>, api_key: ApiKey) -> Router {
    let api = Router::new()
        .route("/send-verification-code", post(send_verification_code))
        .route_layer(middleware::from_fn_with_state(api_key, require_api_key))
        .with_state(service);

    Router::new()
        .route("/", get(health_check))
        .nest("/api", api)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Turns a panic inside a request into a 500 envelope so the server keeps
/// serving other requests.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!("Unhandled fault while serving request: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::fail("Internal server error")),
    )
        .into_response()
}

pub async fn require_api_key(
    State(api_key): State<ApiKey>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|presented| api_key.matches(presented));

    if !authorized {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or_else(|| "unknown peer".to_string(), |info| info.0.to_string());
        tracing::warn!("Unauthorized API access attempt from {}", peer);

        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::fail("Unauthorized. Invalid API Key")),
        )
            .into_response();
    }

    next.run(request).await
}

#[debug_handler]
pub async fn send_verification_code(
    State(service): State<Arc<EmailService>>,
    payload: Result<Json<SendVerificationRequest>, JsonRejection>,
) -> Response {
    let payload = payload.map(|Json(p)| p).unwrap_or_else(|e| {
        tracing::debug!("Unreadable request body: {e}");
        SendVerificationRequest::default()
    });

    let Some((email, code)) = payload.required_fields() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::fail("Email and code are required")),
        )
            .into_response();
    };

    tracing::info!("Sending verification code to {}", email);

    match service.send_verification_code(&email, &code).await {
        Ok(result) => {
            tracing::info!(
                "Email sent successfully to {} (message id {})",
                email,
                result.message_id
            );
            (
                StatusCode::OK,
                Json(ApiResponse::ok("Verification code sent successfully")),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Error sending verification code: {e}");
            let detail = match e {
                MailError::TransportConfig(_) => "Mail transport is not configured".to_string(),
                other => other.to_string(),
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::fail("Failed to send verification code").with_error(detail)),
            )
                .into_response()
        }
    }
}

#[debug_handler]
pub async fn health_check() -> Response {
    (
        StatusCode::OK,
        Json(StatusResponse {
            message: "Monkey Messenger Email Service API".to_string(),
            status: "Running".to_string(),
        }),
    )
        .into_response()
}
