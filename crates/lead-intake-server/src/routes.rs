// crates/lead-intake-server/src/routes.rs
// ============================================================================
// Module: HTTP Routes
// Description: Webhook, health, and phone verification handlers.
// Purpose: Validate requests at the boundary and hand work to the pipeline.
// Dependencies: lead-intake-core, lead-intake-config, axum, serde, url
// ============================================================================

//! ## Overview
//! Both webhook paths accept `{first, last, phone}`, answer immediately, and
//! run the submission pipeline on a background task. Every response carries
//! permissive CORS headers and `OPTIONS` on any path answers `204`. The
//! verification routes are mounted only when a [`VerificationService`] is
//! configured. Security posture: request bodies are untrusted and bounded by
//! `max_body_bytes`; error bodies never echo input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Request;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header::ACCESS_CONTROL_ALLOW_HEADERS;
use axum::http::header::ACCESS_CONTROL_ALLOW_METHODS;
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::http::header::RETRY_AFTER;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use lead_intake_config::ResponseMode;
use lead_intake_core::SubmissionInput;
use lead_intake_core::SubmissionPipeline;
use lead_intake_core::VerificationError;
use lead_intake_core::VerificationService;
use lead_intake_core::fingerprint;
use lead_intake_core::registration_url;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message returned for accepted submissions in `message` mode.
pub const SUCCESS_MESSAGE: &str = "Form submission received and processing";
/// Default request body limit in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
/// Methods advertised to browsers.
const CORS_ALLOW_METHODS: &str = "POST, GET, OPTIONS, PUT, DELETE";
/// Request headers advertised to browsers.
const CORS_ALLOW_HEADERS: &str =
    "Accept, Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, Authorization";

// ============================================================================
// SECTION: State
// ============================================================================

/// Boundary settings for the HTTP routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSettings {
    /// Success response style.
    pub response_mode: ResponseMode,
    /// Registration form used to build redirect URLs.
    pub form_url: Url,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
}

impl RouteSettings {
    /// Creates settings in `message` mode with the default body limit.
    #[must_use]
    pub const fn new(form_url: Url) -> Self {
        Self {
            response_mode: ResponseMode::Message,
            form_url,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Submission pipeline.
    pipeline: SubmissionPipeline,
    /// Phone verification, when enabled.
    verification: Option<VerificationService>,
    /// Boundary settings.
    settings: Arc<RouteSettings>,
}

impl AppState {
    /// Creates handler state.
    #[must_use]
    pub fn new(
        pipeline: SubmissionPipeline,
        verification: Option<VerificationService>,
        settings: RouteSettings,
    ) -> Self {
        Self {
            pipeline,
            verification,
            settings: Arc::new(settings),
        }
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// `{"status": ...}` body.
#[derive(Debug, Serialize)]
struct StatusBody {
    /// Status label.
    status: &'static str,
}

/// Accepted submission body.
#[derive(Debug, Serialize)]
struct AcceptedBody {
    /// Always `success`.
    status: &'static str,
    /// Acknowledgement text (`message` mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    /// Prefilled registration URL (`redirect` mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_url: Option<String>,
}

/// Error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Human-readable error.
    error: &'static str,
    /// Seconds until the request may be retried.
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

/// `/send-otp` request.
#[derive(Debug, Deserialize)]
struct SendCodeRequest {
    /// Phone to verify.
    #[serde(default)]
    phone: String,
}

/// `/verify-otp` request.
#[derive(Debug, Deserialize)]
struct CheckCodeRequest {
    /// Phone being verified.
    #[serde(default)]
    phone: String,
    /// Code the lead received.
    #[serde(default)]
    code: String,
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/webhook/framer-submission", post(handle_submission))
        .route("/webhook/landing-submission", post(handle_submission))
        .route("/health", get(handle_health));
    if state.verification.is_some() {
        router = router
            .route("/send-otp", post(handle_send_code))
            .route("/verify-otp", post(handle_check_code));
    }
    let max_body_bytes = state.settings.max_body_bytes;
    router
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Answers preflight requests and stamps CORS headers on every response.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(CORS_ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(CORS_ALLOW_HEADERS));
    response
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Accepts a lead submission and processes it in the background.
async fn handle_submission(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let input: SubmissionInput = match parse_body(body) {
        Ok(input) => input,
        Err(response) => return response,
    };
    if input.validate().is_err() {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    }
    let accepted = match state.settings.response_mode {
        ResponseMode::Message => AcceptedBody {
            status: "success",
            message: Some(SUCCESS_MESSAGE),
            redirect_url: None,
        },
        ResponseMode::Redirect => {
            let url = registration_url(
                &state.settings.form_url,
                &input.first,
                &input.last,
                &fingerprint(&input.phone),
            );
            AcceptedBody {
                status: "success",
                message: None,
                redirect_url: Some(url.into()),
            }
        }
    };
    drop(state.pipeline.submit_in_background(input));
    (StatusCode::OK, Json(accepted)).into_response()
}

/// Liveness check.
async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(StatusBody {
            status: "ok",
        }),
    )
        .into_response()
}

/// Sends a verification code.
async fn handle_send_code(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let Some(verification) = state.verification.as_ref() else {
        return handle_not_found().await;
    };
    let request: SendCodeRequest = match parse_body(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    if request.phone.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    }
    match verification.request_code(&request.phone).await {
        Ok(()) => (
            StatusCode::OK,
            Json(StatusBody {
                status: "sent",
            }),
        )
            .into_response(),
        Err(err) => verification_error_response(&err),
    }
}

/// Checks a verification code.
async fn handle_check_code(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let Some(verification) = state.verification.as_ref() else {
        return handle_not_found().await;
    };
    let request: CheckCodeRequest = match parse_body(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    if request.phone.is_empty() || request.code.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    }
    match verification.verify_code(&request.phone, &request.code).await {
        Ok(()) => (
            StatusCode::OK,
            Json(StatusBody {
                status: "verified",
            }),
        )
            .into_response(),
        Err(err) => verification_error_response(&err),
    }
}

/// Unknown route.
async fn handle_not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads and decodes a JSON request body.
fn parse_body<T: DeserializeOwned>(body: Result<Bytes, BytesRejection>) -> Result<T, Response> {
    let bytes = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
        } else {
            error_response(StatusCode::BAD_REQUEST, "Invalid JSON format")
        }
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "Invalid JSON format"))
}

/// Builds a JSON error response.
fn error_response(status: StatusCode, error: &'static str) -> Response {
    (
        status,
        Json(ErrorBody {
            error,
            retry_after: None,
        }),
    )
        .into_response()
}

/// Maps verification failures onto HTTP statuses.
fn verification_error_response(err: &VerificationError) -> Response {
    match err {
        VerificationError::Cooldown {
            retry_after_secs,
        } => {
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorBody {
                    error: "Verification code requested too recently",
                    retry_after: Some(*retry_after_secs),
                }),
            )
                .into_response();
            response.headers_mut().insert(RETRY_AFTER, HeaderValue::from(*retry_after_secs));
            response
        }
        VerificationError::InvalidCode => {
            error_response(StatusCode::BAD_REQUEST, "Invalid verification code")
        }
        VerificationError::Expired => {
            error_response(StatusCode::GONE, "Verification expired or not requested")
        }
        VerificationError::Provider(_) => {
            error_response(StatusCode::BAD_GATEWAY, "Verification provider unavailable")
        }
        VerificationError::Store(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}
