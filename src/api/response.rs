// API response utility functions module

use crate::error::ApiError;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN};
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::types::{MessageResponse, NotFoundBody};

pub type ApiResponse = Response<Full<Bytes>>;

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS, DELETE";

/// Build JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> ApiResponse {
    let json = match serde_json::to_string(body) {
        Ok(j) => j,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            return build(
                StatusCode::INTERNAL_SERVER_ERROR,
                "application/json",
                Bytes::from_static(br#"{"success":false,"message":"Internal server error"}"#),
            );
        }
    };

    build(status, "application/json", Bytes::from(json))
}

/// `{"success": true, "message": ...}`
pub fn success(status: StatusCode, message: impl Into<String>) -> ApiResponse {
    json_response(
        status,
        &MessageResponse {
            success: true,
            message: message.into(),
        },
    )
}

/// `{"success": false, "message": ...}` with the error's status
///
/// Internal failures are logged and reported without detail.
pub fn error_response(err: &ApiError) -> ApiResponse {
    let message = if err.is_internal() {
        logger::log_error(&err.to_string());
        "Internal server error".to_string()
    } else {
        err.to_string()
    };

    json_response(
        err.status(),
        &MessageResponse {
            success: false,
            message,
        },
    )
}

/// 404 `{"error": ...}`
pub fn not_found(message: &str) -> ApiResponse {
    json_response(StatusCode::NOT_FOUND, &NotFoundBody { error: message })
}

/// CSV download
pub fn csv_attachment(data: Vec<u8>, filename: &str) -> ApiResponse {
    let mut resp = build(StatusCode::OK, "text/csv", Bytes::from(data));
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")) {
        resp.headers_mut().insert("Content-Disposition", value);
    }
    resp
}

pub fn html_response(data: Vec<u8>) -> ApiResponse {
    build(StatusCode::OK, "text/html; charset=utf-8", Bytes::from(data))
}

pub fn health_response() -> ApiResponse {
    build(StatusCode::OK, "text/plain", Bytes::from_static(b"ok"))
}

/// Build OPTIONS response (preflight request)
pub fn options_response(enable_cors: bool) -> ApiResponse {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", ALLOWED_METHODS);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
            .header("Access-Control-Allow-Headers", "Content-Type");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to build OPTIONS response: {e}"));
        Response::new(Full::new(Bytes::new()))
    })
}

/// Allow any origin on a finished response
pub fn apply_cors(resp: &mut ApiResponse) {
    resp.headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
}

fn build(status: StatusCode, content_type: &str, body: Bytes) -> ApiResponse {
    let content_length = body.len();
    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build {status} response: {e}"));
            Response::new(Full::new(Bytes::new()))
        })
}
