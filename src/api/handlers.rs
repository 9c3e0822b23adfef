// Request handlers module
// Each handler validates input, touches the store and builds a response

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Request, StatusCode};
use serde::de::DeserializeOwned;
use std::error::Error as StdError;

use super::response::{self, json_response, success, ApiResponse};
use super::types::{
    AdminLogin, SelectionRequest, SelectionsResponse, StudentCredentials, StudentLoginResponse,
    StudentsResponse,
};
use crate::config::AppState;
use crate::error::{ApiError, StoreError};
use crate::logger;
use crate::store::{self, Upsert};

pub type HandlerResult = Result<ApiResponse, ApiError>;

/// Path prefix of `DELETE /api/admin/student/{reg}`
pub const STUDENT_PATH_PREFIX: &str = "/api/admin/student/";

/// Read the whole body as a JSON object
///
/// An empty body is treated as `{}`.
async fn read_json<T, B>(req: Request<B>, max_body_size: u64) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(ApiError::PayloadTooLarge { max: max_body_size });
        }
        Err(e) => {
            return Err(ApiError::BadRequest(format!(
                "Failed to read request body: {e}"
            )))
        }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {e}")))
}

/// GET /, /index.html
pub async fn serve_index(state: &AppState) -> HandlerResult {
    let path = &state.config.storage.index_file;
    match tokio::fs::read(path).await {
        Ok(data) => Ok(response::html_response(data)),
        Err(e) => {
            logger::log_warning(&format!("Cannot serve index file {path}: {e}"));
            Ok(response::not_found("index.html not found"))
        }
    }
}

/// GET /api/students
pub async fn list_students(state: &AppState) -> HandlerResult {
    let store = state.store.read().await;
    Ok(json_response(
        StatusCode::OK,
        &StudentsResponse {
            students: store.students(),
        },
    ))
}

/// GET /api/selections
pub async fn list_selections(state: &AppState) -> HandlerResult {
    let store = state.store.read().await;
    Ok(json_response(
        StatusCode::OK,
        &SelectionsResponse {
            selections: store.selections(),
        },
    ))
}

/// GET /api/export/csv
pub async fn export_csv(state: &AppState) -> HandlerResult {
    let mut data = Vec::new();
    {
        let db = state.store.read().await;
        store::write_selections_csv(&mut data, db.selections())?;
    }
    Ok(response::csv_attachment(data, "selections.csv"))
}

/// GET /api/stats
pub async fn stats(state: &AppState) -> HandlerResult {
    let stats = state.store.read().await.stats();
    Ok(json_response(StatusCode::OK, &stats))
}

/// POST /api/admin/login
pub async fn admin_login<B>(req: Request<B>, state: &AppState) -> HandlerResult
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let body: AdminLogin = read_json(req, state.config.http.max_body_size).await?;
    let admin = &state.config.admin;

    if body.username == admin.username && body.password == admin.password {
        Ok(success(StatusCode::OK, "Admin authenticated"))
    } else {
        logger::log_warning(&format!("Failed admin login for '{}'", body.username));
        Err(ApiError::Unauthorized("Invalid credentials"))
    }
}

/// POST /api/admin/add-student
pub async fn add_student<B>(req: Request<B>, state: &AppState) -> HandlerResult
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let body: StudentCredentials = read_json(req, state.config.http.max_body_size).await?;
    let student = state.store.write().await.add_student(&body.reg, &body.dob)?;

    logger::log_store_change("Student added", &student.reg);
    Ok(success(
        StatusCode::CREATED,
        format!("Student {} added successfully", student.reg),
    ))
}

/// DELETE /api/admin/student/{reg}
pub async fn delete_student(path: &str, state: &AppState) -> HandlerResult {
    let reg = path.strip_prefix(STUDENT_PATH_PREFIX).unwrap_or_default();
    if reg.is_empty() || reg.contains('/') {
        return Err(StoreError::StudentNotFound(reg.to_string()).into());
    }

    let removed = state.store.write().await.delete_student(reg)?;

    logger::log_store_change("Student deleted", &removed.reg);
    Ok(success(
        StatusCode::OK,
        format!("Student {} deleted", removed.reg),
    ))
}

/// POST /api/student/login
pub async fn student_login<B>(req: Request<B>, state: &AppState) -> HandlerResult
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let body: StudentCredentials = read_json(req, state.config.http.max_body_size).await?;
    let store = state.store.read().await;

    let Some(student) = store.find_student(&body.reg, &body.dob) else {
        return Err(ApiError::Unauthorized("Student not registered by Admin!"));
    };

    Ok(json_response(
        StatusCode::OK,
        &StudentLoginResponse {
            success: true,
            already_submitted: store.has_selection(&student.reg),
        },
    ))
}

/// POST /api/student/select
pub async fn submit_selection<B>(req: Request<B>, state: &AppState) -> HandlerResult
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let body: SelectionRequest = read_json(req, state.config.http.max_body_size).await?;
    let reg = body.reg.trim();

    let outcome = {
        let mut store = state.store.write().await;
        let outcome = store.upsert_selection(reg, &body.nme, &body.activity)?;
        // Accepted either way; registration is not checked on submission
        if !store.is_registered(reg) {
            logger::log_warning(&format!("Selection saved for unregistered reg '{reg}'"));
        }
        outcome
    };

    let action = match outcome {
        Upsert::Created => "Selection created",
        Upsert::Replaced => "Selection replaced",
    };
    logger::log_store_change(action, reg);
    Ok(success(StatusCode::OK, "Selection saved!"))
}
