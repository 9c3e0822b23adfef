// API module entry
// Routes method + path to the student/selection handlers

mod handlers;
mod response;
mod types;

use hyper::body::Body;
use hyper::{Method, Request};
use std::convert::Infallible;
use std::error::Error as StdError;
use std::sync::Arc;

use crate::config::AppState;
use crate::error::ApiError;
use crate::logger;

use handlers::STUDENT_PATH_PREFIX;
pub use response::ApiResponse;

/// API route handler
///
/// Dispatches to handler functions based on request path and method
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<ApiResponse, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let enable_cors = state.config.http.enable_cors;
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let result = if let Err(e) = check_body_size(&req, state.config.http.max_body_size) {
        Err(e)
    } else {
        route(req, &method, &path, &state).await
    };

    let mut resp = match result {
        Ok(resp) => resp,
        Err(e) => response::error_response(&e),
    };
    if enable_cors {
        response::apply_cors(&mut resp);
    }
    Ok(resp)
}

async fn route<B>(
    req: Request<B>,
    method: &Method,
    path: &str,
    state: &AppState,
) -> handlers::HandlerResult
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    match (method, path) {
        // CORS preflight
        (&Method::OPTIONS, _) => Ok(response::options_response(state.config.http.enable_cors)),
        (&Method::GET, "/" | "/index.html") => handlers::serve_index(state).await,
        (&Method::GET, "/healthz") => Ok(response::health_response()),
        // Admin reads
        (&Method::GET, "/api/students") => handlers::list_students(state).await,
        (&Method::GET, "/api/selections") => handlers::list_selections(state).await,
        (&Method::GET, "/api/export/csv") => handlers::export_csv(state).await,
        (&Method::GET, "/api/stats") => handlers::stats(state).await,
        // Admin writes
        (&Method::POST, "/api/admin/login") => handlers::admin_login(req, state).await,
        (&Method::POST, "/api/admin/add-student") => handlers::add_student(req, state).await,
        (&Method::DELETE, p) if p.starts_with(STUDENT_PATH_PREFIX) => {
            handlers::delete_student(p, state).await
        }
        // Student
        (&Method::POST, "/api/student/login") => handlers::student_login(req, state).await,
        (&Method::POST, "/api/student/select") => handlers::submit_selection(req, state).await,
        // Unknown route
        _ => Ok(response::not_found("Not found")),
    }
}

/// Reject a declared Content-Length above the configured maximum
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Result<(), ApiError> {
    let Some(content_length) = req.headers().get("content-length") else {
        return Ok(());
    };

    match content_length.to_str().map(str::parse::<u64>) {
        Ok(Ok(size)) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Err(ApiError::PayloadTooLarge { max: max_body_size })
        }
        Ok(Ok(_)) => Ok(()),
        _ => Err(ApiError::BadRequest(
            "Invalid Content-Length header".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::Store;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::StatusCode;
    use tempfile::TempDir;

    fn test_state() -> (TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_from(dir.path().join("none").to_str().unwrap()).unwrap();
        config.storage.index_file = dir.path().join("index.html").display().to_string();
        config.http.max_body_size = 1024;
        let store = Store::open(dir.path().join("data.json")).unwrap();
        (dir, Arc::new(AppState::new(config, store)))
    }

    async fn call(
        state: &Arc<AppState>,
        method: Method,
        path: &str,
        body: &str,
    ) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap();
        let resp = handle_request(req, Arc::clone(state)).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    async fn add(state: &Arc<AppState>, reg: &str, dob: &str) -> StatusCode {
        let body = serde_json::json!({ "reg": reg, "dob": dob }).to_string();
        call(state, Method::POST, "/api/admin/add-student", &body).await.0
    }

    async fn select(state: &Arc<AppState>, reg: &str, nme: &str, activity: &str) -> StatusCode {
        let body = serde_json::json!({ "reg": reg, "nme": nme, "activity": activity }).to_string();
        call(state, Method::POST, "/api/student/select", &body).await.0
    }

    #[tokio::test]
    async fn test_admin_login() {
        let (_dir, state) = test_state();
        let (status, body) = call(
            &state,
            Method::POST,
            "/api/admin/login",
            r#"{"username":"admin","password":"1234"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/admin/login",
            r#"{"username":"admin","password":"nope"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_add_student_statuses() {
        let (_dir, state) = test_state();
        assert_eq!(add(&state, "21CS001", "2003-04-12").await, StatusCode::CREATED);
        assert_eq!(add(&state, "21CS001", "2003-04-12").await, StatusCode::CONFLICT);
        assert_eq!(add(&state, "", "2003-04-12").await, StatusCode::BAD_REQUEST);

        let (status, body) = call(&state, Method::POST, "/api/admin/add-student", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Register number and DOB are required");

        let (_, body) = call(&state, Method::GET, "/api/students", "").await;
        assert_eq!(body["students"].as_array().unwrap().len(), 1);
        assert_eq!(body["students"][0]["reg"], "21CS001");
    }

    #[tokio::test]
    async fn test_student_login_reports_submission() {
        let (_dir, state) = test_state();
        add(&state, "21CS001", "2003-04-12").await;
        let creds = r#"{"reg":"21CS001","dob":"2003-04-12"}"#;

        let (status, body) = call(&state, Method::POST, "/api/student/login", creds).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["already_submitted"], false);

        assert_eq!(select(&state, "21CS001", "Sports", "Football").await, StatusCode::OK);
        let (_, body) = call(&state, Method::POST, "/api/student/login", creds).await;
        assert_eq!(body["already_submitted"], true);

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/student/login",
            r#"{"reg":"21CS001","dob":"1999-01-01"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Student not registered by Admin!");
    }

    #[tokio::test]
    async fn test_resubmission_overwrites() {
        let (_dir, state) = test_state();
        add(&state, "21CS001", "2003-04-12").await;
        select(&state, "21CS001", "Sports", "Football").await;
        select(&state, "21CS001", "Arts", "Painting").await;

        let (_, body) = call(&state, Method::GET, "/api/selections", "").await;
        let selections = body["selections"].as_array().unwrap();
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0]["activity"], "Painting");
    }

    #[tokio::test]
    async fn test_select_missing_fields() {
        let (_dir, state) = test_state();
        let (status, body) = call(
            &state,
            Method::POST,
            "/api/student/select",
            r#"{"reg":"21CS001","nme":"Sports"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing fields");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (_dir, state) = test_state();
        let (status, _) = call(&state, Method::POST, "/api/student/select", "{oops").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) =
            call(&state, Method::POST, "/api/student/select", r#"{"reg": 42}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_student_cascades() {
        let (_dir, state) = test_state();
        add(&state, "21CS001", "2003-04-12").await;
        select(&state, "21CS001", "Sports", "Football").await;

        let (status, body) =
            call(&state, Method::DELETE, "/api/admin/student/21CS001", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Student 21CS001 deleted");

        let (_, body) = call(&state, Method::GET, "/api/selections", "").await;
        assert!(body["selections"].as_array().unwrap().is_empty());

        let (status, _) = call(&state, Method::DELETE, "/api/admin/student/21CS001", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&state, Method::DELETE, "/api/admin/student/", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stats_sum_to_total() {
        let (_dir, state) = test_state();
        add(&state, "21CS001", "2003-04-12").await;
        add(&state, "21CS002", "2003-05-01").await;
        select(&state, "21CS001", "Sports", "Football").await;
        select(&state, "21CS002", "Sports", "Cricket").await;

        let (status, body) = call(&state, Method::GET, "/api/stats", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_students"], 2);
        assert_eq!(body["total_submitted"], 2);
        assert_eq!(body["nme_breakdown"]["Sports"], 2);
        assert_eq!(body["activity_breakdown"]["Football"], 1);
        assert_eq!(body["activity_breakdown"]["Cricket"], 1);
    }

    #[tokio::test]
    async fn test_csv_export() {
        let (_dir, state) = test_state();
        select(&state, "21CS001", "Sports", "Football").await;

        let req = Request::builder()
            .method(Method::GET)
            .uri("/api/export/csv")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, Arc::clone(&state)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/csv");
        assert_eq!(
            resp.headers()["content-disposition"],
            "attachment; filename=\"selections.csv\""
        );

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("Register No,NME,Activity,Submitted At\r\n"));
        assert!(text.contains("21CS001,Sports,Football,"));
    }

    #[tokio::test]
    async fn test_unknown_route_and_cors() {
        let (_dir, state) = test_state();
        let req = Request::builder()
            .method(Method::GET)
            .uri("/api/nothing")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, Arc::clone(&state)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");

        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/student/select")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, Arc::clone(&state)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers()["access-control-allow-methods"],
            "GET, POST, OPTIONS, DELETE"
        );
    }

    #[tokio::test]
    async fn test_health_check() {
        let (_dir, state) = test_state();
        let req = Request::builder()
            .method(Method::GET)
            .uri("/healthz")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, Arc::clone(&state)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/plain");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let (_dir, state) = test_state();
        let big = format!(r#"{{"reg":"{}"}}"#, "x".repeat(2048));
        let (status, _) = call(&state, Method::POST, "/api/student/select", &big).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/student/select")
            .header("content-length", "4096")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, Arc::clone(&state)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_index_page() {
        let (dir, state) = test_state();
        let (status, body) = call(&state, Method::GET, "/", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "index.html not found");

        std::fs::write(dir.path().join("index.html"), "<h1>Desk</h1>").unwrap();
        let req = Request::builder()
            .method(Method::GET)
            .uri("/index.html")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, Arc::clone(&state)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"<h1>Desk</h1>");
    }
}
