// API request/response types
// Missing string fields in request bodies deserialize as empty strings

use serde::{Deserialize, Serialize};

use crate::store::{Selection, Student};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminLogin {
    pub username: String,
    pub password: String,
}

/// Body of add-student and student login
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StudentCredentials {
    pub reg: String,
    pub dob: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SelectionRequest {
    pub reg: String,
    pub nme: String,
    pub activity: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StudentLoginResponse {
    pub success: bool,
    pub already_submitted: bool,
}

#[derive(Debug, Serialize)]
pub struct StudentsResponse<'a> {
    pub students: &'a [Student],
}

#[derive(Debug, Serialize)]
pub struct SelectionsResponse<'a> {
    pub selections: &'a [Selection],
}

#[derive(Debug, Serialize)]
pub struct NotFoundBody<'a> {
    pub error: &'a str,
}
