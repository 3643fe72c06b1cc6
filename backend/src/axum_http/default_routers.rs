use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};

use super::error_responses::error_response;

pub async fn not_found(uri: Uri) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("No route for {}", uri.path()))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}
