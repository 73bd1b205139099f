use actix_web::{http::StatusCode, HttpResponse};

/// `{"error": CODE}`, the body every failure path returns.
pub(crate) fn json_error(status: StatusCode, code: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({ "error": code }))
}

pub(crate) fn json_error_with_message(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "error": code,
        "message": message.into(),
    }))
}

pub(crate) fn internal_error() -> HttpResponse {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
}
