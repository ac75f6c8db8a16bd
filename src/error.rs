use axum::{http::StatusCode, response::IntoResponse};
use std::fmt::Display;

pub type AppResult<T> = Result<T, AppErr>;

#[derive(thiserror::Error, Debug)]
pub enum AppErr {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A non-leader tried a leader-only action. Logged, never sent to the client.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("unknown message kind: {0}")]
    UnknownKind(String),

    #[error("config: {0}")]
    Config(String),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntoResponse for AppErr {
    fn into_response(self) -> axum::response::Response {
        let code = match &self {
            AppErr::NotFound(_) => StatusCode::NOT_FOUND,
            AppErr::AlreadyExists(_)
            | AppErr::MalformedPayload(_)
            | AppErr::UnknownKind(_) => StatusCode::BAD_REQUEST,
            AppErr::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppErr::Config(_) | AppErr::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (code, self.to_string()).into_response()
    }
}

/* ── small helpers: turn anything displayable into the matching variant ── */
pub fn malformed<E: Display>(e: E) -> AppErr { AppErr::MalformedPayload(e.to_string()) }

pub fn not_found<E: Display>(what: E) -> AppErr { AppErr::NotFound(what.to_string()) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (AppErr::NotFound("lobby".into()), StatusCode::NOT_FOUND),
            (AppErr::AlreadyExists("lobby".into()), StatusCode::BAD_REQUEST),
            (AppErr::Unauthorized("x".into()), StatusCode::FORBIDDEN),
            (malformed("eof"), StatusCode::BAD_REQUEST),
            (AppErr::UnknownKind("dance".into()), StatusCode::BAD_REQUEST),
            (AppErr::Config("BIND_ADDR".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, code) in cases {
            assert_eq!(err.into_response().status(), code);
        }
    }

    #[test]
    fn helpers_pick_the_right_variant() {
        assert!(matches!(not_found("room lobby"), AppErr::NotFound(m) if m == "room lobby"));
        assert!(matches!(malformed("missing field `url`"), AppErr::MalformedPayload(_)));
    }
}
