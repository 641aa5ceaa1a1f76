use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::packet::PacketError;

#[derive(Debug)]
pub enum AppError {
    Database(sqlx::Error),
    Packet(PacketError),
    UserNotFound(String),
    ChannelNotFound(String),
    GroupNotFound(String),
    Malformed(String),
    Unauthorized(String),
    Internal(String),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "internal_error",
            AppError::Packet(_) => "bad_packet",
            AppError::UserNotFound(_) => "user_not_found",
            AppError::ChannelNotFound(_) => "channel_not_found",
            AppError::GroupNotFound(_) => "group_not_found",
            AppError::Malformed(_) => "invalid_payload",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Packet(_) | AppError::Malformed(_) => StatusCode::BAD_REQUEST,
            AppError::UserNotFound(_)
            | AppError::ChannelNotFound(_)
            | AppError::GroupNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "database error: {e}"),
            AppError::Packet(e) => write!(f, "{e}"),
            AppError::UserNotFound(name) => write!(f, "unknown user {name}"),
            AppError::ChannelNotFound(name) => write!(f, "unknown channel {name}"),
            AppError::GroupNotFound(name) => write!(f, "unknown permission group {name}"),
            AppError::Malformed(msg) => write!(f, "malformed payload: {msg}"),
            AppError::Unauthorized(msg) => write!(f, "{msg}"),
            AppError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Database(e) => Some(e),
            AppError::Packet(e) => Some(e),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, AppError::Database(_) | AppError::Internal(_)) {
            tracing::error!("{self}");
        }
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string()
            }
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<PacketError> for AppError {
    fn from(e: PacketError) -> Self {
        AppError::Packet(e)
    }
}
