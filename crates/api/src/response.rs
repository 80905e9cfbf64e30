#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use serde_json::json;

use knowledge_core_core::error::Error;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Success envelope for 2xx responses
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    /// Response status
    pub status: Status,
    /// Human-readable message
    pub message: String,
    /// Response data payload
    pub data: Option<T>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn ok(data: T) -> HttpResponse {
        HttpResponse::Ok().json(Self {
            status: Status::Success,
            message: "Operation completed successfully".to_string(),
            data: Some(data),
        })
    }

    pub fn ok_with_message(data: T, message: &str) -> HttpResponse {
        HttpResponse::Ok().json(Self {
            status: Status::Success,
            message: message.to_string(),
            data: Some(data),
        })
    }

    pub fn created(data: T) -> HttpResponse {
        HttpResponse::Created().json(Self {
            status: Status::Success,
            message: "Resource created".to_string(),
            data: Some(data),
        })
    }
}

/// Error body per the API contract: always a `detail` field.
#[must_use]
pub fn error_detail(status: StatusCode, detail: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "detail": detail }))
}

/// Map a domain error onto the HTTP error taxonomy.
#[must_use]
pub fn from_error(error: &Error) -> HttpResponse {
    let status = match error {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Validation(_) | Error::Serialization(_) => StatusCode::BAD_REQUEST,
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::Auth(_) => StatusCode::UNAUTHORIZED,
        Error::Forbidden(_) => StatusCode::FORBIDDEN,
        _ if error.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        log::error!("Internal error: {error}");
        return error_detail(status, "Internal server error");
    }

    error_detail(status, &error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (Error::NotFound("x".to_string()), StatusCode::NOT_FOUND),
            (Error::Validation("x".to_string()), StatusCode::BAD_REQUEST),
            (Error::Conflict("x".to_string()), StatusCode::CONFLICT),
            (Error::Auth("x".to_string()), StatusCode::UNAUTHORIZED),
            (Error::Forbidden("x".to_string()), StatusCode::FORBIDDEN),
            (
                Error::Remote("503".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                Error::Unknown("x".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(from_error(&error).status(), expected, "{error}");
        }
    }
}
