#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::api_state::ApiState;
use crate::jwt::validate_token;
use crate::response::error_detail;

/// An authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub subject: String,
    pub is_admin: bool,
}

/// Extractor for endpoints where authentication is optional
pub struct OptionalAuth(pub Option<AuthUser>);

/// Extractor for endpoints requiring a valid bearer
pub struct RequiredAuth(pub AuthUser);

/// Extractor for admin-only endpoints
pub struct AdminAuth(pub AuthUser);

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Resolve the caller from the bearer header: the admin API key grants admin,
/// a valid JWT grants a normal subject.
fn authenticate(req: &HttpRequest) -> Result<Option<AuthUser>, actix_web::Error> {
    let Some(state) = req.app_data::<web::Data<ApiState>>() else {
        return Err(unauthorized("Missing application state"));
    };

    let Some(token) = bearer_token(req) else {
        return Ok(None);
    };

    if state
        .api_config
        .admin_api_key
        .as_deref()
        .is_some_and(|key| key == token)
    {
        return Ok(Some(AuthUser {
            subject: "admin".to_string(),
            is_admin: true,
        }));
    }

    match validate_token(&token, &state.api_config.jwt_secret) {
        Ok(claims) => Ok(Some(AuthUser {
            subject: claims.sub,
            is_admin: false,
        })),
        Err(e) => Err(unauthorized(&e.to_string())),
    }
}

fn require_auth_enabled(req: &HttpRequest) -> bool {
    req.app_data::<web::Data<ApiState>>()
        .is_none_or(|state| state.api_config.require_auth)
}

fn unauthorized(detail: &str) -> actix_web::Error {
    actix_web::error::InternalError::from_response(
        detail.to_string(),
        error_detail(StatusCode::UNAUTHORIZED, detail),
    )
    .into()
}

fn forbidden(detail: &str) -> actix_web::Error {
    actix_web::error::InternalError::from_response(
        detail.to_string(),
        error_detail(StatusCode::FORBIDDEN, detail),
    )
    .into()
}

impl FromRequest for OptionalAuth {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Invalid credentials on an optional endpoint read as anonymous
        ready(Ok(Self(authenticate(req).unwrap_or(None))))
    }
}

impl FromRequest for RequiredAuth {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if !require_auth_enabled(req) {
            return ready(Ok(Self(AuthUser {
                subject: "anonymous".to_string(),
                is_admin: false,
            })));
        }

        ready(match authenticate(req) {
            Ok(Some(user)) => Ok(Self(user)),
            Ok(None) => Err(unauthorized("No credentials provided")),
            Err(e) => Err(e),
        })
    }
}

impl FromRequest for AdminAuth {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if !require_auth_enabled(req) {
            return ready(Ok(Self(AuthUser {
                subject: "admin".to_string(),
                is_admin: true,
            })));
        }

        ready(match authenticate(req) {
            Ok(Some(user)) if user.is_admin => Ok(Self(user)),
            Ok(Some(_)) => Err(forbidden("Admin access required")),
            Ok(None) => Err(unauthorized("No credentials provided")),
            Err(e) => Err(e),
        })
    }
}
