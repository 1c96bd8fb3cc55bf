use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use tracing::warn;
use warp::http::{StatusCode, header};
use warp::reply::Response;
use warp::{Rejection, Reply, reject};

pub async fn recover_error(err: Rejection) -> Result<Response, Infallible> {
    if let Some(rejection) = err.find::<ApiRejection>() {
        let status = rejection.code.status();
        let json = warp::reply::json(&ApiResponse::<()>::err(
            rejection.code,
            rejection.message.clone(),
        ));
        let mut response = warp::reply::with_status(json, status).into_response();
        if rejection.code == ApiErrorCode::Unauthenticated {
            response
                .headers_mut()
                .insert(header::LOCATION, header::HeaderValue::from_static("/api/v1/auth/login"));
        }
        return Ok(response);
    }

    let (code, status, message) = if err.is_not_found() {
        (ApiErrorCode::NotFound, StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (ApiErrorCode::Validation, StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        (
            ApiErrorCode::NotFound,
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else {
        warn!("unhandled rejection: {:?}", err);
        (
            ApiErrorCode::InternalError,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal error".to_string(),
        )
    };
    let json = warp::reply::json(&ApiResponse::<()>::err(code, message));
    Ok(warp::reply::with_status(json, status).into_response())
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApiErrorCode {
    Validation,
    UsernameTaken,
    InvalidCredentials,
    Unauthenticated,
    Forbidden,
    NotFound,
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::Validation => StatusCode::BAD_REQUEST,
            ApiErrorCode::UsernameTaken => StatusCode::CONFLICT,
            ApiErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A typed failure on its way to `recover_error`.
#[derive(Debug)]
pub struct ApiRejection {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiRejection {
    fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiRejection {
            code,
            message: message.into(),
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> Self {
        warn!("Internal error: {}", error);
        Self::new(ApiErrorCode::InternalError, "Internal error")
    }
}

impl reject::Reject for ApiRejection {}

impl From<AuthError> for ApiRejection {
    fn from(error: AuthError) -> Self {
        let message = error.to_string();
        match error {
            AuthError::Validation { .. } => Self::new(ApiErrorCode::Validation, message),
            AuthError::UsernameTaken(_) => Self::new(ApiErrorCode::UsernameTaken, message),
            AuthError::InvalidUsername | AuthError::InvalidPassword => {
                Self::new(ApiErrorCode::InvalidCredentials, message)
            }
            AuthError::Store(e) | AuthError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<PostError> for ApiRejection {
    fn from(error: PostError) -> Self {
        let message = error.to_string();
        match error {
            PostError::Unauthenticated => Self::new(ApiErrorCode::Unauthenticated, message),
            PostError::Validation { .. } => Self::new(ApiErrorCode::Validation, message),
            PostError::NotFound(_) => Self::new(ApiErrorCode::NotFound, message),
            PostError::Forbidden(_) => Self::new(ApiErrorCode::Forbidden, "Forbidden"),
            PostError::Store(e) => Self::internal(e),
        }
    }
}
