//! API handlers organized by resource type.
//!
//! Error conversions shared by the resource modules live here.

mod activities;
mod todos;

pub use activities::*;
pub use todos::*;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;

use crate::application::activities::ActivityError;
use crate::application::repos::RepoError;
use crate::application::todos::TodoError;

use super::error::ApiError;

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match &err {
        RepoError::Duplicate { .. } => {
            ApiError::with_error(StatusCode::CONFLICT, "Duplicate record", &err)
        }
        RepoError::NotFound => ApiError::with_error(StatusCode::NOT_FOUND, "Not Found", &err),
        RepoError::InvalidInput { message } => {
            ApiError::with_error(StatusCode::BAD_REQUEST, message.clone(), &err)
        }
        RepoError::Integrity { .. } => ApiError::with_error(
            StatusCode::CONFLICT,
            "Integrity constraint violated",
            &err,
        ),
        RepoError::Timeout => {
            ApiError::with_error(StatusCode::SERVICE_UNAVAILABLE, "Database timeout", &err)
        }
        RepoError::Persistence(_) => ApiError::internal(&err),
    }
}

pub(crate) fn activity_to_api(err: ActivityError) -> ApiError {
    match err {
        ActivityError::Validation(message) => ApiError::bad_request(message),
        ActivityError::NotFound { .. } => ApiError::not_found(err.to_string()),
        ActivityError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn todo_to_api(err: TodoError) -> ApiError {
    match err {
        TodoError::Validation(message) => ApiError::bad_request(message),
        TodoError::NotFound { .. } | TodoError::ActivityNotFound { .. } => {
            ApiError::not_found(err.to_string())
        }
        TodoError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn json_rejection_to_api(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request(rejection.body_text())
}

pub(crate) fn path_rejection_to_api(rejection: PathRejection) -> ApiError {
    ApiError::bad_request(rejection.body_text())
}

pub(crate) fn query_rejection_to_api(rejection: QueryRejection) -> ApiError {
    ApiError::bad_request(rejection.body_text())
}
