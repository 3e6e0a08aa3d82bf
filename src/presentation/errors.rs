// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::application::use_cases::quote_workflow::WorkflowError;
use crate::application::use_cases::scrape_use_case::ScrapeUseCaseError;
use crate::domain::repositories::RepositoryError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，按具体错误类型映射状态码
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<WorkflowError>() {
            return match err {
                WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
                WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
                WorkflowError::InvalidTransition(_) => StatusCode::CONFLICT,
                WorkflowError::OfferMismatch { .. } | WorkflowError::OfferNotApprovable(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                WorkflowError::Repository(e) => repository_status(e),
                WorkflowError::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }

        if let Some(err) = self.0.downcast_ref::<ScrapeUseCaseError>() {
            return match err {
                ScrapeUseCaseError::NotFound => StatusCode::NOT_FOUND,
                ScrapeUseCaseError::Repository(e) => repository_status(e),
                ScrapeUseCaseError::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }

        if let Some(err) = self.0.downcast_ref::<RepositoryError>() {
            return repository_status(err);
        }

        if self.0.downcast_ref::<validator::ValidationErrors>().is_some() {
            return StatusCode::BAD_REQUEST;
        }

        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) | RepositoryError::Duplicate(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::Corrupt(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = self.0.to_string();
        if status.is_server_error() {
            error!("Request failed: {:#}", self.0);
        }

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
