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
use thiserror::Error;

use crate::application::use_cases::crawl_use_case::CrawlUseCaseError;
use crate::domain::repositories::tender_repository::RepositoryError;
use crate::utils::errors::CrawlError;

/// 请求参数错误
#[derive(Error, Debug)]
#[error("{0}")]
pub struct BadRequest(pub String);

/// 应用错误类型
///
/// 封装所有可能的应用层错误，响应体统一为 `{success: false, message}`
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(BadRequest(message.into()).into())
    }

    fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<BadRequest>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        if let Some(e) = self.0.downcast_ref::<RepositoryError>() {
            return match e {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        if let Some(e) = self.0.downcast_ref::<CrawlUseCaseError>() {
            return match e {
                CrawlUseCaseError::ValidationError(_) => StatusCode::BAD_REQUEST,
                CrawlUseCaseError::Crawl(e) => crawl_status(e),
            };
        }
        if let Some(e) = self.0.downcast_ref::<CrawlError>() {
            return crawl_status(e);
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn crawl_status(error: &CrawlError) -> StatusCode {
    if error.is_user_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "success": false, "message": self.0.to_string() }));
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
