use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde_json::json;
use thiserror::Error;

use crate::error::SearchError;

/// 请求参数不合法
#[derive(Error, Debug)]
#[error("{0}")]
pub struct BadRequest(pub String);

/// API错误类型
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        if self.0.is::<BadRequest>() {
            return StatusCode::BAD_REQUEST;
        }
        match self.0.downcast_ref::<SearchError>() {
            Some(SearchError::InvalidImageFormat(_)) => StatusCode::BAD_REQUEST,
            Some(SearchError::DeadlineExceeded(_)) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("请求处理失败: {:#}", self.0);
        }
        let body = json!({
            "success": false,
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
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

pub type Result<T, E = AppError> = std::result::Result<T, E>;
