use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use log::info;

use super::error::{BadRequest, Result};
use super::state::AppState;
use super::types::*;
use crate::db::SearchScope;

/// 使用图片搜索相似物品
#[utoipa::path(
    post,
    path = "/api/search/visual",
    request_body = VisualSearchRequest,
    responses(
        (status = 200, body = VisualSearchResponse),
        (status = 400, body = ErrorResponse),
        (status = 504, body = ErrorResponse),
    )
)]
pub async fn visual_search_handler(
    State(state): State<Arc<AppState>>,
    Json(data): Json<VisualSearchRequest>,
) -> Result<Json<VisualSearchResponse>> {
    let scope = match data.search_type.as_deref() {
        None => SearchScope::default(),
        Some(s) => s.parse::<SearchScope>().map_err(BadRequest)?,
    };

    info!("正在搜索上传图片，范围 {}", scope);

    let outcome = state.matcher.search(&data.image_base64, scope).await?;
    Ok(Json(VisualSearchResponse::from(outcome)))
}

/// 健康检查
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, body = HealthResponse),
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy".to_string() })
}
