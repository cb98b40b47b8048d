pub mod api;
mod error;
mod state;
pub mod types;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use self::error::*;
pub use self::state::*;

#[derive(OpenApi)]
#[openapi(
    paths(api::visual_search_handler, api::health_handler),
    components(schemas(
        types::VisualSearchRequest,
        types::VisualSearchResponse,
        types::ScoredItem,
        types::ErrorResponse,
        types::HealthResponse,
    ))
)]
pub struct ApiDoc;

/// 构建API服务器
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/search/visual", post(api::visual_search_handler))
        .route("/api/health", get(api::health_handler))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::disable())
        // 上传限制：20M，base64 编码后的图片会比原图大三分之一
        .layer(RequestBodyLimitLayer::new(1024 * 1024 * 20))
        .with_state(state)
}
