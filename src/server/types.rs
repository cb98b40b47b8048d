use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::Item;
use crate::matcher::{MatchResult, SearchOutcome};

/// 视觉搜索请求
#[derive(Debug, Deserialize, ToSchema)]
pub struct VisualSearchRequest {
    /// data URI 或者 base64 编码的图片
    #[serde(rename = "imageBase64", default)]
    pub image_base64: String,
    /// 搜索范围：lost、found 或 both，默认为 both
    #[serde(rename = "searchType")]
    pub search_type: Option<String>,
}

/// 带相似度的物品
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: Item,
    /// 相似度，0 ~ 100
    pub similarity_score: f32,
}

impl From<MatchResult> for ScoredItem {
    fn from(result: MatchResult) -> Self {
        Self { item: result.item, similarity_score: result.score }
    }
}

/// 视觉搜索响应
#[derive(Debug, Serialize, ToSchema)]
pub struct VisualSearchResponse {
    /// 查询图片没有特征或者没有候选物品时为 false
    pub success: bool,
    pub message: String,
    /// 按相似度从高到低排列
    pub items: Vec<ScoredItem>,
}

impl From<SearchOutcome> for VisualSearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        Self {
            success: outcome.is_success(),
            message: outcome.message(),
            items: outcome.into_results().into_iter().map(ScoredItem::from).collect(),
        }
    }
}

/// 错误响应
#[derive(Debug, Serialize, ToSchema)]
#[allow(unused)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// 健康检查响应
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}
