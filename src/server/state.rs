use std::sync::Arc;

use crate::config::{MatchOptions, OrbOptions};
use crate::matcher::Matcher;
use crate::orb::FeatureExtractor;
use crate::repository::ItemStore;

/// 应用状态
pub struct AppState {
    /// 视觉搜索器，持有物品仓库
    pub matcher: Matcher<ItemStore>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(store: ItemStore, orb: OrbOptions, matching: MatchOptions) -> Arc<Self> {
        Arc::new(AppState { matcher: Matcher::new(store, FeatureExtractor::new(orb), matching) })
    }
}
