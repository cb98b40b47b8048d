//! 视觉搜索流程
//!
//! 解码查询图片并提取描述符，读取候选物品，逐个解码、提取并打分，
//! 过滤低分结果后稳定排序，只保留前 N 个。整个流程只读，不产生任何副作用。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, error, info};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tokio::task::spawn_blocking;
use tokio::time::timeout;

use crate::config::MatchOptions;
use crate::db::{Item, SearchScope};
use crate::error::{ExtractionError, SearchError};
use crate::image::decode_image;
use crate::metrics;
use crate::orb::{Descriptor, Extraction, FeatureExtractor};
use crate::repository::ItemRepository;
use crate::similarity::cosine_similarity;
use crate::utils::round2;

/// 一个匹配结果
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub item: Item,
    /// 相似度，0 ~ 100，保留两位小数
    pub score: f32,
    /// 从 1 开始的排名
    pub rank: usize,
}

/// 一次视觉搜索的结果
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// 查询图片中没有足够的特征点
    NoSignal,
    /// 没有可供比较的带图物品
    NoCandidates,
    /// 按相似度从高到低排列的结果，可能为空
    Ranked(Vec<MatchResult>),
}

impl SearchOutcome {
    /// 无特征和无候选两种情况不算成功
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ranked(_))
    }

    pub fn message(&self) -> String {
        match self {
            Self::NoSignal => "Could not extract features from query image".to_string(),
            Self::NoCandidates => "No items with images found to compare".to_string(),
            Self::Ranked(results) if results.len() == 1 => "Found 1 similar item".to_string(),
            Self::Ranked(results) => format!("Found {} similar items", results.len()),
        }
    }

    pub fn results(&self) -> &[MatchResult] {
        match self {
            Self::Ranked(results) => results,
            _ => &[],
        }
    }

    pub fn into_results(self) -> Vec<MatchResult> {
        match self {
            Self::Ranked(results) => results,
            _ => vec![],
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::NoSignal => "no_signal",
            Self::NoCandidates => "no_candidates",
            Self::Ranked(_) => "ranked",
        }
    }
}

/// 候选物品被跳过的原因
#[derive(Error, Debug)]
pub enum CandidateSkip {
    #[error("undecodable image: {0}")]
    Decode(SearchError),
    #[error("only {0} keypoints")]
    NoSignal(usize),
    #[error("extraction failed: {0}")]
    Extract(ExtractionError),
    #[error("search cancelled")]
    Cancelled,
}

impl CandidateSkip {
    fn reason(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::NoSignal(_) => "no_signal",
            Self::Extract(_) => "extract",
            Self::Cancelled => "cancelled",
        }
    }
}

/// 离开作用域时设置取消标记
///
/// 超时或者请求被丢弃后，仍在阻塞线程池中运行的提取任务据此停止处理剩余的候选。
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// 视觉搜索器
pub struct Matcher<R> {
    repository: R,
    extractor: FeatureExtractor,
    opts: MatchOptions,
}

impl<R: ItemRepository> Matcher<R> {
    pub fn new(repository: R, extractor: FeatureExtractor, opts: MatchOptions) -> Self {
        Self { repository, extractor, opts }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn options(&self) -> &MatchOptions {
        &self.opts
    }

    /// 使用传输编码的图片搜索相似物品
    pub async fn search(
        &self,
        image: &str,
        scope: SearchScope,
    ) -> Result<SearchOutcome, SearchError> {
        let start = Instant::now();
        let deadline = self.opts.deadline;
        let cancelled = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(cancelled.clone());

        let search = self.search_inner(image, scope, cancelled.clone());
        let result = match timeout(deadline, search).await {
            Ok(result) => result,
            Err(_) => {
                cancelled.store(true, Ordering::Relaxed);
                Err(SearchError::DeadlineExceeded(deadline))
            }
        };

        let elapsed = start.elapsed().as_secs_f32();
        metrics::inc_search_duration(scope.as_str(), elapsed);
        match &result {
            Ok(outcome) => {
                metrics::inc_search_count(scope.as_str(), outcome.label());
                if let Some(top) = outcome.results().first() {
                    metrics::inc_search_max_score(scope.as_str(), top.score);
                }
                info!(
                    "视觉搜索完成: 范围 {}, 结果 {}, 匹配 {} 个, 耗时 {:.2}ms",
                    scope,
                    outcome.label(),
                    outcome.results().len(),
                    elapsed * 1000.
                );
            }
            Err(e) => {
                metrics::inc_search_count(scope.as_str(), "error");
                info!("视觉搜索失败: 范围 {}, {}", scope, e);
            }
        }

        result
    }

    async fn search_inner(
        &self,
        image: &str,
        scope: SearchScope,
        cancelled: Arc<AtomicBool>,
    ) -> Result<SearchOutcome, SearchError> {
        let extractor = self.extractor.clone();
        let image = image.to_owned();
        let query = run_blocking(move || -> Result<_, SearchError> {
            let decoded = decode_image(&image)?;
            debug!("查询图片尺寸: {}x{}", decoded.width, decoded.height);
            Ok(extractor.extract(&decoded)?)
        })
        .await?;

        let query = match query {
            Extraction::Descriptor(des) => des,
            Extraction::InsufficientSignal(n) => {
                debug!("查询图片只检测到 {} 个特征点", n);
                return Ok(SearchOutcome::NoSignal);
            }
        };

        let candidates = self
            .repository
            .find_candidates(scope, self.opts.max_candidates)
            .await
            .map_err(SearchError::RepositoryUnavailable)?;
        let candidates: Vec<Item> = candidates.into_iter().filter(Item::has_image).collect();
        if candidates.is_empty() {
            return Ok(SearchOutcome::NoCandidates);
        }
        debug!("候选物品数量: {}", candidates.len());

        let extractor = self.extractor.clone();
        let opts = self.opts.clone();
        let results = run_blocking(move || {
            let extracted = extract_candidates(&extractor, candidates, &cancelled);
            if cancelled.load(Ordering::Relaxed) {
                debug!("搜索已取消，放弃剩余的候选");
                return Err(SearchError::Cancelled);
            }
            let mut usable = Vec::with_capacity(extracted.len());
            for (item, des) in extracted {
                match des {
                    Ok(des) => usable.push((item, des)),
                    Err(skip) => {
                        debug!("跳过物品 {}: {}", item.id, skip);
                        metrics::inc_skipped_candidates(skip.reason(), 1);
                    }
                }
            }
            rank(&query, usable, &opts)
        })
        .await?;

        Ok(SearchOutcome::Ranked(results))
    }
}

async fn run_blocking<F, T>(f: F) -> Result<T, SearchError>
where
    F: FnOnce() -> Result<T, SearchError> + Send + 'static,
    T: Send + 'static,
{
    match spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(SearchError::Cancelled),
    }
}

/// 解码并提取一个候选物品的描述符
pub fn candidate_descriptor(
    extractor: &FeatureExtractor,
    item: &Item,
) -> Result<Descriptor, CandidateSkip> {
    let image = item.image.as_deref().unwrap_or_default();
    let decoded = decode_image(image).map_err(CandidateSkip::Decode)?;
    match extractor.extract(&decoded).map_err(CandidateSkip::Extract)? {
        Extraction::Descriptor(des) => Ok(des),
        Extraction::InsufficientSignal(n) => Err(CandidateSkip::NoSignal(n)),
    }
}

/// 并行提取所有候选的描述符，结果顺序与输入一致
///
/// `cancelled` 被设置后，尚未处理的候选不再解码，直接标记为 [`CandidateSkip::Cancelled`]。
pub fn extract_candidates(
    extractor: &FeatureExtractor,
    candidates: Vec<Item>,
    cancelled: &AtomicBool,
) -> Vec<(Item, Result<Descriptor, CandidateSkip>)> {
    let descriptors: Vec<_> = candidates
        .par_iter()
        .map(|item| {
            if cancelled.load(Ordering::Relaxed) {
                return Err(CandidateSkip::Cancelled);
            }
            candidate_descriptor(extractor, item)
        })
        .collect();
    candidates.into_iter().zip(descriptors).collect()
}

/// 打分、过滤并排序
///
/// 相同分数的候选保持输入顺序。
pub fn rank(
    query: &Descriptor,
    candidates: Vec<(Item, Descriptor)>,
    opts: &MatchOptions,
) -> Result<Vec<MatchResult>, SearchError> {
    let mut scored = Vec::with_capacity(candidates.len());
    for (item, des) in candidates {
        let score = cosine_similarity(query, &des).inspect_err(|e| {
            error!("描述符配置不一致，请检查特征提取参数: {e}");
        })?;
        if score >= opts.min_score {
            scored.push((item, score));
        }
    }

    // sort_by 是稳定排序
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(opts.limit);

    Ok(scored
        .into_iter()
        .enumerate()
        .map(|(i, (item, score))| MatchResult { item, score: round2(score), rank: i + 1 })
        .collect())
}
