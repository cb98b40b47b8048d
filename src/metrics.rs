use std::sync::LazyLock;

use prometheus::*;

static METRIC_SEARCH_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "lf_visual_search_count",
        "count of visual search requests",
        &["scope", "outcome"]
    )
    .unwrap()
});

static METRIC_SEARCH_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "lf_visual_search_duration",
        "duration of the visual search in seconds",
        &["scope"]
    )
    .unwrap()
});

static METRIC_SKIPPED_CANDIDATES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "lf_skipped_candidate_count",
        "count of candidates skipped during visual search",
        &["reason"]
    )
    .unwrap()
});

static METRIC_SEARCH_MAX_SCORE: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "lf_visual_search_max_score",
        "max score of the per-request visual search",
        &["scope"],
        (5..=100).step_by(5).map(|x| x as f64).collect()
    )
    .unwrap()
});

/// 记录一次搜索及其结果类型
pub fn inc_search_count(scope: &str, outcome: &str) {
    METRIC_SEARCH_COUNT.with_label_values(&[scope, outcome]).inc();
}

pub fn inc_search_duration(scope: &str, duration: f32) {
    METRIC_SEARCH_DURATION.with_label_values(&[scope]).observe(duration as f64);
}

/// 记录被跳过的候选数量，reason 为 `decode`、`no_signal` 或 `extract`
pub fn inc_skipped_candidates(reason: &str, count: usize) {
    if count > 0 {
        METRIC_SKIPPED_CANDIDATES.with_label_values(&[reason]).inc_by(count as u64);
    }
}

pub fn inc_search_max_score(scope: &str, score: f32) {
    METRIC_SEARCH_MAX_SCORE.with_label_values(&[scope]).observe(score as f64);
}
