use std::time::Duration;

use thiserror::Error;

/// 视觉搜索过程中可能出现的错误
#[derive(Error, Debug)]
pub enum SearchError {
    /// 输入不是合法的 base64，或者无法解码为图片
    #[error("invalid image format: {0}")]
    InvalidImageFormat(String),

    /// 两个描述符长度不一致，说明特征提取配置发生了变化
    #[error("descriptor length mismatch: {left} != {right}")]
    DescriptorLengthMismatch { left: usize, right: usize },

    #[error("item repository unavailable")]
    RepositoryUnavailable(#[source] RepositoryError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("search exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("search task cancelled")]
    Cancelled,
}

/// 特征提取失败
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("opencv: {0}")]
    OpenCv(#[from] opencv::Error),

    #[error("unexpected descriptor matrix: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// 物品仓库读取失败
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupted item record {id}: {reason}")]
    Corrupted { id: String, reason: String },

    #[error("{0}")]
    Unavailable(String),
}
