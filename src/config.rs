use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::cli::*;

static DEFAULT_DATABASE: LazyLock<String> = LazyLock::new(|| {
    match ProjectDirs::from("", "umt", "lostfound") {
        Some(dirs) => dirs.data_dir().join("lostfound.db").to_string_lossy().into_owned(),
        None => "lostfound.db".to_string(),
    }
});

fn default_database() -> &'static str {
    DEFAULT_DATABASE.as_str()
}

#[derive(Parser, Debug, Clone)]
pub struct OrbOptions {
    /// ORB 特征点最大保留数量
    #[arg(short = 'n', value_name = "N", long, default_value_t = 500)]
    pub orb_nfeatures: u32,
    /// ORB 特征金字塔缩放因子
    #[arg(long, value_name = "SCALE", default_value_t = 1.2)]
    pub orb_scale_factor: f32,
    /// ORB 特征金字塔层数
    #[arg(long, value_name = "N", default_value_t = 8)]
    pub orb_nlevels: u32,
    /// ORB FAST 角点检测器阈值
    #[arg(long, value_name = "THRESHOLD", default_value_t = 20)]
    pub orb_fast_threshold: u32,
    /// ORB 描述符的采样块大小，同时作为边缘阈值
    #[arg(long, value_name = "SIZE", default_value_t = 31)]
    pub orb_patch_size: u32,
    /// 提取特征前图片统一缩放到的尺寸
    #[arg(
        short = 'S',
        long,
        value_name = "WIDTHxHEIGHT",
        value_parser = parse_size,
        default_value = "300x300"
    )]
    pub canonical_size: (i32, i32),
    /// 最少特征点，低于该值的图片视为没有可用特征
    #[arg(short, long, value_name = "N", default_value_t = 10)]
    pub min_keypoints: u32,
}

impl Default for OrbOptions {
    fn default() -> Self {
        Self {
            orb_nfeatures: 500,
            orb_scale_factor: 1.2,
            orb_nlevels: 8,
            orb_fast_threshold: 20,
            orb_patch_size: 31,
            canonical_size: (300, 300),
            min_keypoints: 10,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct MatchOptions {
    /// 最低相似度，范围从 0 到 100，低于该值的结果会被丢弃
    #[arg(long, value_name = "SCORE", default_value_t = 20.0)]
    pub min_score: f32,
    /// 返回的结果数量
    #[arg(long, value_name = "COUNT", default_value_t = 15)]
    pub limit: usize,
    /// 单次搜索最多比较的物品数量
    #[arg(long, value_name = "COUNT", default_value_t = 1000)]
    pub max_candidates: usize,
    /// 单次搜索的超时时间，单位为秒，可以是小数
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds, default_value = "30")]
    pub deadline: Duration,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            min_score: 20.0,
            limit: 15,
            max_candidates: 1000,
            deadline: Duration::from_secs(30),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "lostfound", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// 物品数据库文件路径
    #[arg(short, long, value_name = "FILE", default_value = default_database())]
    pub database: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 启动 HTTP 搜索服务
    Server(ServerCommand),
    /// 使用本地图片搜索相似物品
    Search(SearchCommand),
    /// 从 JSON 文件导入物品记录
    Import(ImportCommand),
}

fn parse_size(s: &str) -> anyhow::Result<(i32, i32)> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!("无效的尺寸: {}", s));
    }
    let size: (i32, i32) = (parts[0].parse()?, parts[1].parse()?);
    if size.0 <= 0 || size.1 <= 0 {
        return Err(anyhow::anyhow!("无效的尺寸: {}", s));
    }
    Ok(size)
}

fn parse_seconds(s: &str) -> anyhow::Result<Duration> {
    let secs: f64 = s.parse()?;
    if !secs.is_finite() || secs <= 0. {
        return Err(anyhow::anyhow!("无效的时间: {}", s));
    }
    Ok(Duration::from_secs_f64(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("300x300").unwrap(), (300, 300));
        assert_eq!(parse_size("640x480").unwrap(), (640, 480));
        assert!(parse_size("300").is_err());
        assert!(parse_size("0x300").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn test_defaults_match_cli() {
        let opts = Opts::parse_from(["lostfound", "search", "query.jpg"]);
        let SubCommand::Search(cmd) = opts.subcmd else { panic!("expected search") };
        let default_orb = OrbOptions::default();
        let default_match = MatchOptions::default();
        assert_eq!(cmd.orb.orb_nfeatures, default_orb.orb_nfeatures);
        assert_eq!(cmd.orb.canonical_size, default_orb.canonical_size);
        assert_eq!(cmd.orb.min_keypoints, default_orb.min_keypoints);
        assert_eq!(cmd.matching.min_score, default_match.min_score);
        assert_eq!(cmd.matching.limit, default_match.limit);
        assert_eq!(cmd.matching.deadline, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_seconds("0.25").unwrap(), Duration::from_millis(250));
        assert!(parse_seconds("0").is_err());
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("inf").is_err());
        assert!(parse_seconds("soon").is_err());
    }
}
