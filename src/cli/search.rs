use std::convert::Infallible;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;

use crate::cli::SubCommandExtend;
use crate::config::{MatchOptions, Opts, OrbOptions};
use crate::db::{ItemDb, SearchScope};
use crate::image::{ImageFormat, to_data_uri};
use crate::matcher::{Matcher, SearchOutcome};
use crate::orb::FeatureExtractor;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub orb: OrbOptions,
    #[command(flatten)]
    pub matching: MatchOptions,
    /// 被搜索的图片路径
    pub image: PathBuf,
    /// 搜索范围
    #[arg(short = 't', long, value_enum, default_value_t = SearchScope::Both)]
    pub search_type: SearchScope,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let bytes = tokio::fs::read(&self.image)
            .await
            .with_context(|| format!("无法读取图片: {}", self.image.display()))?;
        let format = ImageFormat::from_path(&self.image).unwrap_or(ImageFormat::Png);
        let uri = to_data_uri(&bytes, format);

        let db = ItemDb::open(&opts.database).await?;
        let matcher =
            Matcher::new(db, FeatureExtractor::new(self.orb.clone()), self.matching.clone());

        let outcome = matcher.search(&uri, self.search_type).await?;

        print_result(&outcome, self)
    }
}

fn print_result(outcome: &SearchOutcome, opts: &SearchCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            let value = json!({
                "success": outcome.is_success(),
                "message": outcome.message(),
                "items": outcome.results(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?)
        }
        OutputFormat::Table => {
            if !outcome.is_success() {
                eprintln!("{}", outcome.message());
            }
            for result in outcome.results() {
                println!("{:.2}\t{} ({})", result.score, result.item.title, result.item.id);
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone)]
pub enum OutputFormat {
    Json,
    Table,
}

impl FromStr for OutputFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            _ => Ok(Self::Table),
        }
    }
}
