use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use clap::Parser;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use serde::Deserialize;

use crate::cli::SubCommandExtend;
use crate::config::{Opts, OrbOptions};
use crate::db::{Item, ItemDb, ItemKind, ItemStatus};
use crate::image::{ImageFormat, decode_image, to_data_uri};
use crate::orb::{Extraction, FeatureExtractor};

#[derive(Parser, Debug, Clone)]
pub struct ImportCommand {
    #[command(flatten)]
    pub orb: OrbOptions,
    /// 物品列表文件，内容为 JSON 数组
    pub file: PathBuf,
}

/// 导入文件中的一条记录
///
/// `imagePath` 为相对于导入文件所在目录的路径，读取后以 data URI 的形式保存。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub date: String,
    pub status: Option<ItemStatus>,
    pub image: Option<String>,
    pub image_path: Option<PathBuf>,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub author_name: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl ImportRecord {
    /// 转换为物品记录，必要时读取图片文件
    pub fn into_item(self, base_dir: &Path) -> anyhow::Result<Item> {
        let image = match (&self.image, &self.image_path) {
            (Some(_), Some(_)) => {
                return Err(anyhow!("{}: image 和 imagePath 不能同时出现", self.title));
            }
            (_, Some(path)) => {
                let path = base_dir.join(path);
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("无法读取图片: {}", path.display()))?;
                let format = ImageFormat::from_path(&path)
                    .ok_or_else(|| anyhow!("无法识别的图片格式: {}", path.display()))?;
                Some(to_data_uri(&bytes, format))
            }
            (image, None) => image.clone().filter(|s| !s.trim().is_empty()),
        };

        Ok(Item {
            id: self.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            kind: self.kind,
            title: self.title,
            category: self.category,
            description: self.description,
            location: self.location,
            date: self.date,
            status: self.status.unwrap_or_default(),
            image,
            contact: self.contact,
            author_name: self.author_name,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

impl SubCommandExtend for ImportCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let content = tokio::fs::read_to_string(&self.file)
            .await
            .with_context(|| format!("无法读取文件: {}", self.file.display()))?;
        let records: Vec<ImportRecord> = serde_json::from_str(&content)?;
        let base_dir = self.file.parent().map(Path::to_path_buf).unwrap_or_default();

        let extractor = FeatureExtractor::new(self.orb.clone());
        let pb = ProgressBar::new(records.len() as u64).with_style(pb_style());

        let items = tokio::task::block_in_place(|| {
            records
                .into_par_iter()
                .progress_with(pb.clone())
                .map(|record| {
                    let item = record.into_item(&base_dir)?;
                    check_image(&extractor, &item);
                    Ok(item)
                })
                .collect::<anyhow::Result<Vec<_>>>()
        })?;
        pb.finish_and_clear();

        let db = ItemDb::open(&opts.database).await?;
        let added = db.add_items(&items).await?;
        info!("导入完成: 新增 {} 个物品，跳过 {} 个已存在的物品", added, items.len() - added);
        println!("imported {added} of {} items", items.len());

        Ok(())
    }
}

/// 图片无法用于视觉搜索时给出提示，但依然导入
fn check_image(extractor: &FeatureExtractor, item: &Item) {
    let Some(image) = item.image.as_deref() else {
        return;
    };
    let decoded = match decode_image(image) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!("{} ({}): 图片无法解码: {}", item.title, item.id, e);
            return;
        }
    };
    match extractor.extract(&decoded) {
        Ok(Extraction::InsufficientSignal(n)) => {
            warn!("{} ({}): 图片只有 {} 个特征点，无法参与视觉搜索", item.title, item.id, n);
        }
        Err(e) => warn!("{} ({}): 特征提取失败: {}", item.title, item.id, e),
        Ok(Extraction::Descriptor(_)) => {}
    }
}

fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template("{elapsed_precise} [{wide_bar}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
