use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::RepositoryError;

/// 物品类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// 丢失物品
    Lost,
    /// 拾到物品
    Found,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::Found => "found",
        }
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lost" => Ok(Self::Lost),
            "found" => Ok(Self::Found),
            _ => Err(format!("invalid item kind: {s}")),
        }
    }
}

/// 物品状态，物品不会被真正删除，只会切换状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Active,
    Resolved,
    Removed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Resolved => "resolved",
            Self::Removed => "removed",
        }
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "resolved" => Ok(Self::Resolved),
            "removed" => Ok(Self::Removed),
            _ => Err(format!("invalid item status: {s}")),
        }
    }
}

/// 搜索范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Lost,
    Found,
    #[default]
    Both,
}

impl SearchScope {
    /// 该范围是否包含指定类型的物品
    pub fn contains(&self, kind: ItemKind) -> bool {
        match self {
            Self::Lost => kind == ItemKind::Lost,
            Self::Found => kind == ItemKind::Found,
            Self::Both => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::Found => "found",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lost" => Ok(Self::Lost),
            "found" => Ok(Self::Found),
            "both" => Ok(Self::Both),
            _ => Err(format!("invalid search type: {s}, expected one of lost, found, both")),
        }
    }
}

/// 物品记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    /// 丢失或拾到的日期，保留用户填写的原文
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub status: ItemStatus,
    /// data URI 或 base64 编码的图片
    #[serde(default)]
    pub image: Option<String>,
    /// 联系方式
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// 是否带有非空图片
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    /// 是否可以作为视觉搜索的候选
    pub fn is_candidate(&self, scope: SearchScope) -> bool {
        self.status == ItemStatus::Active && scope.contains(self.kind) && self.has_image()
    }
}

/// 数据库中的原始物品记录
#[derive(Debug, sqlx::FromRow)]
pub struct ItemRecord {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub date: String,
    pub status: String,
    pub image: Option<String>,
    pub contact: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ItemRecord> for Item {
    type Error = RepositoryError;

    fn try_from(record: ItemRecord) -> Result<Self, Self::Error> {
        let corrupted =
            |reason: String| RepositoryError::Corrupted { id: record.id.clone(), reason };
        let kind = record.kind.parse().map_err(corrupted)?;
        let status = record.status.parse().map_err(corrupted)?;
        Ok(Item {
            id: record.id,
            kind,
            title: record.title,
            category: record.category,
            description: record.description,
            location: record.location,
            date: record.date,
            status,
            image: record.image,
            contact: record.contact,
            author_name: record.author_name,
            created_at: record.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn item(kind: ItemKind, status: ItemStatus, image: Option<&str>) -> Item {
        Item {
            id: "1".to_string(),
            kind,
            title: "Brown wallet".to_string(),
            category: "Wallet".to_string(),
            description: String::new(),
            location: "Library".to_string(),
            date: "2025-03-01".to_string(),
            status,
            image: image.map(str::to_string),
            contact: String::new(),
            author_name: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!("lost".parse::<SearchScope>().unwrap(), SearchScope::Lost);
        assert_eq!("FOUND".parse::<SearchScope>().unwrap(), SearchScope::Found);
        assert_eq!("both".parse::<SearchScope>().unwrap(), SearchScope::Both);
        assert!("invalid".parse::<SearchScope>().is_err());
        assert!("".parse::<SearchScope>().is_err());
    }

    #[test]
    fn test_is_candidate() {
        use ItemKind::*;
        use ItemStatus::*;

        assert!(item(Lost, Active, Some("QUJD")).is_candidate(SearchScope::Lost));
        assert!(item(Lost, Active, Some("QUJD")).is_candidate(SearchScope::Both));
        assert!(!item(Lost, Active, Some("QUJD")).is_candidate(SearchScope::Found));
        assert!(!item(Found, Resolved, Some("QUJD")).is_candidate(SearchScope::Both));
        assert!(!item(Found, Active, None).is_candidate(SearchScope::Both));
        assert!(!item(Found, Active, Some("  ")).is_candidate(SearchScope::Both));
    }

    #[test]
    fn test_item_json_shape() {
        let value = serde_json::to_value(item(ItemKind::Found, ItemStatus::Active, None)).unwrap();
        assert_eq!(value["type"], json!("found"));
        assert_eq!(value["status"], json!("active"));
        assert_eq!(value["authorName"], json!(""));
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_record_with_bad_kind() {
        let record = ItemRecord {
            id: "x".to_string(),
            kind: "misplaced".to_string(),
            title: String::new(),
            category: String::new(),
            description: String::new(),
            location: String::new(),
            date: String::new(),
            status: "active".to_string(),
            image: None,
            contact: String::new(),
            author_name: String::new(),
            created_at: Utc::now(),
        };
        assert!(matches!(Item::try_from(record), Err(RepositoryError::Corrupted { .. })));
    }
}
