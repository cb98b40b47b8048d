use std::path::Path;

use log::{debug, info};
use sqlx::{SqlitePool, sqlite::*};

pub mod crud;
pub mod model;

pub use model::*;

use crate::error::RepositoryError;
use crate::repository::ItemRepository;

pub type Database = SqlitePool;

pub async fn init_db(filename: impl AsRef<Path>) -> Result<Database, sqlx::Error> {
    let filename = filename.as_ref();
    info!("初始化数据库连接: {}", filename.display());

    if let Some(parent) = filename.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .filename(filename)
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;

    info!("检查数据库迁移");
    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

/// 基于 SQLite 的物品仓库
#[derive(Clone)]
pub struct ItemDb {
    pool: Database,
}

impl ItemDb {
    pub async fn open(filename: impl AsRef<Path>) -> Result<Self, sqlx::Error> {
        Ok(Self { pool: init_db(filename).await? })
    }

    /// 添加物品，返回 false 表示该 ID 已存在
    pub async fn add_item(&self, item: &Item) -> Result<bool, sqlx::Error> {
        if crud::item_exists(&self.pool, &item.id).await? {
            return Ok(false);
        }
        crud::add_item(&self.pool, item).await?;
        Ok(true)
    }

    /// 在一个事务中批量添加物品，返回实际添加的数量
    pub async fn add_items(&self, items: &[Item]) -> Result<usize, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut added = 0;
        for item in items {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM item WHERE id = ?")
                .bind(&item.id)
                .fetch_one(&mut *tx)
                .await?;
            if exists > 0 {
                debug!("跳过已存在的物品: {}", item.id);
                continue;
            }
            crud::add_item(&mut *tx, item).await?;
            added += 1;
        }
        tx.commit().await?;
        Ok(added)
    }

    pub async fn count_items(&self) -> Result<i64, sqlx::Error> {
        crud::count_items(&self.pool).await
    }
}

impl ItemRepository for ItemDb {
    async fn find_candidates(
        &self,
        scope: SearchScope,
        limit: usize,
    ) -> Result<Vec<Item>, RepositoryError> {
        let records = crud::find_candidates(&self.pool, scope, limit).await?;
        records.into_iter().map(Item::try_from).collect()
    }
}
