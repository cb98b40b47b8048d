use sqlx::{Executor, Result, Sqlite, SqlitePool};

use super::{Item, ItemRecord, SearchScope};

/// 添加物品记录
pub async fn add_item<'c, E>(executor: E, item: &Item) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO item (
            id, kind, title, category, description, location,
            date, status, image, contact, author_name, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(item.kind.as_str())
    .bind(&item.title)
    .bind(&item.category)
    .bind(&item.description)
    .bind(&item.location)
    .bind(&item.date)
    .bind(item.status.as_str())
    .bind(&item.image)
    .bind(&item.contact)
    .bind(&item.author_name)
    .bind(item.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// 查询视觉搜索的候选物品：状态为 active，带有非空图片
///
/// 按创建时间从新到旧排列，创建时间相同时按 ID 升序。
pub async fn find_candidates(
    executor: &SqlitePool,
    scope: SearchScope,
    limit: usize,
) -> Result<Vec<ItemRecord>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let query = match scope {
        SearchScope::Both => sqlx::query_as::<_, ItemRecord>(
            r#"
            SELECT * FROM item
            WHERE status = 'active' AND image IS NOT NULL AND TRIM(image) != ''
            ORDER BY julianday(created_at) DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(limit),
        SearchScope::Lost | SearchScope::Found => sqlx::query_as::<_, ItemRecord>(
            r#"
            SELECT * FROM item
            WHERE status = 'active' AND image IS NOT NULL AND TRIM(image) != '' AND kind = ?
            ORDER BY julianday(created_at) DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(scope.as_str())
        .bind(limit),
    };

    query.fetch_all(executor).await
}

/// 统计物品数量
pub async fn count_items(executor: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM item").fetch_one(executor).await
}

/// 检查物品 ID 是否已存在
pub async fn item_exists(executor: &SqlitePool, id: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM item WHERE id = ?")
            .bind(id)
            .fetch_one(executor)
            .await?;
    Ok(count > 0)
}
