use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::db::{Item, ItemDb, SearchScope};
use crate::error::RepositoryError;

/// 视觉搜索读取候选物品的接口
pub trait ItemRepository: Send + Sync {
    /// 返回指定范围内状态为 active 且带有图片的物品，最多 `limit` 个
    ///
    /// 没有匹配的物品时返回空列表，只有存储不可用时才返回错误。
    fn find_candidates(
        &self,
        scope: SearchScope,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Item>, RepositoryError>> + Send;
}

/// 内存中的物品仓库，按插入顺序返回候选
#[derive(Default)]
pub struct MemoryItemStore {
    items: Vec<Item>,
    unavailable: AtomicBool,
}

impl MemoryItemStore {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items, unavailable: AtomicBool::new(false) }
    }

    /// 模拟存储不可用
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

impl ItemRepository for MemoryItemStore {
    async fn find_candidates(
        &self,
        scope: SearchScope,
        limit: usize,
    ) -> Result<Vec<Item>, RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("memory store is offline".to_string()));
        }
        Ok(self.items.iter().filter(|item| item.is_candidate(scope)).take(limit).cloned().collect())
    }
}

/// 服务端使用的物品仓库
pub enum ItemStore {
    Sqlite(ItemDb),
    Memory(MemoryItemStore),
}

impl ItemRepository for ItemStore {
    async fn find_candidates(
        &self,
        scope: SearchScope,
        limit: usize,
    ) -> Result<Vec<Item>, RepositoryError> {
        match self {
            Self::Sqlite(db) => db.find_candidates(scope, limit).await,
            Self::Memory(store) => store.find_candidates(scope, limit).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::db::{ItemKind, ItemStatus};

    fn item(id: &str, kind: ItemKind, status: ItemStatus, image: Option<&str>) -> Item {
        Item {
            id: id.to_string(),
            kind,
            title: id.to_string(),
            category: String::new(),
            description: String::new(),
            location: String::new(),
            date: String::new(),
            status,
            image: image.map(str::to_string),
            contact: String::new(),
            author_name: String::new(),
            created_at: Utc::now(),
        }
    }

    fn store() -> MemoryItemStore {
        use ItemKind::*;
        use ItemStatus::*;

        MemoryItemStore::new(vec![
            item("a", Lost, Active, Some("QUJD")),
            item("b", Found, Active, Some("QUJD")),
            item("c", Found, Active, None),
            item("d", Lost, Resolved, Some("QUJD")),
            item("e", Found, Active, Some("QUJD")),
            item("f", Lost, Active, Some("")),
        ])
    }

    async fn ids(store: &impl ItemRepository, scope: SearchScope, limit: usize) -> Vec<String> {
        store.find_candidates(scope, limit).await.unwrap().into_iter().map(|i| i.id).collect()
    }

    #[tokio::test]
    async fn test_memory_store_filters_in_order() {
        let store = store();
        assert_eq!(ids(&store, SearchScope::Both, 100).await, vec!["a", "b", "e"]);
        assert_eq!(ids(&store, SearchScope::Lost, 100).await, vec!["a"]);
        assert_eq!(ids(&store, SearchScope::Found, 100).await, vec!["b", "e"]);
        assert_eq!(ids(&store, SearchScope::Both, 2).await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_memory_store_unavailable() {
        let store = store();
        store.set_unavailable(true);
        assert!(store.find_candidates(SearchScope::Both, 10).await.is_err());
        store.set_unavailable(false);
        assert!(store.find_candidates(SearchScope::Both, 10).await.is_ok());
    }

    #[tokio::test]
    async fn test_item_store_dispatch() {
        let store = ItemStore::Memory(store());
        assert_eq!(ids(&store, SearchScope::Found, 10).await, vec!["b", "e"]);
    }
}
