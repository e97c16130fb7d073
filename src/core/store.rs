//! Authoritative item store shared by the lifecycle manager and orchestrator.

use std::sync::Arc;
use tokio::sync::Mutex;
use crate::core::{ImageItem, ItemId};

/// Insertion-ordered collection of items.
///
/// Every mutation is addressed by [`ItemId`]; positions are never handed out,
/// so concurrent inserts and removals cannot redirect an update to the wrong
/// item.
#[derive(Clone, Default)]
pub struct ItemStore {
    items: Arc<Mutex<Vec<ImageItem>>>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, item: ImageItem) -> ItemId {
        let id = item.id();
        self.items.lock().await.push(item);
        id
    }

    pub async fn insert_many(&self, items: Vec<ImageItem>) -> Vec<ItemId> {
        let ids = items.iter().map(ImageItem::id).collect();
        self.items.lock().await.extend(items);
        ids
    }

    /// Removes an item regardless of its status.
    pub async fn remove(&self, id: &ItemId) -> Option<ImageItem> {
        let mut items = self.items.lock().await;
        let index = items.iter().position(|item| item.id() == *id)?;
        Some(items.remove(index))
    }

    pub async fn get(&self, id: &ItemId) -> Option<ImageItem> {
        self.items.lock().await.iter().find(|item| item.id() == *id).cloned()
    }

    /// Applies `f` to the item with `id`; `None` when it no longer exists.
    pub async fn update<R>(&self, id: &ItemId, f: impl FnOnce(&mut ImageItem) -> R) -> Option<R> {
        let mut items = self.items.lock().await;
        items.iter_mut().find(|item| item.id() == *id).map(f)
    }

    /// Copy of every item in insertion order
    pub async fn snapshot(&self) -> Vec<ImageItem> {
        self.items.lock().await.clone()
    }

    /// Applies `f` to every item matching `predicate` under a single lock,
    /// in insertion order.
    pub async fn update_where<R>(
        &self,
        predicate: impl Fn(&ImageItem) -> bool,
        mut f: impl FnMut(&mut ImageItem) -> R,
    ) -> Vec<R> {
        self.items
            .lock()
            .await
            .iter_mut()
            .filter(|item| predicate(item))
            .map(|item| f(item))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ItemStatus, SourceImage};

    fn item(tag: u8) -> ImageItem {
        ImageItem::new(SourceImage::new(vec![tag], "image/png"))
    }

    #[tokio::test]
    async fn keeps_insertion_order() {
        let store = ItemStore::new();
        let a = store.insert(item(1)).await;
        let rest = store.insert_many(vec![item(2), item(3)]).await;

        let order: Vec<_> = store.snapshot().await.iter().map(ImageItem::id).collect();
        assert_eq!(order, vec![a, rest[0], rest[1]]);
    }

    #[tokio::test]
    async fn update_targets_id_after_removal_shifts_positions() {
        let store = ItemStore::new();
        let a = store.insert(item(1)).await;
        let b = store.insert(item(2)).await;

        store.remove(&a).await.unwrap();
        store.update(&b, |item| item.begin_attempt()).await.unwrap();

        let b_item = store.get(&b).await.unwrap();
        assert_eq!(b_item.status(), ItemStatus::Processing);
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_item_is_none() {
        let store = ItemStore::new();
        let a = store.insert(item(1)).await;
        store.remove(&a).await;

        assert!(store.update(&a, |item| item.begin_attempt()).await.is_none());
        assert!(store.get(&a).await.is_none());
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn update_where_touches_only_matching_items() {
        let store = ItemStore::new();
        let a = store.insert(item(1)).await;
        let b = store.insert(item(2)).await;
        let c = store.insert(item(3)).await;
        store.update(&b, |item| item.begin_attempt()).await;

        let started = store
            .update_where(
                |item| item.status() == ItemStatus::Pending,
                |item| (item.id(), item.begin_attempt()),
            )
            .await;

        assert_eq!(started, vec![(a, 1), (c, 1)]);
        // b keeps its single attempt
        assert_eq!(store.update(&b, |item| item.begin_attempt()).await, Some(2));
    }
}
