//! 解析履歴ストア
//!
//! 新しい順に並んだ HistoryItem の唯一の保持者。
//! 変更のたびに全件をJSONでストレージへ書き込み、購読者へ通知する。
//!
//! 書き込み順序: 候補をシリアライズ → ストレージへ書き込み → 成功時のみメモリを更新して通知。
//! ストレージ書き込みに失敗した場合、メモリもストレージも変更されない。

use crate::error::Result;
use crate::storage::StorageProvider;
use crate::types::HistoryItem;

/// ストレージ上のキー
pub const HISTORY_STORAGE_KEY: &str = "detection_history";

pub type SubscriptionId = u64;

type Subscriber = Box<dyn FnMut(&[HistoryItem])>;

pub struct HistoryStore<S: StorageProvider> {
    storage: S,
    items: Vec<HistoryItem>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: SubscriptionId,
}

impl<S: StorageProvider> HistoryStore<S> {
    /// ストレージから履歴を復元
    ///
    /// 保存データが壊れている場合は警告を出して空の履歴で開始する。
    pub fn load(storage: S) -> Self {
        let items = match read_persisted(&storage) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, key = HISTORY_STORAGE_KEY, "履歴を読み込めません。空の履歴で開始します");
                Vec::new()
            }
        };
        tracing::debug!(count = items.len(), "履歴を復元");

        Self {
            storage,
            items,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// 先頭に追加（同じIDの既存項目は置き換え）
    pub fn add_detection(&mut self, item: HistoryItem) -> Result<()> {
        let next: Vec<&HistoryItem> = std::iter::once(&item)
            .chain(self.items.iter().filter(|existing| existing.id != item.id))
            .collect();
        persist_to(&mut self.storage, &next)?;

        self.items.retain(|existing| existing.id != item.id);
        self.items.insert(0, item);
        self.publish();
        Ok(())
    }

    /// IDで削除。該当なしの場合は何もせず false を返す
    pub fn delete_item(&mut self, id: &str) -> Result<bool> {
        if !self.items.iter().any(|item| item.id == id) {
            return Ok(false);
        }

        let next: Vec<&HistoryItem> = self.items.iter().filter(|item| item.id != id).collect();
        persist_to(&mut self.storage, &next)?;

        self.items.retain(|item| item.id != id);
        self.publish();
        Ok(true)
    }

    /// 全件削除し、ストレージのエントリも消す
    pub fn clear_all(&mut self) -> Result<()> {
        self.storage.remove_item(HISTORY_STORAGE_KEY)?;
        self.items.clear();
        self.publish();
        Ok(())
    }

    /// 現在の状態
    pub fn get_all(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn find(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 購読を登録し、現在の状態をすぐに1回通知する
    pub fn subscribe<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut(&[HistoryItem]) + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;

        callback(&self.items);
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // 登録順に同期配信
    fn publish(&mut self) {
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&self.items);
        }
    }
}

fn read_persisted<S: StorageProvider>(storage: &S) -> Result<Vec<HistoryItem>> {
    match storage.get_item(HISTORY_STORAGE_KEY)? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

// self.items を借用したまま書き込めるよう、ストレージだけを受け取る
fn persist_to<S: StorageProvider>(storage: &mut S, items: &[&HistoryItem]) -> Result<()> {
    let json = serde_json::to_string(items)?;
    storage.set_item(HISTORY_STORAGE_KEY, &json)
}
