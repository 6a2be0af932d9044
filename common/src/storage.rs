//! キーバリューストレージの抽象化
//!
//! ブラウザの localStorage 相当のインターフェース。
//! CLIではファイル、テストではメモリをバックエンドに使う。

use crate::error::{Error, Result};
use std::collections::HashMap;

/// 文字列キー・文字列値のストレージ
pub trait StorageProvider {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// 存在しないキーの削除はエラーにしない
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

/// メモリ上のストレージ（容量制限つき）
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全エントリ合計の上限バイト数を指定
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl StorageProvider for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(limit) = self.quota_bytes {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > limit {
                return Err(Error::QuotaExceeded { needed, limit });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

impl<S: StorageProvider + ?Sized> StorageProvider for &mut S {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k").unwrap(), None);

        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));

        storage.remove_item("k").unwrap();
        assert!(storage.is_empty());

        // 2回目の削除もエラーにならない
        storage.remove_item("k").unwrap();
    }

    #[test]
    fn test_quota_counts_replacement_not_sum() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.set_item("k", "12345").unwrap();
        // 同じキーの上書きは古い値を差し引いて判定
        storage.set_item("k", "123456789").unwrap();

        let err = storage.set_item("k", "1234567890").unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { needed: 11, limit: 10 }));
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("123456789"));
    }
}
