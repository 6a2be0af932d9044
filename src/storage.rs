//! ファイルに永続化するキーバリューストレージ
//!
//! 全エントリを1つのJSONオブジェクトとして保存する。
//! 書き込みは一時ファイル経由の rename で置き換え、途中状態を残さない。

use fracture_assist_common::{Error, Result, StorageProvider};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// 既存ファイルを読み込む。壊れていれば警告して空から始める
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| Error::Persistence(format!("{}: {}", path.display(), e)))?;
            match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ストレージファイルが壊れているため空で開始");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let persist_err = |e: std::io::Error| Error::Persistence(format!("{}: {}", self.path.display(), e));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(persist_err)?;
            }
        }

        let content = serde_json::to_string(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content).map_err(persist_err)?;
        std::fs::rename(&tmp_path, &self.path).map_err(persist_err)?;

        tracing::debug!(path = %self.path.display(), keys = entries.len(), "ストレージ保存");
        Ok(())
    }
}

impl StorageProvider for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut next = self.entries.clone();
        next.remove(key);
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }
}
