use crate::error::{FractureAssistError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://web-production-529f.up.railway.app/api/detect/";

/// 環境変数で検出APIのURLを上書きできる
pub const API_URL_ENV: &str = "FRACTURE_ASSIST_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub timeout_seconds: u64,
    /// 履歴ファイルの保存先（未指定ならデータディレクトリ）
    pub storage_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| FractureAssistError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("fracture-assist").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            timeout_seconds: 60,
            storage_path: None,
        }
    }

    pub fn get_api_url(&self) -> String {
        // 環境変数を優先
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url,
            _ => self.api_url.clone(),
        }
    }

    pub fn set_api_url(&mut self, url: String) -> Result<()> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FractureAssistError::Config(format!(
                "URLは http:// か https:// で始めてください: {}",
                url
            )));
        }
        self.api_url = url;
        self.save()
    }

    pub fn storage_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.storage_path {
            return Ok(path.clone());
        }
        let data = dirs::data_dir()
            .ok_or_else(|| FractureAssistError::Config("データディレクトリが見つかりません".into()))?;
        Ok(data.join("fracture-assist").join("storage.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_seconds, 60);
        assert!(config.storage_path.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"timeout_seconds": 5}"#).unwrap();
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_explicit_storage_path() {
        let config = Config {
            storage_path: Some(PathBuf::from("/tmp/fa/storage.json")),
            ..Config::default()
        };
        assert_eq!(config.storage_path().unwrap(), PathBuf::from("/tmp/fa/storage.json"));
    }
}
