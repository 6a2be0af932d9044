//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ストレージの読み書き失敗
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Storage quota exceeded: {needed} bytes needed, limit {limit} bytes")]
    QuotaExceeded { needed: usize, limit: usize },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::Io(io_error);
        let display = format!("{}", error);
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_error_display_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = Error::Json(json_error);
        assert!(format!("{}", error).contains("JSON error"));
    }

    #[test]
    fn test_error_display_quota() {
        let error = Error::QuotaExceeded { needed: 2048, limit: 1024 };
        assert_eq!(
            format!("{}", error),
            "Storage quota exceeded: 2048 bytes needed, limit 1024 bytes"
        );
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Persistence("書き込み失敗".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("Persistence"));
        assert!(debug.contains("書き込み失敗"));
    }
}
