//! 骨折検出APIクライアント
//!
//! 画像1枚を multipart の `image` フィールドで POST し、
//! `DetectionResponse` を受け取る。パースは純関数に分けてある。

use crate::error::{FractureAssistError, Result};
use crate::intake::FilePreview;
use fracture_assist_common::DetectionResponse;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 検出処理の差し替え点（テストでは固定応答を返す実装を使う）
#[allow(async_fn_in_trait)]
pub trait Detector {
    async fn detect(&self, file: &FilePreview) -> Result<DetectionResponse>;
}

// =============================================================================
// HTTP
// =============================================================================

pub struct HttpDetector {
    http: reqwest::Client,
    api_url: String,
}

impl HttpDetector {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| FractureAssistError::Config(e.to_string()))?;
        Ok(Self {
            http,
            api_url: api_url.into(),
        })
    }
}

impl Detector for HttpDetector {
    async fn detect(&self, file: &FilePreview) -> Result<DetectionResponse> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)
            .map_err(|e| FractureAssistError::UploadTransport(e.to_string()))?;
        let form = Form::new().part("image", part);

        tracing::debug!(url = %self.api_url, file = %file.file_name, bytes = file.size, "検出APIへ送信");

        let response = self
            .http
            .post(&self.api_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| FractureAssistError::UploadTransport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FractureAssistError::UploadTransport(e.to_string()))?;

        if !status.is_success() {
            let message = extract_error_message(&text).unwrap_or_else(|| status.to_string());
            return Err(FractureAssistError::UploadStatus {
                status: status.as_u16(),
                message,
            });
        }

        parse_response(&text)
    }
}

// =============================================================================
// PARSING
// =============================================================================

pub fn parse_response(json: &str) -> Result<DetectionResponse> {
    serde_json::from_str(json).map_err(|e| FractureAssistError::ApiParse(e.to_string()))
}

/// エラー本文から表示用メッセージを取り出す（message → error → detail の順）
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .filter_map(|key| value.get(*key))
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            serde_json::Value::Object(inner) => inner
                .get("message")
                .and_then(|m| m.as_str())
                .map(|s| s.trim().to_string()),
            _ => None,
        })
        .find(|s| !s.is_empty())
}
