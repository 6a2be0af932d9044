//! 検出結果・履歴の型定義
//!
//! CLIと他のフロントエンドで共有される型:
//! - Detection: 検出APIが返す1件の骨折領域
//! - DetectionResponse: 検出APIのレスポンス
//! - HistoryItem: 医師が確認して保存した解析記録

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 検出APIが返す1件の検出結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_id: i64,
    pub class_name: String,
    /// 0.0〜1.0
    pub confidence: f64,
    /// [x1, y1, x2, y2]（ピクセル座標）
    pub bbox: [f64; 4],
}

impl Detection {
    /// "fracture 87.0%" 形式のラベル
    pub fn label(&self) -> String {
        format!("{} {}%", self.class_name, self.confidence_percent())
    }

    /// 信頼度を小数1桁のパーセント表記にする
    pub fn confidence_percent(&self) -> String {
        format!("{:.1}", self.confidence * 100.0)
    }
}

/// 検出APIのレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<Detection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionResponse {
    pub fn detections(&self) -> &[Detection] {
        self.detections.as_deref().unwrap_or(&[])
    }

    pub fn has_detections(&self) -> bool {
        !self.detections().is_empty()
    }
}

/// 解析ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Failed => "failed",
        }
    }
}

/// 重症度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl Severity {
    /// 表示ラベル
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "Leve",
            Severity::Medium => "Moderada",
            Severity::High => "Grave",
        }
    }

    /// 表示色（RGB）
    pub fn color(&self) -> [u8; 3] {
        match self {
            Severity::Low => [0x48, 0xbb, 0x78],
            Severity::Medium => [0xed, 0x89, 0x36],
            Severity::High => [0xf5, 0x65, 0x65],
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" | "leve" => Ok(Severity::Low),
            "medium" | "moderada" => Ok(Severity::Medium),
            "high" | "grave" => Ok(Severity::High),
            _ => Err(format!("Unknown severity: {}. Use low, medium, or high", s)),
        }
    }
}

/// 保存される解析記録
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub body_region: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fracture_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fracture_location: Option<String>,

    /// data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(with = "timestamp_millis")]
    pub timestamp: DateTime<Utc>,

    pub status: Status,

    /// 0〜100（平均信頼度を四捨五入）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<Detection>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl HistoryItem {
    pub fn detections(&self) -> &[Detection] {
        self.detections.as_deref().unwrap_or(&[])
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// ミリ秒精度に切り詰めた現在時刻
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// タイムスタンプを "2025-01-02T03:04:05.678Z" 形式で読み書きする
pub mod timestamp_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
