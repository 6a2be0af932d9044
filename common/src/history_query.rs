//! 履歴一覧のフィルタ・ソート・表示フォーマット

use crate::types::{HistoryItem, Status};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone};

/// ステータス絞り込み
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Success,
    Failed,
}

impl StatusFilter {
    fn matches(&self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Success => status == Status::Success,
            StatusFilter::Failed => status == Status::Failed,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "success" => Ok(StatusFilter::Success),
            "failed" => Ok(StatusFilter::Failed),
            _ => Err(format!("Unknown status: {}. Use all, success, or failed", s)),
        }
    }
}

/// 並び順
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    DateDesc,
    DateAsc,
    /// 患者名順
    Title,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date-desc" => Ok(SortOrder::DateDesc),
            "date-asc" => Ok(SortOrder::DateAsc),
            "title" | "name" => Ok(SortOrder::Title),
            _ => Err(format!("Unknown sort: {}. Use date-desc, date-asc, or title", s)),
        }
    }
}

/// 一覧の絞り込み条件
#[derive(Clone, Debug, Default)]
pub struct HistoryQuery {
    pub status: StatusFilter,
    pub search: String,
    pub sort: SortOrder,
}

impl HistoryQuery {
    /// 検索語が患者名・患者ID・部位・骨折タイプのいずれかに含まれるか（大文字小文字無視）
    pub fn matches_search(&self, item: &HistoryItem) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        let fields = [
            Some(item.patient_name.as_str()),
            Some(item.patient_id.as_str()),
            Some(item.body_region.as_str()),
            item.fracture_type.as_deref(),
        ];
        fields
            .iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// 条件に合う項目を並び替えて返す
    pub fn apply<'a>(&self, items: &'a [HistoryItem]) -> Vec<&'a HistoryItem> {
        let mut filtered: Vec<&HistoryItem> = items
            .iter()
            .filter(|item| self.status.matches(item.status) && self.matches_search(item))
            .collect();

        match self.sort {
            SortOrder::DateDesc => filtered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            SortOrder::DateAsc => filtered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
            SortOrder::Title => filtered.sort_by(|a, b| {
                a.patient_name
                    .to_lowercase()
                    .cmp(&b.patient_name.to_lowercase())
            }),
        }

        filtered
    }
}

/// 成功/失敗の件数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

pub fn history_stats(items: &[HistoryItem]) -> HistoryStats {
    let success = items.iter().filter(|i| i.status == Status::Success).count();
    HistoryStats {
        total: items.len(),
        success,
        failed: items.len() - success,
    }
}

/// 日付表示: 今日なら "Hoje"、昨日なら "Ontem"、それ以外は dd/mm/yyyy
pub fn format_date<Tz: TimeZone>(ts: &DateTime<Tz>, today: NaiveDate) -> String {
    let date = ts.date_naive();
    if date == today {
        "Hoje".to_string()
    } else if today.pred_opt() == Some(date) {
        "Ontem".to_string()
    } else {
        format!("{:02}/{:02}/{:04}", date.day(), date.month(), date.year())
    }
}

/// 時刻表示: HH:MM
pub fn format_time<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.format("%H:%M").to_string()
}

/// バイト数を "1.5 KB" 形式にする
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut i = 0;
    while value >= 1024.0 && i < UNITS.len() - 1 {
        value /= 1024.0;
        i += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[i])
}
