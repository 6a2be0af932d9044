//! 履歴の端末表示

use chrono::{DateTime, Local, NaiveDate};
use fracture_assist_common::history_query::{format_date, format_time, history_stats};
use fracture_assist_common::{HistoryItem, HistoryQuery};

/// 一覧1行分の表示文字列
pub fn history_row(item: &HistoryItem, today: NaiveDate) -> String {
    let local: DateTime<Local> = item.timestamp.with_timezone(&Local);
    let mark = if item.is_success() { "✔" } else { "✘" };
    let confidence = item
        .confidence
        .map(|c| format!("{}%", c))
        .unwrap_or_else(|| "-".to_string());
    let severity = item.severity.map(|s| s.label()).unwrap_or("-");

    format!(
        "{} {} {}  {} ({})  {}  {}  信頼度 {}  重症度 {}  [{}]",
        mark,
        format_date(&local, today),
        format_time(&local),
        item.patient_name,
        item.patient_id,
        non_empty_or_dash(&item.body_region),
        item.fracture_type.as_deref().unwrap_or("-"),
        confidence,
        severity,
        item.id,
    )
}

fn non_empty_or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

pub fn print_history(items: &[HistoryItem], query: &HistoryQuery) {
    let stats = history_stats(items);
    println!(
        "履歴: 全{}件（成功 {} / 失敗 {}）",
        stats.total, stats.success, stats.failed
    );

    let matched = query.apply(items);
    if matched.is_empty() {
        if items.is_empty() {
            println!("履歴はまだありません");
        } else {
            println!("条件に一致する履歴はありません");
        }
        return;
    }

    let today = Local::now().date_naive();
    println!();
    for item in matched {
        println!("{}", history_row(item, today));
    }
}

pub fn print_item(item: &HistoryItem) {
    let local: DateTime<Local> = item.timestamp.with_timezone(&Local);

    println!("ID: {}", item.id);
    println!("  日時: {}", local.format("%d/%m/%Y %H:%M:%S"));
    println!("  患者: {} ({})", item.patient_name, item.patient_id);
    println!("  部位: {}", non_empty_or_dash(&item.body_region));
    println!("  骨折タイプ: {}", item.fracture_type.as_deref().unwrap_or("-"));
    println!("  骨折位置: {}", item.fracture_location.as_deref().unwrap_or("-"));
    println!("  ステータス: {}", item.status.as_str());
    if let Some(confidence) = item.confidence {
        println!("  信頼度: {}%", confidence);
    }
    if let Some(severity) = item.severity {
        println!("  重症度: {}", severity.label());
    }
    if let Some(file_name) = &item.file_name {
        println!("  ファイル: {}", file_name);
    }

    let detections = item.detections();
    println!("  検出数: {}", detections.len());
    for (i, detection) in detections.iter().enumerate() {
        let [x1, y1, x2, y2] = detection.bbox;
        println!(
            "    {}. {} ({:.0}, {:.0}) - ({:.0}, {:.0})",
            i + 1,
            detection.label(),
            x1,
            y1,
            x2,
            y2
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fracture_assist_common::{Severity, Status};

    fn item() -> HistoryItem {
        HistoryItem {
            id: "det-1-abc".into(),
            patient_id: "P-2025-0001".into(),
            patient_name: "Ana".into(),
            body_region: String::new(),
            fracture_type: Some("fracture".into()),
            fracture_location: None,
            image_url: None,
            timestamp: Utc::now(),
            status: Status::Success,
            confidence: Some(87),
            severity: Some(Severity::High),
            detections: None,
            file_name: None,
        }
    }

    #[test]
    fn test_history_row_contents() {
        let today = Local::now().date_naive();
        let row = history_row(&item(), today);
        assert!(row.starts_with("✔ Hoje"));
        assert!(row.contains("Ana (P-2025-0001)"));
        assert!(row.contains("信頼度 87%"));
        assert!(row.contains("重症度 Grave"));
        assert!(row.ends_with("[det-1-abc]"));
    }

    #[test]
    fn test_failed_row_without_confidence() {
        let mut failed = item();
        failed.status = Status::Failed;
        failed.confidence = None;
        failed.severity = None;
        let row = history_row(&failed, Local::now().date_naive());
        assert!(row.starts_with("✘"));
        assert!(row.contains("信頼度 -"));
        assert!(row.contains("重症度 -"));
    }
}
