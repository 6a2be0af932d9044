//! 医師による所見入力と履歴項目への統合
//!
//! 検出後に医師が入力するフォーム（患者ID・部位・骨折タイプ・重症度など）を
//! 検出結果とマージして HistoryItem を組み立てる。

use crate::types::{Detection, HistoryItem, Severity, Status};
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;

/// 患者名未入力時の表示名
pub const ANONYMOUS_PATIENT: &str = "Paciente Anônimo";

/// 所見入力フォーム
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationForm {
    pub patient_name: String,
    pub patient_id: String,
    pub body_region: String,
    pub fracture_type: String,
    pub fracture_location: String,
    pub severity: Severity,
    pub save_to_history: bool,
}

impl AnnotationForm {
    /// 初期値: 自動採番の患者ID、重症度 medium、履歴保存あり
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_rng(now, &mut rand::rng())
    }

    pub fn with_rng<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> Self {
        Self {
            patient_name: String::new(),
            patient_id: generate_patient_id(now.year(), rng),
            body_region: String::new(),
            fracture_type: String::new(),
            fracture_location: String::new(),
            severity: Severity::Medium,
            save_to_history: true,
        }
    }
}

/// 入力結果
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationDecision {
    Confirm(AnnotationForm),
    /// 結果を破棄（履歴にも保存しない）
    Cancel,
}

/// 患者ID: P-<年>-<4桁ゼロ埋め乱数>
pub fn generate_patient_id<R: Rng>(year: i32, rng: &mut R) -> String {
    format!("P-{}-{:04}", year, rng.random_range(0..9999))
}

/// 履歴ID: det-<エポックミリ秒>-<36進9文字>
pub fn generate_history_id<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("det-{}-{}", now.timestamp_millis(), suffix)
}

/// 平均信頼度（0〜100に四捨五入）。検出なし・平均0の場合は None
pub fn mean_confidence_percent(detections: &[Detection]) -> Option<u8> {
    if detections.is_empty() {
        return None;
    }
    let mean = detections.iter().map(|d| d.confidence).sum::<f64>() / detections.len() as f64;
    if mean > 0.0 {
        Some((mean * 100.0).round().clamp(0.0, 100.0) as u8)
    } else {
        None
    }
}

/// 検出結果の一行要約（"fracture (87.0%), ..."）
pub fn detections_summary(detections: &[Detection]) -> String {
    if detections.is_empty() {
        return "Nenhuma fratura detectada".to_string();
    }
    detections
        .iter()
        .map(|d| format!("{} ({}%)", d.class_name, d.confidence_percent()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 確認対象のファイル情報
#[derive(Debug, Clone, Copy)]
pub struct ReviewedFile<'a> {
    pub file_name: &'a str,
    /// 元画像の data URL
    pub preview_url: &'a str,
    /// 検出枠を描画した data URL
    pub annotated_url: Option<&'a str>,
    pub detections: &'a [Detection],
}

/// フォームと検出結果から履歴項目を組み立てる
pub fn build_history_item<R: Rng>(
    form: &AnnotationForm,
    file: ReviewedFile<'_>,
    timestamp: DateTime<Utc>,
    rng: &mut R,
) -> HistoryItem {
    let detections = file.detections;

    let patient_name = if form.patient_name.trim().is_empty() {
        ANONYMOUS_PATIENT.to_string()
    } else {
        form.patient_name.clone()
    };

    // 骨折タイプ未入力なら検出クラス名を連結
    let fracture_type = if form.fracture_type.trim().is_empty() {
        detections
            .iter()
            .map(|d| d.class_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        form.fracture_type.clone()
    };

    let status = if detections.is_empty() {
        Status::Failed
    } else {
        Status::Success
    };

    HistoryItem {
        id: generate_history_id(timestamp, rng),
        patient_id: form.patient_id.clone(),
        patient_name,
        body_region: form.body_region.clone(),
        fracture_type: non_empty(fracture_type),
        fracture_location: non_empty(form.fracture_location.clone()),
        image_url: Some(file.annotated_url.unwrap_or(file.preview_url).to_string()),
        timestamp,
        status,
        confidence: mean_confidence_percent(detections),
        severity: Some(form.severity),
        detections: Some(detections.to_vec()),
        file_name: Some(file.file_name.to_string()),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn detection(name: &str, confidence: f64) -> Detection {
        Detection {
            class_id: 0,
            class_name: name.to_string(),
            confidence,
            bbox: [10.0, 10.0, 50.0, 50.0],
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_patient_id_format() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let id = generate_patient_id(2025, &mut rng);
            assert!(id.starts_with("P-2025-"));
            let num = &id["P-2025-".len()..];
            assert_eq!(num.len(), 4);
            assert!(num.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_history_id_format() {
        let mut rng = StdRng::seed_from_u64(1);
        let id = generate_history_id(now(), &mut rng);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts[0], "det");
        assert_eq!(parts[1], now().timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_default_form() {
        let form = AnnotationForm::new(now());
        assert!(form.patient_id.starts_with("P-2025-"));
        assert_eq!(form.severity, Severity::Medium);
        assert!(form.save_to_history);
        assert!(form.patient_name.is_empty());
    }

    #[test]
    fn test_build_success_item() {
        let mut rng = StdRng::seed_from_u64(3);
        let form = AnnotationForm::with_rng(now(), &mut rng);
        let detections = vec![detection("fracture", 0.87)];
        let item = build_history_item(
            &form,
            ReviewedFile {
                file_name: "xray.jpg",
                preview_url: "data:image/jpeg;base64,AAA",
                annotated_url: Some("data:image/png;base64,BBB"),
                detections: &detections,
            },
            now(),
            &mut rng,
        );

        assert_eq!(item.status, Status::Success);
        assert_eq!(item.confidence, Some(87));
        assert_eq!(item.patient_name, ANONYMOUS_PATIENT);
        assert_eq!(item.fracture_type.as_deref(), Some("fracture"));
        assert_eq!(item.image_url.as_deref(), Some("data:image/png;base64,BBB"));
        assert_eq!(item.fracture_location, None);
        assert_eq!(item.file_name.as_deref(), Some("xray.jpg"));
        assert_eq!(item.patient_id, form.patient_id);
    }

    #[test]
    fn test_build_failed_item_without_detections() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut form = AnnotationForm::with_rng(now(), &mut rng);
        form.patient_name = "João".to_string();
        form.fracture_type = "Cominutiva".to_string();

        let item = build_history_item(
            &form,
            ReviewedFile {
                file_name: "x.png",
                preview_url: "data:image/png;base64,AAA",
                annotated_url: None,
                detections: &[],
            },
            now(),
            &mut rng,
        );

        assert_eq!(item.status, Status::Failed);
        assert_eq!(item.confidence, None);
        assert_eq!(item.patient_name, "João");
        assert_eq!(item.fracture_type.as_deref(), Some("Cominutiva"));
        assert_eq!(item.image_url.as_deref(), Some("data:image/png;base64,AAA"));
    }

    #[test]
    fn test_detections_summary() {
        let detections = vec![detection("fracture", 0.87), detection("fissure", 0.5)];
        assert_eq!(detections_summary(&detections), "fracture (87.0%), fissure (50.0%)");
        assert_eq!(detections_summary(&[]), "Nenhuma fratura detectada");
    }

    #[test]
    fn test_mean_confidence_rounding() {
        let detections = vec![detection("a", 0.5), detection("b", 0.75)];
        assert_eq!(mean_confidence_percent(&detections), Some(63));
        assert_eq!(mean_confidence_percent(&[detection("z", 0.0)]), None);
    }
}
