//! 検出後の所見入力
//!
//! 対話式（dialoguer）と、CLI引数の値をそのまま使う非対話式がある。

use crate::error::Result;
use crate::intake::FilePreview;
use chrono::Utc;
use dialoguer::{Confirm, Input, Select};
use fracture_assist_common::history_query::format_file_size;
use fracture_assist_common::{detections_summary, AnnotationDecision, AnnotationForm, Severity};

/// 1ファイルごとに呼ばれる所見入力
pub trait Annotator {
    fn review(&mut self, file: &FilePreview) -> Result<AnnotationDecision>;
}

/// CLI引数で与えられた既定値
#[derive(Debug, Clone)]
pub struct AnnotationPreset {
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub body_region: Option<String>,
    pub fracture_type: Option<String>,
    pub fracture_location: Option<String>,
    pub severity: Option<Severity>,
    pub save_to_history: bool,
}

impl Default for AnnotationPreset {
    fn default() -> Self {
        Self {
            patient_name: None,
            patient_id: None,
            body_region: None,
            fracture_type: None,
            fracture_location: None,
            severity: None,
            save_to_history: true,
        }
    }
}

impl AnnotationPreset {
    /// 未指定の項目はフォーム初期値（患者IDは自動採番）
    pub fn to_form(&self) -> AnnotationForm {
        let mut form = AnnotationForm::new(Utc::now());
        if let Some(name) = &self.patient_name {
            form.patient_name = name.clone();
        }
        if let Some(id) = &self.patient_id {
            form.patient_id = id.clone();
        }
        if let Some(region) = &self.body_region {
            form.body_region = region.clone();
        }
        if let Some(fracture_type) = &self.fracture_type {
            form.fracture_type = fracture_type.clone();
        }
        if let Some(location) = &self.fracture_location {
            form.fracture_location = location.clone();
        }
        if let Some(severity) = self.severity {
            form.severity = severity;
        }
        form.save_to_history = self.save_to_history;
        form
    }
}

/// 確認なしで既定値を確定する（`--yes`）
pub struct PresetAnnotator {
    preset: AnnotationPreset,
}

impl PresetAnnotator {
    pub fn new(preset: AnnotationPreset) -> Self {
        Self { preset }
    }
}

impl Annotator for PresetAnnotator {
    fn review(&mut self, file: &FilePreview) -> Result<AnnotationDecision> {
        println!("  {}: {}", file.file_name, detections_summary(&file.detections));
        Ok(AnnotationDecision::Confirm(self.preset.to_form()))
    }
}

const SEVERITY_CHOICES: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

/// 端末で1件ずつ所見を入力する
pub struct PromptAnnotator {
    preset: AnnotationPreset,
}

impl PromptAnnotator {
    pub fn new(preset: AnnotationPreset) -> Self {
        Self { preset }
    }
}

impl Annotator for PromptAnnotator {
    fn review(&mut self, file: &FilePreview) -> Result<AnnotationDecision> {
        println!("\n🩻 {} ({})", file.file_name, format_file_size(file.size));
        println!("  検出結果: {}", detections_summary(&file.detections));
        if file.annotated_image.is_none() && !file.detections.is_empty() {
            println!("  ⚠ 検出枠の描画に失敗したため元画像を保存します");
        }

        let keep = Confirm::new()
            .with_prompt("この結果を記録しますか?")
            .default(true)
            .interact()?;
        if !keep {
            return Ok(AnnotationDecision::Cancel);
        }

        let initial = self.preset.to_form();

        let patient_name = prompt_text("患者名（空欄で匿名）", &initial.patient_name)?;
        let patient_id = prompt_text("患者ID", &initial.patient_id)?;
        let body_region = prompt_text("撮影部位", &initial.body_region)?;
        let fracture_type = prompt_text("骨折タイプ（空欄で検出クラス名）", &initial.fracture_type)?;
        let fracture_location = prompt_text("骨折位置", &initial.fracture_location)?;

        let labels: Vec<&str> = SEVERITY_CHOICES.iter().map(|s| s.label()).collect();
        let default_index = SEVERITY_CHOICES
            .iter()
            .position(|s| *s == initial.severity)
            .unwrap_or(1);
        let severity_index = Select::new()
            .with_prompt("重症度")
            .items(&labels)
            .default(default_index)
            .interact()?;

        let save_to_history = Confirm::new()
            .with_prompt("履歴に保存しますか?")
            .default(initial.save_to_history)
            .interact()?;

        Ok(AnnotationDecision::Confirm(AnnotationForm {
            patient_name,
            patient_id: if patient_id.trim().is_empty() {
                initial.patient_id
            } else {
                patient_id
            },
            body_region,
            fracture_type,
            fracture_location,
            severity: SEVERITY_CHOICES[severity_index],
            save_to_history,
        }))
    }
}

fn prompt_text(prompt: &str, default: &str) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
    if !default.is_empty() {
        input = input.default(default.to_string());
    }
    let value = input.interact_text()?;
    Ok(value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_preset_uses_form_defaults() {
        let form = AnnotationPreset::default().to_form();
        assert!(form.patient_id.starts_with("P-"));
        assert_eq!(form.severity, Severity::Medium);
        assert!(form.save_to_history);
        assert!(form.patient_name.is_empty());
    }

    #[test]
    fn test_preset_overrides() {
        let preset = AnnotationPreset {
            patient_name: Some("Maria Souza".into()),
            patient_id: Some("P-2025-0042".into()),
            body_region: Some("Punho".into()),
            severity: Some(Severity::High),
            save_to_history: false,
            ..Default::default()
        };
        let form = preset.to_form();
        assert_eq!(form.patient_name, "Maria Souza");
        assert_eq!(form.patient_id, "P-2025-0042");
        assert_eq!(form.body_region, "Punho");
        assert_eq!(form.severity, Severity::High);
        assert!(!form.save_to_history);
        assert!(form.fracture_type.is_empty());
    }
}
