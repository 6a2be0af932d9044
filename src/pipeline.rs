//! アップロードから履歴保存までの一連の処理
//!
//! ファイルを1件ずつ 送信 → 検出枠描画 → 所見入力 → 履歴保存 の順に処理する。
//! 所見入力が終わるまで次のファイルには進まない。
//! 1件の失敗はそのファイルの結果として記録し、残りの処理は続ける。

use crate::annotator::Annotator;
use crate::detector::Detector;
use crate::error::{FractureAssistError, Result};
use crate::intake::FilePreview;
use crate::overlay::annotate_preview;
use fracture_assist_common::types::now_millis;
use fracture_assist_common::{
    build_history_item, AnnotationDecision, HistoryStore, ReviewedFile, StorageProvider,
};
use indicatif::{ProgressBar, ProgressStyle};

/// 1ファイルの処理結果
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Saved { file_name: String, history_id: String },
    /// 所見は確定したが履歴保存なし
    NotSaved { file_name: String },
    Cancelled { file_name: String },
    Failed { file_name: String, message: String },
}

impl FileOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            Self::Saved { file_name, .. }
            | Self::NotSaved { file_name }
            | Self::Cancelled { file_name }
            | Self::Failed { file_name, .. } => file_name,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn saved_ids(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                FileOutcome::Saved { history_id, .. } => Some(history_id.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Failed { .. }))
            .count()
    }
}

pub struct UploadPipeline<D: Detector> {
    detector: D,
    progress: ProgressBar,
}

impl<D: Detector> UploadPipeline<D> {
    pub fn new(detector: D) -> Self {
        Self {
            detector,
            progress: ProgressBar::hidden(),
        }
    }

    /// 端末に進捗バーを出す
    pub fn with_progress(mut self) -> Self {
        let style = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        self.progress = ProgressBar::new(0).with_style(style);
        self
    }

    pub async fn run<S, A>(
        &self,
        files: &mut [FilePreview],
        annotator: &mut A,
        store: &mut HistoryStore<S>,
    ) -> Result<BatchReport>
    where
        S: StorageProvider,
        A: Annotator + ?Sized,
    {
        if files.is_empty() {
            return Err(FractureAssistError::NoImagesFound(
                "アップロードする画像が選択されていません".into(),
            ));
        }

        self.progress.set_length(files.len() as u64);
        let mut report = BatchReport::default();

        for file in files.iter_mut() {
            self.progress.set_message(file.file_name.clone());
            let outcome = self.process(file, annotator, store).await;
            tracing::debug!(?outcome, "ファイル処理完了");
            report.outcomes.push(outcome);
            self.progress.inc(1);
        }

        self.progress.finish_and_clear();
        Ok(report)
    }

    async fn process<S, A>(
        &self,
        file: &mut FilePreview,
        annotator: &mut A,
        store: &mut HistoryStore<S>,
    ) -> FileOutcome
    where
        S: StorageProvider,
        A: Annotator + ?Sized,
    {
        let file_name = file.file_name.clone();

        file.reset_upload_state();
        file.uploading = true;

        let response = match self.detector.detect(file).await {
            Ok(response) => response,
            Err(e) => {
                let message = e.upload_message();
                tracing::warn!(file = %file_name, error = %e, "アップロード失敗");
                file.uploading = false;
                file.upload_error = Some(message.clone());
                return FileOutcome::Failed { file_name, message };
            }
        };

        file.uploading = false;
        file.upload_progress = 100;
        file.upload_success = true;

        if !response.success {
            tracing::info!(file = %file_name, message = ?response.message, "検出APIが success=false を返却");
        }
        if response.success && response.has_detections() {
            file.detections = response.detections().to_vec();
            if let Err(e) = annotate_preview(file) {
                tracing::warn!(file = %file_name, error = %e, "検出枠の描画に失敗。元画像を使用します");
                file.annotated_image = None;
            }
        }

        let decision = match self.progress.suspend(|| annotator.review(file)) {
            Ok(decision) => decision,
            Err(e) => {
                return FileOutcome::Failed {
                    file_name,
                    message: e.to_string(),
                }
            }
        };

        let form = match decision {
            AnnotationDecision::Confirm(form) => form,
            AnnotationDecision::Cancel => return FileOutcome::Cancelled { file_name },
        };

        if !form.save_to_history {
            return FileOutcome::NotSaved { file_name };
        }

        let item = build_history_item(
            &form,
            ReviewedFile {
                file_name: &file.file_name,
                preview_url: &file.preview,
                annotated_url: file.annotated_image.as_deref(),
                detections: &file.detections,
            },
            now_millis(),
            &mut rand::rng(),
        );
        let history_id = item.id.clone();

        match store.add_detection(item) {
            Ok(()) => FileOutcome::Saved { file_name, history_id },
            Err(e) => {
                tracing::error!(file = %file_name, error = %e, "履歴の保存に失敗");
                FileOutcome::Failed {
                    file_name,
                    message: format!("履歴の保存に失敗しました: {}", e),
                }
            }
        }
    }
}
