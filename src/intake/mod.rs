//! 画像ファイルの受け付け
//!
//! 指定されたファイル・フォルダから画像だけを選び、
//! アップロード状態を持つ `FilePreview` にする。

use crate::data_url;
use crate::error::{FractureAssistError, Result};
use fracture_assist_common::Detection;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// アップロード待ち・処理中・処理済みの画像1件
#[derive(Debug, Clone)]
pub struct FilePreview {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub mime: String,
    pub bytes: Vec<u8>,
    /// 元画像の data URL
    pub preview: String,
    pub uploading: bool,
    pub upload_progress: u8,
    pub upload_error: Option<String>,
    pub upload_success: bool,
    pub detections: Vec<Detection>,
    /// 検出枠を描いた PNG の data URL
    pub annotated_image: Option<String>,
}

impl FilePreview {
    /// 画像でなければ None
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Option<Self> {
        let path = path.into();
        let mime = sniff_image_mime(&bytes)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Some(Self {
            preview: data_url::encode(mime, &bytes),
            size: bytes.len() as u64,
            mime: mime.to_string(),
            path,
            file_name,
            bytes,
            uploading: false,
            upload_progress: 0,
            upload_error: None,
            upload_success: false,
            detections: Vec::new(),
            annotated_image: None,
        })
    }

    pub fn reset_upload_state(&mut self) {
        self.uploading = false;
        self.upload_progress = 0;
        self.upload_error = None;
        self.upload_success = false;
        self.detections.clear();
        self.annotated_image = None;
    }
}

/// 内容からMIMEを判定し、image/* 以外は None
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    let mime = format.to_mime_type();
    mime.starts_with("image/").then_some(mime)
}

/// パス（ファイルまたはフォルダ）から画像を集める
///
/// フォルダ内はファイル名順。画像でないファイルと読めないファイルは除外する。
pub fn collect_images(paths: &[PathBuf], recursive: bool) -> Result<Vec<FilePreview>> {
    let mut previews = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(FractureAssistError::FileNotFound(path.display().to_string()));
        }

        if path.is_dir() {
            previews.extend(scan_folder(path, recursive)?);
        } else if let Some(preview) = load_file(path) {
            previews.push(preview);
        }
    }

    Ok(previews)
}

fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<FilePreview>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut previews = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(preview) = load_file(path) {
            previews.push(preview);
        }
    }

    Ok(previews)
}

fn load_file(path: &Path) -> Option<FilePreview> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "読み込めないファイルをスキップ");
            return None;
        }
    };

    let preview = FilePreview::from_bytes(path, bytes);
    if preview.is_none() {
        tracing::debug!(path = %path.display(), "画像ではないため除外");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn png_bytes() -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        RgbImage::new(4, 4).write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_sniff_image_mime() {
        assert_eq!(sniff_image_mime(&png_bytes()), Some("image/png"));
        assert_eq!(sniff_image_mime(b"hello world"), None);
    }

    #[test]
    fn test_collect_filters_non_images() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), png_bytes()).unwrap();
        std::fs::write(dir.path().join("a.png"), png_bytes()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"text").unwrap();
        // 拡張子ではなく内容で判定する
        std::fs::write(dir.path().join("fake.jpg"), b"not an image").unwrap();

        let previews = collect_images(&[dir.path().to_path_buf()], false).unwrap();
        let names: Vec<&str> = previews.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png"]);

        let first = &previews[0];
        assert_eq!(first.mime, "image/png");
        assert!(first.preview.starts_with("data:image/png;base64,"));
        assert!(!first.uploading && !first.upload_success);
        assert_eq!(first.upload_progress, 0);
    }

    #[test]
    fn test_collect_recursive() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir_all(&sub).unwrap();
        std::fs::write(dir.path().join("top.png"), png_bytes()).unwrap();
        std::fs::write(sub.join("deep.png"), png_bytes()).unwrap();

        let flat = collect_images(&[dir.path().to_path_buf()], false).unwrap();
        assert_eq!(flat.len(), 1);

        let deep = collect_images(&[dir.path().to_path_buf()], true).unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("ok.png"), png_bytes()).unwrap();

        // ディレクトリは read できない
        assert!(load_file(dir.path()).is_none());
        assert!(load_file(&dir.path().join("removed.png")).is_none());
        assert_eq!(load_file(&dir.path().join("ok.png")).unwrap().file_name, "ok.png");
    }

    #[test]
    fn test_collect_missing_path() {
        let result = collect_images(&[PathBuf::from("/nonexistent/xray.png")], false);
        assert!(matches!(result, Err(FractureAssistError::FileNotFound(_))));
    }
}
