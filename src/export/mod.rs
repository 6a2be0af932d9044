pub mod pdf;

use crate::error::Result;
use fracture_assist_common::export::report_core::report_file_name;
use fracture_assist_common::HistoryItem;
use std::path::{Path, PathBuf};

/// 出力先がフォルダなら `<患者ID>_<時刻>.pdf` を付ける
pub fn output_path_for(output: &Path, item: &HistoryItem) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(report_file_name(item))
    } else {
        output.to_path_buf()
    }
}

pub fn export_report(item: &HistoryItem, output: &Path) -> Result<PathBuf> {
    let output_path = output_path_for(output, item);
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    println!("- PDFを生成中...");
    pdf::generate_report(item, &output_path)?;
    println!("✔ PDF出力: {}", output_path.display());

    Ok(output_path)
}
