//! Fracture Assist Common Library
//!
//! CLIと他のフロントエンドで共有される型・履歴ストア・レイアウト計算

pub mod types;
pub mod error;
pub mod storage;
pub mod history;
pub mod history_query;
pub mod annotation;
pub mod overlay;
pub mod layout;
pub mod export;

pub use types::{Detection, DetectionResponse, HistoryItem, Severity, Status};
pub use error::{Error, Result};
pub use storage::{MemoryStorage, StorageProvider};
pub use history::{HistoryStore, SubscriptionId, HISTORY_STORAGE_KEY};
pub use history_query::{HistoryQuery, HistoryStats, SortOrder, StatusFilter};
pub use annotation::{
    AnnotationDecision, AnnotationForm, ReviewedFile, build_history_item, detections_summary,
};
pub use overlay::{ImageSurface, SurfaceRect, PALETTE, render_detections};
