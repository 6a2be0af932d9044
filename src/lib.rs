//! fracture-assist: X線画像の骨折検出アシスタント
//!
//! 検出APIへの送信、検出枠の描画、医師の所見入力、解析履歴の永続化、
//! PDFレポート出力を行う。

pub mod annotator;
pub mod cli;
pub mod config;
pub mod data_url;
pub mod detector;
pub mod error;
pub mod export;
pub mod intake;
pub mod overlay;
pub mod pipeline;
pub mod storage;
pub mod views;
