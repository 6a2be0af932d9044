use clap::{Parser, Subcommand};
use fracture_assist_common::{Severity, SortOrder, StatusFilter};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fracture-assist")]
#[command(about = "X線画像の骨折検出・所見記録・レポート生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像を検出APIに送り、所見を入力して履歴に保存
    Analyze {
        /// 画像ファイルまたはフォルダ
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        /// 確認なしで引数の値を所見として確定
        #[arg(short = 'y', long)]
        yes: bool,

        /// 患者名（未指定なら匿名）
        #[arg(long)]
        patient_name: Option<String>,

        /// 患者ID（未指定なら P-<年>-<4桁> を自動採番）
        #[arg(long)]
        patient_id: Option<String>,

        /// 撮影部位
        #[arg(long)]
        body_region: Option<String>,

        /// 骨折タイプ（未指定なら検出クラス名）
        #[arg(long)]
        fracture_type: Option<String>,

        /// 骨折位置
        #[arg(long)]
        fracture_location: Option<String>,

        /// 重症度 (low/medium/high)
        #[arg(long)]
        severity: Option<Severity>,

        /// 履歴に保存しない
        #[arg(long)]
        no_save: bool,

        /// 検出APIのURL（設定より優先）
        #[arg(long)]
        api_url: Option<String>,
    },

    /// 解析履歴の一覧
    History {
        /// ステータス (all/success/failed)
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,

        /// 患者名・患者ID・部位・骨折タイプで検索
        #[arg(short = 'q', long, default_value = "")]
        search: String,

        /// 並び順 (date-desc/date-asc/title)
        #[arg(long, default_value = "date-desc")]
        sort: SortOrder,
    },

    /// 履歴1件の詳細
    Show {
        id: String,
    },

    /// 履歴1件を削除
    Delete {
        id: String,

        /// 確認しない
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// 履歴をすべて削除
    Clear {
        /// 確認しない
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// 履歴1件をPDFレポートに出力
    Export {
        id: String,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定を管理
    Config {
        /// 検出APIのURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// 現在の設定を表示
        #[arg(long)]
        show: bool,
    },
}
