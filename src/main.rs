use anyhow::Context;
use clap::Parser;
use dialoguer::Confirm;
use fracture_assist::{annotator, cli, config, detector, error, export, intake, pipeline, storage, views};
use fracture_assist_common::export::report_core::{DISCLAIMER_TEXT, DISCLAIMER_TITLE};
use fracture_assist_common::{HistoryQuery, HistoryStore};
use annotator::{AnnotationPreset, Annotator, PresetAnnotator, PromptAnnotator};
use cli::{Cli, Commands};
use config::Config;
use error::FractureAssistError;
use pipeline::{FileOutcome, UploadPipeline};
use std::time::Duration;
use storage::FileStorage;

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(config: &Config) -> anyhow::Result<HistoryStore<FileStorage>> {
    let path = config.storage_path()?;
    let storage = FileStorage::open(&path)
        .with_context(|| format!("履歴ファイルを開けません: {}", path.display()))?;
    Ok(HistoryStore::load(storage))
}

fn confirm(prompt: &str) -> error::Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Analyze {
            paths,
            recursive,
            yes,
            patient_name,
            patient_id,
            body_region,
            fracture_type,
            fracture_location,
            severity,
            no_save,
            api_url,
        } => {
            println!("🩻 fracture-assist - 骨折検出\n");
            println!("⚠ {}: {}\n", DISCLAIMER_TITLE, DISCLAIMER_TEXT);

            // 1. 画像の読み込み
            println!("[1/3] 画像を読み込み中...");
            let mut files = intake::collect_images(&paths, recursive)?;
            if files.is_empty() {
                let joined = paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(FractureAssistError::NoImagesFound(joined).into());
            }
            println!("✔ {}枚の画像を検出\n", files.len());

            // 2. 送信・所見入力
            let api_url = api_url.unwrap_or_else(|| config.get_api_url());
            println!("[2/3] 検出APIへ送信中... ({})", api_url);
            let detector = detector::HttpDetector::new(api_url, Duration::from_secs(config.timeout_seconds))?;
            let pipeline = UploadPipeline::new(detector).with_progress();

            let preset = AnnotationPreset {
                patient_name,
                patient_id,
                body_region,
                fracture_type,
                fracture_location,
                severity,
                save_to_history: !no_save,
            };
            let mut annotator: Box<dyn Annotator> = if yes {
                Box::new(PresetAnnotator::new(preset))
            } else {
                Box::new(PromptAnnotator::new(preset))
            };

            let mut store = open_store(&config)?;
            store.subscribe(|items| tracing::debug!(count = items.len(), "履歴を更新"));

            let report = pipeline.run(&mut files, annotator.as_mut(), &mut store).await?;

            // 3. 結果
            println!("\n[3/3] 結果");
            for outcome in &report.outcomes {
                match outcome {
                    FileOutcome::Saved { file_name, history_id } => {
                        println!("✔ {}: 履歴に保存 ({})", file_name, history_id)
                    }
                    FileOutcome::NotSaved { file_name } => println!("- {}: 保存しません", file_name),
                    FileOutcome::Cancelled { file_name } => println!("- {}: キャンセル", file_name),
                    FileOutcome::Failed { file_name, message } => println!("✘ {}: {}", file_name, message),
                }
            }

            let failed = report.failed_count();
            if failed > 0 {
                println!("\n⚠ {}件が失敗しました", failed);
            } else {
                println!("\n✅ 完了");
            }
        }

        Commands::History { status, search, sort } => {
            let store = open_store(&config)?;
            views::print_history(store.get_all(), &HistoryQuery { status, search, sort });
        }

        Commands::Show { id } => {
            let store = open_store(&config)?;
            let item = store
                .find(&id)
                .ok_or_else(|| FractureAssistError::HistoryNotFound(id.clone()))?;
            views::print_item(item);
        }

        Commands::Delete { id, yes } => {
            let mut store = open_store(&config)?;
            let Some(item) = store.find(&id) else {
                println!("⚠ 履歴が見つかりません: {}", id);
                return Ok(());
            };

            let prompt = format!("{} ({}) を削除しますか?", item.patient_name, item.id);
            if !yes && !confirm(&prompt)? {
                println!("中止しました");
                return Ok(());
            }

            store.delete_item(&id)?;
            println!("✔ 削除しました: {}", id);
        }

        Commands::Clear { yes } => {
            let mut store = open_store(&config)?;
            let prompt = format!("履歴{}件をすべて削除しますか?", store.len());
            if !yes && !confirm(&prompt)? {
                println!("中止しました");
                return Ok(());
            }

            store.clear_all()?;
            println!("✔ 履歴をすべて削除しました");
        }

        Commands::Export { id, output } => {
            println!("📄 fracture-assist - レポート出力\n");

            let store = open_store(&config)?;
            let item = store
                .find(&id)
                .ok_or_else(|| FractureAssistError::HistoryNotFound(id.clone()))?;

            let output = output.unwrap_or_else(|| std::path::PathBuf::from("."));
            export::export_report(item, &output)?;

            println!("\n✅ エクスポート完了");
        }

        Commands::Config { set_api_url, show } => {
            let mut config = config;

            if let Some(url) = set_api_url {
                config.set_api_url(url)?;
                println!("✔ 検出APIのURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  検出API: {}", config.get_api_url());
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  履歴ファイル: {}", config.storage_path()?.display());
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}
