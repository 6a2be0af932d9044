//! PDF report planning shared by every renderer.
//!
//! HistoryItem 1件をページごとの描画要素列に変換する。
//! 座標はすべてmm、Yは上端基準（テキストはベースライン）。

use crate::history_query::{format_date, format_time};
use crate::layout::{
    estimate_text_width_mm, line_height_mm, wrap_text, PageCursor, A4_WIDTH_MM, BODY_START_Y_MM,
    DETECTIONS_BLOCK_MIN_MM, DETECTION_LINE_MIN_MM, DISCLAIMER_HEIGHT_MM, FOOTER_Y_MM,
    HEADER_ACCENT_HEIGHT_MM, HEADER_ACCENT_Y_MM, HEADER_HEIGHT_MM, HEADING_GAP_MM,
    IMAGE_BLOCK_MIN_MM, IMAGE_HEIGHT_MM, IMAGE_WIDTH_MM, LINE_GAP_MM, MARGIN_MM, PANEL_INSET_MM,
    SECTION_GAP_MM, USABLE_WIDTH_MM,
};
use crate::types::{HistoryItem, Status};
use chrono::{DateTime, TimeZone};

pub const REPORT_TITLE: &str = "Relatório de Análise";
pub const REPORT_SUBTITLE: &str = "Sistema de Detecção de Fraturas por IA";
pub const IMAGE_UNAVAILABLE_NOTICE: &str = "Imagem não disponível para exportação";

/// 免責事項
pub const DISCLAIMER_TITLE: &str = "Aviso Importante";
pub const DISCLAIMER_TEXT: &str = "Este relatório foi gerado por um sistema de Inteligência Artificial e serve apenas como ferramenta de apoio ao diagnóstico médico. Não substitui a avaliação de um profissional qualificado. Os resultados podem conter falsos positivos ou negativos. Sempre consulte um médico especialista para diagnóstico definitivo.";

const HEADER_COLOR: [u8; 3] = [102, 126, 234];
const HEADER_ACCENT_COLOR: [u8; 3] = [118, 75, 162];
const PATIENT_PANEL_COLOR: [u8; 3] = [247, 250, 252];
const RESULTS_PANEL_COLOR: [u8; 3] = [237, 242, 247];
const DISCLAIMER_COLOR: [u8; 3] = [255, 243, 205];
const DISCLAIMER_TEXT_COLOR: [u8; 3] = [120, 53, 15];
const SUCCESS_COLOR: [u8; 3] = [72, 187, 120];
const FAILED_COLOR: [u8; 3] = [245, 101, 101];
const MUTED_COLOR: [u8; 3] = [150, 150, 150];
const WHITE: [u8; 3] = [255, 255, 255];
const BLACK: [u8; 3] = [0, 0, 0];

const PATIENT_PANEL_HEIGHT_MM: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

/// ページ上の描画要素
#[derive(Debug, Clone, PartialEq)]
pub enum ReportElement {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: [u8; 3],
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        size_pt: f32,
        style: FontStyle,
        color: [u8; 3],
    },
    /// 画像スロット（画像本体はレンダラー側が保持）
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportPage {
    pub elements: Vec<ReportElement>,
}

/// 埋め込み画像の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportImage {
    /// デコード済み（ピクセル寸法）
    Embedded { width_px: u32, height_px: u32 },
    /// 画像はあるがデコードできない
    Unavailable,
    /// 画像なし
    Absent,
}

/// 出力ファイル名: <患者IDのスラッグ>_<タイムスタンプのエポックミリ秒>.pdf
pub fn report_file_name(item: &HistoryItem) -> String {
    format!("{}_{}.pdf", slugify(&item.patient_id), item.timestamp.timestamp_millis())
}

/// ファイル名に使えない文字を '_' に置き換える
pub fn slugify(value: &str) -> String {
    let slug: String = value
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if slug.is_empty() {
        "paciente".to_string()
    } else {
        slug
    }
}

/// 画像を枠内にアスペクト比を保って収めた寸法（mm）
pub fn fit_image(width_px: u32, height_px: u32) -> (f32, f32) {
    if width_px == 0 || height_px == 0 {
        return (IMAGE_WIDTH_MM, IMAGE_HEIGHT_MM);
    }
    let scale = (IMAGE_WIDTH_MM / width_px as f32).min(IMAGE_HEIGHT_MM / height_px as f32);
    (width_px as f32 * scale, height_px as f32 * scale)
}

struct Planner {
    pages: Vec<ReportPage>,
    cursor: PageCursor,
}

impl Planner {
    fn new() -> Self {
        Self {
            pages: vec![ReportPage::default()],
            cursor: PageCursor::new(MARGIN_MM),
        }
    }

    fn ensure_space(&mut self, min_height_mm: f32) {
        if self.cursor.ensure_space(min_height_mm) {
            self.pages.push(ReportPage::default());
        }
    }

    fn push(&mut self, element: ReportElement) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: [u8; 3]) {
        self.push(ReportElement::FillRect { x, y, width, height, color });
    }

    fn text_at(&mut self, x: f32, y: f32, text: impl Into<String>, size_pt: f32, style: FontStyle, color: [u8; 3]) {
        self.push(ReportElement::Text {
            x,
            y,
            text: text.into(),
            size_pt,
            style,
            color,
        });
    }

    /// パネル内の1行（現在位置）
    fn line(&mut self, text: impl Into<String>, size_pt: f32, style: FontStyle, color: [u8; 3]) {
        let y = self.cursor.y_mm;
        self.text_at(MARGIN_MM + PANEL_INSET_MM, y, text, size_pt, style, color);
    }
}

/// レポートのページ構成を組み立てる
pub fn plan_report<Tz: TimeZone>(
    item: &HistoryItem,
    image: ReportImage,
    generated_at: &DateTime<Tz>,
) -> Vec<ReportPage>
where
    Tz::Offset: std::fmt::Display,
{
    let mut plan = Planner::new();

    // ヘッダー
    plan.rect(0.0, 0.0, A4_WIDTH_MM, HEADER_HEIGHT_MM, HEADER_COLOR);
    plan.rect(0.0, HEADER_ACCENT_Y_MM, A4_WIDTH_MM, HEADER_ACCENT_HEIGHT_MM, HEADER_ACCENT_COLOR);
    plan.text_at(MARGIN_MM, 25.0, REPORT_TITLE, 24.0, FontStyle::Bold, WHITE);
    plan.text_at(MARGIN_MM, 35.0, REPORT_SUBTITLE, 12.0, FontStyle::Regular, WHITE);
    plan.cursor.y_mm = BODY_START_Y_MM;

    plan_patient_panel(&mut plan, item, generated_at);
    plan_results_panel(&mut plan, item);

    if item.status == Status::Success && image != ReportImage::Absent {
        plan_image(&mut plan, image);
    }

    plan_detections(&mut plan, item);
    plan_disclaimer(&mut plan);

    // フッター（最終ページ）
    let footer = format!(
        "Relatório gerado em {} às {}",
        generated_at.format("%d/%m/%Y"),
        generated_at.format("%H:%M:%S")
    );
    let footer_x = (A4_WIDTH_MM - estimate_text_width_mm(&footer, 8.0)) / 2.0;
    plan.text_at(footer_x, FOOTER_Y_MM, footer, 8.0, FontStyle::Italic, MUTED_COLOR);

    plan.pages
}

fn plan_patient_panel<Tz: TimeZone>(plan: &mut Planner, item: &HistoryItem, generated_at: &DateTime<Tz>)
where
    Tz::Offset: std::fmt::Display,
{
    let top = plan.cursor.y_mm;
    plan.rect(MARGIN_MM, top, USABLE_WIDTH_MM, PATIENT_PANEL_HEIGHT_MM, PATIENT_PANEL_COLOR);

    plan.cursor.advance(10.0);
    plan.line("Informações do Paciente", 14.0, FontStyle::Bold, BLACK);
    plan.cursor.advance(HEADING_GAP_MM);

    let local_ts = item.timestamp.with_timezone(&generated_at.timezone());
    let mut lines = vec![
        format!("Nome: {}", item.patient_name),
        format!("ID do Paciente: {}", item.patient_id),
        format!("Região do Corpo: {}", item.body_region),
        format!(
            "Data: {} às {}",
            format_date(&local_ts, generated_at.date_naive()),
            format_time(&local_ts)
        ),
    ];
    if let Some(file_name) = &item.file_name {
        lines.push(format!("Arquivo: {}", file_name));
    }

    for (i, text) in lines.into_iter().enumerate() {
        if i > 0 {
            plan.cursor.advance(LINE_GAP_MM);
        }
        plan.line(text, 10.0, FontStyle::Regular, BLACK);
    }
    plan.cursor.advance(SECTION_GAP_MM);
}

fn plan_results_panel(plan: &mut Planner, item: &HistoryItem) {
    let mut details = Vec::new();
    if item.status == Status::Success {
        if let Some(fracture_type) = &item.fracture_type {
            details.push(format!("Tipo de Fratura: {}", fracture_type));
        }
        if let Some(location) = &item.fracture_location {
            details.push(format!("Localização: {}", location));
        }
        if let Some(confidence) = item.confidence {
            details.push(format!("Confiança da IA: {}%", confidence));
        }
        if let Some(severity) = item.severity {
            details.push(format!("Severidade: {}", severity.label()));
        }
    }

    // 見出し + ステータス行 + 詳細行
    let panel_height = 10.0 + HEADING_GAP_MM + LINE_GAP_MM * details.len() as f32 + 8.0;
    let top = plan.cursor.y_mm;
    plan.rect(MARGIN_MM, top, USABLE_WIDTH_MM, panel_height, RESULTS_PANEL_COLOR);

    plan.cursor.advance(10.0);
    plan.line("Resultados da Análise", 14.0, FontStyle::Bold, BLACK);
    plan.cursor.advance(HEADING_GAP_MM);

    let (status_text, status_color) = match item.status {
        Status::Success => ("Fratura Detectada", SUCCESS_COLOR),
        Status::Failed => ("Nenhuma Fratura Detectada", FAILED_COLOR),
    };
    plan.line(format!("Status: {}", status_text), 10.0, FontStyle::Bold, status_color);

    for text in details {
        plan.cursor.advance(LINE_GAP_MM);
        plan.line(text, 10.0, FontStyle::Regular, BLACK);
    }
    plan.cursor.advance(SECTION_GAP_MM);
}

fn plan_image(plan: &mut Planner, image: ReportImage) {
    // 代替文言だけなら見出しと1行分で足りる
    let needed = match image {
        ReportImage::Embedded { .. } => IMAGE_BLOCK_MIN_MM,
        ReportImage::Unavailable | ReportImage::Absent => HEADING_GAP_MM + LINE_GAP_MM,
    };
    plan.ensure_space(needed);
    plan.line("Radiografia Analisada", 14.0, FontStyle::Bold, BLACK);
    plan.cursor.advance(HEADING_GAP_MM);

    match image {
        ReportImage::Embedded { width_px, height_px } => {
            let (width, height) = fit_image(width_px, height_px);
            let y = plan.cursor.y_mm;
            plan.push(ReportElement::Image {
                x: MARGIN_MM + PANEL_INSET_MM,
                y,
                width,
                height,
            });
            plan.cursor.advance(height + 10.0);
        }
        ReportImage::Unavailable | ReportImage::Absent => {
            plan.line(IMAGE_UNAVAILABLE_NOTICE, 10.0, FontStyle::Italic, MUTED_COLOR);
            plan.cursor.advance(10.0);
        }
    }
}

fn plan_detections(plan: &mut Planner, item: &HistoryItem) {
    let detections = item.detections();
    if detections.is_empty() {
        return;
    }

    plan.ensure_space(DETECTIONS_BLOCK_MIN_MM);
    plan.line("Detecções da Inteligência Artificial", 14.0, FontStyle::Bold, BLACK);
    plan.cursor.advance(HEADING_GAP_MM);

    for (index, detection) in detections.iter().enumerate() {
        plan.ensure_space(DETECTION_LINE_MIN_MM);
        plan.line(
            format!(
                "{}. {} - Confiança: {}%",
                index + 1,
                detection.class_name,
                detection.confidence_percent()
            ),
            10.0,
            FontStyle::Regular,
            BLACK,
        );
        plan.cursor.advance(LINE_GAP_MM);
    }
    plan.cursor.advance(10.0);
}

fn plan_disclaimer(plan: &mut Planner) {
    plan.ensure_space(DISCLAIMER_HEIGHT_MM);
    let top = plan.cursor.y_mm;
    plan.rect(MARGIN_MM, top, USABLE_WIDTH_MM, DISCLAIMER_HEIGHT_MM, DISCLAIMER_COLOR);

    plan.cursor.advance(8.0);
    plan.line(DISCLAIMER_TITLE, 12.0, FontStyle::Bold, DISCLAIMER_TEXT_COLOR);
    plan.cursor.advance(LINE_GAP_MM);

    let max_width = USABLE_WIDTH_MM - PANEL_INSET_MM * 2.0;
    let step = line_height_mm(9.0);
    let start = plan.cursor.y_mm;
    for (i, text) in wrap_text(DISCLAIMER_TEXT, max_width, 9.0).into_iter().enumerate() {
        let y = start + step * i as f32;
        plan.text_at(MARGIN_MM + PANEL_INSET_MM, y, text, 9.0, FontStyle::Regular, DISCLAIMER_TEXT_COLOR);
    }
}
