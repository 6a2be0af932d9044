//! 解析レポートPDFの描画
//!
//! ページ構成は `report_core::plan_report` が決め、ここでは printpdf に描くだけ。
//! 画像が読めない場合は埋め込みを諦めて代替テキストを出す。

use crate::data_url;
use crate::error::{FractureAssistError, Result};
use chrono::{DateTime, Local, TimeZone};
use fracture_assist_common::export::report_core::{plan_report, FontStyle, ReportElement, ReportImage, REPORT_TITLE};
use fracture_assist_common::layout::{A4_HEIGHT_MM, A4_WIDTH_MM};
use fracture_assist_common::HistoryItem;
use printpdf::image_crate::{self, DynamicImage};
use printpdf::*;
use std::path::Path;

/// 埋め込み画像の解像度
const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;

struct EmbeddedImage {
    image: DynamicImage,
    width_px: u32,
    height_px: u32,
}

struct ReportFonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl ReportFonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self> {
        let add = |font: BuiltinFont| {
            doc.add_builtin_font(font)
                .map_err(|e| FractureAssistError::PdfGeneration(format!("フォント追加エラー: {:?}", e)))
        };
        Ok(Self {
            regular: add(BuiltinFont::Helvetica)?,
            bold: add(BuiltinFont::HelveticaBold)?,
            italic: add(BuiltinFont::HelveticaOblique)?,
        })
    }

    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

/// レポートをファイルに書き出す
pub fn generate_report(item: &HistoryItem, output_path: &Path) -> Result<()> {
    let bytes = render_report(item, &Local::now())?;
    std::fs::write(output_path, bytes)?;
    Ok(())
}

/// レポートPDFのバイト列を生成
pub fn render_report<Tz: TimeZone>(item: &HistoryItem, generated_at: &DateTime<Tz>) -> Result<Vec<u8>>
where
    Tz::Offset: std::fmt::Display,
{
    let embedded = match load_report_image(item) {
        None => None,
        Some(Ok(image)) => Some(image),
        Some(Err(e)) => {
            tracing::warn!(id = %item.id, error = %e, "レポート画像を読み込めないため代替テキストを使用");
            None
        }
    };
    let report_image = match (&embedded, item.image_url.is_some()) {
        (Some(image), _) => ReportImage::Embedded {
            width_px: image.width_px,
            height_px: image.height_px,
        },
        (None, true) => ReportImage::Unavailable,
        (None, false) => ReportImage::Absent,
    };

    let pages = plan_report(item, report_image, generated_at);
    tracing::debug!(id = %item.id, pages = pages.len(), "レポート構成");

    let (doc, page1, layer1) = PdfDocument::new(
        REPORT_TITLE,
        Mm(A4_WIDTH_MM),
        Mm(A4_HEIGHT_MM),
        "Layer 1",
    );
    let fonts = ReportFonts::load(&doc)?;

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (page_ref, layer_ref) = doc.add_page(
                Mm(A4_WIDTH_MM),
                Mm(A4_HEIGHT_MM),
                format!("Layer {}", index + 1),
            );
            doc.get_page(page_ref).get_layer(layer_ref)
        };

        for element in &page.elements {
            draw_element(&layer, element, &fonts, embedded.as_ref());
        }
    }

    doc.save_to_bytes()
        .map_err(|e| FractureAssistError::PdfGeneration(format!("PDF保存エラー: {:?}", e)))
}

fn fill_color(color: [u8; 3]) -> Color {
    Color::Rgb(Rgb::new(
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
        None,
    ))
}

/// 上端基準のY（mm）をPDF座標に変換
fn pdf_y(top_mm: f32) -> Mm {
    Mm(A4_HEIGHT_MM - top_mm)
}

fn draw_element(
    layer: &PdfLayerReference,
    element: &ReportElement,
    fonts: &ReportFonts,
    image: Option<&EmbeddedImage>,
) {
    match element {
        ReportElement::FillRect { x, y, width, height, color } => {
            layer.set_fill_color(fill_color(*color));
            layer.add_rect(Rect::new(Mm(*x), pdf_y(y + height), Mm(x + width), pdf_y(*y)));
        }
        ReportElement::Text { x, y, text, size_pt, style, color } => {
            layer.set_fill_color(fill_color(*color));
            layer.use_text(text.as_str(), *size_pt, Mm(*x), pdf_y(*y), fonts.get(*style));
        }
        ReportElement::Image { x, y, width, height } => {
            let Some(embedded) = image else { return };
            let natural_width_mm = embedded.width_px as f32 / IMAGE_DPI * MM_PER_INCH;
            let natural_height_mm = embedded.height_px as f32 / IMAGE_DPI * MM_PER_INCH;

            Image::from_dynamic_image(&embedded.image).add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(*x)),
                    translate_y: Some(pdf_y(y + height)),
                    scale_x: Some(width / natural_width_mm),
                    scale_y: Some(height / natural_height_mm),
                    dpi: Some(IMAGE_DPI),
                    ..Default::default()
                },
            );
        }
    }
}

/// 画像URL（data URL またはローカルパス）を読み込む。URLがなければ None
fn load_report_image(item: &HistoryItem) -> Option<Result<EmbeddedImage>> {
    let source = item.image_url.as_deref()?;
    Some(read_image_bytes(source).and_then(|bytes| decode_image(&bytes)))
}

fn read_image_bytes(source: &str) -> Result<Vec<u8>> {
    if data_url::is_data_url(source) {
        return data_url::decode(source).map(|(_, bytes)| bytes);
    }
    if source.starts_with("http://") || source.starts_with("https://") {
        return Err(FractureAssistError::ImageDecode(format!(
            "リモート画像は埋め込めません: {}",
            source
        )));
    }
    let path = source.strip_prefix("file://").unwrap_or(source);
    Ok(std::fs::read(path)?)
}

fn decode_image(bytes: &[u8]) -> Result<EmbeddedImage> {
    let decoded = image_crate::load_from_memory(bytes)
        .map_err(|e| FractureAssistError::ImageDecode(e.to_string()))?;
    // アルファは埋め込まずRGBにする
    let rgb = decoded.to_rgb8();
    let (width_px, height_px) = rgb.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err(FractureAssistError::ImageDecode("画像サイズが0です".into()));
    }
    Ok(EmbeddedImage {
        image: DynamicImage::ImageRgb8(rgb),
        width_px,
        height_px,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_image_bytes_rejects_remote() {
        assert!(read_image_bytes("https://example.com/x.png").is_err());
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        assert!(matches!(decode_image(b"garbage"), Err(FractureAssistError::ImageDecode(_))));
    }

    #[test]
    fn test_pdf_y_flips_axis() {
        assert_eq!(pdf_y(0.0), Mm(A4_HEIGHT_MM));
        assert_eq!(pdf_y(A4_HEIGHT_MM), Mm(0.0));
    }
}
