//! 検出枠をラスタ画像に描く
//!
//! 描画手順は `fracture_assist_common::overlay` にあり、ここは
//! image/imageproc による `ImageSurface` 実装と PNG 出力だけを持つ。

use crate::data_url;
use crate::error::{FractureAssistError, Result};
use crate::intake::FilePreview;
use ab_glyph::{FontArc, PxScale};
use fracture_assist_common::{render_detections, Detection, ImageSurface, SurfaceRect};
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::io::Cursor;

static LABEL_FONT: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");

pub fn label_font() -> Result<FontArc> {
    FontArc::try_from_slice(LABEL_FONT).map_err(|e| FractureAssistError::ImageDecode(e.to_string()))
}

/// RGBA画像への描画先
pub struct RasterSurface {
    image: RgbaImage,
    font: FontArc,
}

impl RasterSurface {
    pub fn new(image: RgbaImage, font: FontArc) -> Self {
        Self { image, font }
    }

    /// エンコード済み画像（PNG/JPEG等）から作る
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| FractureAssistError::ImageDecode(e.to_string()))?
            .to_rgba8();
        Ok(Self::new(image, label_font()?))
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| FractureAssistError::ImageDecode(e.to_string()))?;
        Ok(buf.into_inner())
    }
}

fn rgba(color: [u8; 3]) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], 0xFF])
}

/// 幅・高さ0の Rect は作れないので1pxに切り上げる
fn pixel_rect(x: f32, y: f32, width: f32, height: f32) -> Option<Rect> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Rect::at(x.round() as i32, y.round() as i32).of_size(
        (width.round() as u32).max(1),
        (height.round() as u32).max(1),
    ))
}

impl ImageSurface for RasterSurface {
    fn stroke_rect(&mut self, rect: SurfaceRect, color: [u8; 3], line_width: u32) {
        // 線幅ぶん矩形を内外に重ねて描く（中心線が元の矩形）
        let half = (line_width / 2) as f32;
        for step in 0..line_width.max(1) {
            let offset = step as f32 - half;
            let outline = pixel_rect(
                rect.x - offset,
                rect.y - offset,
                rect.width + offset * 2.0,
                rect.height + offset * 2.0,
            );
            if let Some(outline) = outline {
                draw_hollow_rect_mut(&mut self.image, outline, rgba(color));
            }
        }
    }

    fn fill_rect(&mut self, rect: SurfaceRect, color: [u8; 3]) {
        if let Some(area) = pixel_rect(rect.x, rect.y, rect.width, rect.height) {
            draw_filled_rect_mut(&mut self.image, area, rgba(color));
        }
    }

    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        text_size(PxScale::from(font_size), &self.font, text).0 as f32
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, font_size: f32, color: [u8; 3]) {
        draw_text_mut(
            &mut self.image,
            rgba(color),
            x.round() as i32,
            y.round() as i32,
            PxScale::from(font_size),
            &self.font,
            text,
        );
    }
}

/// 画像に検出枠を描いて PNG で返す
pub fn render_overlay_png(image_bytes: &[u8], detections: &[Detection]) -> Result<Vec<u8>> {
    let mut surface = RasterSurface::decode(image_bytes)?;
    render_detections(&mut surface, detections);
    surface.encode_png()
}

/// 検出結果を描いた画像を `annotated_image` に入れる
///
/// 検出がなければ何もしない。デコードに失敗した場合は annotated_image を空のままにする。
pub fn annotate_preview(preview: &mut FilePreview) -> Result<()> {
    if preview.detections.is_empty() {
        preview.annotated_image = None;
        return Ok(());
    }

    let png = render_overlay_png(&preview.bytes, &preview.detections)?;
    preview.annotated_image = Some(data_url::encode("image/png", &png));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fracture_assist_common::PALETTE;

    fn white_png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([0xFF, 0xFF, 0xFF, 0xFF]));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn detection(bbox: [f64; 4]) -> Detection {
        Detection {
            class_id: 0,
            class_name: "fracture".to_string(),
            confidence: 0.87,
            bbox,
        }
    }

    #[test]
    fn test_font_loads() {
        let font = label_font().unwrap();
        let surface = RasterSurface::new(RgbaImage::new(1, 1), font);
        assert!(surface.measure_text("fracture 87.0%", 16.0) > 0.0);
    }

    #[test]
    fn test_box_and_label_pixels() {
        let png = render_overlay_png(&white_png(120, 120), &[detection([10.0, 40.0, 50.0, 80.0])]).unwrap();
        let image = image::load_from_memory(&png).unwrap().to_rgba8();
        let color = rgba(PALETTE[0]);

        // 枠の左辺・上辺
        assert_eq!(*image.get_pixel(10, 60), color);
        assert_eq!(*image.get_pixel(30, 40), color);
        // 線幅3なので1px外側も塗られる
        assert_eq!(*image.get_pixel(9, 60), color);
        // 枠の内側は元のまま
        assert_eq!(*image.get_pixel(30, 60), Rgba([0xFF, 0xFF, 0xFF, 0xFF]));
        // ラベル背景（枠の上 24px、テキスト開始前の左端）
        assert_eq!(*image.get_pixel(11, 20), color);
    }

    #[test]
    fn test_second_detection_uses_next_color() {
        let detections = vec![detection([10.0, 40.0, 40.0, 70.0]), detection([60.0, 40.0, 100.0, 70.0])];
        let png = render_overlay_png(&white_png(120, 120), &detections).unwrap();
        let image = image::load_from_memory(&png).unwrap().to_rgba8();

        assert_eq!(*image.get_pixel(10, 55), rgba(PALETTE[0]));
        assert_eq!(*image.get_pixel(100, 55), rgba(PALETTE[1]));
    }

    #[test]
    fn test_box_outside_image_is_not_an_error() {
        let result = render_overlay_png(&white_png(20, 20), &[detection([-30.0, -30.0, 200.0, 200.0])]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_annotate_preview_rejects_undecodable() {
        let mut preview = FilePreview::from_bytes("x.png", white_png(8, 8)).unwrap();
        preview.bytes = b"broken".to_vec();
        preview.detections = vec![detection([1.0, 1.0, 4.0, 4.0])];

        assert!(annotate_preview(&mut preview).is_err());
        assert!(preview.annotated_image.is_none());
    }
}
