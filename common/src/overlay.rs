//! 検出枠オーバーレイの描画手順
//!
//! 描画先は `ImageSurface` で抽象化し、ラスタ実装はCLI側に置く。
//! 枠は画像範囲にクリップせず、重なりは検出順に後勝ちで描く。

use crate::types::Detection;

/// 枠の色（検出インデックス mod 8 で選ぶ）
pub const PALETTE: [[u8; 3]; 8] = [
    [0xFF, 0x6B, 0x6B],
    [0x4E, 0xCD, 0xC4],
    [0x45, 0xB7, 0xD1],
    [0xFF, 0xA0, 0x7A],
    [0x98, 0xD8, 0xC8],
    [0xF7, 0xDC, 0x6F],
    [0xBB, 0x8F, 0xCE],
    [0x85, 0xC1, 0xE2],
];

pub const STROKE_WIDTH: u32 = 3;
pub const LABEL_FONT_SIZE: f32 = 16.0;
pub const LABEL_TEXT_HEIGHT: f32 = 20.0;
pub const LABEL_PADDING: f32 = 4.0;
pub const LABEL_TEXT_COLOR: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// 軸平行の矩形（ピクセル座標、浮動小数）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// 描画先の抽象
pub trait ImageSurface {
    fn stroke_rect(&mut self, rect: SurfaceRect, color: [u8; 3], line_width: u32);

    fn fill_rect(&mut self, rect: SurfaceRect, color: [u8; 3]);

    /// テキスト幅（ピクセル）
    fn measure_text(&self, text: &str, font_size: f32) -> f32;

    /// (x, y) はテキスト左上
    fn draw_text(&mut self, text: &str, x: f32, y: f32, font_size: f32, color: [u8; 3]);
}

pub fn color_for_index(index: usize) -> [u8; 3] {
    PALETTE[index % PALETTE.len()]
}

/// 全検出の枠とラベルを描く
pub fn render_detections<S: ImageSurface + ?Sized>(surface: &mut S, detections: &[Detection]) {
    for (index, detection) in detections.iter().enumerate() {
        draw_detection(surface, index, detection);
    }
}

fn draw_detection<S: ImageSurface + ?Sized>(surface: &mut S, index: usize, detection: &Detection) {
    let color = color_for_index(index);
    let [x1, y1, x2, y2] = detection.bbox.map(|v| v as f32);

    surface.stroke_rect(
        SurfaceRect { x: x1, y: y1, width: x2 - x1, height: y2 - y1 },
        color,
        STROKE_WIDTH,
    );

    // ラベル背景は枠の上辺のすぐ上
    let label = detection.label();
    let text_width = surface.measure_text(&label, LABEL_FONT_SIZE);
    let background = SurfaceRect {
        x: x1,
        y: y1 - LABEL_TEXT_HEIGHT - LABEL_PADDING,
        width: text_width + LABEL_PADDING * 2.0,
        height: LABEL_TEXT_HEIGHT + LABEL_PADDING,
    };
    surface.fill_rect(background, color);
    surface.draw_text(
        &label,
        x1 + LABEL_PADDING,
        background.y + LABEL_PADDING,
        LABEL_FONT_SIZE,
        LABEL_TEXT_COLOR,
    );
}
