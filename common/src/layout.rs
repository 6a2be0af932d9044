//! レポートのレイアウト設定モジュール
//!
//! mm基準のレイアウト定義（上端からのY座標）

// ============================================
// mm基準レイアウト
// ============================================

/// A4サイズ（mm）
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// 余白（mm）
pub const MARGIN_MM: f32 = 20.0;

/// 利用可能幅（mm）
pub const USABLE_WIDTH_MM: f32 = A4_WIDTH_MM - MARGIN_MM * 2.0; // 170mm

/// パネル内の字下げ（mm）
pub const PANEL_INSET_MM: f32 = 5.0;

/// ヘッダー帯
pub const HEADER_HEIGHT_MM: f32 = 45.0;
pub const HEADER_ACCENT_Y_MM: f32 = 35.0;
pub const HEADER_ACCENT_HEIGHT_MM: f32 = 10.0;

/// 本文の開始位置
pub const BODY_START_Y_MM: f32 = 60.0;

/// 行送り
pub const LINE_GAP_MM: f32 = 6.0;
pub const HEADING_GAP_MM: f32 = 8.0;
pub const SECTION_GAP_MM: f32 = 15.0;

/// 画像枠（mm）
pub const IMAGE_WIDTH_MM: f32 = USABLE_WIDTH_MM - PANEL_INSET_MM * 2.0; // 160mm
pub const IMAGE_HEIGHT_MM: f32 = 120.0;

/// 各ブロックを描く前に必要な残り高さ（mm）
pub const IMAGE_BLOCK_MIN_MM: f32 = HEADING_GAP_MM + IMAGE_HEIGHT_MM;
pub const DETECTIONS_BLOCK_MIN_MM: f32 = 40.0;
pub const DETECTION_LINE_MIN_MM: f32 = 10.0;
pub const DISCLAIMER_HEIGHT_MM: f32 = 35.0;

/// フッターのY座標（mm、上から）
pub const FOOTER_Y_MM: f32 = A4_HEIGHT_MM - 10.0;

// ============================================
// 変換係数
// ============================================

/// mm → pt変換 (1mm = 72/25.4 pt ≈ 2.835pt)
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// Helveticaの平均文字幅（em比）
pub const AVG_CHAR_WIDTH_EM: f32 = 0.5;

/// 複数行テキストの行間係数
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;

/// mm → pt 変換
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

/// pt → mm 変換
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / MM_TO_PT
}

/// 概算テキスト幅（mm）
pub fn estimate_text_width_mm(text: &str, font_size_pt: f32) -> f32 {
    pt_to_mm(text.chars().count() as f32 * font_size_pt * AVG_CHAR_WIDTH_EM)
}

/// 複数行テキストの行送り（mm）
pub fn line_height_mm(font_size_pt: f32) -> f32 {
    pt_to_mm(font_size_pt * LINE_HEIGHT_FACTOR)
}

/// 指定幅に収まるよう単語単位で折り返す
pub fn wrap_text(text: &str, max_width_mm: f32, font_size_pt: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if estimate_text_width_mm(&candidate, font_size_pt) > max_width_mm && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ============================================
// 改ページ
// ============================================

/// 縦方向の描画位置とページ番号
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    pub page: usize,
    pub y_mm: f32,
}

impl PageCursor {
    pub fn new(y_mm: f32) -> Self {
        Self { page: 0, y_mm }
    }

    /// 下余白までの残り高さ
    pub fn remaining_mm(&self) -> f32 {
        A4_HEIGHT_MM - MARGIN_MM - self.y_mm
    }

    /// 残りが足りなければ次ページの上余白へ移動。改ページしたら true
    pub fn ensure_space(&mut self, min_height_mm: f32) -> bool {
        if self.remaining_mm() < min_height_mm {
            self.page += 1;
            self.y_mm = MARGIN_MM;
            true
        } else {
            false
        }
    }

    pub fn advance(&mut self, mm: f32) {
        self.y_mm += mm;
    }
}
