//! Canvas drawing helpers shared by the screens and the variants.

use web_sys::CanvasRenderingContext2d;

pub const BG: &str = "#fff1f2";
pub const ACCENT: &str = "#be185d";
pub const TEXT: &str = "#881337";
pub const MUTED: &str = "#64748b";
pub const TRACK: &str = "#e5e7eb";

/// Heart glyph centered on (x, y).
pub fn heart(ctx: &CanvasRenderingContext2d, x: f64, y: f64, size: f64, color: &str) {
    ctx.set_fill_style_str(color);
    ctx.begin_path();
    ctx.move_to(x, y + size);
    ctx.bezier_curve_to(x - size, y, x - size * 1.5, y - size * 0.5, x, y - size);
    ctx.bezier_curve_to(x + size * 1.5, y - size * 0.5, x + size, y, x, y + size);
    ctx.fill();
}

pub fn clear(ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
    ctx.set_fill_style_str(BG);
    ctx.fill_rect(0.0, 0.0, width, height);
}

pub fn centered_text(ctx: &CanvasRenderingContext2d, text: &str, x: f64, y: f64, font: &str, color: &str) {
    ctx.set_font(font);
    ctx.set_text_align("center");
    ctx.set_fill_style_str(color);
    ctx.fill_text(text, x, y).ok();
}

/// Horizontal gauge filled to `pct` (0..=100).
pub fn gauge(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, pct: f64, color: &str) {
    ctx.set_fill_style_str(TRACK);
    ctx.fill_rect(x, y, w, h);
    ctx.set_fill_style_str(color);
    ctx.fill_rect(x, y, w * pct.clamp(0.0, 100.0) / 100.0, h);
}

/// Multi-line text block, one canvas line per `\n`.
pub fn paragraph(ctx: &CanvasRenderingContext2d, text: &str, x: f64, y: f64, line_h: f64, font: &str, color: &str) {
    for (i, line) in text.lines().enumerate() {
        centered_text(ctx, line, x, y + i as f64 * line_h, font, color);
    }
}
