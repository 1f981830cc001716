//! Campaign message overlay.
//!
//! The message sits in a panel along the bottom of the artifact: the
//! covered region is blurred, masked to rounded corners, washed with a
//! faint brand tint, and the message is set centered inside it with the
//! built-in bitmap face at the largest integer scale that fits.
//!
//! Layout is pure calculation (wrapping and scale selection are plain
//! functions over character counts), so the fitting logic is unit-testable
//! without touching pixels.

use super::bitmap_font::{GLYPH_HEIGHT, GLYPH_TRACKING, GLYPH_WIDTH, glyph, text_width};
use crate::policy::MessageCase;
use image::{DynamicImage, Rgba, RgbaImage, imageops};

const SIDE_PADDING_RATIO: f32 = 0.05;
const BOTTOM_PADDING_RATIO: f32 = 0.04;
const PANEL_HEIGHT_RATIO: f32 = 0.28;
const TEXT_PADDING_X_RATIO: f32 = 0.08;
const TEXT_PADDING_Y_RATIO: f32 = 0.18;
const BLUR_SIGMA: f32 = 15.0;
const CORNER_RADIUS: u32 = 24;
const PANEL_TINT: Rgba<u8> = Rgba([176, 248, 255, 13]);
const TEXT_ALPHA: u8 = 240;
/// Line gap as a fraction of the glyph height.
const LINE_SPACING_RATIO: f32 = 0.35;
const MIN_SCALE: u32 = 2;

/// Parse `#RRGGBB`; anything unparseable falls back to white.
fn normalize_hex_color(color: &str) -> [u8; 3] {
    let value = color.trim().trim_start_matches('#');
    if value.len() != 6 {
        return [255, 255, 255];
    }
    let parse = |range: std::ops::Range<usize>| u8::from_str_radix(&value[range], 16);
    match (parse(0..2), parse(2..4), parse(4..6)) {
        (Ok(r), Ok(g), Ok(b)) => [r, g, b],
        _ => [255, 255, 255],
    }
}

fn apply_case(message: &str, case: MessageCase) -> String {
    match case {
        MessageCase::Normal => message.to_string(),
        MessageCase::AllUpper => message.to_uppercase(),
        MessageCase::AllLower => message.to_lowercase(),
    }
}

/// Greedy word wrap at a maximum pre-scale pixel width. Oversized single
/// words are split by character so no line ever overflows.
fn wrap_text(text: &str, max_width_prescale: u32) -> Vec<String> {
    if max_width_prescale == 0 {
        return if text.is_empty() {
            Vec::new()
        } else {
            vec![text.to_string()]
        };
    }

    // Split a word wider than a full line into line-sized chunks; the last
    // chunk becomes the new current line.
    fn split_oversized_word(word: &str, lines: &mut Vec<String>, max_width: u32) -> String {
        let mut chunk = String::new();
        for character in word.chars() {
            let mut attempt = chunk.clone();
            attempt.push(character);
            if text_width(&attempt) <= max_width || chunk.is_empty() {
                chunk = attempt;
            } else {
                lines.push(chunk);
                chunk = character.to_string();
            }
        }
        chunk
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate) <= max_width_prescale {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if text_width(word) <= max_width_prescale {
                current = word.to_string();
            } else {
                current = split_oversized_word(word, &mut lines, max_width_prescale);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn wrapped_height_prescale(line_count: u32) -> u32 {
    if line_count == 0 {
        return 0;
    }
    let gap = (GLYPH_HEIGHT as f32 * LINE_SPACING_RATIO) as u32;
    line_count * GLYPH_HEIGHT + (line_count - 1) * gap
}

/// Pick the largest integer scale whose wrapped text fits the box.
/// Returns the scale and the lines wrapped at that scale.
fn choose_fitting_scale(message: &str, box_width: u32, box_height: u32) -> (u32, Vec<String>) {
    let mut best = (MIN_SCALE, wrap_text(message, box_width / MIN_SCALE.max(1)));
    let max_scale = (box_height / GLYPH_HEIGHT).max(MIN_SCALE);
    for scale in MIN_SCALE..=max_scale {
        let lines = wrap_text(message, box_width / scale);
        let widest = lines.iter().map(|line| text_width(line)).max().unwrap_or(0);
        if widest * scale <= box_width && wrapped_height_prescale(lines.len() as u32) * scale <= box_height
        {
            best = (scale, lines);
        }
    }
    best
}

fn blend_pixel(base: &mut Rgba<u8>, color: [u8; 3], alpha: u8) {
    let a = f32::from(alpha) / 255.0;
    for channel in 0..3 {
        let b = f32::from(base.0[channel]);
        base.0[channel] = (b * (1.0 - a) + f32::from(color[channel]) * a) as u8;
    }
}

fn inside_rounded_rect(x: u32, y: u32, width: u32, height: u32, radius: u32) -> bool {
    let r = radius.min(width / 2).min(height / 2);
    let (x, y, w, h, r) = (x as i64, y as i64, width as i64, height as i64, r as i64);
    let corner_x = if x < r {
        Some(r - 1)
    } else if x >= w - r {
        Some(w - r)
    } else {
        None
    };
    let corner_y = if y < r {
        Some(r - 1)
    } else if y >= h - r {
        Some(h - r)
    } else {
        None
    };
    match (corner_x, corner_y) {
        (Some(cx), Some(cy)) => {
            let dx = x - cx;
            let dy = y - cy;
            dx * dx + dy * dy <= r * r
        }
        _ => true,
    }
}

fn draw_text_line(
    canvas: &mut RgbaImage,
    line: &str,
    origin_x: u32,
    origin_y: u32,
    scale: u32,
    color: [u8; 3],
) {
    let mut pen_x = origin_x;
    for character in line.chars() {
        let columns = glyph(character);
        for (column_index, column) in columns.iter().enumerate() {
            for row in 0..GLYPH_HEIGHT {
                if column >> row & 1 == 0 {
                    continue;
                }
                for dx in 0..scale {
                    for dy in 0..scale {
                        let px = pen_x + column_index as u32 * scale + dx;
                        let py = origin_y + row * scale + dy;
                        if px < canvas.width() && py < canvas.height() {
                            blend_pixel(canvas.get_pixel_mut(px, py), color, TEXT_ALPHA);
                        }
                    }
                }
            }
        }
        pen_x += (GLYPH_WIDTH + GLYPH_TRACKING) * scale;
    }
}

/// Composite the campaign message panel onto `image`.
pub fn overlay_campaign_message(
    image: &DynamicImage,
    message: &str,
    message_case: MessageCase,
    text_color: &str,
) -> DynamicImage {
    let mut composed = image.to_rgba8();
    let (width, height) = composed.dimensions();

    let side_padding = (width as f32 * SIDE_PADDING_RATIO) as u32;
    let bottom_padding = (height as f32 * BOTTOM_PADDING_RATIO) as u32;
    let panel_height = (height as f32 * PANEL_HEIGHT_RATIO) as u32;
    let x1 = side_padding;
    let x2 = width.saturating_sub(side_padding);
    let y2 = height.saturating_sub(bottom_padding);
    let y1 = y2.saturating_sub(panel_height);
    let panel_width = x2.saturating_sub(x1);
    let panel_height = y2.saturating_sub(y1);
    if panel_width == 0 || panel_height == 0 {
        return DynamicImage::ImageRgba8(composed).to_rgb8().into();
    }

    // Blur the covered region, then paste it back through the rounded mask
    // with the brand tint on top.
    let region = imageops::crop_imm(&composed, x1, y1, panel_width, panel_height).to_image();
    let blurred = imageops::blur(&region, BLUR_SIGMA);
    for y in 0..panel_height {
        for x in 0..panel_width {
            if !inside_rounded_rect(x, y, panel_width, panel_height, CORNER_RADIUS) {
                continue;
            }
            let mut pixel = *blurred.get_pixel(x, y);
            blend_pixel(
                &mut pixel,
                [PANEL_TINT.0[0], PANEL_TINT.0[1], PANEL_TINT.0[2]],
                PANEL_TINT.0[3],
            );
            composed.put_pixel(x1 + x, y1 + y, pixel);
        }
    }

    let text_padding_x = (panel_width as f32 * TEXT_PADDING_X_RATIO) as u32;
    let text_padding_y = (panel_height as f32 * TEXT_PADDING_Y_RATIO) as u32;
    let box_width = panel_width.saturating_sub(2 * text_padding_x).max(1);
    let box_height = panel_height.saturating_sub(2 * text_padding_y).max(1);

    let rendered = apply_case(message, message_case);
    let (scale, lines) = choose_fitting_scale(&rendered, box_width, box_height);
    let total_height = wrapped_height_prescale(lines.len() as u32) * scale;
    let color = normalize_hex_color(text_color);
    let gap = ((GLYPH_HEIGHT as f32 * LINE_SPACING_RATIO) as u32 + GLYPH_HEIGHT) * scale;

    let mut pen_y = y1 + text_padding_y + box_height.saturating_sub(total_height) / 2;
    for line in &lines {
        let line_width = text_width(line) * scale;
        let pen_x = x1 + text_padding_x + box_width.saturating_sub(line_width) / 2;
        draw_text_line(&mut composed, line, pen_x, pen_y, scale, color);
        pen_y += gap;
    }

    DynamicImage::ImageRgba8(composed).to_rgb8().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn hex_color_fallback_is_white() {
        assert_eq!(normalize_hex_color("#FF8800"), [255, 136, 0]);
        assert_eq!(normalize_hex_color("nonsense"), [255, 255, 255]);
        assert_eq!(normalize_hex_color("#12"), [255, 255, 255]);
    }

    #[test]
    fn case_transform() {
        assert_eq!(apply_case("MiXeD", MessageCase::Normal), "MiXeD");
        assert_eq!(apply_case("MiXeD", MessageCase::AllUpper), "MIXED");
        assert_eq!(apply_case("MiXeD", MessageCase::AllLower), "mixed");
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_text("one two three four", text_width("one two"));
        assert!(lines.len() >= 2);
        for line in &lines {
            assert!(text_width(line) <= text_width("one two"), "line: {line}");
        }
    }

    #[test]
    fn wrap_splits_oversized_single_word() {
        let lines = wrap_text("abcdefghij", text_width("abc"));
        assert!(lines.len() > 1);
        let rejoined: String = lines.concat();
        assert_eq!(rejoined, "abcdefghij");
    }

    #[test]
    fn fitting_scale_never_overflows_box() {
        let (scale, lines) = choose_fitting_scale("Launch message", 600, 200);
        let widest = lines.iter().map(|l| text_width(l)).max().unwrap();
        assert!(widest * scale <= 600);
        assert!(wrapped_height_prescale(lines.len() as u32) * scale <= 200);
        assert!(scale >= MIN_SCALE);
    }

    #[test]
    fn overlay_preserves_dimensions_and_touches_panel() {
        let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            400,
            400,
            image::Rgb([40, 40, 40]),
        ));
        let out = overlay_campaign_message(&base, "HELLO WORLD", MessageCase::Normal, "#FFFFFF");
        assert_eq!((out.width(), out.height()), (400, 400));

        let rgb = out.to_rgb8();
        // Pixels well above the panel are untouched; the panel region is not
        // uniformly the base color anymore.
        assert_eq!(rgb.get_pixel(200, 40).0, [40, 40, 40]);
        let panel_changed = (300..390).any(|y| rgb.get_pixel(200, y).0 != [40, 40, 40]);
        assert!(panel_changed);
    }
}
