//! Brand logo placement.
//!
//! The logo is alpha-composited into the policy's safe corner, inset by a
//! margin proportional to the artifact width. A logo wider than the
//! policy's `max_relative_width` share of the artifact is downscaled to
//! that cap first; smaller logos are placed as-is. A missing logo file is
//! not an imaging error — the artifact passes through unchanged and the
//! compliance gate reports the absence separately.

use crate::policy::{LogoPolicy, SafeCorner};
use image::imageops::FilterType;
use image::{DynamicImage, imageops};
use std::path::Path;
use tracing::debug;

/// Corner inset as a fraction of the artifact width.
const SAFE_MARGIN_RATIO: f32 = 0.04;

/// Composite the logo at `logo_path` onto `image` per the policy.
///
/// Returns the (possibly unchanged) artifact as RGB. `None` or a
/// nonexistent path is a no-op; an unreadable file is skipped the same
/// way, with a debug log, so a corrupt logo never fails a render.
pub fn overlay_logo(
    image: &DynamicImage,
    logo_path: Option<&Path>,
    policy: &LogoPolicy,
) -> DynamicImage {
    let Some(path) = logo_path.filter(|p| p.is_file()) else {
        return DynamicImage::ImageRgb8(image.to_rgb8());
    };
    let logo = match image::open(path) {
        Ok(logo) => logo.to_rgba8(),
        Err(error) => {
            debug!(path = %path.display(), %error, "logo unreadable, placing nothing");
            return DynamicImage::ImageRgb8(image.to_rgb8());
        }
    };

    let mut canvas = image.to_rgba8();
    let (width, height) = canvas.dimensions();

    let max_logo_width = ((width as f32 * policy.max_relative_width) as u32).max(1);
    let logo = if logo.width() > max_logo_width {
        let scaled_height = ((u64::from(logo.height()) * u64::from(max_logo_width))
            / u64::from(logo.width()).max(1)) as u32;
        imageops::resize(
            &logo,
            max_logo_width,
            scaled_height.max(1),
            FilterType::Lanczos3,
        )
    } else {
        logo
    };

    let margin = (width as f32 * SAFE_MARGIN_RATIO) as u32;
    let x = match policy.safe_corner {
        SafeCorner::TopLeft => i64::from(margin),
        SafeCorner::TopRight => {
            i64::from(width) - i64::from(margin) - i64::from(logo.width())
        }
    };
    let y = i64::from(margin.min(height.saturating_sub(1)));
    imageops::overlay(&mut canvas, &logo, x, y);

    DynamicImage::ImageRgba8(canvas).to_rgb8().into()
}
