//! Ratio variants of the base hero.
//!
//! The ratio set is fixed and ordered — `1x1`, `9x16`, `16x9` — and that
//! order is part of the output contract: manifest entries and file writes
//! follow it deterministically.
//!
//! Generated heroes are cover-cropped to the target canvas. Reused heroes
//! are never cropped: the product file (often a transparent packshot) is
//! alpha-composited, centered, over a cover-cropped background or a plain
//! white canvas whose size derives from the product's own dimensions.

use crate::assets::ResolvedProductAssets;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage, imageops};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VariantError {
    #[error("Unsupported ratio key: {0}")]
    UnsupportedRatio(String),
    #[error("Product {0} has no hero file for reused composition")]
    MissingHero(String),
    #[error("Failed to open {path}: {message}")]
    Open { path: String, message: String },
}

/// The rendering matrix's ratio axis, in contract order.
pub const TARGET_VARIANTS: [(&str, (u32, u32)); 3] = [
    ("1x1", (1080, 1080)),
    ("9x16", (1080, 1920)),
    ("16x9", (1920, 1080)),
];

/// Canvas size for a reused product image: derived from the product's own
/// dimensions so the packshot is never downscaled to fit a fixed canvas.
fn target_size_from_product(
    product_size: (u32, u32),
    ratio_key: &str,
) -> Result<(u32, u32), VariantError> {
    let (width, height) = product_size;
    match ratio_key {
        "1x1" => {
            let side = width.max(height);
            Ok((side, side))
        }
        "9x16" => Ok((width, ((width as f64 * 16.0 / 9.0).round() as u32).max(1))),
        "16x9" => Ok((((height as f64 * 16.0 / 9.0).round() as u32).max(1), height)),
        other => Err(VariantError::UnsupportedRatio(other.to_string())),
    }
}

/// Scale to cover the target, then center-crop to it exactly.
fn cover_and_center_crop(image: &DynamicImage, target: (u32, u32)) -> DynamicImage {
    image.resize_to_fill(target.0, target.1, FilterType::Lanczos3)
}

/// Center-crop a generated hero into one ratio cell.
pub fn create_variant(
    base_image: &DynamicImage,
    ratio_key: &str,
) -> Result<DynamicImage, VariantError> {
    let (_, target) = TARGET_VARIANTS
        .iter()
        .find(|(key, _)| *key == ratio_key)
        .ok_or_else(|| VariantError::UnsupportedRatio(ratio_key.to_string()))?;
    Ok(cover_and_center_crop(base_image, *target))
}

fn open_image(path: &std::path::Path) -> Result<DynamicImage, VariantError> {
    image::open(path).map_err(|e| VariantError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Alpha-preserving composition for a reused product asset.
///
/// The product file is composited unscaled and centered; only the
/// background (when present) is cover-cropped to the derived canvas.
pub fn compose_reused_variant(
    resolved: &ResolvedProductAssets,
    ratio_key: &str,
) -> Result<DynamicImage, VariantError> {
    let hero_path = resolved
        .hero_path
        .as_deref()
        .ok_or_else(|| VariantError::MissingHero(resolved.product.id.clone()))?;

    let product = open_image(hero_path)?.to_rgba8();
    let target = target_size_from_product(product.dimensions(), ratio_key)?;

    let mut canvas: RgbaImage = match resolved
        .background_path
        .as_deref()
        .filter(|path| path.exists())
    {
        Some(background_path) => {
            cover_and_center_crop(&open_image(background_path)?, target).to_rgba8()
        }
        None => RgbaImage::from_pixel(target.0, target.1, Rgba([255, 255, 255, 255])),
    };

    let offset_x = (i64::from(target.0) - i64::from(product.width())) / 2;
    let offset_y = (i64::from(target.1) - i64::from(product.height())) / 2;
    imageops::overlay(&mut canvas, &product, offset_x, offset_y);

    Ok(DynamicImage::ImageRgba8(canvas).to_rgb8().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{brief_with_products, solid_png};
    use image::RgbImage;

    #[test]
    fn ratio_order_is_fixed() {
        let keys: Vec<&str> = TARGET_VARIANTS.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, vec!["1x1", "9x16", "16x9"]);
    }

    #[test]
    fn variant_matches_target_dimensions() {
        let base = DynamicImage::ImageRgb8(RgbImage::new(1536, 1536));
        for (key, (width, height)) in TARGET_VARIANTS {
            let variant = create_variant(&base, key).unwrap();
            assert_eq!((variant.width(), variant.height()), (width, height));
        }
    }

    #[test]
    fn unknown_ratio_is_rejected() {
        let base = DynamicImage::ImageRgb8(RgbImage::new(16, 16));
        assert!(matches!(
            create_variant(&base, "4x3").unwrap_err(),
            VariantError::UnsupportedRatio(_)
        ));
    }

    #[test]
    fn product_canvas_sizes_derive_from_product() {
        assert_eq!(target_size_from_product((800, 600), "1x1").unwrap(), (800, 800));
        assert_eq!(
            target_size_from_product((900, 600), "9x16").unwrap(),
            (900, 1600)
        );
        assert_eq!(
            target_size_from_product((800, 900), "16x9").unwrap(),
            (1600, 900)
        );
    }

    #[test]
    fn reused_composition_centers_product_on_white() {
        let tmp = tempfile::TempDir::new().unwrap();
        let hero = tmp.path().join("product.png");
        solid_png(&hero, 100, 60, [10, 20, 30]);

        let brief = brief_with_products(&["p1", "p2"]);
        let resolved = ResolvedProductAssets {
            product: brief.products[0].clone(),
            product_dir: tmp.path().to_path_buf(),
            hero_path: Some(hero),
            logo_path: None,
            background_path: None,
        };

        let composed = compose_reused_variant(&resolved, "1x1").unwrap();
        assert_eq!((composed.width(), composed.height()), (100, 100));

        let rgb = composed.to_rgb8();
        // Center pixel is the product; the top-left corner is white canvas.
        assert_eq!(rgb.get_pixel(50, 50).0, [10, 20, 30]);
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn reused_composition_without_hero_is_error() {
        let brief = brief_with_products(&["p1", "p2"]);
        let resolved = ResolvedProductAssets {
            product: brief.products[0].clone(),
            product_dir: std::path::PathBuf::from("."),
            hero_path: None,
            logo_path: None,
            background_path: None,
        };
        assert!(matches!(
            compose_reused_variant(&resolved, "1x1").unwrap_err(),
            VariantError::MissingHero(_)
        ));
    }
}
