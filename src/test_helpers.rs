//! Shared test utilities for the campaign-forge test suite.
//!
//! Briefs are built in memory rather than parsed from fixture files — most
//! tests care about one or two fields and the builder keeps the rest valid.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut brief = brief_with_products(&["p1", "p2"]);
//! brief.products[0].prompt = Some("Exact prompt.".to_string());
//!
//! let resolved = resolved_for(&brief, 0);
//! assert!(!resolved.has_reusable_hero());
//! ```

use crate::assets::ResolvedProductAssets;
use crate::brief::{CampaignBrief, ProductBrief};
use image::{Rgb, RgbImage};
use std::path::Path;

/// A valid brief with the given product ids. Names derive from the ids.
pub fn brief_with_products(ids: &[&str]) -> CampaignBrief {
    CampaignBrief {
        campaign_id: "test_campaign".to_string(),
        message: "Feel the glow".to_string(),
        target_region: "US".to_string(),
        target_audience: "Young professionals".to_string(),
        locals: Vec::new(),
        products: ids
            .iter()
            .map(|id| ProductBrief {
                id: id.to_string(),
                name: format!("Product {id}"),
                prompt: None,
                image: None,
                logo: None,
            })
            .collect(),
        visual_style: None,
        prompts: None,
        palette: None,
        negative_prompt: None,
    }
}

/// Resolved assets for one brief product with nothing on disk.
pub fn resolved_for(brief: &CampaignBrief, index: usize) -> ResolvedProductAssets {
    let product = brief.products[index].clone();
    ResolvedProductAssets {
        product_dir: Path::new("assets").join(&product.id),
        product,
        hero_path: None,
        logo_path: None,
        background_path: None,
    }
}

/// Write a solid-color PNG at `path`, creating parent directories.
pub fn solid_png(path: &Path, width: u32, height: u32, rgb: [u8; 3]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_pixel(width, height, Rgb(rgb))
        .save(path)
        .unwrap();
}
