//! Product asset resolution.
//!
//! Pure filesystem lookup: each product maps to `{assets_root}/{product_id}/`
//! and the resolver probes for hero, logo, and background files there. Brief
//! overrides win; otherwise the conventional names are tried in order:
//!
//! ```text
//! hero:       product.png      → product_{id}.png
//! logo:       logo.png         → logo_{id}.png
//! background: background.png   → background_{id}.png
//! ```
//!
//! A product with a hero file on disk is classified `reused`; everything
//! else `generated` — the pipeline's hero-resolution step decides how.

use crate::brief::{CampaignBrief, ProductBrief};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where a product's base hero image comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroSource {
    /// A hero file exists under the assets root; no store or provider involved.
    Reused,
    /// The most recent stored record for this product.
    GeneratedLast,
    /// A stored record selected by explicit identifier.
    GeneratedId,
    /// Freshly produced by the image provider this run.
    GeneratedNew,
}

impl HeroSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reused => "reused",
            Self::GeneratedLast => "generated_last",
            Self::GeneratedId => "generated_id",
            Self::GeneratedNew => "generated_new",
        }
    }

    /// True when the base image came from disk or the store rather than a
    /// fresh provider call. Feeds the reused/generated metrics split.
    pub fn is_reuse(self) -> bool {
        !matches!(self, Self::GeneratedNew)
    }
}

/// Per-product record of resolved on-disk assets. Built once before hero
/// resolution, read-only afterward.
#[derive(Debug, Clone)]
pub struct ResolvedProductAssets {
    pub product: ProductBrief,
    pub product_dir: PathBuf,
    pub hero_path: Option<PathBuf>,
    pub logo_path: Option<PathBuf>,
    pub background_path: Option<PathBuf>,
}

impl ResolvedProductAssets {
    /// True when a reusable hero file exists on disk right now.
    pub fn has_reusable_hero(&self) -> bool {
        self.hero_path.as_deref().is_some_and(Path::exists)
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.exists().then_some(path)
}

fn resolve_named(
    product_dir: &Path,
    override_name: Option<&str>,
    stem: &str,
    product_id: &str,
) -> Option<PathBuf> {
    if let Some(name) = override_name {
        return existing(product_dir.join(name));
    }
    existing(product_dir.join(format!("{stem}.png")))
        .or_else(|| existing(product_dir.join(format!("{stem}_{product_id}.png"))))
}

/// Resolve assets for every product in brief order.
pub fn resolve_product_assets(
    assets_root: &Path,
    brief: &CampaignBrief,
) -> Vec<ResolvedProductAssets> {
    brief
        .products
        .iter()
        .map(|product| {
            let product_dir = assets_root.join(&product.id);
            ResolvedProductAssets {
                hero_path: resolve_named(
                    &product_dir,
                    product.image.as_deref(),
                    "product",
                    &product.id,
                ),
                logo_path: resolve_named(
                    &product_dir,
                    product.logo.as_deref(),
                    "logo",
                    &product.id,
                ),
                background_path: resolve_named(&product_dir, None, "background", &product.id),
                product: product.clone(),
                product_dir,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::brief_with_products;

    #[test]
    fn conventional_names_are_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("p1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("product.png"), b"x").unwrap();
        std::fs::write(dir.join("logo_p1.png"), b"x").unwrap();

        let brief = brief_with_products(&["p1", "p2"]);
        let resolved = resolve_product_assets(tmp.path(), &brief);

        assert!(resolved[0].has_reusable_hero());
        assert_eq!(
            resolved[0].logo_path.as_deref(),
            Some(dir.join("logo_p1.png").as_path())
        );
        assert!(resolved[0].background_path.is_none());
        assert!(!resolved[1].has_reusable_hero());
    }

    #[test]
    fn brief_override_wins_and_must_exist() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("p1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("hero_custom.png"), b"x").unwrap();
        // Conventional file also present; the override must still win.
        std::fs::write(dir.join("product.png"), b"x").unwrap();

        let mut brief = brief_with_products(&["p1", "p2"]);
        brief.products[0].image = Some("hero_custom.png".to_string());
        brief.products[1].image = Some("missing.png".to_string());

        let resolved = resolve_product_assets(tmp.path(), &brief);
        assert_eq!(
            resolved[0].hero_path.as_deref(),
            Some(dir.join("hero_custom.png").as_path())
        );
        // An override naming a nonexistent file does not fall back.
        assert!(resolved[1].hero_path.is_none());
    }

    #[test]
    fn resolution_preserves_brief_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        let brief = brief_with_products(&["zeta", "alpha", "mid"]);
        let resolved = resolve_product_assets(tmp.path(), &brief);
        let ids: Vec<&str> = resolved.iter().map(|r| r.product.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
    }
}
