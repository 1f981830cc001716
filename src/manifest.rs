//! Run manifest and metrics.
//!
//! Every run writes two JSON documents next to the campaign outputs:
//! `manifest.json`, the per-product record of what was produced and what
//! the compliance gate said, and `metrics.json`, the run's counters. Both
//! are written pretty-printed, once, at the end of the run — a run aborted
//! mid-flight still gets a manifest covering the products it finished.

use crate::compliance::{BrandCheckResult, LegalCheckResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Image save failed at {path}: {message}")]
    ImageSave { path: PathBuf, message: String },
}

/// One product's row in the manifest.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductManifestEntry {
    pub product_id: String,
    pub product_name: String,
    /// `reused`, `generated_last`, `generated_id`, or `generated_new`.
    pub hero_source: String,
    /// Keyed `{ratio}` for English, `{ratio}_{locale}` otherwise, plus
    /// `prompt` and `message_{locale}` entries.
    pub output_files: BTreeMap<String, String>,
    pub compliance: BTreeMap<String, BrandCheckResult>,
    pub legal: BTreeMap<String, LegalCheckResult>,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignManifest {
    pub campaign_id: String,
    pub target_region: String,
    pub target_audience: String,
    pub message: String,
    pub provider: String,
    pub dry_run: bool,
    pub started_at: String,
    pub finished_at: String,
    pub locales_processed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_policy_path: Option<String>,
    pub strict_brand: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_policy_path: Option<String>,
    pub strict_legal: bool,
    pub brand_compliance_summary: String,
    pub legal_compliance_summary: String,
    pub products: Vec<ProductManifestEntry>,
}

/// Counters for one run, serialized to `metrics.json`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunMetrics {
    pub total_products_processed: u32,
    pub products_skipped: u32,
    pub assets_reused: u32,
    pub assets_generated: u32,
    pub total_variants_produced: u32,
    pub execution_time_seconds: f64,
}

/// Wall-clock timer for the metrics document.
pub struct Timer(Instant);

impl Timer {
    pub fn start() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.0.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

/// Current UTC time, RFC 3339 with seconds precision.
pub fn utc_now_iso() -> String {
    chrono::Utc::now()
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Save an artifact as PNG, creating parent directories.
pub fn save_image(image: &image::DynamicImage, path: &Path) -> Result<(), ManifestError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| ManifestError::ImageSave {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Write a serializable document as pretty JSON, creating parents.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), ManifestError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(value)?;
    std::fs::write(path, body)?;
    Ok(())
}
