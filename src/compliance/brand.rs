//! Brand evaluation of a composited artifact.
//!
//! Three check families, with deliberately different severities:
//!
//! - **Logo** — presence (when required) and filename membership in the
//!   allow-list. Failures are hard violations.
//! - **Palette** — coverage of each required color over a fixed 120×120
//!   downscale of the artifact, L1 pixel distance within `3 × tolerance`.
//!   Coverage below `min_coverage` is a warning, never a violation: brand
//!   colors drifting is reviewable, not shippable-blocking on its own.
//! - **Imagery keywords** — scanned over the generation prompt. A missing
//!   required keyword is a warning; an avoid keyword present is a hard
//!   violation.
//!
//! `passed` is simply "no hard violations". Warnings accumulate into the
//! manifest without flipping it.

use crate::policy::BrandPolicy;
use image::{DynamicImage, imageops::FilterType};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

const SAMPLE_EDGE: u32 = 120;

/// Outcome of evaluating one artifact against the brand policy.
#[derive(Debug, Clone, Serialize)]
pub struct BrandCheckResult {
    pub passed: bool,
    pub checks: BTreeMap<String, bool>,
    pub warnings: Vec<String>,
    pub violations: Vec<String>,
}

/// Parse `#RRGGBB` into channels. `None` for anything else.
fn hex_to_rgb(hex_color: &str) -> Option<[u8; 3]> {
    let value = hex_color.trim().trim_start_matches('#');
    if value.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&value[0..2], 16).ok()?;
    let g = u8::from_str_radix(&value[2..4], 16).ok()?;
    let b = u8::from_str_radix(&value[4..6], 16).ok()?;
    Some([r, g, b])
}

fn channel_distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (i32::from(x) - i32::from(y)).unsigned_abs())
        .sum()
}

/// Fraction of sampled pixels within L1 distance `3 × tolerance` of `target`.
fn palette_coverage(image: &DynamicImage, target: [u8; 3], tolerance: u8) -> f32 {
    let sample = image
        .resize_exact(SAMPLE_EDGE, SAMPLE_EDGE, FilterType::Triangle)
        .to_rgb8();
    let threshold = u32::from(tolerance) * 3;

    let total = sample.pixels().len() as u32;
    if total == 0 {
        return 0.0;
    }
    let matching = sample
        .pixels()
        .filter(|pixel| channel_distance(pixel.0, target) <= threshold)
        .count() as u32;
    matching as f32 / total as f32
}

/// Evaluate the final artifact, its logo, and its prompt against `policy`.
pub fn evaluate_brand_compliance(
    final_image: &DynamicImage,
    policy: &BrandPolicy,
    logo_path: Option<&Path>,
    prompt_text: &str,
) -> BrandCheckResult {
    let mut checks: BTreeMap<String, bool> = BTreeMap::new();
    let mut warnings: Vec<String> = Vec::new();
    let mut violations: Vec<String> = Vec::new();

    let has_logo = logo_path.is_some_and(|path| path.exists());
    checks.insert("logo_present".to_string(), has_logo);
    if policy.logo.required {
        if !has_logo {
            violations.push("Required logo is missing.".to_string());
        } else if let Some(path) = logo_path
            && !policy.logo.expected_filenames.is_empty()
        {
            let expected: Vec<String> = policy
                .logo
                .expected_filenames
                .iter()
                .map(|name| name.to_lowercase())
                .collect();
            let actual = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
                .to_lowercase();
            let matches_expected = expected.contains(&actual);
            checks.insert("logo_expected_filename".to_string(), matches_expected);
            if !matches_expected {
                violations.push(format!(
                    "Logo filename '{actual}' is not in allowed set: {expected:?}."
                ));
            }
        }
    }

    if !policy.colors.required_palette.is_empty() {
        let mut palette_ok = true;
        for hex_color in &policy.colors.required_palette {
            let Some(rgb) = hex_to_rgb(hex_color) else {
                palette_ok = false;
                warnings.push(format!("Unparseable palette color '{hex_color}'."));
                continue;
            };
            let coverage = palette_coverage(final_image, rgb, policy.colors.tolerance);
            let color_ok = coverage >= policy.colors.min_coverage;
            checks.insert(format!("color_{}", hex_color.to_lowercase()), color_ok);
            if !color_ok {
                palette_ok = false;
                warnings.push(format!(
                    "Palette color {hex_color} coverage {coverage:.3} is below threshold {:.3}.",
                    policy.colors.min_coverage
                ));
            }
        }
        checks.insert("palette_compliant".to_string(), palette_ok);
    }

    let prompt_lower = prompt_text.to_lowercase();
    if !policy.imagery.required_keywords.is_empty() {
        let mut required_ok = true;
        for keyword in &policy.imagery.required_keywords {
            let present = prompt_lower.contains(&keyword.to_lowercase());
            checks.insert(format!("imagery_required_{keyword}"), present);
            if !present {
                required_ok = false;
                warnings.push(format!("Imagery keyword '{keyword}' not found in prompt."));
            }
        }
        checks.insert("imagery_required_keywords".to_string(), required_ok);
    }

    for keyword in &policy.imagery.avoid_keywords {
        let present = prompt_lower.contains(&keyword.to_lowercase());
        checks.insert(format!("imagery_avoid_{keyword}"), !present);
        if present {
            violations.push(format!(
                "Prohibited imagery keyword '{keyword}' present in prompt."
            ));
        }
    }

    BrandCheckResult {
        passed: violations.is_empty(),
        checks,
        warnings,
        violations,
    }
}
