//! CLI output formatting for finished runs.
//!
//! Output is **information-centric, not file-centric**: each product leads
//! with its positional index, name, and hero source, with output cells as
//! indented `ratio → path` context lines. The run footer repeats the
//! compliance summaries and the metrics counters.
//!
//! ```text
//! Campaign summer_glow → output/summer_glow
//! 001 Aurora Serum [generated_new]
//!     1x1 → summer_glow/aurora/1x1/final.png
//!     1x1_es → summer_glow/aurora/1x1/final_es.png
//! 002 Glow Mist [skipped: compliance block: ...]
//!
//! Locales: en, es
//! Brand compliance: 5/6 cells passed
//! Legal compliance: 1 flagged, 0 blocking
//! Produced 6 variants for 1 product in 0.84s (reused 0, generated 1)
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.

use crate::manifest::{CampaignManifest, RunMetrics};
use crate::pipeline::LegalValidationSummary;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Format run output: per-product cells plus the metrics footer.
pub fn format_run_output(
    manifest: &CampaignManifest,
    metrics: &RunMetrics,
    campaign_dir: &Path,
) -> Vec<String> {
    let mut lines = Vec::new();

    let dry_marker = if manifest.dry_run { " (dry run)" } else { "" };
    lines.push(format!(
        "Campaign {} \u{2192} {}{}",
        manifest.campaign_id,
        campaign_dir.display(),
        dry_marker
    ));

    for (i, product) in manifest.products.iter().enumerate() {
        if product.skipped {
            let reason = product.skip_reason.as_deref().unwrap_or("unknown");
            lines.push(format!(
                "{} {} [skipped: {}]",
                format_index(i + 1),
                product.product_name,
                reason
            ));
            continue;
        }
        lines.push(format!(
            "{} {} [{}]",
            format_index(i + 1),
            product.product_name,
            product.hero_source
        ));
        for (key, path) in &product.output_files {
            // Prompt and message entries are text, not files.
            if key == "prompt" || key.starts_with("message_") {
                continue;
            }
            lines.push(format!("    {} \u{2192} {}", key, path));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Locales: {}",
        manifest.locales_processed.join(", ")
    ));
    lines.push(format!(
        "Brand compliance: {}",
        manifest.brand_compliance_summary
    ));
    lines.push(format!(
        "Legal compliance: {}",
        manifest.legal_compliance_summary
    ));

    let products = metrics.total_products_processed;
    let product_word = if products == 1 { "product" } else { "products" };
    lines.push(format!(
        "Produced {} variants for {} {} in {:.2}s (reused {}, generated {})",
        metrics.total_variants_produced,
        products,
        product_word,
        metrics.execution_time_seconds,
        metrics.assets_reused,
        metrics.assets_generated
    ));
    if metrics.products_skipped > 0 {
        lines.push(format!("Skipped {} products", metrics.products_skipped));
    }

    lines
}

/// Print run output to stdout.
pub fn print_run_output(manifest: &CampaignManifest, metrics: &RunMetrics, campaign_dir: &Path) {
    for line in format_run_output(manifest, metrics, campaign_dir) {
        println!("{}", line);
    }
}

/// Format the standalone legal validation report.
pub fn format_legal_output(summary: &LegalValidationSummary) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Checked {} texts: {} flagged, {} blocking",
        summary.texts_checked, summary.flagged, summary.blocked
    ));
    for finding in &summary.findings {
        lines.push(format!("    {}", finding));
    }
    if summary.flagged == 0 {
        lines.push("All campaign texts pass the legal policy".to_string());
    }
    lines
}

/// Print legal validation output to stdout.
pub fn print_legal_output(summary: &LegalValidationSummary) {
    for line in format_legal_output(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ProductManifestEntry;

    fn manifest_with(products: Vec<ProductManifestEntry>) -> CampaignManifest {
        CampaignManifest {
            campaign_id: "camp".to_string(),
            target_region: "US".to_string(),
            target_audience: "Everyone".to_string(),
            message: "Go".to_string(),
            provider: "mock".to_string(),
            dry_run: false,
            started_at: String::new(),
            finished_at: String::new(),
            locales_processed: vec!["en".to_string(), "es".to_string()],
            brand_policy_path: None,
            strict_brand: false,
            legal_policy_path: None,
            strict_legal: false,
            brand_compliance_summary: "not evaluated (no brand policy)".to_string(),
            legal_compliance_summary: "not evaluated (no legal policy)".to_string(),
            products,
        }
    }

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn run_output_lists_cells_and_footer() {
        let mut entry = ProductManifestEntry {
            product_id: "p1".to_string(),
            product_name: "Product One".to_string(),
            hero_source: "reused".to_string(),
            ..Default::default()
        };
        entry
            .output_files
            .insert("1x1".to_string(), "camp/p1/1x1/final.png".to_string());
        entry
            .output_files
            .insert("prompt".to_string(), "a long prompt".to_string());
        entry
            .output_files
            .insert("message_es".to_string(), "[es] Go".to_string());

        let manifest = manifest_with(vec![entry]);
        let metrics = RunMetrics {
            total_products_processed: 1,
            total_variants_produced: 6,
            assets_reused: 1,
            ..Default::default()
        };
        let lines = format_run_output(&manifest, &metrics, Path::new("out/camp"));

        assert_eq!(lines[0], "Campaign camp \u{2192} out/camp");
        assert_eq!(lines[1], "001 Product One [reused]");
        assert_eq!(lines[2], "    1x1 \u{2192} camp/p1/1x1/final.png");
        // Prompt and message entries are suppressed from the cell list.
        assert!(!lines.iter().any(|l| l.contains("a long prompt")));
        assert!(lines.iter().any(|l| l == "Locales: en, es"));
        assert!(lines.last().unwrap().starts_with("Produced 6 variants"));
    }

    #[test]
    fn skipped_product_shows_reason() {
        let entry = ProductManifestEntry {
            product_id: "p2".to_string(),
            product_name: "Product Two".to_string(),
            skipped: true,
            skip_reason: Some("compliance block: bad words".to_string()),
            ..Default::default()
        };
        let manifest = manifest_with(vec![entry]);
        let lines = format_run_output(&manifest, &RunMetrics::default(), Path::new("out/camp"));
        assert_eq!(
            lines[1],
            "001 Product Two [skipped: compliance block: bad words]"
        );
    }

    #[test]
    fn legal_output_reports_clean_pass() {
        let summary = LegalValidationSummary {
            texts_checked: 3,
            ..Default::default()
        };
        let lines = format_legal_output(&summary);
        assert_eq!(lines[0], "Checked 3 texts: 0 flagged, 0 blocking");
        assert_eq!(lines[1], "All campaign texts pass the legal policy");
    }

    #[test]
    fn legal_output_lists_findings() {
        let summary = LegalValidationSummary {
            texts_checked: 2,
            flagged: 1,
            blocked: 1,
            findings: vec!["message[en]: keyword:scam".to_string()],
        };
        let lines = format_legal_output(&summary);
        assert_eq!(lines[0], "Checked 2 texts: 1 flagged, 1 blocking");
        assert_eq!(lines[1], "    message[en]: keyword:scam");
    }
}
