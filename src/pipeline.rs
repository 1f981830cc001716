//! Campaign run orchestration.
//!
//! One run is a straight pipeline over the brief's products, in brief
//! order, sequentially — determinism of the output tree and of the abort
//! point matters more here than wall-clock parallelism:
//!
//! 1. Load and validate the brief; resolve policies and locales.
//! 2. Per product: resolve assets, build the prompt, gate the prompt
//!    through the legal evaluator, resolve the base hero (reuse → store →
//!    provider), then render every ratio×locale cell (compose, logo,
//!    message overlay), gating each cell's message and artifact.
//! 3. Write `manifest.json` and `metrics.json` next to the outputs.
//!
//! A blocking compliance result aborts the entire run immediately; files
//! already written stay on disk and the manifest records every product
//! finished or attempted up to the abort. A per-product rendering failure
//! is narrower: the product is marked skipped and the run continues.

use crate::assets::{HeroSource, ResolvedProductAssets, resolve_product_assets};
use crate::brief::{BriefError, CampaignBrief, load_brief};
use crate::compliance::{evaluate_brand_compliance, evaluate_legal_text};
use crate::imaging::{compose_reused_variant, create_variant, overlay_campaign_message, overlay_logo};
use crate::imaging::variants::{TARGET_VARIANTS, VariantError};
use crate::localize::{
    LocalizeError, MessageLocalizer, build_localizer, is_english_locale, normalize_locale,
    resolve_output_locales,
};
use crate::manifest::{
    CampaignManifest, ManifestError, ProductManifestEntry, RunMetrics, Timer, save_image,
    utc_now_iso, write_json,
};
use crate::mirror::{FsMirror, RemoteMirror};
use crate::policy::{
    BrandPolicy, LegalPolicy, PolicyError, load_brand_policy, load_legal_policy,
    resolve_policy_path,
};
use crate::prompt::build_generation_prompt;
use crate::provider::{ImageProvider, ProviderError, create_provider};
use crate::store::{GeneratedImageStore, StoreError};
use image::DynamicImage;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

/// Requested size hint for provider-generated heroes. Oversized relative
/// to every target so each ratio crop downscales rather than upscales.
const HERO_SIZE: (u32, u32) = (1536, 1536);

const DEFAULT_BRAND_POLICY: &str = "brand_policy.yaml";
const DEFAULT_LEGAL_POLICY: &str = "legal_policy.yaml";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Brief(#[from] BriefError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Variant(#[from] VariantError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Localize(#[from] LocalizeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("No stored image found with id '{0}'")]
    MissingStoredImage(String),
    #[error("Run aborted: compliance block on product '{product_id}': {reasons}")]
    ComplianceBlocked { product_id: String, reasons: String },
}

/// Everything one run needs, assembled by the CLI.
pub struct RunConfig {
    pub brief_path: PathBuf,
    pub assets_root: PathBuf,
    pub output_root: PathBuf,
    pub storage_root: PathBuf,
    /// `mock` or `real`.
    pub provider_mode: String,
    /// `developer` or `vertex`, for `real` mode.
    pub gemini_backend: String,
    pub gemini_model: String,
    /// Extra locale appended after the brief's list.
    pub locale: Option<String>,
    pub localize: bool,
    pub dry_run: bool,
    pub brand_policy_path: Option<PathBuf>,
    pub strict_brand: bool,
    pub legal_policy_path: Option<PathBuf>,
    pub strict_legal: bool,
    /// Base-hero selection: `new`, `last`, or `id`.
    pub generated_image_mode: String,
    pub generated_image_id: Option<String>,
}

/// What a finished (or aborted) run reports back to the CLI.
#[derive(Debug)]
pub struct PipelineReport {
    pub manifest: CampaignManifest,
    pub metrics: RunMetrics,
    pub campaign_dir: PathBuf,
}

/// Counters for the standalone legal validation command.
#[derive(Debug, Default)]
pub struct LegalValidationSummary {
    pub texts_checked: u32,
    pub flagged: u32,
    pub blocked: u32,
    pub findings: Vec<String>,
}

enum ProductFailure {
    /// The product cannot be rendered; the run continues without it.
    Skip(String),
    /// A blocking compliance result; the run aborts.
    Block(Vec<String>),
    Fatal(PipelineError),
}

struct RunContext<'a> {
    brief: &'a CampaignBrief,
    campaign_dir: PathBuf,
    locale_messages: Vec<(String, String)>,
    brand_policy: Option<BrandPolicy>,
    legal_policy: Option<LegalPolicy>,
    strict_brand: bool,
    strict_legal: bool,
    dry_run: bool,
    provider: Box<dyn ImageProvider>,
    store: GeneratedImageStore<'a>,
    mirror: Option<&'a dyn RemoteMirror>,
    output_root: PathBuf,
    generated_image_mode: String,
    generated_image_id: Option<String>,
}

/// Output filename for one ratio×locale cell. English is unsuffixed.
fn cell_file_name(locale: &str) -> String {
    if is_english_locale(locale) {
        "final.png".to_string()
    } else {
        format!("final_{}.png", normalize_locale(locale))
    }
}

/// Manifest key for one ratio×locale cell.
fn cell_key(ratio: &str, locale: &str) -> String {
    if is_english_locale(locale) {
        ratio.to_string()
    } else {
        format!("{ratio}_{}", normalize_locale(locale))
    }
}

fn message_key(locale: &str) -> String {
    format!("message_{}", normalize_locale(locale))
}

/// Resolve the base hero per the configured mode.
///
/// An on-disk hero always wins. Otherwise `last` tries the most recent
/// stored record and falls through to fresh generation on a miss, while
/// `id` demands its exact record and fails the run when absent.
fn resolve_hero(
    context: &RunContext<'_>,
    resolved: &ResolvedProductAssets,
    prompt: &str,
) -> Result<(HeroSource, Option<DynamicImage>), PipelineError> {
    if resolved.has_reusable_hero() {
        info!(product_id = %resolved.product.id, "reusing on-disk product asset");
        return Ok((HeroSource::Reused, None));
    }

    match context.generated_image_mode.as_str() {
        "last" => {
            if let Some((image_id, image)) =
                context.store.load_last_for_product(&resolved.product.id)?
            {
                info!(
                    product_id = %resolved.product.id,
                    %image_id, "reusing most recent stored hero"
                );
                return Ok((HeroSource::GeneratedLast, Some(image)));
            }
            info!(
                product_id = %resolved.product.id,
                "no stored hero, generating a fresh one"
            );
        }
        "id" => {
            let image_id = context.generated_image_id.as_deref().ok_or_else(|| {
                PipelineError::Configuration(
                    "--generated-image-id is required when the image mode is 'id'".to_string(),
                )
            })?;
            let (_, image) = context
                .store
                .load_by_id(image_id)?
                .ok_or_else(|| PipelineError::MissingStoredImage(image_id.to_string()))?;
            return Ok((HeroSource::GeneratedId, Some(image)));
        }
        "new" => {}
        other => {
            return Err(PipelineError::Configuration(format!(
                "Unknown generated image mode '{other}' (use new, last, or id)"
            )));
        }
    }

    if context.dry_run {
        return Ok((HeroSource::GeneratedNew, None));
    }
    let image = context.provider.generate_hero(
        prompt,
        HERO_SIZE,
        context.brief.negative_prompt.as_deref(),
    )?;
    let (image_id, _) = context.store.save_new(&resolved.product.id, &image)?;
    info!(product_id = %resolved.product.id, %image_id, "stored generated hero");
    Ok((HeroSource::GeneratedNew, Some(image)))
}

fn process_product(
    context: &RunContext<'_>,
    resolved: &ResolvedProductAssets,
    metrics: &mut RunMetrics,
) -> Result<ProductManifestEntry, ProductFailure> {
    let mut entry = ProductManifestEntry {
        product_id: resolved.product.id.clone(),
        product_name: resolved.product.name.clone(),
        ..Default::default()
    };

    let prompt = build_generation_prompt(context.brief, resolved);
    entry
        .output_files
        .insert("prompt".to_string(), prompt.clone());

    // Gate the prompt before any rendering or provider spend.
    if let Some(policy) = &context.legal_policy {
        let result = evaluate_legal_text(&prompt, "en", policy, context.strict_legal);
        if result.should_block {
            return Err(ProductFailure::Block(result.violations));
        }
        for violation in &result.violations {
            warn!(product_id = %resolved.product.id, %violation, "legal warning on prompt");
        }
        entry.legal.insert("prompt".to_string(), result);
    }

    // Configuration mistakes and explicit-id misses fail the run; anything
    // else wrong with one product's hero skips just that product.
    let (hero_source, hero_image) = match resolve_hero(context, resolved, &prompt) {
        Ok(pair) => pair,
        Err(error @ (PipelineError::Configuration(_) | PipelineError::MissingStoredImage(_))) => {
            return Err(ProductFailure::Fatal(error));
        }
        Err(error) => return Err(ProductFailure::Skip(error.to_string())),
    };
    entry.hero_source = hero_source.as_str().to_string();
    if hero_source.is_reuse() {
        metrics.assets_reused += 1;
    } else {
        metrics.assets_generated += 1;
    }

    for (locale, message) in &context.locale_messages {
        entry
            .output_files
            .insert(message_key(locale), message.clone());

        if let Some(policy) = &context.legal_policy {
            let result = evaluate_legal_text(message, locale, policy, context.strict_legal);
            if result.should_block {
                return Err(ProductFailure::Block(result.violations));
            }
            entry.legal.insert(message_key(locale), result);
        }
    }

    let typography = context
        .brand_policy
        .as_ref()
        .map(|policy| policy.typography.clone())
        .unwrap_or_default();
    let logo_policy = context
        .brand_policy
        .as_ref()
        .map(|policy| policy.logo.clone())
        .unwrap_or_default();

    for (ratio_key, _) in TARGET_VARIANTS {
        for (locale, message) in &context.locale_messages {
            let key = cell_key(ratio_key, locale);
            let relative: PathBuf = [
                context.brief.campaign_id.as_str(),
                resolved.product.id.as_str(),
                ratio_key,
                cell_file_name(locale).as_str(),
            ]
            .iter()
            .collect();
            let relative = relative.display().to_string();
            entry.output_files.insert(key.clone(), relative.clone());

            if context.dry_run {
                metrics.total_variants_produced += 1;
                continue;
            }

            let base = match &hero_image {
                Some(image) => create_variant(image, ratio_key)
                    .map_err(|e| ProductFailure::Skip(e.to_string()))?,
                None => compose_reused_variant(resolved, ratio_key)
                    .map_err(|e| ProductFailure::Skip(e.to_string()))?,
            };
            // Message panel first, logo last, so the logo stays crisp even
            // when it reaches into the blurred panel region.
            let with_message = overlay_campaign_message(
                &base,
                message,
                typography.case,
                &typography.color,
            );
            let final_image =
                overlay_logo(&with_message, resolved.logo_path.as_deref(), &logo_policy);

            if let Some(policy) = &context.brand_policy {
                let result = evaluate_brand_compliance(
                    &final_image,
                    policy,
                    resolved.logo_path.as_deref(),
                    &prompt,
                );
                for warning in &result.warnings {
                    warn!(
                        product_id = %resolved.product.id,
                        ratio_key, %locale, %warning, "brand warning"
                    );
                }
                if !result.passed && context.strict_brand {
                    return Err(ProductFailure::Block(result.violations));
                }
                entry.compliance.insert(key.clone(), result);
            }

            let destination = context.output_root.join(&relative);
            save_image(&final_image, &destination)
                .map_err(|e| ProductFailure::Fatal(e.into()))?;
            if let Some(mirror) = context.mirror {
                mirror.upload_output_file(&destination, &context.output_root);
            }
            metrics.total_variants_produced += 1;
        }
    }

    Ok(entry)
}

fn load_policies(
    config: &RunConfig,
) -> Result<
    (
        Option<BrandPolicy>,
        Option<PathBuf>,
        Option<LegalPolicy>,
        Option<PathBuf>,
    ),
    PipelineError,
> {
    let brand_path = resolve_policy_path(config.brand_policy_path.as_deref(), DEFAULT_BRAND_POLICY);
    let legal_path = resolve_policy_path(config.legal_policy_path.as_deref(), DEFAULT_LEGAL_POLICY);
    let brand = brand_path.as_deref().map(load_brand_policy).transpose()?;
    let legal = legal_path.as_deref().map(load_legal_policy).transpose()?;
    Ok((brand, brand_path, legal, legal_path))
}

/// Translate the campaign message into every non-English output locale.
/// A failed translation falls back to English with a warning — a missing
/// translation is a quality problem, not a reason to lose the campaign.
fn localize_messages(
    brief: &CampaignBrief,
    locales: &[String],
    localizer: &dyn MessageLocalizer,
) -> Vec<(String, String)> {
    locales
        .iter()
        .map(|locale| {
            let message = if is_english_locale(locale) {
                brief.message.clone()
            } else {
                match localizer.translate(&brief.message, locale) {
                    Ok(translated) => translated,
                    Err(error) => {
                        warn!(%locale, %error, "localization failed, shipping English");
                        brief.message.clone()
                    }
                }
            };
            (locale.clone(), message)
        })
        .collect()
}

/// Execute one full campaign run.
pub fn run_pipeline(config: &RunConfig) -> Result<PipelineReport, PipelineError> {
    let timer = Timer::start();
    let started_at = utc_now_iso();

    let brief = load_brief(&config.brief_path)?;
    let (brand_policy, brand_path, legal_policy, legal_path) = load_policies(config)?;
    let locales = resolve_output_locales(config.localize, &brief.locals, config.locale.as_deref());
    let localizer = build_localizer(config.localize, &config.provider_mode, &config.gemini_model)?;
    let locale_messages = localize_messages(&brief, &locales, localizer.as_ref());
    let provider = create_provider(
        &config.provider_mode,
        &config.gemini_backend,
        &config.gemini_model,
    )?;

    let mirror_backend = if config.dry_run { None } else { FsMirror::from_env() };
    let mirror: Option<&dyn RemoteMirror> =
        mirror_backend.as_ref().map(|m| m as &dyn RemoteMirror);
    let store = GeneratedImageStore::new(&config.storage_root, mirror)?;

    let resolved_products = resolve_product_assets(&config.assets_root, &brief);
    let campaign_dir = config.output_root.join(&brief.campaign_id);

    info!(
        campaign_id = %brief.campaign_id,
        products = resolved_products.len(),
        locales = ?locales,
        dry_run = config.dry_run,
        "starting campaign run"
    );

    let context = RunContext {
        brief: &brief,
        campaign_dir: campaign_dir.clone(),
        locale_messages,
        brand_policy,
        legal_policy,
        strict_brand: config.strict_brand,
        strict_legal: config.strict_legal,
        dry_run: config.dry_run,
        provider,
        store,
        mirror,
        output_root: config.output_root.clone(),
        generated_image_mode: config.generated_image_mode.clone(),
        generated_image_id: config.generated_image_id.clone(),
    };

    let mut metrics = RunMetrics::default();
    let mut entries: Vec<ProductManifestEntry> = Vec::new();
    let mut abort: Option<(String, Vec<String>)> = None;

    for resolved in &resolved_products {
        match process_product(&context, resolved, &mut metrics) {
            Ok(entry) => {
                metrics.total_products_processed += 1;
                entries.push(entry);
            }
            Err(ProductFailure::Skip(reason)) => {
                error!(product_id = %resolved.product.id, %reason, "skipping product");
                metrics.products_skipped += 1;
                entries.push(ProductManifestEntry {
                    product_id: resolved.product.id.clone(),
                    product_name: resolved.product.name.clone(),
                    skipped: true,
                    skip_reason: Some(reason),
                    ..Default::default()
                });
            }
            Err(ProductFailure::Block(violations)) => {
                let reasons = violations.join("; ");
                error!(
                    product_id = %resolved.product.id,
                    %reasons, "compliance block, aborting run"
                );
                entries.push(ProductManifestEntry {
                    product_id: resolved.product.id.clone(),
                    product_name: resolved.product.name.clone(),
                    skipped: true,
                    skip_reason: Some(format!("compliance block: {reasons}")),
                    ..Default::default()
                });
                abort = Some((resolved.product.id.clone(), violations));
                break;
            }
            Err(ProductFailure::Fatal(error)) => return Err(error),
        }
    }

    metrics.execution_time_seconds = timer.elapsed_seconds();

    let brand_summary = summarize_brand(&entries, context.brand_policy.is_some());
    let legal_summary = summarize_legal(&entries, context.legal_policy.is_some());

    let manifest = CampaignManifest {
        campaign_id: brief.campaign_id.clone(),
        target_region: brief.target_region.clone(),
        target_audience: brief.target_audience.clone(),
        message: brief.message.clone(),
        provider: config.provider_mode.clone(),
        dry_run: config.dry_run,
        started_at,
        finished_at: utc_now_iso(),
        locales_processed: locales,
        brand_policy_path: brand_path.map(|p| p.display().to_string()),
        strict_brand: config.strict_brand,
        legal_policy_path: legal_path.map(|p| p.display().to_string()),
        strict_legal: config.strict_legal,
        brand_compliance_summary: brand_summary,
        legal_compliance_summary: legal_summary,
        products: entries,
    };

    // The manifest covers whatever happened, aborted runs included.
    if !config.dry_run {
        let manifest_path = campaign_dir.join("manifest.json");
        let metrics_path = campaign_dir.join("metrics.json");
        write_json(&manifest, &manifest_path)?;
        write_json(&metrics, &metrics_path)?;
        if let Some(mirror) = context.mirror {
            mirror.upload_output_file(&manifest_path, &config.output_root);
            mirror.upload_output_file(&metrics_path, &config.output_root);
        }
    }

    if let Some((product_id, violations)) = abort {
        return Err(PipelineError::ComplianceBlocked {
            product_id,
            reasons: violations.join("; "),
        });
    }

    info!(
        products = metrics.total_products_processed,
        variants = metrics.total_variants_produced,
        seconds = metrics.execution_time_seconds,
        "campaign run finished"
    );

    Ok(PipelineReport {
        manifest,
        metrics,
        campaign_dir: context.campaign_dir,
    })
}

fn summarize_brand(entries: &[ProductManifestEntry], evaluated: bool) -> String {
    if !evaluated {
        return "not evaluated (no brand policy)".to_string();
    }
    let total: usize = entries.iter().map(|e| e.compliance.len()).sum();
    let passed: usize = entries
        .iter()
        .flat_map(|e| e.compliance.values())
        .filter(|r| r.passed)
        .count();
    format!("{passed}/{total} cells passed")
}

fn summarize_legal(entries: &[ProductManifestEntry], evaluated: bool) -> String {
    if !evaluated {
        return "not evaluated (no legal policy)".to_string();
    }
    let flagged: usize = entries
        .iter()
        .flat_map(|e| e.legal.values())
        .filter(|r| r.flagged)
        .count();
    let blocked = entries.iter().filter(|e| {
        e.skip_reason
            .as_deref()
            .is_some_and(|r| r.starts_with("compliance block"))
    });
    format!("{flagged} flagged, {} blocking", blocked.count())
}

/// Evaluate every campaign text against the legal policy without touching
/// images, providers, or the output tree.
pub fn run_legal_validation_only(
    config: &RunConfig,
) -> Result<LegalValidationSummary, PipelineError> {
    let brief = load_brief(&config.brief_path)?;
    let legal_path = resolve_policy_path(config.legal_policy_path.as_deref(), DEFAULT_LEGAL_POLICY)
        .ok_or_else(|| {
            PipelineError::Configuration(
                "legal validation requires a legal policy (pass --legal-policy or add config/legal_policy.yaml)"
                    .to_string(),
            )
        })?;
    let policy = load_legal_policy(&legal_path)?;
    let locales = resolve_output_locales(config.localize, &brief.locals, config.locale.as_deref());
    // Evaluate what would actually ship: the translated message per locale,
    // not the English source under every rule set.
    let localizer = build_localizer(config.localize, &config.provider_mode, &config.gemini_model)?;
    let locale_messages = localize_messages(&brief, &locales, localizer.as_ref());

    let mut summary = LegalValidationSummary::default();
    let mut check = |label: String, text: &str, locale: &str| {
        let result = evaluate_legal_text(text, locale, &policy, config.strict_legal);
        summary.texts_checked += 1;
        if result.flagged {
            summary.flagged += 1;
            summary
                .findings
                .push(format!("{label}: {}", result.hits.join(", ")));
        }
        if result.should_block {
            summary.blocked += 1;
        }
    };

    for (locale, message) in &locale_messages {
        check(format!("message[{locale}]"), message, locale);
    }
    let resolved_products = resolve_product_assets(&config.assets_root, &brief);
    for resolved in &resolved_products {
        let prompt = build_generation_prompt(&brief, resolved);
        check(format!("prompt[{}]", resolved.product.id), &prompt, "en");
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_naming_suffixes_non_english_locales() {
        assert_eq!(cell_file_name("en"), "final.png");
        assert_eq!(cell_file_name("en-US"), "final.png");
        assert_eq!(cell_file_name("pt-BR"), "final_pt_br.png");
        assert_eq!(cell_key("1x1", "en"), "1x1");
        assert_eq!(cell_key("9x16", "es"), "9x16_es");
    }

    #[test]
    fn summaries_without_policies_say_so() {
        assert_eq!(summarize_brand(&[], false), "not evaluated (no brand policy)");
        assert_eq!(summarize_legal(&[], false), "not evaluated (no legal policy)");
    }
}
