//! Locale resolution and message localization.
//!
//! ## Locale set
//!
//! English renders first and always, with no filename suffix. With
//! localization enabled, the brief's `locals` list (plus an optional CLI
//! locale) follows in declared order — normalized to `lowercase_underscore`
//! form, deduplicated, and with any `en_*` variant collapsing into the
//! leading `en`.
//!
//! ## Localizers
//!
//! One trait, three implementations, selected once at startup:
//!
//! - [`NoopLocalizer`] — localization disabled; messages pass through.
//! - [`MockLocalizer`] — deterministic `[locale] message` tagging for
//!   offline runs and tests.
//! - [`GeminiLocalizer`] — translation via the Gemini developer API.

use std::fmt::Write as _;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalizeError {
    #[error("Missing API key environment variable: {0}")]
    MissingApiKey(String),
    #[error("Translation request failed for locale '{locale}': {message}")]
    Request { locale: String, message: String },
}

/// Normalize a locale code: trim, lowercase, dashes to underscores.
pub fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('-', "_").to_lowercase()
}

/// `en` and every `en_*` regional variant count as English.
pub fn is_english_locale(locale: &str) -> bool {
    let normalized = normalize_locale(locale);
    normalized == "en" || normalized.starts_with("en_")
}

/// Compute the ordered locale list for a run.
pub fn resolve_output_locales(
    enable_localization: bool,
    brief_locales: &[String],
    cli_locale: Option<&str>,
) -> Vec<String> {
    let mut candidates: Vec<String> = vec!["en".to_string()];
    if enable_localization {
        candidates.extend(brief_locales.iter().cloned());
        if let Some(locale) = cli_locale {
            candidates.push(locale.to_string());
        }
    }

    let mut seen = std::collections::HashSet::new();
    let mut resolved = Vec::new();
    for locale in candidates {
        let normalized = normalize_locale(&locale);
        let canonical = if is_english_locale(&normalized) {
            "en".to_string()
        } else {
            normalized
        };
        if seen.insert(canonical.clone()) {
            resolved.push(canonical);
        }
    }
    resolved
}

/// Translates the campaign message into a target locale.
pub trait MessageLocalizer {
    fn translate(&self, message: &str, target_locale: &str) -> Result<String, LocalizeError>;
}

/// Pass-through localizer used when localization is disabled.
pub struct NoopLocalizer;

impl MessageLocalizer for NoopLocalizer {
    fn translate(&self, message: &str, _target_locale: &str) -> Result<String, LocalizeError> {
        Ok(message.to_string())
    }
}

/// Deterministic localizer for mock-provider runs: tags the message with
/// its locale so localized cells are distinguishable without a network.
pub struct MockLocalizer;

impl MessageLocalizer for MockLocalizer {
    fn translate(&self, message: &str, target_locale: &str) -> Result<String, LocalizeError> {
        Ok(format!("[{target_locale}] {message}"))
    }
}

/// Gemini-backed translation over the developer API.
pub struct GeminiLocalizer {
    api_key: String,
    model: String,
    http: reqwest::blocking::Client,
}

impl GeminiLocalizer {
    pub const API_KEY_ENV: &'static str = "GEMINI_API_KEY";

    pub fn new(model: &str) -> Result<Self, LocalizeError> {
        let api_key = std::env::var(Self::API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LocalizeError::MissingApiKey(Self::API_KEY_ENV.to_string()))?;
        Ok(Self {
            api_key,
            model: model.to_string(),
            http: reqwest::blocking::Client::new(),
        })
    }
}

impl MessageLocalizer for GeminiLocalizer {
    fn translate(&self, message: &str, target_locale: &str) -> Result<String, LocalizeError> {
        if is_english_locale(target_locale) {
            return Ok(message.to_string());
        }

        let mut prompt = String::new();
        let _ = write!(
            prompt,
            "Translate the following marketing campaign message from English into locale '{target_locale}'. \
             Keep intent and concise ad style. Return only the translated message.\n\nMessage: {message}"
        );

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| LocalizeError::Request {
                locale: target_locale.to_string(),
                message: e.to_string(),
            })?;

        let payload: serde_json::Value =
            response.json().map_err(|e| LocalizeError::Request {
                locale: target_locale.to_string(),
                message: e.to_string(),
            })?;

        let translated = payload["candidates"][0]["content"]["parts"]
            .as_array()
            .into_iter()
            .flatten()
            .find_map(|part| part["text"].as_str())
            .map(str::trim)
            .filter(|text| !text.is_empty());

        // An empty translation is not worth failing the run over; the
        // English message ships for that locale instead.
        Ok(translated.unwrap_or(message).to_string())
    }
}

/// Map (localize flag, provider mode, model) to one concrete localizer.
pub fn build_localizer(
    enable_localization: bool,
    provider_mode: &str,
    model: &str,
) -> Result<Box<dyn MessageLocalizer>, LocalizeError> {
    if !enable_localization {
        return Ok(Box::new(NoopLocalizer));
    }
    match provider_mode {
        "mock" => Ok(Box::new(MockLocalizer)),
        "real" => Ok(Box::new(GeminiLocalizer::new(model)?)),
        _ => Ok(Box::new(NoopLocalizer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization() {
        assert_eq!(normalize_locale(" pt-BR "), "pt_br");
        assert_eq!(normalize_locale("ES"), "es");
        assert!(is_english_locale("en-US"));
        assert!(is_english_locale("EN"));
        assert!(!is_english_locale("es"));
    }

    #[test]
    fn disabled_localization_is_english_only() {
        let locales = resolve_output_locales(false, &["es".to_string()], Some("fr"));
        assert_eq!(locales, vec!["en"]);
    }

    #[test]
    fn enabled_localization_normalizes_and_dedupes() {
        let brief_locales = vec!["es".to_string(), "pt-BR".to_string(), "ES".to_string()];
        let locales = resolve_output_locales(true, &brief_locales, None);
        assert_eq!(locales, vec!["en", "es", "pt_br"]);
    }

    #[test]
    fn english_variants_collapse_into_leading_en() {
        let brief_locales = vec!["en-GB".to_string(), "fr".to_string()];
        let locales = resolve_output_locales(true, &brief_locales, Some("en_US"));
        assert_eq!(locales, vec!["en", "fr"]);
    }

    #[test]
    fn cli_locale_appends_after_brief_locales() {
        let locales = resolve_output_locales(true, &["es".to_string()], Some("de"));
        assert_eq!(locales, vec!["en", "es", "de"]);
    }

    #[test]
    fn mock_localizer_tags_message() {
        let localized = MockLocalizer.translate("Buy now", "es").unwrap();
        assert_eq!(localized, "[es] Buy now");
    }

    #[test]
    fn noop_localizer_passes_through() {
        let localized = NoopLocalizer.translate("Buy now", "es").unwrap();
        assert_eq!(localized, "Buy now");
    }
}
