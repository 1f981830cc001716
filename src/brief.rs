//! Campaign brief loading and validation.
//!
//! The brief is the declarative input of every run: campaign metadata, the
//! headline message, and the product list. It is parsed from YAML or JSON,
//! validated field by field, and never mutated afterward — the orchestrator
//! borrows it read-only for the whole run.
//!
//! Validation errors embed a minimal valid example so a user staring at a
//! rejected brief can fix it without opening the docs.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Minimal brief accepted by the loader, embedded in validation errors.
pub const MIN_VALID_EXAMPLE_YAML: &str = "\
campaign_id: demo_campaign
message: \"Primary campaign headline\"
target_region: \"US\"
target_audience: \"Young professionals\"
products:
  - id: product_1
    name: \"Product One\"
  - id: product_2
    name: \"Product Two\"
";

#[derive(Error, Debug)]
pub enum BriefError {
    #[error("Brief file not found: {0}")]
    NotFound(std::path::PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(
        "Unsupported brief format. Use .yaml, .yml, or .json files.\n\nMinimal valid YAML example:\n{MIN_VALID_EXAMPLE_YAML}"
    )]
    UnsupportedFormat,
    #[error("Unable to parse brief file: {0}\n\nMinimal valid YAML example:\n{MIN_VALID_EXAMPLE_YAML}")]
    Parse(String),
    #[error("Brief validation failed:\n{0}\n\nMinimal valid YAML example:\n{MIN_VALID_EXAMPLE_YAML}")]
    Invalid(String),
}

/// Optional art direction carried by the brief and folded into prompts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualStyle {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub palette: Vec<String>,
}

/// One product line within a brief.
///
/// `id` is the identity key — unique within a brief (caller responsibility)
/// and used for asset directories, store paths, and output paths. The
/// optional fields override the prompt builder and the asset resolver's
/// filename conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductBrief {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

/// A validated campaign brief. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignBrief {
    pub campaign_id: String,
    pub message: String,
    pub target_region: String,
    pub target_audience: String,
    /// Locale codes rendered in addition to English when localization is on.
    #[serde(default)]
    pub locals: Vec<String>,
    pub products: Vec<ProductBrief>,
    #[serde(default)]
    pub visual_style: Option<VisualStyle>,
    #[serde(default)]
    pub prompts: Option<std::collections::BTreeMap<String, String>>,
    #[serde(default)]
    pub palette: Option<Vec<String>>,
    #[serde(default)]
    pub negative_prompt: Option<String>,
}

impl CampaignBrief {
    /// Check the invariants the deserializer cannot express.
    ///
    /// Collects every failure instead of stopping at the first so one
    /// round trip surfaces all problems.
    fn validate(&self) -> Result<(), BriefError> {
        let mut errors: Vec<String> = Vec::new();

        let required = [
            ("campaign_id", &self.campaign_id),
            ("message", &self.message),
            ("target_region", &self.target_region),
            ("target_audience", &self.target_audience),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(format!("- {field}: must be a non-empty string"));
            }
        }

        if self.products.len() < 2 {
            errors.push(format!(
                "- products: at least 2 products required, got {}",
                self.products.len()
            ));
        }
        for (index, product) in self.products.iter().enumerate() {
            if product.id.trim().is_empty() {
                errors.push(format!("- products.{index}.id: must be a non-empty string"));
            }
            if product.name.trim().is_empty() {
                errors.push(format!("- products.{index}.name: must be a non-empty string"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(BriefError::Invalid(errors.join("\n")))
        }
    }
}

/// Load and validate a brief from a `.yaml`/`.yml`/`.json` file.
pub fn load_brief(brief_path: &Path) -> Result<CampaignBrief, BriefError> {
    if !brief_path.exists() {
        return Err(BriefError::NotFound(brief_path.to_path_buf()));
    }
    let content = std::fs::read_to_string(brief_path)?;

    let extension = brief_path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let brief: CampaignBrief = match extension.as_deref() {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|e| BriefError::Parse(e.to_string()))?
        }
        Some("json") => {
            serde_json::from_str(&content).map_err(|e| BriefError::Parse(e.to_string()))?
        }
        _ => return Err(BriefError::UnsupportedFormat),
    };

    brief.validate()?;
    Ok(brief)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_brief(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn minimal_example_is_valid() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_brief(&tmp, "brief.yaml", MIN_VALID_EXAMPLE_YAML);
        let brief = load_brief(&path).unwrap();
        assert_eq!(brief.campaign_id, "demo_campaign");
        assert_eq!(brief.products.len(), 2);
        assert!(brief.locals.is_empty());
    }

    #[test]
    fn json_brief_is_accepted() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_brief(
            &tmp,
            "brief.json",
            r#"{
                "campaign_id": "c1",
                "message": "Buy it",
                "target_region": "EU",
                "target_audience": "Everyone",
                "products": [
                    {"id": "a", "name": "A"},
                    {"id": "b", "name": "B"}
                ]
            }"#,
        );
        let brief = load_brief(&path).unwrap();
        assert_eq!(brief.products[1].id, "b");
    }

    #[test]
    fn single_product_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_brief(
            &tmp,
            "brief.yaml",
            "campaign_id: c1\nmessage: m\ntarget_region: US\ntarget_audience: a\nproducts:\n  - id: only\n    name: Only\n",
        );
        let err = load_brief(&path).unwrap_err();
        assert!(matches!(err, BriefError::Invalid(_)));
        assert!(err.to_string().contains("at least 2 products"));
    }

    #[test]
    fn empty_required_field_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_brief(
            &tmp,
            "brief.yaml",
            "campaign_id: \"  \"\nmessage: m\ntarget_region: US\ntarget_audience: a\nproducts:\n  - id: a\n    name: A\n  - id: b\n    name: B\n",
        );
        let err = load_brief(&path).unwrap_err();
        assert!(err.to_string().contains("campaign_id"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_brief(&tmp, "brief.toml", "campaign_id = 'x'");
        assert!(matches!(
            load_brief(&path).unwrap_err(),
            BriefError::UnsupportedFormat
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_brief(Path::new("/nonexistent/brief.yaml")).unwrap_err();
        assert!(matches!(err, BriefError::NotFound(_)));
    }
}
