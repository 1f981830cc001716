//! Brand and legal policy models.
//!
//! Both policies are plain data loaded once per run from YAML or JSON and
//! shared read-only with the compliance gate. Defaults are chosen so an
//! empty file is a valid (permissive) policy — every section is optional.
//!
//! When the CLI is given no explicit path, `config/brand_policy.yaml` and
//! `config/legal_policy.yaml` under the working directory are used if they
//! exist; a missing default file simply disables that gate.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Policy file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported policy format (use .yaml, .yml, or .json): {0}")]
    UnsupportedFormat(PathBuf),
    #[error("Unable to parse policy file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

// =========================================================================
// Legal policy
// =========================================================================

/// What a flagged hit does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegalAction {
    Warn,
    Block,
}

impl Default for LegalAction {
    fn default() -> Self {
        Self::Warn
    }
}

/// One set of blocked-content rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegalChecks {
    #[serde(default)]
    pub blocked_keywords: Vec<String>,
    #[serde(default)]
    pub blocked_regex: Vec<String>,
}

/// Per-locale addition to the global checks.
///
/// Override lists are **additive** — they extend the global lists, never
/// replace them. A locale override may carry its own `default_action`,
/// which then decides blocking for hits evaluated under that locale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegalLocaleOverride {
    #[serde(default)]
    pub blocked_keywords: Vec<String>,
    #[serde(default)]
    pub blocked_regex: Vec<String>,
    #[serde(default)]
    pub default_action: Option<LegalAction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegalPolicy {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub default_action: LegalAction,
    #[serde(default)]
    pub checks: LegalChecks,
    /// Keyed by normalized locale (`pt_br`) or bare language (`es`).
    #[serde(default)]
    pub locale_overrides: std::collections::BTreeMap<String, LegalLocaleOverride>,
}

fn default_version() -> u32 {
    1
}

// =========================================================================
// Brand policy
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoPolicy {
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_logo_filenames")]
    pub expected_filenames: Vec<String>,
    #[serde(default = "default_safe_corner")]
    pub safe_corner: SafeCorner,
    #[serde(default = "default_logo_width")]
    pub max_relative_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafeCorner {
    TopRight,
    TopLeft,
}

fn default_logo_filenames() -> Vec<String> {
    vec!["logo.png".to_string()]
}

fn default_safe_corner() -> SafeCorner {
    SafeCorner::TopRight
}

fn default_logo_width() -> f32 {
    0.22
}

impl Default for LogoPolicy {
    fn default() -> Self {
        Self {
            required: false,
            expected_filenames: default_logo_filenames(),
            safe_corner: default_safe_corner(),
            max_relative_width: default_logo_width(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorPolicy {
    /// Hex colors (`#RRGGBB`) that must appear in the final artifact.
    #[serde(default)]
    pub required_palette: Vec<String>,
    /// Per-channel tolerance for a pixel to count as "this color".
    #[serde(default = "default_tolerance")]
    pub tolerance: u8,
    /// Minimum fraction of sampled pixels within tolerance.
    #[serde(default = "default_min_coverage")]
    pub min_coverage: f32,
}

fn default_tolerance() -> u8 {
    35
}

fn default_min_coverage() -> f32 {
    0.01
}

impl Default for ColorPolicy {
    fn default() -> Self {
        Self {
            required_palette: Vec::new(),
            tolerance: default_tolerance(),
            min_coverage: default_min_coverage(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageryPolicy {
    #[serde(default)]
    pub required_keywords: Vec<String>,
    #[serde(default)]
    pub avoid_keywords: Vec<String>,
}

/// How the campaign message is set on the artifact.
///
/// The typeface preference list is carried for manifests and future
/// renderers; the built-in face ignores it. Case and color are honored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypographyPolicy {
    #[serde(default)]
    pub primary_typeface: Option<String>,
    #[serde(default)]
    pub fallback_typefaces: Vec<String>,
    #[serde(default = "default_case")]
    pub case: MessageCase,
    #[serde(default = "default_text_color")]
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageCase {
    Normal,
    AllUpper,
    AllLower,
}

fn default_case() -> MessageCase {
    MessageCase::Normal
}

fn default_text_color() -> String {
    "#FFFFFF".to_string()
}

impl Default for TypographyPolicy {
    fn default() -> Self {
        Self {
            primary_typeface: None,
            fallback_typefaces: Vec::new(),
            case: default_case(),
            color: default_text_color(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandPolicy {
    #[serde(default = "default_policy_version")]
    pub policy_version: String,
    #[serde(default = "default_brand_name")]
    pub brand_name: String,
    #[serde(default)]
    pub logo: LogoPolicy,
    #[serde(default)]
    pub colors: ColorPolicy,
    #[serde(default)]
    pub imagery: ImageryPolicy,
    #[serde(default)]
    pub typography: TypographyPolicy,
}

fn default_policy_version() -> String {
    "1.0".to_string()
}

fn default_brand_name() -> String {
    "default-brand".to_string()
}

// =========================================================================
// Loading
// =========================================================================

fn parse_policy<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, PolicyError> {
    if !path.exists() {
        return Err(PolicyError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|e| PolicyError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
        Some("json") => serde_json::from_str(&content).map_err(|e| PolicyError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        _ => Err(PolicyError::UnsupportedFormat(path.to_path_buf())),
    }
}

pub fn load_legal_policy(path: &Path) -> Result<LegalPolicy, PolicyError> {
    parse_policy(path)
}

pub fn load_brand_policy(path: &Path) -> Result<BrandPolicy, PolicyError> {
    parse_policy(path)
}

/// Resolve an optional explicit path against the default location.
///
/// Returns `(policy, path)` when a file was found, `(None, None)` when the
/// default location is simply absent — the gate is then skipped. An explicit
/// path that does not exist is still an error from `load_*_policy`.
pub fn resolve_policy_path(explicit: Option<&Path>, default_name: &str) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = Path::new("config").join(default_name);
            default.exists().then_some(default)
        }
    }
}
