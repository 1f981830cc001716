use campaign_forge::pipeline::{RunConfig, run_legal_validation_only, run_pipeline};
use campaign_forge::output;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shared flags for commands that read the brief and legal policy.
#[derive(clap::Args, Clone)]
struct LegalArgs {
    /// Legal policy file (defaults to config/legal_policy.yaml if present)
    #[arg(long)]
    legal_policy: Option<PathBuf>,

    /// Treat every legal hit as blocking
    #[arg(long)]
    strict_legal: bool,
}

#[derive(Parser)]
#[command(name = "campaign-forge")]
#[command(about = "Creative automation pipeline for campaign imagery")]
#[command(long_about = "\
Creative automation pipeline for campaign imagery

A campaign brief (YAML or JSON) is the data source. Each product in the
brief becomes a matrix of branded artifacts: three aspect ratios, one per
output locale, each carrying the campaign message and brand logo.

Input structure:

  brief.yaml                       # Campaign brief (message, products, locales)
  assets/
  ├── aurora_serum/                # One directory per product id
  │   ├── product.png              # Reusable hero (optional)
  │   ├── logo.png                 # Brand logo (optional)
  │   └── background.png           # Backdrop for reused heroes (optional)
  └── glow_mist/
  config/
  ├── brand_policy.yaml            # Brand compliance rules (optional)
  └── legal_policy.yaml            # Blocked-content rules (optional)

Hero resolution (first available wins):
  Reuse:       product.png under the product's asset directory
  Store:       --generated-image last|id pulls from the generated store
  Generate:    the configured provider renders a fresh hero

Outputs land under {output}/{campaign_id}/{product_id}/{ratio}/ with a
manifest.json and metrics.json beside them.")]
#[command(version)]
struct Cli {
    /// Product assets directory
    #[arg(long, default_value = "assets", global = true)]
    assets: PathBuf,

    /// Output directory
    #[arg(long, default_value = "output", global = true)]
    output: PathBuf,

    /// Root for the generated-image store
    #[arg(long, default_value = "storage", global = true)]
    storage: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: brief → heroes → variants → manifest
    Run {
        /// Campaign brief file (.yaml, .yml, or .json)
        #[arg(long)]
        brief: PathBuf,

        /// Image provider: mock or real
        #[arg(long, default_value = "mock")]
        provider: String,

        /// Gemini backend for the real provider: developer or vertex
        #[arg(long, default_value = "developer")]
        gemini_backend: String,

        /// Model identifier for generation and translation
        #[arg(long, default_value = "gemini-2.5-flash-image-preview")]
        gemini_model: String,

        /// Extra output locale appended after the brief's list
        #[arg(long)]
        locale: Option<String>,

        /// Translate the campaign message into the brief's locales
        #[arg(long)]
        localize: bool,

        /// Plan the run without writing images or calling providers
        #[arg(long)]
        dry_run: bool,

        /// Brand policy file (defaults to config/brand_policy.yaml if present)
        #[arg(long)]
        brand_policy: Option<PathBuf>,

        /// Treat brand violations as blocking
        #[arg(long)]
        strict_brand: bool,

        /// Base hero selection: new, last, or id
        #[arg(long, default_value = "new")]
        generated_image: String,

        /// Stored image identifier, required with --generated-image id
        #[arg(long)]
        generated_image_id: Option<String>,

        #[command(flatten)]
        legal: LegalArgs,
    },
    /// Check the brief's texts against the legal policy, nothing else
    LegalCheck {
        /// Campaign brief file (.yaml, .yml, or .json)
        #[arg(long)]
        brief: PathBuf,

        /// Extra output locale appended after the brief's list
        #[arg(long)]
        locale: Option<String>,

        /// Evaluate the brief's locales, not just English
        #[arg(long)]
        localize: bool,

        #[command(flatten)]
        legal: LegalArgs,
    },
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            brief,
            provider,
            gemini_backend,
            gemini_model,
            locale,
            localize,
            dry_run,
            brand_policy,
            strict_brand,
            generated_image,
            generated_image_id,
            legal,
        } => {
            let config = RunConfig {
                brief_path: brief,
                assets_root: cli.assets,
                output_root: cli.output,
                storage_root: cli.storage,
                provider_mode: provider,
                gemini_backend,
                gemini_model,
                locale,
                localize,
                dry_run,
                brand_policy_path: brand_policy,
                strict_brand,
                legal_policy_path: legal.legal_policy,
                strict_legal: legal.strict_legal,
                generated_image_mode: generated_image,
                generated_image_id,
            };
            let report = run_pipeline(&config)?;
            output::print_run_output(&report.manifest, &report.metrics, &report.campaign_dir);
        }
        Command::LegalCheck {
            brief,
            locale,
            localize,
            legal,
        } => {
            let config = RunConfig {
                brief_path: brief,
                assets_root: cli.assets,
                output_root: cli.output,
                storage_root: cli.storage,
                provider_mode: "mock".to_string(),
                gemini_backend: "developer".to_string(),
                gemini_model: String::new(),
                locale,
                localize,
                dry_run: true,
                brand_policy_path: None,
                strict_brand: false,
                legal_policy_path: legal.legal_policy,
                strict_legal: legal.strict_legal,
                generated_image_mode: "new".to_string(),
                generated_image_id: None,
            };
            let summary = run_legal_validation_only(&config)?;
            output::print_legal_output(&summary);
            if summary.blocked > 0 {
                return Err(format!(
                    "{} campaign texts are blocked by the legal policy",
                    summary.blocked
                )
                .into());
            }
        }
    }

    Ok(())
}
