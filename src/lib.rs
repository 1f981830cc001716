//! # Campaign Forge
//!
//! A creative automation pipeline for campaign imagery. A campaign brief is
//! the data source: each product in the brief becomes a matrix of branded
//! artifacts — three aspect ratios, one per output locale, each carrying
//! the campaign message and brand logo — gated by legal and brand
//! compliance policies.
//!
//! # Architecture: One Run, Three Phases
//!
//! ```text
//! 1. Resolve    brief + policies + assets  →  per-product plan
//! 2. Render     hero (reuse/store/provider) → ratio×locale cells
//! 3. Record     manifest.json + metrics.json beside the outputs
//! ```
//!
//! Products are processed sequentially, in brief order. That is a design
//! choice, not a limitation: the output tree, the manifest, and — most
//! importantly — the abort point of a blocking compliance result are all
//! deterministic. A blocked product stops the run exactly where a human
//! reviewer would expect, with everything before it already on disk.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`brief`] | Campaign brief loading and validation (YAML/JSON) |
//! | [`policy`] | Brand and legal policy models and loaders |
//! | [`compliance`] | Pure evaluators: legal text rules, brand artifact rules |
//! | [`assets`] | Per-product asset resolution under the assets root |
//! | [`prompt`] | Hero-generation prompt assembly |
//! | [`localize`] | Locale resolution and campaign message translation |
//! | [`provider`] | Hero image providers: mock gradient, Gemini, Vertex |
//! | [`store`] | Two-tier generated-image store with sortable identifiers |
//! | [`mirror`] | Best-effort remote mirror behind the store and outputs |
//! | [`imaging`] | Ratio variants, logo placement, message overlay |
//! | [`manifest`] | Manifest and metrics documents, JSON/PNG writers |
//! | [`pipeline`] | The orchestrator: one run end to end |
//! | [`output`] | CLI output formatting for finished runs |
//!
//! # Design Decisions
//!
//! ## Reuse Before Generation
//!
//! A hero image is expensive (provider time, money, review effort), so the
//! pipeline exhausts cheaper sources first: an on-disk product asset wins
//! outright, the generated store can be consulted by recency or by exact
//! identifier, and only then does the provider render a fresh hero — which
//! is immediately persisted so the next run can reuse it.
//!
//! ## Identifier-Ordered Store
//!
//! Stored heroes are named by a microsecond UTC timestamp plus a monotonic
//! counter, so lexicographic order **is** chronological order. "Most
//! recent" is decided from names alone — no metadata files, no reliance on
//! filesystem mtimes that copying or mirroring would disturb.
//!
//! ## Compliance as a Gate, Not a Filter
//!
//! Legal rules run on the prompt before any provider spend and on every
//! localized message; brand rules run on every finished cell. A blocking
//! result aborts the whole run rather than silently dropping the offending
//! cell — partial campaigns that look complete are worse than loud
//! failures. Warnings accumulate in the manifest for human review.
//!
//! ## Best-Effort Mirroring
//!
//! The remote mirror (a second filesystem root, or anything speaking the
//! same three verbs) can never fail a run that would succeed locally.
//! Uploads are fire-and-forget; reads happen only on a local miss and
//! cache-fill the local tier.

pub mod assets;
pub mod brief;
pub mod compliance;
pub mod imaging;
pub mod localize;
pub mod manifest;
pub mod mirror;
pub mod output;
pub mod pipeline;
pub mod policy;
pub mod prompt;
pub mod provider;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
