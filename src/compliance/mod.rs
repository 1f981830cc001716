//! Compliance gate — pure evaluators, stateless given their inputs.
//!
//! Two independent evaluators share one result shape: flagged/blocking
//! booleans plus human-readable hit, warning, and violation lists.
//!
//! - [`legal`] checks text (the generation prompt, each localized message)
//!   against blocked keywords and regexes, with additive locale overrides.
//! - [`brand`] checks a composited artifact plus its prompt against the
//!   brand policy: logo presence, palette coverage, imagery keywords.
//!
//! The gate is invoked twice per product life cycle: once on the built
//! prompt before any rendering, and once per ratio×locale cell on the
//! localized message and final image after rendering.

pub mod brand;
pub mod legal;

pub use brand::{BrandCheckResult, evaluate_brand_compliance};
pub use legal::{LegalCheckResult, evaluate_legal_text};
