//! Artifact rendering — pure Rust over the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Ratio variants** | `resize_to_fill` (Lanczos3) center crop |
//! | **Reused composition** | `imageops::overlay` on derived canvas |
//! | **Message panel** | box blur + rounded mask + bitmap face |
//! | **Logo placement** | alpha composite into the safe corner |
//!
//! The module is split into:
//! - **Variants**: The fixed ratio matrix and per-ratio composition
//! - **Text overlay**: Campaign message panel (pure layout + pixels)
//! - **Logo overlay**: Policy-driven corner placement
//! - **Bitmap font**: The built-in 5×7 face the overlay renders with
mod bitmap_font;
pub mod logo_overlay;
pub mod text_overlay;
pub mod variants;

pub use logo_overlay::overlay_logo;
pub use text_overlay::overlay_campaign_message;
pub use variants::{
    TARGET_VARIANTS, VariantError, compose_reused_variant, create_variant,
};
