//! Generation prompt assembly.
//!
//! A product-level `prompt` override is used verbatim, then the brief's
//! campaign-level `prompts` map (keyed by product id). Otherwise the
//! prompt is composed from the brief's campaign fields and optional
//! visual style, always ending with the no-text-overlay instruction
//! (text is set by the overlay stage, never by the image model).

use crate::assets::ResolvedProductAssets;
use crate::brief::CampaignBrief;

/// Build the hero-generation prompt for one product.
pub fn build_generation_prompt(brief: &CampaignBrief, resolved: &ResolvedProductAssets) -> String {
    if let Some(prompt) = &resolved.product.prompt {
        return prompt.clone();
    }
    if let Some(prompt) = brief
        .prompts
        .as_ref()
        .and_then(|prompts| prompts.get(&resolved.product.id))
    {
        return prompt.clone();
    }

    let mut parts = vec![
        format!(
            "Create a premium advertising hero image for product: {}.",
            resolved.product.name
        ),
        format!("Target audience: {}.", brief.target_audience),
        format!("Target region: {}.", brief.target_region),
    ];

    if let Some(style) = &brief.visual_style {
        if !style.keywords.is_empty() {
            parts.push(format!(
                "Visual style keywords: {}.",
                style.keywords.join(", ")
            ));
        }
        if let Some(mood) = style.mood.as_deref().filter(|m| !m.is_empty()) {
            parts.push(format!("Mood: {mood}."));
        }
    }

    if let Some(palette) = brief.palette.as_deref().filter(|p| !p.is_empty()) {
        parts.push(format!("Brand palette: {}.", palette.join(", ")));
    }

    parts.push("No text overlays in the generated image.".to_string());
    parts.join(" ")
}
