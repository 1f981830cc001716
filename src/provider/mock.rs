//! Deterministic offline provider.
//!
//! The hero is a vertical gradient between two colors derived from a
//! sha256 of the prompt, with a small dark label plate in the corner.
//! Identical prompts yield identical pixels, which makes pipeline tests
//! and dry runs reproducible without any network.

use super::{ImageProvider, ProviderError};
use image::{DynamicImage, Rgb, RgbImage};
use sha2::{Digest, Sha256};

pub struct MockProvider;

const LABEL_PLATE: (u32, u32) = (220, 60);
const LABEL_MARGIN: u32 = 20;

fn gradient_colors(prompt: &str) -> ([u8; 3], [u8; 3]) {
    let digest = Sha256::digest(prompt.as_bytes());
    (
        [digest[0], digest[1], digest[2]],
        [digest[3], digest[4], digest[5]],
    )
}

impl ImageProvider for MockProvider {
    fn generate_hero(
        &self,
        prompt: &str,
        size: (u32, u32),
        _negative_prompt: Option<&str>,
    ) -> Result<DynamicImage, ProviderError> {
        let (width, height) = size;
        let (top, bottom) = gradient_colors(prompt);

        let mut image = RgbImage::new(width, height);
        for y in 0..height {
            let blend = f32::from(y as u16) / (height.saturating_sub(1).max(1)) as f32;
            let row = [
                (top[0] as f32 * (1.0 - blend) + bottom[0] as f32 * blend) as u8,
                (top[1] as f32 * (1.0 - blend) + bottom[1] as f32 * blend) as u8,
                (top[2] as f32 * (1.0 - blend) + bottom[2] as f32 * blend) as u8,
            ];
            for x in 0..width {
                image.put_pixel(x, y, Rgb(row));
            }
        }

        // Label plate so mock output is recognizable at a glance.
        let (plate_w, plate_h) = LABEL_PLATE;
        for y in LABEL_MARGIN..(LABEL_MARGIN + plate_h).min(height) {
            for x in LABEL_MARGIN..(LABEL_MARGIN + plate_w).min(width) {
                image.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }

        Ok(DynamicImage::ImageRgb8(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_matches_requested_size() {
        let image = MockProvider.generate_hero("p", (64, 128), None).unwrap();
        assert_eq!((image.width(), image.height()), (64, 128));
    }

    #[test]
    fn identical_prompts_are_pixel_identical() {
        let a = MockProvider.generate_hero("same", (32, 32), None).unwrap();
        let b = MockProvider.generate_hero("same", (32, 32), None).unwrap();
        assert_eq!(a.to_rgb8().as_raw(), b.to_rgb8().as_raw());
    }

    #[test]
    fn different_prompts_differ() {
        let a = MockProvider.generate_hero("one", (32, 32), None).unwrap();
        let b = MockProvider.generate_hero("two", (32, 32), None).unwrap();
        assert_ne!(a.to_rgb8().as_raw(), b.to_rgb8().as_raw());
    }
}
