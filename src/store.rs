//! Two-tier generated-image store.
//!
//! The local filesystem is the authoritative tier:
//!
//! ```text
//! {storage_root}/generated/{product_id}/{image_id}.png
//! ```
//!
//! Records are append-only — no deletion, no update. Image identifiers are
//! time-derived and lexicographically sortable, so "most recent" is
//! decidable from identifiers alone with no metadata files:
//!
//! ```text
//! 20260826T142501.183204_000017
//! └── UTC timestamp (µs) ──┘└─ process-monotonic counter
//! ```
//!
//! The counter makes collisions practically impossible within one process.
//! Two concurrent *processes* writing the same product can still race to
//! out-of-order ids — an accepted limitation; there is no distributed lock.
//!
//! An optional [`RemoteMirror`] is the second tier. Writes are mirrored
//! fire-and-forget (a mirror failure is logged and never raised). Reads
//! consult the mirror only on a local miss, and a successful remote read
//! is written back into the local tier so the next lookup is local.

use crate::mirror::{MirrorWrite, RemoteMirror, generated_key};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encode/decode failed at {path}: {message}")]
    Image { path: PathBuf, message: String },
}

static SAVE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Mint a fresh image identifier: microsecond UTC timestamp plus a
/// process-monotonic counter. Later mints always sort later.
fn next_image_id() -> String {
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.6f");
    let counter = SAVE_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{stamp}_{counter:06}")
}

pub struct GeneratedImageStore<'a> {
    generated_root: PathBuf,
    mirror: Option<&'a dyn RemoteMirror>,
}

impl<'a> GeneratedImageStore<'a> {
    pub fn new(
        storage_root: &Path,
        mirror: Option<&'a dyn RemoteMirror>,
    ) -> Result<Self, StoreError> {
        let generated_root = storage_root.join("generated");
        std::fs::create_dir_all(&generated_root)?;
        Ok(Self {
            generated_root,
            mirror,
        })
    }

    fn product_dir(&self, product_id: &str) -> PathBuf {
        self.generated_root.join(product_id)
    }

    fn load_png(&self, path: &Path) -> Result<DynamicImage, StoreError> {
        image::open(path).map_err(|e| StoreError::Image {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Persist a freshly generated hero. Returns the new identifier and
    /// local path. The mirror write is best-effort.
    pub fn save_new(
        &self,
        product_id: &str,
        image: &DynamicImage,
    ) -> Result<(String, PathBuf), StoreError> {
        let image_id = next_image_id();
        let product_dir = self.product_dir(product_id);
        std::fs::create_dir_all(&product_dir)?;
        let image_path = product_dir.join(format!("{image_id}.png"));
        image
            .save_with_format(&image_path, image::ImageFormat::Png)
            .map_err(|e| StoreError::Image {
                path: image_path.clone(),
                message: e.to_string(),
            })?;

        if let Some(mirror) = self.mirror
            && mirror.upload(&image_path, &generated_key(product_id, &image_id))
                == MirrorWrite::Failed
        {
            warn!(product_id, %image_id, "mirror write failed, local copy stands");
        }

        Ok((image_id, image_path))
    }

    /// Most recent record for a product, by identifier ordering. Falls back
    /// to the mirror on a local miss and cache-fills the local tier.
    pub fn load_last_for_product(
        &self,
        product_id: &str,
    ) -> Result<Option<(String, DynamicImage)>, StoreError> {
        let product_dir = self.product_dir(product_id);
        let mut ids: Vec<String> = Vec::new();
        if product_dir.exists() {
            for entry in std::fs::read_dir(&product_dir)? {
                let path = entry?.path();
                if path.is_file()
                    && path.extension().is_some_and(|ext| ext == "png")
                    && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                {
                    ids.push(stem.to_string());
                }
            }
        }
        if let Some(latest) = ids.into_iter().max() {
            let path = product_dir.join(format!("{latest}.png"));
            return Ok(Some((latest, self.load_png(&path)?)));
        }

        // Local miss — consult the mirror. Ids are timestamp-prefixed, so
        // the last sorted key is the most recent record.
        if let Some(mirror) = self.mirror {
            let prefix = format!("generated/{product_id}/");
            let latest_id = mirror
                .list_keys(&prefix)
                .into_iter()
                .filter(|key| key.ends_with(".png"))
                .next_back()
                .and_then(|key| {
                    Path::new(&key)
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .map(str::to_string)
                });
            if let Some(image_id) = latest_id {
                let destination = product_dir.join(format!("{image_id}.png"));
                if mirror.download(&generated_key(product_id, &image_id), &destination) {
                    info!(product_id, %image_id, "cache-filled local tier from mirror");
                    return Ok(Some((image_id, self.load_png(&destination)?)));
                }
            }
        }

        Ok(None)
    }

    /// Exact-identifier lookup across all products. Falls back to the
    /// mirror on a local miss and cache-fills the local tier.
    pub fn load_by_id(
        &self,
        image_id: &str,
    ) -> Result<Option<(String, DynamicImage)>, StoreError> {
        let target_name = format!("{image_id}.png");
        for entry in walkdir::WalkDir::new(&self.generated_root)
            .into_iter()
            .filter_map(Result::ok)
        {
            if entry.file_type().is_file() && entry.file_name().to_string_lossy() == target_name {
                return Ok(Some((image_id.to_string(), self.load_png(entry.path())?)));
            }
        }

        if let Some(mirror) = self.mirror {
            let suffix = format!("/{target_name}");
            let found = mirror
                .list_keys("generated/")
                .into_iter()
                .find(|key| key.ends_with(&suffix));
            // Key shape is generated/{product_id}/{image_id}.png; anything
            // else is not ours to interpret.
            if let Some(key) = found
                && let [_, product_id, _] =
                    key.split('/').collect::<Vec<_>>().as_slice()
            {
                let destination = self.product_dir(product_id).join(&target_name);
                if mirror.download(&key, &destination) {
                    info!(product_id = %product_id, image_id, "cache-filled local tier from mirror");
                    return Ok(Some((image_id.to_string(), self.load_png(&destination)?)));
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::FsMirror;
    use image::{Rgb, RgbImage};

    fn solid(rgb: [u8; 3]) -> DynamicImage {
        let mut image = RgbImage::new(8, 8);
        for pixel in image.pixels_mut() {
            *pixel = Rgb(rgb);
        }
        DynamicImage::ImageRgb8(image)
    }

    #[test]
    fn save_then_load_last_round_trips_bytes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = GeneratedImageStore::new(tmp.path(), None).unwrap();

        let (first_id, _) = store.save_new("p1", &solid([1, 2, 3])).unwrap();
        let (second_id, _) = store.save_new("p1", &solid([9, 8, 7])).unwrap();
        assert!(second_id > first_id, "identifiers must sort chronologically");

        let (loaded_id, image) = store.load_last_for_product("p1").unwrap().unwrap();
        assert_eq!(loaded_id, second_id);
        assert_eq!(
            image.to_rgb8().as_raw(),
            solid([9, 8, 7]).to_rgb8().as_raw()
        );
    }

    #[test]
    fn load_last_is_none_for_unknown_product() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = GeneratedImageStore::new(tmp.path(), None).unwrap();
        assert!(store.load_last_for_product("ghost").unwrap().is_none());
    }

    #[test]
    fn load_by_id_finds_record_across_products() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = GeneratedImageStore::new(tmp.path(), None).unwrap();
        store.save_new("p1", &solid([1, 1, 1])).unwrap();
        let (wanted, _) = store.save_new("p2", &solid([2, 2, 2])).unwrap();

        let (found_id, image) = store.load_by_id(&wanted).unwrap().unwrap();
        assert_eq!(found_id, wanted);
        assert_eq!(
            image.to_rgb8().as_raw(),
            solid([2, 2, 2]).to_rgb8().as_raw()
        );
        assert!(store.load_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn writes_are_mirrored() {
        let local = tempfile::TempDir::new().unwrap();
        let remote = tempfile::TempDir::new().unwrap();
        let mirror = FsMirror::new(remote.path().to_path_buf());
        let store = GeneratedImageStore::new(local.path(), Some(&mirror)).unwrap();

        let (image_id, _) = store.save_new("p1", &solid([5, 5, 5])).unwrap();
        assert!(
            remote
                .path()
                .join(format!("generated/p1/{image_id}.png"))
                .exists()
        );
    }

    #[test]
    fn local_miss_falls_back_to_mirror_and_cache_fills() {
        let seed = tempfile::TempDir::new().unwrap();
        let remote = tempfile::TempDir::new().unwrap();
        let mirror = FsMirror::new(remote.path().to_path_buf());

        // Populate the mirror through one store, then read through a second
        // store with an empty local tier.
        let seeded = GeneratedImageStore::new(seed.path(), Some(&mirror)).unwrap();
        let (image_id, _) = seeded.save_new("p1", &solid([7, 7, 7])).unwrap();

        let fresh_root = tempfile::TempDir::new().unwrap();
        let fresh = GeneratedImageStore::new(fresh_root.path(), Some(&mirror)).unwrap();

        let (found_id, _) = fresh.load_last_for_product("p1").unwrap().unwrap();
        assert_eq!(found_id, image_id);
        // Cache fill: the record is now in the fresh local tier.
        assert!(
            fresh_root
                .path()
                .join(format!("generated/p1/{image_id}.png"))
                .exists()
        );

        // Same fallback for exact-id lookup from another empty tier.
        let other_root = tempfile::TempDir::new().unwrap();
        let other = GeneratedImageStore::new(other_root.path(), Some(&mirror)).unwrap();
        assert!(other.load_by_id(&image_id).unwrap().is_some());
        assert!(
            other_root
                .path()
                .join(format!("generated/p1/{image_id}.png"))
                .exists()
        );
    }

    #[test]
    fn identifier_ordering_not_mtime_decides_last() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = GeneratedImageStore::new(tmp.path(), None).unwrap();
        let (first_id, first_path) = store.save_new("p1", &solid([1, 0, 0])).unwrap();
        let (second_id, _) = store.save_new("p1", &solid([0, 1, 0])).unwrap();

        // Touch the older file so its mtime is newest; identifier order
        // must still win.
        solid([1, 0, 0]).save(&first_path).unwrap();
        let _ = first_id;

        let (loaded_id, _) = store.load_last_for_product("p1").unwrap().unwrap();
        assert_eq!(loaded_id, second_id);
    }
}
