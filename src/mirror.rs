//! Best-effort remote mirror.
//!
//! The mirror is a second, optional tier behind the local store and the
//! output tree. Its contract is deliberately weak: uploads are
//! fire-and-forget, listing returns an empty set on any failure, and a
//! failed download is indistinguishable from a missing key. Nothing a
//! mirror does can fail a run that would succeed locally — every operation
//! returns a value the caller logs (at `warn`) and discards.
//!
//! Key scheme (shared by every implementation):
//!
//! ```text
//! generated/{product_id}/{image_id}.png     stored hero images
//! output/{path relative to output root}     campaign outputs
//! ```
//!
//! The shipped implementation, [`FsMirror`], mirrors into a second
//! filesystem root (typically a mounted network share), enabled by the
//! `CAMPAIGN_FORGE_MIRROR_ROOT` environment variable. Anything speaking
//! the same three verbs — an object-store client included — can stand in
//! behind the trait.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable that activates the filesystem mirror.
pub const MIRROR_ROOT_ENV: &str = "CAMPAIGN_FORGE_MIRROR_ROOT";

/// Outcome of a mirror write. Callers log failures and move on.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorWrite {
    Stored,
    Failed,
}

/// The three verbs every mirror speaks.
pub trait RemoteMirror {
    /// Copy a local file to `key`. Never propagates errors.
    fn upload(&self, local_path: &Path, key: &str) -> MirrorWrite;

    /// All keys under `prefix`, sorted ascending. Empty on any failure.
    fn list_keys(&self, prefix: &str) -> Vec<String>;

    /// Fetch `key` into `local_path`. `false` covers both "missing" and
    /// "failed" — the caller cannot and should not distinguish them.
    fn download(&self, key: &str, local_path: &Path) -> bool;
}

impl dyn RemoteMirror + '_ {
    /// Upload an output file under a key derived from its path relative to
    /// the output root. Files outside the root are skipped with a warning.
    pub fn upload_output_file(&self, local_path: &Path, output_root: &Path) {
        let Ok(relative) = local_path.strip_prefix(output_root) else {
            warn!(
                path = %local_path.display(),
                root = %output_root.display(),
                "mirror upload skipped: file is not under the output root"
            );
            return;
        };
        let key = format!("output/{}", relative.display());
        if self.upload(local_path, &key) == MirrorWrite::Failed {
            warn!(%key, "mirror upload failed");
        }
    }
}

/// Build the generated-image key for a product/id pair.
pub fn generated_key(product_id: &str, image_id: &str) -> String {
    format!("generated/{product_id}/{image_id}.png")
}

/// Filesystem-backed mirror rooted at a second directory tree.
pub struct FsMirror {
    root: PathBuf,
}

impl FsMirror {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Activate the mirror when `CAMPAIGN_FORGE_MIRROR_ROOT` is set,
    /// mirroring the original deployment's credential-gated behavior:
    /// absence of configuration means no mirror and no mirror calls.
    pub fn from_env() -> Option<Self> {
        match std::env::var(MIRROR_ROOT_ENV) {
            Ok(root) if !root.trim().is_empty() => {
                debug!(%root, "remote mirror active");
                Some(Self::new(PathBuf::from(root)))
            }
            _ => {
                debug!("no mirror root configured, remote mirror disabled");
                None
            }
        }
    }
}

impl RemoteMirror for FsMirror {
    fn upload(&self, local_path: &Path, key: &str) -> MirrorWrite {
        let destination = self.root.join(key);
        let result = destination
            .parent()
            .map(std::fs::create_dir_all)
            .transpose()
            .and_then(|_| std::fs::copy(local_path, &destination));
        match result {
            Ok(_) => {
                debug!(key, "mirror upload ok");
                MirrorWrite::Stored
            }
            Err(error) => {
                warn!(key, %error, "mirror upload failed");
                MirrorWrite::Failed
            }
        }
    }

    fn list_keys(&self, prefix: &str) -> Vec<String> {
        let base = self.root.join(prefix);
        if !base.exists() {
            return Vec::new();
        }
        let mut keys: Vec<String> = walkdir::WalkDir::new(&base)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .ok()
                    .map(|relative| relative.display().to_string())
            })
            .collect();
        keys.sort();
        keys
    }

    fn download(&self, key: &str, local_path: &Path) -> bool {
        let source = self.root.join(key);
        if !source.is_file() {
            return false;
        }
        let result = local_path
            .parent()
            .map(std::fs::create_dir_all)
            .transpose()
            .and_then(|_| std::fs::copy(&source, local_path));
        match result {
            Ok(_) => {
                debug!(key, "mirror download ok");
                true
            }
            Err(error) => {
                warn!(key, %error, "mirror download failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_then_list_then_download_round_trip() {
        let remote = tempfile::TempDir::new().unwrap();
        let local = tempfile::TempDir::new().unwrap();
        let mirror = FsMirror::new(remote.path().to_path_buf());

        let source = local.path().join("hero.png");
        std::fs::write(&source, b"pixels").unwrap();

        assert_eq!(
            mirror.upload(&source, &generated_key("p1", "a")),
            MirrorWrite::Stored
        );
        assert_eq!(
            mirror.upload(&source, &generated_key("p1", "b")),
            MirrorWrite::Stored
        );

        assert_eq!(
            mirror.list_keys("generated/p1/"),
            vec!["generated/p1/a.png", "generated/p1/b.png"]
        );

        let fetched = local.path().join("fetched.png");
        assert!(mirror.download("generated/p1/b.png", &fetched));
        assert_eq!(std::fs::read(&fetched).unwrap(), b"pixels");
    }

    #[test]
    fn missing_key_download_is_false_not_error() {
        let remote = tempfile::TempDir::new().unwrap();
        let mirror = FsMirror::new(remote.path().to_path_buf());
        let destination = remote.path().join("out.png");
        assert!(!mirror.download("generated/p1/missing.png", &destination));
        assert!(!destination.exists());
    }

    #[test]
    fn upload_of_missing_source_fails_quietly() {
        let remote = tempfile::TempDir::new().unwrap();
        let mirror = FsMirror::new(remote.path().to_path_buf());
        assert_eq!(
            mirror.upload(Path::new("/nonexistent/file.png"), "generated/p/x.png"),
            MirrorWrite::Failed
        );
    }

    #[test]
    fn list_keys_on_empty_prefix_is_empty() {
        let remote = tempfile::TempDir::new().unwrap();
        let mirror = FsMirror::new(remote.path().to_path_buf());
        assert!(mirror.list_keys("generated/none/").is_empty());
    }

    #[test]
    fn output_upload_derives_relative_key() {
        let remote = tempfile::TempDir::new().unwrap();
        let out = tempfile::TempDir::new().unwrap();
        let nested = out.path().join("camp/prod/1x1");
        std::fs::create_dir_all(&nested).unwrap();
        let file = nested.join("final.png");
        std::fs::write(&file, b"x").unwrap();

        let mirror = FsMirror::new(remote.path().to_path_buf());
        let mirror_ref: &dyn RemoteMirror = &mirror;
        mirror_ref.upload_output_file(&file, out.path());

        assert!(remote.path().join("output/camp/prod/1x1/final.png").exists());
    }
}
