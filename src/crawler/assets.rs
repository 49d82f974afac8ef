//! Product image storage
//!
//! Images are stored as `<images-dir>/<item_id>.jpg`. Writing goes through a
//! temporary sibling file that is renamed into place, so a rerun replaces the
//! previous image and never leaves a second copy behind.

use crate::crawler::fetcher::Fetcher;
use crate::AssetError;
use std::path::{Path, PathBuf};
use url::Url;

/// Extension given to every stored image
pub const ASSET_EXTENSION: &str = "jpg";

/// Writes downloaded images under a fixed directory
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
}

impl AssetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic storage path for a key
    ///
    /// Characters outside `[A-Za-z0-9._-]` become `_` so a key can never
    /// point outside the image directory.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, AssetError> {
        let key = sanitize_key(key).ok_or(AssetError::EmptyKey)?;
        Ok(self.dir.join(format!("{}.{}", key, ASSET_EXTENSION)))
    }

    /// Downloads `url` and stores it under `key`, replacing any earlier copy
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Where the image was written
    /// * `Err(AssetError)` - Missing key or URL, fetch failure, or write failure
    pub async fn fetch_asset(
        &self,
        fetcher: &Fetcher,
        url: &str,
        key: &str,
    ) -> Result<PathBuf, AssetError> {
        let path = self.path_for(key)?;

        if url.trim().is_empty() {
            return Err(AssetError::MissingUrl {
                key: key.to_string(),
            });
        }

        let url = Url::parse(url).map_err(|e| crate::FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let bytes = fetcher.get_bytes(&url).await?;
        self.store(&path, &bytes).await?;

        tracing::debug!("Stored image for {} at {}", key, path.display());
        Ok(path)
    }

    /// Writes bytes to `path` through a temporary sibling file
    async fn store(&self, path: &Path, bytes: &[u8]) -> Result<(), AssetError> {
        let write_error = |source| AssetError::Write {
            path: path.to_path_buf(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(write_error)?;

        let partial = path.with_extension(format!("{}.part", ASSET_EXTENSION));
        tokio::fs::write(&partial, bytes)
            .await
            .map_err(write_error)?;

        if let Err(e) = tokio::fs::rename(&partial, path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(write_error(e));
        }

        Ok(())
    }
}

/// Replaces unsafe characters; None for keys that would be empty
fn sanitize_key(key: &str) -> Option<String> {
    let key = key.trim();
    if key.is_empty() || key.chars().all(|c| c == '.') {
        return None;
    }

    Some(
        key.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
    )
}
