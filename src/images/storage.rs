//! Filesystem-level image storage.
//!
//! Every image lives in its own file, `{base_dir}/{image_key}`, with no index:
//! existence is checked by looking the file up directly. Writes go to a
//! temporary file in the same directory and are renamed into place, so a
//! reader sees either the previous payload or the new one, never a torn
//! write. Writers to the same key additionally serialize on a per-key lock.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use closet_core::{Error, ImageData, ImageKey, Result};
use uuid::Uuid;

use super::locks::KeyLocks;

/// Durable key → image storage.
///
/// `load` reports absence as `Ok(None)`; only genuine I/O failures become
/// errors. `remove` treats an absent key as success.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, key: ImageKey, image: &ImageData) -> Result<()>;

    async fn load(&self, key: ImageKey) -> Result<Option<ImageData>>;

    async fn remove(&self, key: ImageKey) -> Result<()>;

    /// Delete every stored image, returning how many were removed.
    ///
    /// Best-effort: a failure on one image does not stop the others, and
    /// already-deleted images are not restored, but any failure is reported.
    async fn remove_all(&self) -> Result<usize>;
}

/// Filesystem manager for image storage.
pub struct DiskImageStore {
    base_dir: PathBuf,
    write_locks: KeyLocks,
}

impl DiskImageStore {
    /// Create a new `DiskImageStore` rooted at `base_dir`.
    ///
    /// The directory is created lazily on the first save.
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            write_locks: KeyLocks::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the filesystem path for an image.
    pub fn path_for(&self, key: ImageKey) -> PathBuf {
        self.base_dir.join(key.to_string())
    }

    /// Check whether an image file exists for `key`.
    pub async fn contains(&self, key: ImageKey) -> Result<bool> {
        tokio::fs::try_exists(self.path_for(key))
            .await
            .map_err(|e| Error::persistence(key, e))
    }

    /// Enumerate stored image keys.
    ///
    /// Only files whose names parse as an [`ImageKey`] count; in-flight
    /// temporary files and anything else in the directory are ignored.
    pub async fn keys(&self) -> Result<Vec<ImageKey>> {
        let mut dir = match tokio::fs::read_dir(&self.base_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::from(e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if let Some(key) = entry.file_name().to_str().and_then(|s| s.parse().ok()) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    async fn write_atomic(&self, key: ImageKey, image: &ImageData) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let tmp = self.base_dir.join(format!(".{key}.{}.tmp", Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp, image.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&tmp, self.path_for(key)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }

    async fn remove_file(&self, key: ImageKey) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::persistence(key, e)),
        }
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn save(&self, key: ImageKey, image: &ImageData) -> Result<()> {
        let result = {
            let _guard = self.write_locks.lock(key).await;
            self.write_atomic(key, image).await
        };
        result.map_err(|e| Error::persistence(key, e))?;
        tracing::debug!(%key, bytes = image.size_bytes(), "Stored image on disk");
        Ok(())
    }

    async fn load(&self, key: ImageKey) -> Result<Option<ImageData>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(ImageData::from(bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::persistence(key, e)),
        }
    }

    async fn remove(&self, key: ImageKey) -> Result<()> {
        let _guard = self.write_locks.lock(key).await;
        self.remove_file(key).await
    }

    async fn remove_all(&self) -> Result<usize> {
        let keys = self.keys().await?;
        let total = keys.len();
        let mut removed = 0;
        let mut failed = 0;
        let mut first_failure: Option<Error> = None;

        for key in keys {
            match self.remove(key).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(%key, "Failed to delete image file: {e}");
                    failed += 1;
                    first_failure.get_or_insert(e);
                }
            }
        }

        match first_failure {
            None => {
                tracing::debug!(removed, "Removed all images from disk");
                Ok(removed)
            }
            Some(Error::Persistence { key, source }) => Err(Error::persistence(
                key,
                std::io::Error::new(
                    source.kind(),
                    format!("{failed} of {total} images could not be deleted; first failure: {source}"),
                ),
            )),
            Some(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn payload(fill: u8, len: usize) -> ImageData {
        ImageData::from(vec![fill; len])
    }

    #[test]
    fn test_path_for() {
        let store = DiskImageStore::new(PathBuf::from("/data/images"));
        let key = ImageKey::new();
        assert_eq!(
            store.path_for(key),
            PathBuf::from(format!("/data/images/{key}"))
        );
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path().join("images"));
        let key = ImageKey::new();
        let image = ImageData::from(b"\x89PNG\r\n\x1a\n fake png".to_vec());

        store.save(key, &image).await.unwrap();
        assert_eq!(store.load(key).await.unwrap(), Some(image));
        assert!(store.contains(key).await.unwrap());
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path().to_path_buf());
        assert_eq!(store.load(ImageKey::new()).await.unwrap(), None);

        let never_created = DiskImageStore::new(dir.path().join("nope"));
        assert_eq!(never_created.load(ImageKey::new()).await.unwrap(), None);
        assert!(never_created.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path().to_path_buf());
        let key = ImageKey::new();
        store.save(key, &payload(1, 64)).await.unwrap();
        store.save(key, &payload(2, 8)).await.unwrap();
        assert_eq!(store.load(key).await.unwrap(), Some(payload(2, 8)));
        assert_eq!(store.keys().await.unwrap(), vec![key]);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path().to_path_buf());
        let key = ImageKey::new();
        store.save(key, &payload(1, 4)).await.unwrap();

        store.remove(key).await.unwrap();
        store.remove(key).await.unwrap();
        store.remove(ImageKey::new()).await.unwrap();
        assert_eq!(store.load(key).await.unwrap(), None);
        assert!(store.write_locks.is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the storage directory should be.
        let blocker = dir.path().join("images");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let store = DiskImageStore::new(blocker);
        let key = ImageKey::new();

        let err = store.save(key, &payload(1, 4)).await.unwrap_err();
        assert!(matches!(err, Error::Persistence { key: k, .. } if k == key));
        assert!(matches!(
            store.load(key).await,
            Err(Error::Persistence { .. })
        ));
    }

    #[tokio::test]
    async fn test_remove_all_is_best_effort() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path().to_path_buf());
        let keys: Vec<ImageKey> = (0..10).map(|_| ImageKey::new()).collect();
        for (i, key) in keys.iter().enumerate() {
            if i == 6 {
                // Record #7 cannot be deleted with remove_file.
                let stuck = store.path_for(*key);
                std::fs::create_dir(&stuck).unwrap();
                std::fs::write(stuck.join("inner"), b"x").unwrap();
            } else {
                store.save(*key, &payload(i as u8, 16)).await.unwrap();
            }
        }

        let err = store.remove_all().await.unwrap_err();
        match err {
            Error::Persistence { key, source } => {
                assert_eq!(key, keys[6]);
                assert!(source.to_string().contains("1 of 10"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(store.keys().await.unwrap(), vec![keys[6]]);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(store.path_for(*key).exists(), i == 6, "record #{}", i + 1);
        }
    }

    #[tokio::test]
    async fn test_remove_all_counts_and_ignores_strays() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path().to_path_buf());
        for i in 0..3 {
            store.save(ImageKey::new(), &payload(i, 4)).await.unwrap();
        }
        std::fs::write(dir.path().join("README"), b"stray").unwrap();

        assert_eq!(store.remove_all().await.unwrap(), 3);
        assert!(store.keys().await.unwrap().is_empty());
        assert!(dir.path().join("README").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_same_key_never_tear() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DiskImageStore::new(dir.path().to_path_buf()));
        let key = ImageKey::new();

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..16u8 {
            let store = Arc::clone(&store);
            tasks.spawn(async move {
                store
                    .save(key, &payload(i, 1024 + i as usize * 97))
                    .await
                    .unwrap();
            });
        }
        while let Some(res) = tasks.join_next().await {
            res.unwrap();
        }

        let stored = store.load(key).await.unwrap().unwrap();
        let bytes = stored.as_bytes();
        let fill = bytes[0];
        assert!(bytes.iter().all(|b| *b == fill));
        assert_eq!(bytes.len(), 1024 + fill as usize * 97);
        assert_eq!(store.keys().await.unwrap(), vec![key]);
        assert!(store.write_locks.is_empty());
    }
}
