//! In-memory [`ImageStore`] doubles for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use closet_core::{Error, ImageData, ImageKey, Result};
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use super::storage::ImageStore;

fn io_failure(key: ImageKey) -> Error {
    Error::persistence(key, std::io::Error::new(std::io::ErrorKind::Other, "simulated I/O failure"))
}

/// HashMap-backed store that counts loads and can be told to fail writes.
#[derive(Default)]
pub struct MemoryStore {
    images: Mutex<HashMap<ImageKey, ImageData>>,
    loads: AtomicUsize,
    fail_saves: AtomicBool,
    fail_removes: AtomicBool,
}

impl MemoryStore {
    pub fn insert(&self, key: ImageKey, image: ImageData) {
        self.images.lock().insert(key, image);
    }

    pub fn contains(&self, key: &ImageKey) -> bool {
        self.images.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.images.lock().len()
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageStore for MemoryStore {
    async fn save(&self, key: ImageKey, image: &ImageData) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(io_failure(key));
        }
        self.insert(key, image.clone());
        Ok(())
    }

    async fn load(&self, key: ImageKey) -> Result<Option<ImageData>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(self.images.lock().get(&key).cloned())
    }

    async fn remove(&self, key: ImageKey) -> Result<()> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(io_failure(key));
        }
        self.images.lock().remove(&key);
        Ok(())
    }

    async fn remove_all(&self) -> Result<usize> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(io_failure(ImageKey::new()));
        }
        let mut images = self.images.lock();
        let n = images.len();
        images.clear();
        Ok(n)
    }
}

/// Store whose every operation fails with an I/O error.
pub struct FailingStore;

#[async_trait]
impl ImageStore for FailingStore {
    async fn save(&self, key: ImageKey, _image: &ImageData) -> Result<()> {
        Err(io_failure(key))
    }

    async fn load(&self, key: ImageKey) -> Result<Option<ImageData>> {
        Err(io_failure(key))
    }

    async fn remove(&self, key: ImageKey) -> Result<()> {
        Err(io_failure(key))
    }

    async fn remove_all(&self) -> Result<usize> {
        Err(io_failure(ImageKey::new()))
    }
}

/// Store whose `load` reads the bytes and then parks until released.
///
/// Lets a test run other operations while a disk read is in flight.
pub struct GatedStore {
    inner: MemoryStore,
    reached: Notify,
    release: Semaphore,
    waiting: Arc<AtomicUsize>,
}

impl Default for GatedStore {
    fn default() -> Self {
        Self {
            inner: MemoryStore::default(),
            reached: Notify::new(),
            release: Semaphore::new(0),
            waiting: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// Decrements the parked-load counter even when the load is aborted.
struct Parked(Arc<AtomicUsize>);

impl Drop for Parked {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl GatedStore {
    pub fn insert(&self, key: ImageKey, image: ImageData) {
        self.inner.insert(key, image);
    }

    pub fn contains(&self, key: &ImageKey) -> bool {
        self.inner.contains(key)
    }

    /// Wait until some `load` has read its bytes and parked.
    pub async fn wait_until_loading(&self) {
        self.reached.notified().await;
    }

    /// Let `n` parked or future loads finish.
    pub fn release(&self, n: usize) {
        self.release.add_permits(n);
    }

    /// Loads currently parked.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageStore for GatedStore {
    async fn save(&self, key: ImageKey, image: &ImageData) -> Result<()> {
        self.inner.save(key, image).await
    }

    async fn load(&self, key: ImageKey) -> Result<Option<ImageData>> {
        let found = self.inner.images.lock().get(&key).cloned();
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let _parked = Parked(Arc::clone(&self.waiting));
        self.reached.notify_one();
        self.release
            .acquire()
            .await
            .map_err(|e| Error::Internal(e.to_string()))?
            .forget();
        Ok(found)
    }

    async fn remove(&self, key: ImageKey) -> Result<()> {
        self.inner.remove(key).await
    }

    async fn remove_all(&self) -> Result<usize> {
        self.inner.remove_all().await
    }
}
