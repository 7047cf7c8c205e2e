//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a temporary image
//! directory and a full [`AppContext`] wired on top of both.

#![allow(dead_code)]

use std::path::PathBuf;

use closet::context::AppContext;
use closet_core::config::Config;
use closet_core::{Category, Clothing, ImageData, ImageKey};
use closet_db::pool::{init_memory_pool, DbPool};
use tempfile::TempDir;

/// Smallest byte string `image::guess_format` recognises as a PNG.
pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// A PNG-looking payload whose tail makes it unique to `n`.
pub fn png(n: u32) -> ImageData {
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.extend_from_slice(&n.to_le_bytes());
    bytes.extend(std::iter::repeat(n as u8).take(64));
    ImageData::from(bytes)
}

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temporary storage directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub config: Config,
    dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. The storage
    /// directory is always replaced with a fresh temporary one.
    pub fn with_config(mut config: Config) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        config.images.storage_dir = dir.path().join("images");
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::with_pool(&config, db.clone());
        Self {
            ctx,
            db,
            config,
            dir,
        }
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.config.images.storage_dir.clone()
    }

    pub fn image_path(&self, key: ImageKey) -> PathBuf {
        self.storage_dir().join(key.to_string())
    }

    /// Save a new clothing item with a unique image.
    pub async fn add_clothing(&self, category: Category, n: u32) -> Clothing {
        let clothing = Clothing::new(category, format!("item {n}"), png(n));
        self.ctx
            .clothing
            .save(&clothing)
            .await
            .expect("failed to save clothing");
        clothing
    }
}
