//! Database doubles for repository unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use closet_core::{ClothingRecord, Error, Result, StyleRecord};
use closet_db::pool::init_memory_pool;
use closet_db::{Entity, EntityStore, SqliteStore};

/// Wraps a real [`SqliteStore`] and fails selected operations on demand.
pub struct FlakyDb {
    inner: SqliteStore,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    fail_removes: AtomicBool,
}

impl FlakyDb {
    pub fn new() -> Arc<Self> {
        let pool = init_memory_pool().unwrap();
        Arc::new(Self {
            inner: SqliteStore::new(pool),
            fail_loads: AtomicBool::new(false),
            fail_saves: AtomicBool::new(false),
            fail_removes: AtomicBool::new(false),
        })
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(Error::database("simulated database failure"))
        } else {
            Ok(())
        }
    }
}

macro_rules! flaky_store {
    ($record:ty) => {
        impl EntityStore<$record> for FlakyDb {
            fn load_all(&self) -> Result<Vec<$record>> {
                Self::check(&self.fail_loads)?;
                EntityStore::<$record>::load_all(&self.inner)
            }

            fn load(&self, id: <$record as Entity>::Id) -> Result<Option<$record>> {
                Self::check(&self.fail_loads)?;
                EntityStore::<$record>::load(&self.inner, id)
            }

            fn save(&self, record: &$record) -> Result<()> {
                Self::check(&self.fail_saves)?;
                EntityStore::<$record>::save(&self.inner, record)
            }

            fn remove(&self, id: <$record as Entity>::Id) -> Result<bool> {
                Self::check(&self.fail_removes)?;
                EntityStore::<$record>::remove(&self.inner, id)
            }

            fn remove_all(&self) -> Result<usize> {
                Self::check(&self.fail_removes)?;
                EntityStore::<$record>::remove_all(&self.inner)
            }
        }
    };
}

flaky_store!(ClothingRecord);
flaky_store!(StyleRecord);

/// Smallest byte string `image::guess_format` recognises as a PNG.
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
