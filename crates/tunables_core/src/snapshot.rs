//! Process-wide and per-unit-of-work façades over factory + cache.
//!
//! [`OptionsManager`] serves from the shared, process-lifetime cache: its
//! values persist across calls until monitor activity invalidates them.
//! [`OptionsSnapshot`] owns a fresh private cache, so every snapshot
//! instance resolves each name at most once and repeated reads within one
//! unit of work (a request, a job) stay stable even while a concurrent
//! rebuild replaces the shared cache's values.

use std::sync::Arc;

use crate::cache::OptionsCache;
use crate::error::OptionsError;
use crate::factory::OptionsFactory;
use crate::name::InstanceName;
use crate::options::Options;

// ─────────────────────────────────────────────────────────────────────────────
// OptionsManager
// ─────────────────────────────────────────────────────────────────────────────

/// Process-wide access to cached tunables values.
///
/// Shares its cache with the type's
/// [`OptionsMonitor`](crate::monitor::OptionsMonitor), so change-triggered
/// rebuilds are what subsequent `get` calls observe.
pub struct OptionsManager<T: Options> {
    factory: Arc<OptionsFactory<T>>,
    cache: Arc<OptionsCache<T>>,
}

impl<T: Options> OptionsManager<T> {
    /// Creates a manager over a shared factory and cache.
    #[must_use]
    pub fn new(factory: Arc<OptionsFactory<T>>, cache: Arc<OptionsCache<T>>) -> Self {
        Self { factory, cache }
    }

    /// Returns the value for `name`, building and caching it on first
    /// access.
    ///
    /// # Errors
    ///
    /// Propagates build errors; nothing is cached on failure and the next
    /// call retries.
    pub fn get(&self, name: impl Into<InstanceName>) -> Result<Arc<T>, OptionsError> {
        let name = name.into();
        self.cache.get_or_add(&name, || self.factory.create(&name))
    }

    /// Returns the value for the default instance.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn value(&self) -> Result<Arc<T>, OptionsError> {
        self.get(InstanceName::Default)
    }
}

impl<T: Options> Clone for OptionsManager<T> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            cache: Arc::clone(&self.cache),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OptionsSnapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Stable per-unit-of-work view of tunables values.
///
/// Each snapshot owns a private cache. Create one per logical unit of work
/// and drop it when the unit completes; a fresh snapshot picks up whatever
/// configuration is current at that point.
pub struct OptionsSnapshot<T: Options> {
    factory: Arc<OptionsFactory<T>>,
    cache: OptionsCache<T>,
}

impl<T: Options> OptionsSnapshot<T> {
    /// Creates a snapshot with an empty private cache.
    #[must_use]
    pub fn new(factory: Arc<OptionsFactory<T>>) -> Self {
        Self {
            factory,
            cache: OptionsCache::new(),
        }
    }

    /// Returns the value for `name`, built at most once per snapshot.
    ///
    /// # Errors
    ///
    /// Propagates build errors; the next call on this snapshot retries.
    pub fn get(&self, name: impl Into<InstanceName>) -> Result<Arc<T>, OptionsError> {
        let name = name.into();
        self.cache.get_or_add(&name, || self.factory.create(&name))
    }

    /// Returns the value for the default instance.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn value(&self) -> Result<Arc<T>, OptionsError> {
        self.get(InstanceName::Default)
    }
}
