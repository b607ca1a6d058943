//! Memoized storage for built tunables values.
//!
//! The cache holds at most one materialized value per instance name. Each
//! name gets its own slot with its own lock, so builds for unrelated
//! instances never serialize against each other; the slot lock is the sole
//! synchronization point for a given name.
//!
//! Cached values are handed out as `Arc<T>` and are never mutated in
//! place: replacement swaps the whole entry.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};

use crate::error::OptionsError;
use crate::name::InstanceName;
use crate::options::Options;

/// Per-name storage slot.
///
/// The slot mutex is held for the duration of a build, which is what makes
/// `get_or_add` at-most-once under contention: concurrent callers for the
/// same name block here until the builder releases the lock.
struct Slot<T> {
    value: Mutex<Option<Arc<T>>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }
}

/// Caches at most one built value per instance name.
///
/// # Failure semantics
///
/// Build failures are never cached. The failing caller gets the error, the
/// slot stays vacant, and the next caller — including a caller that was
/// blocked waiting on the failed build — retries the build itself.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tunables_core::cache::OptionsCache;
/// use tunables_core::name::InstanceName;
///
/// #[derive(Default)]
/// struct PoolOptions {
///     size: usize,
/// }
///
/// let cache = OptionsCache::<PoolOptions>::new();
/// let name = InstanceName::Default;
///
/// let first = cache.get_or_add(&name, || Ok(PoolOptions { size: 8 })).unwrap();
/// let second = cache.get_or_add(&name, || unreachable!("already cached")).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub struct OptionsCache<T: Options> {
    slots: RwLock<HashMap<InstanceName, Arc<Slot<T>>>>,
}

impl<T: Options> OptionsCache<T> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `name`, building and caching it if
    /// absent.
    ///
    /// Under concurrent callers for the same unseen name, `build` runs
    /// exactly once; every caller observes the same `Arc`. Distinct names
    /// build concurrently.
    ///
    /// # Errors
    ///
    /// Propagates the build error. Nothing is cached on failure.
    pub fn get_or_add<F>(&self, name: &InstanceName, build: F) -> Result<Arc<T>, OptionsError>
    where
        F: FnOnce() -> Result<T, OptionsError>,
    {
        let slot = self.slot(name);
        let mut value = slot.value.lock();
        if let Some(existing) = value.as_ref() {
            return Ok(Arc::clone(existing));
        }

        let built = Arc::new(build()?);
        *value = Some(Arc::clone(&built));
        Ok(built)
    }

    /// Explicitly sets the value for `name`, returning any previous value.
    ///
    /// This is the replacement path used after a change-triggered rebuild:
    /// readers keep seeing the old value until the swap, so nothing blocks
    /// on the rebuild itself.
    pub fn insert(&self, name: &InstanceName, value: Arc<T>) -> Option<Arc<T>> {
        let slot = self.slot(name);
        let mut current = slot.value.lock();
        current.replace(value)
    }

    /// Inserts a value only if `name` has no cached value yet.
    ///
    /// Returns whether the insertion occurred.
    pub fn try_insert(&self, name: &InstanceName, value: Arc<T>) -> bool {
        let slot = self.slot(name);
        let mut current = slot.value.lock();
        if current.is_some() {
            false
        } else {
            *current = Some(value);
            true
        }
    }

    /// Evicts the entry for `name`.
    ///
    /// Returns whether an entry existed. A build already in flight for the
    /// evicted name completes against its old slot; its result is returned
    /// to those callers but is no longer cached.
    pub fn remove(&self, name: &InstanceName) -> bool {
        self.slots.write().remove(name).is_some()
    }

    /// Evicts every entry.
    ///
    /// Used when a type-wide change occurs without per-name granularity.
    pub fn clear(&self) {
        self.slots.write().clear();
    }

    /// Returns a snapshot of the names with a cached (or currently
    /// building) value.
    ///
    /// Slots left vacant by a failed build are skipped; the check never
    /// blocks on a build in flight.
    #[must_use]
    pub fn names(&self) -> Vec<InstanceName> {
        self.slots
            .read()
            .iter()
            .filter(|(_, slot)| match slot.value.try_lock() {
                Some(value) => value.is_some(),
                // Lock held: a build is in flight, count the name.
                None => true,
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Returns the slot for `name`, creating it if needed.
    fn slot(&self, name: &InstanceName) -> Arc<Slot<T>> {
        if let Some(slot) = self.slots.read().get(name) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(
            slots
                .entry(name.clone())
                .or_insert_with(|| Arc::new(Slot::new())),
        )
    }
}

impl<T: Options> Default for OptionsCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        value: i32,
    }

    fn sample(value: i32) -> Result<Sample, OptionsError> {
        Ok(Sample { value })
    }

    #[test]
    fn get_or_add_builds_once_then_serves_the_cache() {
        let cache = OptionsCache::<Sample>::new();
        let name = InstanceName::from("a");
        let builds = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_add(&name, || {
                    builds.fetch_add(1, Ordering::SeqCst);
                    sample(1)
                })
                .unwrap();
            assert_eq!(value.value, 1);
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_names_have_distinct_entries() {
        let cache = OptionsCache::<Sample>::new();

        let a = cache.get_or_add(&InstanceName::from("a"), || sample(1)).unwrap();
        let b = cache.get_or_add(&InstanceName::from("b"), || sample(2)).unwrap();

        assert_eq!(a.value, 1);
        assert_eq!(b.value, 2);
    }

    #[test]
    fn failed_builds_are_not_cached() {
        let cache = OptionsCache::<Sample>::new();
        let name = InstanceName::from("a");

        let err = cache.get_or_add(&name, || {
            Err(OptionsError::Construction {
                type_name: "Sample",
                name: name.clone(),
                reason: "transient".into(),
            })
        });
        assert!(err.is_err());

        // The next access retries and can succeed.
        let value = cache.get_or_add(&name, || sample(3)).unwrap();
        assert_eq!(value.value, 3);
    }

    #[test]
    fn insert_replaces_and_returns_the_previous_value() {
        let cache = OptionsCache::<Sample>::new();
        let name = InstanceName::Default;

        assert!(cache.insert(&name, Arc::new(Sample { value: 1 })).is_none());
        let old = cache.insert(&name, Arc::new(Sample { value: 2 })).unwrap();
        assert_eq!(old.value, 1);

        let current = cache.get_or_add(&name, || unreachable!()).unwrap();
        assert_eq!(current.value, 2);
    }

    #[test]
    fn try_insert_only_fills_vacant_slots() {
        let cache = OptionsCache::<Sample>::new();
        let name = InstanceName::from("a");

        assert!(cache.try_insert(&name, Arc::new(Sample { value: 1 })));
        assert!(!cache.try_insert(&name, Arc::new(Sample { value: 2 })));

        let current = cache.get_or_add(&name, || unreachable!()).unwrap();
        assert_eq!(current.value, 1);
    }

    #[test]
    fn remove_evicts_a_single_entry() {
        let cache = OptionsCache::<Sample>::new();
        let a = InstanceName::from("a");
        let b = InstanceName::from("b");
        cache.get_or_add(&a, || sample(1)).unwrap();
        cache.get_or_add(&b, || sample(2)).unwrap();

        assert!(cache.remove(&a));
        assert!(!cache.remove(&a));

        // "a" rebuilds, "b" is untouched.
        let rebuilt = cache.get_or_add(&a, || sample(10)).unwrap();
        assert_eq!(rebuilt.value, 10);
        let kept = cache.get_or_add(&b, || unreachable!()).unwrap();
        assert_eq!(kept.value, 2);
    }

    #[test]
    fn clear_evicts_everything() {
        let cache = OptionsCache::<Sample>::new();
        cache.get_or_add(&InstanceName::from("a"), || sample(1)).unwrap();
        cache.get_or_add(&InstanceName::from("b"), || sample(2)).unwrap();

        cache.clear();
        assert!(cache.names().is_empty());
    }

    #[test]
    fn names_skips_slots_left_vacant_by_failed_builds() {
        let cache = OptionsCache::<Sample>::new();
        let good = InstanceName::from("good");
        let bad = InstanceName::from("bad");

        cache.get_or_add(&good, || sample(1)).unwrap();
        let _ = cache.get_or_add(&bad, || {
            Err(OptionsError::Construction {
                type_name: "Sample",
                name: bad.clone(),
                reason: "nope".into(),
            })
        });

        assert_eq!(cache.names(), vec![good]);
    }
}
