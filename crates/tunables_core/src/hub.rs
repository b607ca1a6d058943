//! Cross-type registry of options engines.
//!
//! Each options type gets its own generic factory, cache, and monitor;
//! type identity only enters the picture where cross-type lookup is
//! unavoidable — typed retrieval by consumers and administrative
//! invalidation sweeps. The hub covers exactly that: a `TypeId`-keyed map
//! of erased per-type monitors with typed recovery.

use core::any::TypeId;
use std::sync::Arc;

use downcast_rs::{Downcast, impl_downcast};
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::monitor::OptionsMonitor;
use crate::options::Options;

/// Type-erased handle to one options type's monitor.
trait ErasedOptions: Downcast + Send + Sync {
    /// Returns the options type's name for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Evicts every cached value of the type.
    fn invalidate_all(&self);
}
impl_downcast!(ErasedOptions);

/// Concrete erased entry wrapping a monitor.
struct ErasedMonitor<T: Options>(Arc<OptionsMonitor<T>>);

impl<T: Options> ErasedOptions for ErasedMonitor<T> {
    fn type_name(&self) -> &'static str {
        T::type_name()
    }

    fn invalidate_all(&self) {
        self.0.invalidate_all();
    }
}

/// Registry of options engines, keyed by options type.
///
/// One entry per type; re-registration replaces the previous entry.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tunables_core::cache::OptionsCache;
/// use tunables_core::change::ChangeNotifier;
/// use tunables_core::factory::OptionsFactory;
/// use tunables_core::hub::OptionsHub;
/// use tunables_core::monitor::OptionsMonitor;
/// use tunables_core::setup::SetupRegistry;
///
/// #[derive(Default)]
/// struct HttpOptions {
///     port: u16,
/// }
///
/// let mut setup = SetupRegistry::<HttpOptions>::new();
/// setup.configure_all(|opts| opts.port = 8080);
/// let monitor = OptionsMonitor::new(
///     Arc::new(OptionsFactory::new(Arc::new(setup))),
///     Arc::new(OptionsCache::new()),
///     Arc::new(ChangeNotifier::new()),
/// );
///
/// let hub = OptionsHub::new();
/// hub.register(monitor);
///
/// let monitor = hub.monitor::<HttpOptions>().expect("registered above");
/// assert_eq!(monitor.current().unwrap().port, 8080);
/// ```
pub struct OptionsHub {
    entries: RwLock<HashMap<TypeId, Box<dyn ErasedOptions>>>,
}

impl OptionsHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Registers the monitor for `T`, replacing any previous entry.
    pub fn register<T: Options>(&self, monitor: Arc<OptionsMonitor<T>>) {
        tracing::debug!(options = T::type_name(), "registered tunables type");
        self.entries
            .write()
            .insert(TypeId::of::<T>(), Box::new(ErasedMonitor(monitor)));
    }

    /// Returns the registered monitor for `T`, if any.
    #[must_use]
    pub fn monitor<T: Options>(&self) -> Option<Arc<OptionsMonitor<T>>> {
        self.entries
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<ErasedMonitor<T>>())
            .map(|entry| Arc::clone(&entry.0))
    }

    /// Returns `true` if a monitor for `T` is registered.
    #[must_use]
    pub fn contains<T: Options>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<T>())
    }

    /// Evicts every cached value of every registered type.
    ///
    /// Administrative sweep: nothing is rebuilt here; each type rebuilds
    /// lazily on its next access.
    pub fn invalidate_all_types(&self) {
        let entries = self.entries.read();
        for entry in entries.values() {
            tracing::debug!(options = entry.type_name(), "administrative invalidation");
            entry.invalidate_all();
        }
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for OptionsHub {
    fn default() -> Self {
        Self::new()
    }
}
