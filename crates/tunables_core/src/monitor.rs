//! Long-lived change monitoring for one tunables type.
//!
//! The monitor owns the subscribe → fire → resubscribe loop against a
//! [`ChangeTokenSource`], rebuilds affected instances when the token
//! fires, swaps the new values into the shared cache, and notifies
//! registered listeners. Rearming happens **before** the rebuild and
//! notification, so a change arriving during either is picked up by the
//! next token rather than lost.
//!
//! # Lock discipline
//!
//! Rebuilds run outside every cache lock; the swap takes only the slot
//! lock, briefly. Listener notification runs against a snapshot taken
//! under a read lock, so disposing a subscription never blocks on an
//! in-flight notification and a listener may register or dispose
//! subscriptions freely from inside its callback.

use std::sync::{Arc, Weak};

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};

use crate::cache::OptionsCache;
use crate::change::{ChangeScope, ChangeTokenSource, TokenRegistration};
use crate::error::OptionsError;
use crate::factory::OptionsFactory;
use crate::name::InstanceName;
use crate::options::Options;

// ─────────────────────────────────────────────────────────────────────────────
// Listener storage
// ─────────────────────────────────────────────────────────────────────────────

/// Shared listener callback for dynamic storage.
type ChangeListener<T> = Arc<dyn Fn(&Arc<T>, &InstanceName) + Send + Sync>;

/// Shared error-listener callback for dynamic storage.
type ErrorListener = Arc<dyn Fn(&OptionsError, &InstanceName) + Send + Sync>;

struct ListenerTable<T> {
    next_id: u64,
    on_change: HashMap<u64, ChangeListener<T>>,
    on_error: HashMap<u64, ErrorListener>,
}

impl<T> ListenerTable<T> {
    fn new() -> Self {
        Self {
            next_id: 0,
            on_change: HashMap::new(),
            on_error: HashMap::new(),
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ChangeSubscription
// ─────────────────────────────────────────────────────────────────────────────

/// Guard for a listener registered via [`OptionsMonitor::on_change`] or
/// [`OptionsMonitor::on_error`].
///
/// Dropping the guard (or calling [`dispose`](Self::dispose)) stops
/// further notifications to that listener without affecting other
/// listeners. Disposal is idempotent, safe from any thread, and never
/// blocks on an in-flight notification: a notification that has already
/// snapshotted its listeners delivers to them regardless.
pub struct ChangeSubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl ChangeSubscription {
    /// Stops further notifications. Equivalent to dropping the guard.
    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OptionsMonitor
// ─────────────────────────────────────────────────────────────────────────────

/// Watches a change-token source and keeps cached values of `T` fresh.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tunables_core::cache::OptionsCache;
/// use tunables_core::change::ChangeNotifier;
/// use tunables_core::factory::OptionsFactory;
/// use tunables_core::monitor::OptionsMonitor;
/// use tunables_core::setup::SetupRegistry;
///
/// #[derive(Default)]
/// struct LimitOptions {
///     max_inflight: usize,
/// }
///
/// let mut setup = SetupRegistry::<LimitOptions>::new();
/// setup.configure_all(|opts| opts.max_inflight = 16);
///
/// let notifier = Arc::new(ChangeNotifier::new());
/// let monitor = OptionsMonitor::new(
///     Arc::new(OptionsFactory::new(Arc::new(setup))),
///     Arc::new(OptionsCache::new()),
///     notifier.clone(),
/// );
///
/// assert_eq!(monitor.current().unwrap().max_inflight, 16);
///
/// let _subscription = monitor.on_change(|value, name| {
///     let _ = (value.max_inflight, name);
/// });
/// notifier.notify_all();
/// ```
pub struct OptionsMonitor<T: Options> {
    factory: Arc<OptionsFactory<T>>,
    cache: Arc<OptionsCache<T>>,
    source: Arc<dyn ChangeTokenSource>,
    listeners: Arc<RwLock<ListenerTable<T>>>,
    /// Registration on the currently armed token. Held so the callback
    /// survives until the token fires; replaced on each rearm.
    armed: Mutex<Option<TokenRegistration>>,
}

impl<T: Options> OptionsMonitor<T> {
    /// Creates a monitor over a shared factory and cache, armed against
    /// `source`.
    ///
    /// The cache is typically shared with an
    /// [`OptionsManager`](crate::snapshot::OptionsManager) so that
    /// monitor-triggered rebuilds are what the manager serves.
    pub fn new(
        factory: Arc<OptionsFactory<T>>,
        cache: Arc<OptionsCache<T>>,
        source: Arc<dyn ChangeTokenSource>,
    ) -> Arc<Self> {
        let monitor = Arc::new(Self {
            factory,
            cache,
            source,
            listeners: Arc::new(RwLock::new(ListenerTable::new())),
            armed: Mutex::new(None),
        });
        Self::arm(&monitor);
        monitor
    }

    /// Returns the value for `name`, building and caching it on first
    /// access.
    ///
    /// While a change-triggered rebuild is in flight the previous value is
    /// still cached, so this does not block on the rebuild.
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
    pub fn current(&self) -> Result<Arc<T>, OptionsError> {
        self.get(InstanceName::Default)
    }

    /// Registers a listener called with `(new value, name)` after each
    /// successful change-triggered rebuild.
    pub fn on_change(
        &self,
        listener: impl Fn(&Arc<T>, &InstanceName) + Send + Sync + 'static,
    ) -> ChangeSubscription {
        let id = {
            let mut table = self.listeners.write();
            let id = table.next_id();
            table.on_change.insert(id, Arc::new(listener));
            id
        };
        self.subscription(id, SubscriptionKind::Change)
    }

    /// Registers a listener called with `(error, name)` when a
    /// change-triggered rebuild fails.
    ///
    /// Without any error listener, rebuild failures are logged and
    /// otherwise dropped; they never tear down the monitor.
    pub fn on_error(
        &self,
        listener: impl Fn(&OptionsError, &InstanceName) + Send + Sync + 'static,
    ) -> ChangeSubscription {
        let id = {
            let mut table = self.listeners.write();
            let id = table.next_id();
            table.on_error.insert(id, Arc::new(listener));
            id
        };
        self.subscription(id, SubscriptionKind::Error)
    }

    /// Evicts the cached value for `name`; the next access rebuilds.
    ///
    /// Returns whether an entry existed.
    pub fn invalidate(&self, name: impl Into<InstanceName>) -> bool {
        let name = name.into();
        let existed = self.cache.remove(&name);
        tracing::debug!(
            options = T::type_name(),
            instance = %name,
            existed,
            "invalidated tunables entry"
        );
        existed
    }

    /// Evicts every cached value of this type.
    pub fn invalidate_all(&self) {
        self.cache.clear();
        tracing::debug!(options = T::type_name(), "invalidated all tunables entries");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Change handling
    // ─────────────────────────────────────────────────────────────────────────

    /// Arms (or rearms) the monitor against the source's current token.
    fn arm(monitor: &Arc<Self>) {
        let token = monitor.source.token();
        let weak = Arc::downgrade(monitor);
        let registration = token.on_fire(move |scope| {
            if let Some(monitor) = weak.upgrade() {
                // Rearm first so a change arriving during the rebuild or
                // notification lands on the next token instead of vanishing.
                Self::arm(&monitor);
                monitor.handle_change(scope);
            }
        });

        // When the token had already fired, `on_fire` ran the callback
        // synchronously and the recursive `arm` inside it stored the live
        // registration; storing the spent one here would disarm it.
        if registration.is_active() {
            *monitor.armed.lock() = Some(registration);
        }
    }

    fn handle_change(&self, scope: &ChangeScope) {
        let names = match scope {
            ChangeScope::Instance(name) => vec![name.clone()],
            // No per-instance granularity: rebuild whatever is cached.
            ChangeScope::AllInstances => self.cache.names(),
        };

        for name in names {
            self.rebuild(&name);
        }
    }

    /// Rebuilds one instance and swaps it into the cache, or evicts it on
    /// failure so the next access surfaces the error at the call site.
    fn rebuild(&self, name: &InstanceName) {
        match self.factory.create(name) {
            Ok(value) => {
                let value = Arc::new(value);
                self.cache.insert(name, Arc::clone(&value));
                tracing::debug!(
                    options = T::type_name(),
                    instance = %name,
                    "rebuilt tunables after change"
                );
                self.notify_change(&value, name);
            }
            Err(error) => {
                self.cache.remove(name);
                if !self.notify_error(&error, name) {
                    tracing::warn!(
                        options = T::type_name(),
                        instance = %name,
                        %error,
                        "tunables rebuild failed; entry evicted"
                    );
                }
            }
        }
    }

    fn notify_change(&self, value: &Arc<T>, name: &InstanceName) {
        let listeners: Vec<ChangeListener<T>> =
            self.listeners.read().on_change.values().cloned().collect();
        for listener in listeners {
            listener(value, name);
        }
    }

    /// Returns whether any error listener was notified.
    fn notify_error(&self, error: &OptionsError, name: &InstanceName) -> bool {
        let listeners: Vec<ErrorListener> =
            self.listeners.read().on_error.values().cloned().collect();
        let notified = !listeners.is_empty();
        for listener in listeners {
            listener(error, name);
        }
        notified
    }

    fn subscription(&self, id: u64, kind: SubscriptionKind) -> ChangeSubscription {
        let table = Arc::downgrade(&self.listeners);
        ChangeSubscription {
            cancel: Some(Box::new(move || {
                if let Some(table) = table.upgrade() {
                    let mut table = table.write();
                    match kind {
                        SubscriptionKind::Change => {
                            table.on_change.remove(&id);
                        }
                        SubscriptionKind::Error => {
                            table.on_error.remove(&id);
                        }
                    }
                }
            })),
        }
    }
}

#[derive(Clone, Copy)]
enum SubscriptionKind {
    Change,
    Error,
}
