//! Edge-triggered change notification.
//!
//! A [`ChangeToken`] is a one-shot signal: it fires at most once, and a
//! consumer that wants to keep watching must ask its
//! [`ChangeTokenSource`] for a fresh token after each fire. Modelling the
//! subscribe → fire → resubscribe loop explicitly preserves
//! exactly-once-per-change semantics; there is no persistent event stream
//! to fall behind on.
//!
//! [`ChangeNotifier`] is the in-process source: administrative or test code
//! calls [`notify`](ChangeNotifier::notify) /
//! [`notify_all`](ChangeNotifier::notify_all) to fire the current token and
//! arm a fresh one in a single motion.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::name::InstanceName;

// ─────────────────────────────────────────────────────────────────────────────
// ChangeScope
// ─────────────────────────────────────────────────────────────────────────────

/// The set of instances affected by a configuration change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeScope {
    /// A single instance changed.
    Instance(InstanceName),
    /// The whole type changed, without per-instance granularity.
    AllInstances,
}

// ─────────────────────────────────────────────────────────────────────────────
// ChangeToken
// ─────────────────────────────────────────────────────────────────────────────

/// Type-erased fire callback for dynamic storage.
type FireFn = Box<dyn FnOnce(&ChangeScope) + Send>;

struct TokenState {
    /// Set once, on fire. Later registrations observe it and run
    /// immediately so a change can never slip between fire and subscribe.
    fired: Option<ChangeScope>,
    callbacks: Vec<(u64, FireFn)>,
    next_id: u64,
}

/// A one-shot signal that a configuration source changed.
///
/// Clones share the same underlying state: firing any clone fires them
/// all, exactly once.
#[derive(Clone)]
pub struct ChangeToken {
    state: Arc<Mutex<TokenState>>,
}

impl ChangeToken {
    /// Creates an unfired token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TokenState {
                fired: None,
                callbacks: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Returns `true` once the token has fired.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.state.lock().fired.is_some()
    }

    /// Registers a callback to run when the token fires.
    ///
    /// If the token has already fired, the callback runs immediately on
    /// the current thread and the returned registration is inert. Dropping
    /// the registration before the fire cancels the callback.
    pub fn on_fire(
        &self,
        callback: impl FnOnce(&ChangeScope) + Send + 'static,
    ) -> TokenRegistration {
        let mut state = self.state.lock();
        if let Some(scope) = state.fired.clone() {
            drop(state);
            callback(&scope);
            return TokenRegistration::spent();
        }

        let id = state.next_id;
        state.next_id += 1;
        state.callbacks.push((id, Box::new(callback)));
        TokenRegistration {
            state: Some(Arc::downgrade(&self.state)),
            id,
        }
    }

    /// Fires the token, running every registered callback in registration
    /// order. Subsequent fires are no-ops.
    ///
    /// Callbacks run outside the token's lock, so a callback may register
    /// on (or fire) other tokens freely.
    pub fn fire(&self, scope: ChangeScope) {
        let callbacks = {
            let mut state = self.state.lock();
            if state.fired.is_some() {
                return;
            }
            state.fired = Some(scope.clone());
            core::mem::take(&mut state.callbacks)
        };

        for (_, callback) in callbacks {
            callback(&scope);
        }
    }
}

impl Default for ChangeToken {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenRegistration
// ─────────────────────────────────────────────────────────────────────────────

/// Cancellation guard for a [`ChangeToken::on_fire`] callback.
///
/// Dropping the guard removes the callback if the token has not fired
/// yet. Cancellation is idempotent, safe from any thread, and never blocks
/// on an in-flight fire: a fire that has already collected its callbacks
/// runs them regardless.
pub struct TokenRegistration {
    state: Option<Weak<Mutex<TokenState>>>,
    id: u64,
}

impl TokenRegistration {
    /// A registration whose callback already ran.
    fn spent() -> Self {
        Self { state: None, id: 0 }
    }

    /// Returns `true` while the callback is still registered to run.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Cancels the callback. Equivalent to dropping the guard.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(weak) = self.state.take() {
            if let Some(state) = weak.upgrade() {
                state.lock().callbacks.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

impl Drop for TokenRegistration {
    fn drop(&mut self) {
        self.release();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ChangeTokenSource
// ─────────────────────────────────────────────────────────────────────────────

/// Hands out the change token for one tunables type.
///
/// `token()` returns the *current* token — the one that will fire on the
/// next change. After each fire the source must hand out a fresh token, so
/// a consumer's rearm loop is: `token()` → `on_fire(..)` → (fire) →
/// `token()` again.
pub trait ChangeTokenSource: Send + Sync + 'static {
    /// Returns the token that fires on the next configuration change.
    fn token(&self) -> ChangeToken;
}

// ─────────────────────────────────────────────────────────────────────────────
// ChangeNotifier
// ─────────────────────────────────────────────────────────────────────────────

/// In-process [`ChangeTokenSource`] fired directly by application code.
///
/// # Example
///
/// ```
/// use tunables_core::change::{ChangeNotifier, ChangeScope, ChangeTokenSource};
///
/// let notifier = ChangeNotifier::new();
/// let token = notifier.token();
/// let _registration = token.on_fire(|scope| {
///     assert_eq!(scope, &ChangeScope::Instance("primary".into()));
/// });
///
/// notifier.notify("primary");
/// assert!(token.has_fired());
/// // The notifier already armed a fresh token for the next change.
/// assert!(!notifier.token().has_fired());
/// ```
pub struct ChangeNotifier {
    current: Mutex<ChangeToken>,
}

impl ChangeNotifier {
    /// Creates a notifier with an unfired current token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Mutex::new(ChangeToken::new()),
        }
    }

    /// Signals that a single instance changed.
    pub fn notify(&self, name: impl Into<InstanceName>) {
        self.fire(ChangeScope::Instance(name.into()));
    }

    /// Signals a type-wide change without per-instance granularity.
    pub fn notify_all(&self) {
        self.fire(ChangeScope::AllInstances);
    }

    fn fire(&self, scope: ChangeScope) {
        // Swap in the fresh token before firing: a callback that rearms by
        // calling `token()` must observe the next token, not the one that
        // is firing.
        let fired = {
            let mut current = self.current.lock();
            core::mem::replace(&mut *current, ChangeToken::new())
        };
        fired.fire(scope);
    }
}

impl ChangeTokenSource for ChangeNotifier {
    fn token(&self) -> ChangeToken {
        self.current.lock().clone()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn fire_runs_callbacks_once() {
        let token = ChangeToken::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_cb = Arc::clone(&hits);
        let _registration = token.on_fire(move |_| {
            hits_cb.fetch_add(1, Ordering::SeqCst);
        });

        token.fire(ChangeScope::AllInstances);
        token.fire(ChangeScope::AllInstances);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(token.has_fired());
    }

    #[test]
    fn registering_on_a_fired_token_runs_immediately() {
        let token = ChangeToken::new();
        token.fire(ChangeScope::Instance("a".into()));

        let hits = Arc::new(AtomicUsize::new(0));
        let hits_cb = Arc::clone(&hits);
        let registration = token.on_fire(move |scope| {
            assert_eq!(scope, &ChangeScope::Instance("a".into()));
            hits_cb.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!registration.is_active());
    }

    #[test]
    fn dropping_a_registration_cancels_the_callback() {
        let token = ChangeToken::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_cb = Arc::clone(&hits);
        let registration = token.on_fire(move |_| {
            hits_cb.fetch_add(1, Ordering::SeqCst);
        });
        drop(registration);

        token.fire(ChangeScope::AllInstances);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancel_only_removes_its_own_callback() {
        let token = ChangeToken::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_a = Arc::clone(&hits);
        let a = token.on_fire(move |_| {
            hits_a.fetch_add(1, Ordering::SeqCst);
        });
        let hits_b = Arc::clone(&hits);
        let _b = token.on_fire(move |_| {
            hits_b.fetch_add(10, Ordering::SeqCst);
        });

        a.cancel();
        token.fire(ChangeScope::AllInstances);

        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn notifier_arms_a_fresh_token_before_firing() {
        let notifier = ChangeNotifier::new();
        let first = notifier.token();

        // A callback that rearms mid-fire must see the next token.
        let rearmed = Arc::new(Mutex::new(None));
        let rearmed_cb = Arc::clone(&rearmed);
        let notifier = Arc::new(notifier);
        let notifier_cb = Arc::clone(&notifier);
        let _registration = first.on_fire(move |_| {
            *rearmed_cb.lock() = Some(notifier_cb.token());
        });

        notifier.notify("a");

        let fresh = rearmed.lock().take().expect("callback ran");
        assert!(first.has_fired());
        assert!(!fresh.has_fired());
    }

    #[test]
    fn notify_carries_the_instance_name() {
        let notifier = ChangeNotifier::new();
        let seen = Arc::new(Mutex::new(None));

        let seen_cb = Arc::clone(&seen);
        let _registration = notifier.token().on_fire(move |scope| {
            *seen_cb.lock() = Some(scope.clone());
        });

        notifier.notify("primary");
        assert_eq!(
            seen.lock().take(),
            Some(ChangeScope::Instance("primary".into()))
        );
    }
}
