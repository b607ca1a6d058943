//! The options resolution, caching, and change-notification engine for
//! tunables.
//!
//! `tunables_core` resolves named, strongly-typed configuration values by
//! applying ordered setup steps to a default instance, memoizes the
//! result per (type, name), and invalidates and rebuilds memoized values
//! when a change-token source signals that the underlying configuration
//! changed:
//!
//! - [`name`] - Instance names with a distinguished default
//! - [`options`] - The marker trait for tunables value types
//! - [`setup`] - Ordered, scoped mutation steps in three phases
//! - [`factory`] - Building values from registered steps
//! - [`cache`] - At-most-once memoization per instance name
//! - [`change`] - Edge-triggered change tokens and sources
//! - [`monitor`] - Change-driven rebuild and listener notification
//! - [`snapshot`] - Process-wide and per-unit-of-work façades
//! - [`hub`] - Cross-type registry and administrative invalidation
//! - [`error`] - Build errors with phase/step context
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tunables_core::cache::OptionsCache;
//! use tunables_core::change::ChangeNotifier;
//! use tunables_core::factory::OptionsFactory;
//! use tunables_core::monitor::OptionsMonitor;
//! use tunables_core::setup::SetupRegistry;
//! use tunables_core::snapshot::OptionsManager;
//!
//! #[derive(Default)]
//! struct RetryOptions {
//!     attempts: u32,
//! }
//!
//! // Registered once at startup.
//! let mut setup = SetupRegistry::<RetryOptions>::new();
//! setup
//!     .configure_named("aggressive", |opts| opts.attempts = 10)
//!     .configure_all(|opts| opts.attempts += 1);
//!
//! let factory = Arc::new(OptionsFactory::new(Arc::new(setup)));
//! let cache = Arc::new(OptionsCache::new());
//! let notifier = Arc::new(ChangeNotifier::new());
//!
//! let _monitor = OptionsMonitor::new(
//!     Arc::clone(&factory),
//!     Arc::clone(&cache),
//!     notifier.clone(),
//! );
//! let manager = OptionsManager::new(factory, cache);
//!
//! assert_eq!(manager.get("aggressive").unwrap().attempts, 11);
//! assert_eq!(manager.value().unwrap().attempts, 1);
//!
//! // A configuration change invalidates and rebuilds.
//! notifier.notify("aggressive");
//! assert_eq!(manager.get("aggressive").unwrap().attempts, 11);
//! ```

/// At-most-once memoization per instance name.
pub mod cache;

/// Edge-triggered change tokens and sources.
pub mod change;

/// Build errors with phase/step context.
pub mod error;

/// Building values from registered steps.
pub mod factory;

/// Cross-type registry and administrative invalidation.
pub mod hub;

/// Change-driven rebuild and listener notification.
pub mod monitor;

/// Instance names with a distinguished default.
pub mod name;

/// The marker trait for tunables value types.
pub mod options;

/// Ordered, scoped mutation steps in three phases.
pub mod setup;

/// Process-wide and per-unit-of-work façades.
pub mod snapshot;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::cache::OptionsCache;
    pub use crate::change::{
        ChangeNotifier, ChangeScope, ChangeToken, ChangeTokenSource, TokenRegistration,
    };
    pub use crate::error::OptionsError;
    pub use crate::factory::OptionsFactory;
    pub use crate::hub::OptionsHub;
    pub use crate::monitor::{ChangeSubscription, OptionsMonitor};
    pub use crate::name::InstanceName;
    pub use crate::options::Options;
    pub use crate::setup::{SetupPhase, SetupRegistry, SetupStep, StepError, StepScope};
    pub use crate::snapshot::{OptionsManager, OptionsSnapshot};
}
