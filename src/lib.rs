//! Runtime resolution, caching, and live reload of named, strongly-typed
//! configuration values.

pub use tunables_core::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use tunables_core::prelude::*;
}
