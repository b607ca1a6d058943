//! Instance names for tunables values.
//!
//! Every tunables type can exist in multiple named variants. The common
//! unnamed case is represented by a distinguished default name rather than
//! an empty-string convention, so code that handles names never has to
//! special-case sentinels.
//!
//! # Example
//!
//! ```
//! use tunables_core::name::InstanceName;
//!
//! let default = InstanceName::Default;
//! let primary = InstanceName::from("primary");
//!
//! assert!(default.is_default());
//! assert_ne!(default, primary);
//!
//! // The empty string is canonicalized to the default name.
//! assert_eq!(InstanceName::from(""), InstanceName::Default);
//! ```

use core::fmt;
use std::sync::Arc;

/// The name of a tunables instance.
///
/// Names are **case-sensitive** and are compared byte-for-byte; no
/// normalization is performed. The empty string is canonicalized to
/// [`InstanceName::Default`] on construction, so `Named("")` is
/// unrepresentable and every instance has exactly one name value.
///
/// Cloning is cheap: named variants share their backing string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum InstanceName {
    /// The distinguished unnamed instance.
    #[default]
    Default,
    /// An explicitly named instance.
    Named(Arc<str>),
}

impl InstanceName {
    /// Returns `true` if this is the default (unnamed) instance.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Returns the name as a string slice.
    ///
    /// The default instance is reported as the empty string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => "",
            Self::Named(name) => name,
        }
    }
}

impl From<&str> for InstanceName {
    fn from(name: &str) -> Self {
        if name.is_empty() {
            Self::Default
        } else {
            Self::Named(Arc::from(name))
        }
    }
}

impl From<String> for InstanceName {
    fn from(name: String) -> Self {
        if name.is_empty() {
            Self::Default
        } else {
            Self::Named(Arc::from(name))
        }
    }
}

impl From<&InstanceName> for InstanceName {
    fn from(name: &InstanceName) -> Self {
        name.clone()
    }
}

impl fmt::Display for InstanceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("(default)"),
            Self::Named(name) => f.write_str(name),
        }
    }
}
