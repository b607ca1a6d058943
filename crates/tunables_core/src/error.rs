//! Errors produced while building a tunables value.

use crate::name::InstanceName;
use crate::setup::SetupPhase;

/// Errors that can occur while resolving a tunables value.
///
/// Build errors are never cached: every subsequent resolution of the same
/// (type, name) retries the build from scratch. The variants carry enough
/// context — type name, instance name, and for step failures the phase and
/// step position — to diagnose a failure at the call site.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OptionsError {
    /// The seed function for the options type failed.
    #[error("failed to seed {type_name} for instance `{name}`: {reason}")]
    Construction {
        /// The options type being built.
        type_name: &'static str,
        /// The instance that was requested.
        name: InstanceName,
        /// The seed function's error, rendered.
        reason: String,
    },

    /// A setup step failed during one of the build phases.
    #[error("{phase} step #{step} failed for {type_name} instance `{name}`: {reason}")]
    Setup {
        /// The options type being built.
        type_name: &'static str,
        /// The instance that was requested.
        name: InstanceName,
        /// The phase the failing step ran in.
        phase: SetupPhase,
        /// 1-based position of the failing step within the phase's
        /// applicable sequence (instance-scoped steps first, then
        /// all-instance steps).
        step: usize,
        /// The step's error, rendered.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_error_names_the_phase_and_step() {
        let err = OptionsError::Setup {
            type_name: "PoolOptions",
            name: InstanceName::from("primary"),
            phase: SetupPhase::PostConfigure,
            step: 2,
            reason: "size must be non-zero".into(),
        };

        let rendered = err.to_string();
        assert!(rendered.contains("post-configure step #2"));
        assert!(rendered.contains("PoolOptions"));
        assert!(rendered.contains("primary"));
        assert!(rendered.contains("size must be non-zero"));
    }

    #[test]
    fn construction_error_names_the_instance() {
        let err = OptionsError::Construction {
            type_name: "PoolOptions",
            name: InstanceName::Default,
            reason: "missing base".into(),
        };

        assert!(err.to_string().contains("(default)"));
    }
}
