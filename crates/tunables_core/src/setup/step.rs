//! Individual setup steps and their scoping.

use core::fmt;

use crate::name::InstanceName;

/// Boxed error returned by fallible setup steps and seed functions.
pub type StepError = Box<dyn std::error::Error + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// SetupPhase
// ─────────────────────────────────────────────────────────────────────────────

/// The build phase a setup step runs in.
///
/// Phases run strictly in declaration order: every `Configure` step
/// completes before any `PostConfigure` step runs, which completes before
/// any `Initialize` step. Within a phase, steps scoped to the requested
/// instance run before steps scoped to all instances, each group in
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupPhase {
    /// Primary configuration of the freshly seeded value.
    Configure,
    /// Adjustments applied after all configuration has run.
    PostConfigure,
    /// Final initialization once the value is otherwise complete.
    Initialize,
}

impl SetupPhase {
    /// All phases, in execution order.
    pub const ALL: [SetupPhase; 3] = [
        SetupPhase::Configure,
        SetupPhase::PostConfigure,
        SetupPhase::Initialize,
    ];
}

impl fmt::Display for SetupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configure => f.write_str("configure"),
            Self::PostConfigure => f.write_str("post-configure"),
            Self::Initialize => f.write_str("initialize"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StepScope
// ─────────────────────────────────────────────────────────────────────────────

/// Which instances a setup step applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepScope {
    /// Applies to a single instance.
    Instance(InstanceName),
    /// Applies to every instance, whatever its name.
    AllInstances,
}

// ─────────────────────────────────────────────────────────────────────────────
// SetupStep
// ─────────────────────────────────────────────────────────────────────────────

/// Type-erased step action for dynamic storage.
type StepFn<T> = Box<dyn Fn(&mut T) -> Result<(), StepError> + Send + Sync>;

/// A single registered mutation step for options of type `T`.
///
/// Steps are owned by the [`SetupRegistry`](super::SetupRegistry) and
/// referenced by the factory at build time; they live for the life of the
/// process and are never removed.
pub struct SetupStep<T> {
    scope: StepScope,
    action: StepFn<T>,
}

impl<T> SetupStep<T> {
    pub(crate) fn new(
        scope: StepScope,
        action: impl Fn(&mut T) -> Result<(), StepError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            scope,
            action: Box::new(action),
        }
    }

    /// Returns the instances this step applies to.
    #[must_use]
    pub fn scope(&self) -> &StepScope {
        &self.scope
    }

    /// Runs the step against a value under construction.
    pub(crate) fn apply(&self, value: &mut T) -> Result<(), StepError> {
        (self.action)(value)
    }
}

impl<T> fmt::Debug for SetupStep<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupStep")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
