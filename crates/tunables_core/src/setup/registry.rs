//! Registration-ordered storage for setup steps.

use crate::name::InstanceName;
use crate::options::Options;

use super::step::{SetupPhase, SetupStep, StepError, StepScope};

/// Type-erased seed function for dynamic storage.
type SeedFn<T> = Box<dyn Fn() -> Result<T, StepError> + Send + Sync>;

/// Owns every setup step registered for options of type `T`.
///
/// Steps are registered at startup and never removed. Each phase keeps its
/// own list in registration order; the factory decides which steps apply to
/// a given instance at build time.
///
/// # Example
///
/// ```
/// use tunables_core::setup::SetupRegistry;
///
/// #[derive(Default)]
/// struct PoolOptions {
///     size: usize,
/// }
///
/// let mut setup = SetupRegistry::<PoolOptions>::new();
/// setup
///     .configure(|opts| opts.size = 4)
///     .configure_named("large", |opts| opts.size = 64)
///     .post_configure_all(|opts| opts.size = opts.size.max(1));
/// ```
pub struct SetupRegistry<T: Options> {
    seed: Option<SeedFn<T>>,
    configure: Vec<SetupStep<T>>,
    post_configure: Vec<SetupStep<T>>,
    initialize: Vec<SetupStep<T>>,
}

impl<T: Options> SetupRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seed: None,
            configure: Vec::new(),
            post_configure: Vec::new(),
            initialize: Vec::new(),
        }
    }

    /// Replaces the seed used to construct each value.
    ///
    /// By default every build starts from `T::default()`. A seed function
    /// may fail, in which case the build aborts with
    /// [`OptionsError::Construction`](crate::error::OptionsError::Construction).
    pub fn seed_with(
        &mut self,
        seed: impl Fn() -> Result<T, StepError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.seed = Some(Box::new(seed));
        self
    }

    /// Constructs the seed value for a build.
    pub(crate) fn seed_value(&self) -> Result<T, StepError> {
        match &self.seed {
            Some(seed) => seed(),
            None => Ok(T::default()),
        }
    }

    /// Returns the steps registered for `phase`, in registration order.
    #[must_use]
    pub fn steps(&self, phase: SetupPhase) -> &[SetupStep<T>] {
        match phase {
            SetupPhase::Configure => &self.configure,
            SetupPhase::PostConfigure => &self.post_configure,
            SetupPhase::Initialize => &self.initialize,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Configure phase
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers a configure step for the default instance.
    pub fn configure(&mut self, step: impl Fn(&mut T) + Send + Sync + 'static) -> &mut Self {
        self.push_infallible(SetupPhase::Configure, StepScope::Instance(InstanceName::Default), step)
    }

    /// Registers a configure step for a named instance.
    pub fn configure_named(
        &mut self,
        name: impl Into<InstanceName>,
        step: impl Fn(&mut T) + Send + Sync + 'static,
    ) -> &mut Self {
        self.push_infallible(SetupPhase::Configure, StepScope::Instance(name.into()), step)
    }

    /// Registers a configure step that applies to every instance.
    pub fn configure_all(&mut self, step: impl Fn(&mut T) + Send + Sync + 'static) -> &mut Self {
        self.push_infallible(SetupPhase::Configure, StepScope::AllInstances, step)
    }

    /// Registers a fallible configure step with an explicit scope.
    pub fn try_configure(
        &mut self,
        scope: StepScope,
        step: impl Fn(&mut T) -> Result<(), StepError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.configure.push(SetupStep::new(scope, step));
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // PostConfigure phase
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers a post-configure step for the default instance.
    pub fn post_configure(&mut self, step: impl Fn(&mut T) + Send + Sync + 'static) -> &mut Self {
        self.push_infallible(
            SetupPhase::PostConfigure,
            StepScope::Instance(InstanceName::Default),
            step,
        )
    }

    /// Registers a post-configure step for a named instance.
    pub fn post_configure_named(
        &mut self,
        name: impl Into<InstanceName>,
        step: impl Fn(&mut T) + Send + Sync + 'static,
    ) -> &mut Self {
        self.push_infallible(SetupPhase::PostConfigure, StepScope::Instance(name.into()), step)
    }

    /// Registers a post-configure step that applies to every instance.
    pub fn post_configure_all(&mut self, step: impl Fn(&mut T) + Send + Sync + 'static) -> &mut Self {
        self.push_infallible(SetupPhase::PostConfigure, StepScope::AllInstances, step)
    }

    /// Registers a fallible post-configure step with an explicit scope.
    pub fn try_post_configure(
        &mut self,
        scope: StepScope,
        step: impl Fn(&mut T) -> Result<(), StepError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.post_configure.push(SetupStep::new(scope, step));
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Initialize phase
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers an initialize step for the default instance.
    pub fn initialize(&mut self, step: impl Fn(&mut T) + Send + Sync + 'static) -> &mut Self {
        self.push_infallible(
            SetupPhase::Initialize,
            StepScope::Instance(InstanceName::Default),
            step,
        )
    }

    /// Registers an initialize step for a named instance.
    pub fn initialize_named(
        &mut self,
        name: impl Into<InstanceName>,
        step: impl Fn(&mut T) + Send + Sync + 'static,
    ) -> &mut Self {
        self.push_infallible(SetupPhase::Initialize, StepScope::Instance(name.into()), step)
    }

    /// Registers an initialize step that applies to every instance.
    pub fn initialize_all(&mut self, step: impl Fn(&mut T) + Send + Sync + 'static) -> &mut Self {
        self.push_infallible(SetupPhase::Initialize, StepScope::AllInstances, step)
    }

    /// Registers a fallible initialize step with an explicit scope.
    pub fn try_initialize(
        &mut self,
        scope: StepScope,
        step: impl Fn(&mut T) -> Result<(), StepError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.initialize.push(SetupStep::new(scope, step));
        self
    }

    fn push_infallible(
        &mut self,
        phase: SetupPhase,
        scope: StepScope,
        step: impl Fn(&mut T) + Send + Sync + 'static,
    ) -> &mut Self {
        let step = SetupStep::new(scope, move |value: &mut T| {
            step(value);
            Ok(())
        });
        match phase {
            SetupPhase::Configure => self.configure.push(step),
            SetupPhase::PostConfigure => self.post_configure.push(step),
            SetupPhase::Initialize => self.initialize.push(step),
        }
        self
    }
}

impl<T: Options> Default for SetupRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
