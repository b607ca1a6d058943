//! Building tunables values from registered setup steps.

use std::sync::Arc;

use crate::error::OptionsError;
use crate::name::InstanceName;
use crate::options::Options;
use crate::setup::{SetupPhase, SetupRegistry, StepScope};

/// Builds fully configured values of `T` for a given instance name.
///
/// A build seeds the value (`T::default()` or the registry's seed
/// function), then runs each phase in order: `Configure`, `PostConfigure`,
/// `Initialize`. Within a phase, steps scoped to the requested instance run
/// first, then steps scoped to all instances, each group in registration
/// order. A failing step aborts the build; no partial value escapes.
///
/// # Unknown names
///
/// A name with no instance-scoped steps is **not** an error: the build
/// falls back to the seed value shaped by the all-instance steps. Callers
/// that need to distinguish configured instances from ad-hoc names must do
/// so at registration time.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tunables_core::factory::OptionsFactory;
/// use tunables_core::name::InstanceName;
/// use tunables_core::setup::SetupRegistry;
///
/// #[derive(Default)]
/// struct PoolOptions {
///     size: usize,
/// }
///
/// let mut setup = SetupRegistry::<PoolOptions>::new();
/// setup
///     .configure_named("large", |opts| opts.size = 64)
///     .configure_all(|opts| opts.size += 1);
///
/// let factory = OptionsFactory::new(Arc::new(setup));
/// assert_eq!(factory.create(&InstanceName::from("large")).unwrap().size, 65);
/// assert_eq!(factory.create(&InstanceName::Default).unwrap().size, 1);
/// ```
pub struct OptionsFactory<T: Options> {
    setup: Arc<SetupRegistry<T>>,
}

impl<T: Options> OptionsFactory<T> {
    /// Creates a factory over a shared step registry.
    #[must_use]
    pub fn new(setup: Arc<SetupRegistry<T>>) -> Self {
        Self { setup }
    }

    /// Builds a new value for `name`.
    ///
    /// # Errors
    ///
    /// - [`OptionsError::Construction`] if the seed function fails.
    /// - [`OptionsError::Setup`] if any step fails; the error names the
    ///   phase and the step's position within it.
    pub fn create(&self, name: &InstanceName) -> Result<T, OptionsError> {
        let mut value = self
            .setup
            .seed_value()
            .map_err(|source| OptionsError::Construction {
                type_name: T::type_name(),
                name: name.clone(),
                reason: source.to_string(),
            })?;

        for phase in SetupPhase::ALL {
            self.run_phase(phase, name, &mut value)?;
        }

        Ok(value)
    }

    /// Runs one phase: instance-scoped steps, then all-instance steps.
    fn run_phase(
        &self,
        phase: SetupPhase,
        name: &InstanceName,
        value: &mut T,
    ) -> Result<(), OptionsError> {
        let steps = self.setup.steps(phase);

        let scoped = steps
            .iter()
            .filter(|step| matches!(step.scope(), StepScope::Instance(n) if n == name));
        let global = steps
            .iter()
            .filter(|step| matches!(step.scope(), StepScope::AllInstances));

        for (position, step) in scoped.chain(global).enumerate() {
            step.apply(value).map_err(|source| OptionsError::Setup {
                type_name: T::type_name(),
                name: name.clone(),
                phase,
                step: position + 1,
                reason: source.to_string(),
            })?;
        }

        Ok(())
    }
}
