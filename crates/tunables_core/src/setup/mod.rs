//! Setup steps: ordered, scoped mutation callbacks applied during a build.
//!
//! A build runs in three phases — [`Configure`](SetupPhase::Configure),
//! [`PostConfigure`](SetupPhase::PostConfigure), then
//! [`Initialize`](SetupPhase::Initialize) — and phases never interleave.
//! Within a phase, steps scoped to the requested instance run before steps
//! scoped to all instances, each group in registration order.
//!
//! Steps are registered once at startup into a [`SetupRegistry`] and shared
//! with the factory for the life of the process.

mod registry;
mod step;

pub use registry::SetupRegistry;
pub use step::{SetupPhase, SetupStep, StepError, StepScope};
