//! End-to-end resolution scenarios for `tunables_core`.

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tunables_core::cache::OptionsCache;
use tunables_core::error::OptionsError;
use tunables_core::factory::OptionsFactory;
use tunables_core::setup::{SetupRegistry, StepScope};
use tunables_core::snapshot::OptionsManager;

#[derive(Debug, Default)]
struct Sample {
    value: i32,
}

fn manager_with(setup: SetupRegistry<Sample>) -> OptionsManager<Sample> {
    OptionsManager::new(
        Arc::new(OptionsFactory::new(Arc::new(setup))),
        Arc::new(OptionsCache::new()),
    )
}

/// A named configure step composes with an all-instance configure step,
/// name-specific first.
#[test]
fn named_and_all_instance_steps_compose() {
    let mut setup = SetupRegistry::<Sample>::new();
    setup
        .configure_named("a", |opts| opts.value = 1)
        .configure_all(|opts| opts.value += 10);
    let manager = manager_with(setup);

    assert_eq!(manager.get("a").unwrap().value, 11);
    assert_eq!(manager.get("b").unwrap().value, 10);
}

/// A failing post-configure step surfaces at the call site; once the
/// underlying cause clears, the next resolution succeeds and is cached.
#[test]
fn failure_then_recovery_is_cached() {
    let broken = Arc::new(AtomicBool::new(true));
    let builds = Arc::new(AtomicUsize::new(0));

    let mut setup = SetupRegistry::<Sample>::new();
    let builds_step = Arc::clone(&builds);
    setup.configure_all(move |opts| {
        builds_step.fetch_add(1, Ordering::SeqCst);
        opts.value = 5;
    });
    let broken_step = Arc::clone(&broken);
    setup.try_post_configure(StepScope::AllInstances, move |_| {
        if broken_step.load(Ordering::SeqCst) {
            Err("validation failed".into())
        } else {
            Ok(())
        }
    });
    let manager = manager_with(setup);

    let err = manager.get("a").unwrap_err();
    assert!(matches!(
        err,
        OptionsError::Setup {
            step: 1,
            ..
        }
    ));

    // Errors are never cached: with the step fixed, the retry succeeds.
    broken.store(false, Ordering::SeqCst);
    assert_eq!(manager.get("a").unwrap().value, 5);

    // And the success is cached.
    manager.get("a").unwrap();
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

/// The error message carries enough context to diagnose the failure.
#[test]
fn resolution_errors_name_the_type_instance_and_phase() {
    let mut setup = SetupRegistry::<Sample>::new();
    setup.try_initialize(StepScope::Instance("primary".into()), |_| {
        Err("connection refused".into())
    });
    let manager = manager_with(setup);

    let rendered = manager.get("primary").unwrap_err().to_string();
    assert!(rendered.contains("Sample"));
    assert!(rendered.contains("primary"));
    assert!(rendered.contains("initialize"));
    assert!(rendered.contains("connection refused"));
}

/// Values are cached per name: resolving one name never builds another.
#[test]
fn resolution_is_per_name() {
    let builds = Arc::new(AtomicUsize::new(0));
    let builds_step = Arc::clone(&builds);
    let mut setup = SetupRegistry::<Sample>::new();
    setup.configure_all(move |_| {
        builds_step.fetch_add(1, Ordering::SeqCst);
    });
    let manager = manager_with(setup);

    manager.get("a").unwrap();
    manager.get("a").unwrap();
    manager.value().unwrap();

    assert_eq!(builds.load(Ordering::SeqCst), 2);
}
