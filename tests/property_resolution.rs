/// Property-based tests for handle resolution
///
/// These tests build random dependency chains and rings and check that resolution follows the
/// caching and cycle rules regardless of their shape.

use ioc_ref::{DiError, Handle, Mode, RegisterOptions, Registry};
use once_cell::sync::OnceCell;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn mode_strategy() -> impl Strategy<Value = Mode> {
    prop_oneof![Just(Mode::Global), Just(Mode::Standalone)]
}

/// Builds a chain where handle `i` depends on handle `i - 1`; returns the last handle.
fn chain(modes: &[Mode], calls: &Arc<AtomicUsize>) -> Handle<usize> {
    let mut previous: Option<Handle<usize>> = None;
    for &mode in modes {
        let calls = calls.clone();
        let dependency = previous.take();
        previous = Some(Handle::with_options(
            move |scope| {
                calls.fetch_add(1, Ordering::SeqCst);
                match &dependency {
                    Some(dep) => Ok(*scope.resolve(dep)? + 1),
                    None => Ok(1),
                }
            },
            RegisterOptions::new().mode(mode),
        ));
    }
    previous.expect("at least one mode")
}

/// Builds a ring of `len` handles where each depends on the next and the last on the first.
fn ring(modes: &[Mode]) -> Vec<Handle<u32>> {
    let slots: Vec<Arc<OnceCell<Handle<u32>>>> = modes.iter().map(|_| Arc::new(OnceCell::new())).collect();
    let handles: Vec<Handle<u32>> = modes
        .iter()
        .enumerate()
        .map(|(i, &mode)| {
            let next = slots[(i + 1) % slots.len()].clone();
            Handle::with_options(
                move |scope| {
                    let next = next.get().expect("ring is wired before resolution");
                    Ok(*scope.resolve(next)?)
                },
                RegisterOptions::new().mode(mode),
            )
        })
        .collect();
    for (slot, handle) in slots.iter().zip(&handles) {
        let _ = slot.set(handle.clone());
    }
    handles
}

proptest! {
    #[test]
    fn chain_resolves_to_its_length(modes in prop::collection::vec(mode_strategy(), 1..24)) {
        let calls = Arc::new(AtomicUsize::new(0));
        let top = chain(&modes, &calls);

        let registry = Registry::new();
        let value = registry.with_root_scope(|scope| scope.resolve(&top)).unwrap();

        prop_assert_eq!(*value, modes.len());
        // One root scope: every link is built exactly once.
        prop_assert_eq!(calls.load(Ordering::SeqCst), modes.len());
    }

    #[test]
    fn global_values_survive_root_scopes(modes in prop::collection::vec(mode_strategy(), 1..12), rounds in 2usize..5) {
        let calls = Arc::new(AtomicUsize::new(0));
        let top = chain(&modes, &calls);

        let registry = Registry::new();
        let values: Vec<_> = (0..rounds)
            .map(|_| registry.with_root_scope(|scope| scope.resolve(&top)).unwrap())
            .collect();

        let top_is_global = *modes.last().unwrap() == Mode::Global;
        for value in &values[1..] {
            prop_assert_eq!(Arc::ptr_eq(value, &values[0]), top_is_global);
        }
        if top_is_global {
            prop_assert_eq!(calls.load(Ordering::SeqCst), modes.len());
        }
    }

    #[test]
    fn every_ring_is_reported_as_circular(modes in prop::collection::vec(mode_strategy(), 1..10), start in 0usize..10) {
        let handles = ring(&modes);
        let entry = &handles[start % handles.len()];

        let registry = Registry::new();
        let result = registry.with_root_scope(|scope| scope.resolve(entry));

        match result {
            Err(DiError::Circular { handle, path }) => {
                prop_assert_eq!(handle, entry.id());
                prop_assert_eq!(path.len(), modes.len() + 1);
            }
            other => prop_assert!(false, "expected Circular, got {:?}", other),
        }
        prop_assert!(registry.is_empty());
    }
}
