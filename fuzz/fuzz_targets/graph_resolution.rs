#![no_main]

use ioc_ref::{DiError, Handle, Mode, RegisterOptions, Registry};
use libfuzzer_sys::fuzz_target;
use once_cell::sync::OnceCell;
use std::sync::Arc;

const MAX_NODES: usize = 16;

type Slots = Arc<Vec<OnceCell<Handle<u64>>>>;

// Each node takes two bytes: the low bit of the first picks the mode, the second is a bitmask of
// dependencies over the next eight nodes (wrapping, so cycles are common).
fn decode(data: &[u8]) -> Vec<(Mode, Vec<usize>)> {
    let count = (data.len() / 2).min(MAX_NODES);
    (0..count)
        .map(|i| {
            let mode = if data[2 * i] & 1 == 0 { Mode::Global } else { Mode::Standalone };
            let mask = data[2 * i + 1];
            let deps = (0..8)
                .filter(|bit| mask & (1 << bit) != 0)
                .map(|bit| (i + bit) % count)
                .collect();
            (mode, deps)
        })
        .collect()
}

fn reaches_cycle(graph: &[(Mode, Vec<usize>)], node: usize, on_path: &mut Vec<bool>, done: &mut Vec<bool>) -> bool {
    if on_path[node] {
        return true;
    }
    if done[node] {
        return false;
    }
    on_path[node] = true;
    let found = graph[node].1.iter().any(|&dep| reaches_cycle(graph, dep, on_path, done));
    on_path[node] = false;
    done[node] = true;
    found
}

fuzz_target!(|data: &[u8]| {
    let graph = decode(data);
    if graph.is_empty() {
        return;
    }

    let slots: Slots = Arc::new(graph.iter().map(|_| OnceCell::new()).collect());
    for (i, (mode, deps)) in graph.iter().enumerate() {
        let deps = deps.clone();
        let wired = slots.clone();
        let handle = Handle::with_options(
            move |scope| {
                let mut total = 1u64;
                for &dep in &deps {
                    let dep = wired[dep].get().expect("graph is wired before resolution");
                    total = total.wrapping_add(*scope.resolve(dep)?);
                }
                Ok(total)
            },
            RegisterOptions::new().mode(*mode),
        );
        let _ = slots[i].set(handle);
    }

    let cyclic = reaches_cycle(&graph, 0, &mut vec![false; graph.len()], &mut vec![false; graph.len()]);
    let registry = Registry::new();
    let entry = slots[0].get().expect("entry handle");

    for _ in 0..2 {
        match registry.with_root_scope(|scope| scope.resolve(entry)) {
            Ok(_) => assert!(!cyclic, "cycle not reported"),
            Err(DiError::Circular { path, .. }) => {
                assert!(cyclic, "acyclic graph reported as circular");
                assert!(path.len() >= 2);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
});
