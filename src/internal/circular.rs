//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::key::{HandleId, IdSet, PathId};
use crate::provider::Registry;

/// Default limit on the number of handles under construction on one path.
pub(crate) const MAX_DEPTH: usize = 1024;

/// Ordered record of the handles under construction on one resolution path.
///
/// Shared by a root scope and every child scope opened beneath it. The in-progress markers decide
/// whether a request is circular; the stack only supplies depth and the labels for error messages.
pub(crate) struct ResolutionPath {
    id: PathId,
    stack: RefCell<Vec<(HandleId, &'static str)>>,
}

impl ResolutionPath {
    pub(crate) fn new() -> Self {
        Self {
            id: PathId::next(),
            stack: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn id(&self) -> PathId {
        self.id
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    /// Labels of the current path followed by `closing`, e.g. `["A", "B", "A"]`.
    pub(crate) fn describe(&self, closing: &'static str) -> Vec<&'static str> {
        let stack = self.stack.borrow();
        let mut path: Vec<&'static str> = stack.iter().map(|&(_, label)| label).collect();
        path.push(closing);
        path
    }

    fn push(&self, id: HandleId, label: &'static str) {
        self.stack.borrow_mut().push((id, label));
    }

    fn pop(&self, id: HandleId) {
        let popped = self.stack.borrow_mut().pop();
        debug_assert_eq!(popped.map(|(popped, _)| popped), Some(id));
    }
}

thread_local! {
    static GLOBAL_FRAMES: RefCell<Vec<GlobalFrame>> = RefCell::new(Vec::new());
}

/// A Global-mode construction running on the current thread.
///
/// Root scopes opened from inside a factory start a fresh path, so per-path markers cannot see
/// them. The frames can.
struct GlobalFrame {
    registry: usize,
    id: HandleId,
    label: &'static str,
}

fn registry_key(registry: &Registry) -> usize {
    registry as *const Registry as usize
}

/// Labels of the Global constructions on this thread for `registry`, starting at the outermost
/// one building `id`. `None` when this thread is not building `id`.
pub(crate) fn thread_cycle(registry: &Registry, id: HandleId) -> Option<Vec<&'static str>> {
    let key = registry_key(registry);
    GLOBAL_FRAMES.with(|frames| {
        let frames = frames.borrow();
        let start = frames.iter().position(|f| f.registry == key && f.id == id)?;
        Some(
            frames[start..]
                .iter()
                .filter(|f| f.registry == key)
                .map(|f| f.label)
                .collect(),
        )
    })
}

/// Where an in-progress marker lives.
pub(crate) enum Marker<'a> {
    /// Registry-wide marker, keyed by handle and path.
    Global(&'a Registry),
    /// A scope's own in-progress set.
    Local(&'a RefCell<IdSet>),
}

/// Guard holding a handle's in-progress marker for the duration of its factory call.
///
/// The marker and the path frame are removed on drop, so they are released on normal return,
/// on an error return, and while unwinding from a panicking factory.
pub(crate) struct CreatingGuard<'a> {
    marker: Marker<'a>,
    path: &'a ResolutionPath,
    id: HandleId,
}

impl<'a> CreatingGuard<'a> {
    pub(crate) fn enter(
        marker: Marker<'a>,
        path: &'a ResolutionPath,
        id: HandleId,
        label: &'static str,
    ) -> Self {
        match &marker {
            Marker::Global(registry) => {
                registry.mark_creating(id, path.id());
                let registry = registry_key(registry);
                GLOBAL_FRAMES.with(|frames| frames.borrow_mut().push(GlobalFrame { registry, id, label }));
            }
            Marker::Local(set) => {
                set.borrow_mut().insert(id);
            }
        }
        path.push(id, label);

        Self { marker, path, id }
    }
}

impl Drop for CreatingGuard<'_> {
    fn drop(&mut self) {
        match &self.marker {
            Marker::Global(registry) => {
                registry.clear_creating(self.id, self.path.id());
                let key = registry_key(registry);
                let _ = GLOBAL_FRAMES.try_with(|frames| {
                    let mut frames = frames.borrow_mut();
                    if let Some(pos) = frames.iter().rposition(|f| f.registry == key && f.id == self.id) {
                        frames.remove(pos);
                    }
                });
            }
            Marker::Local(set) => {
                set.borrow_mut().remove(&self.id);
            }
        }
        self.path.pop(self.id);
    }
}
