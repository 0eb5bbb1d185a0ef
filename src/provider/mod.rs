//! Global singleton store and resolution scopes.
//!
//! This module contains the [`Registry`] type, which caches Global-mode values, and the
//! [`Scope`] type that runs the resolution algorithm.

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::internal::MAX_DEPTH;
use crate::key::{HandleId, IdHasher, IdMap, PathId};
use crate::observer::{Observers, ResolutionObserver};
use crate::registration::{AnyArc, Handle};

pub mod scope;
pub use scope::Scope;

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// Global singleton store.
///
/// Holds the cached value of every Global-mode handle resolved from a root scope, together with
/// the in-progress markers of handles currently being built into it. Both live behind a single
/// reader/writer lock that is only ever held for map operations, never while a factory runs.
///
/// A process-wide instance backs the free functions ([`with_root_scope`](crate::with_root_scope),
/// [`reset_global_store`](crate::reset_global_store)). Independent instances can be created with
/// [`Registry::new`] or [`Registry::builder`], which keeps test isolation explicit.
///
/// # Thread Safety
///
/// `Registry` is `Send + Sync`. Root scopes on different threads may share one registry. Two
/// threads that resolve the same Global handle for the first time at the same moment may both
/// run its factory; the first value written wins and the other thread adopts it, so every caller
/// observes a single instance.
///
/// A construction still running when [`reset`](Registry::reset) is called hands its value to its
/// caller but does not cache it, so nothing built before a reset survives it.
///
/// # Examples
///
/// ```
/// use ioc_ref::{Handle, Registry};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counter = {
///     let calls = calls.clone();
///     Handle::new(move |_| Ok(calls.fetch_add(1, Ordering::SeqCst) + 1))
/// };
///
/// let registry = Registry::new();
/// assert_eq!(*registry.with_root_scope(|s| s.resolve(&counter)).unwrap(), 1);
/// assert_eq!(*registry.with_root_scope(|s| s.resolve(&counter)).unwrap(), 1);
///
/// registry.reset();
/// assert_eq!(*registry.with_root_scope(|s| s.resolve(&counter)).unwrap(), 2);
/// ```
pub struct Registry {
    state: RwLock<StoreState>,
    max_depth: usize,
    pub(crate) observers: Observers,
}

#[derive(Default)]
struct StoreState {
    instances: IdMap<AnyArc>,
    creating: HashSet<(HandleId, PathId), IdHasher>,
    generation: u64,
}

impl Registry {
    /// Creates an empty store with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts a [`RegistryBuilder`] for a store with custom settings.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The process-wide store used by the free functions.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Opens a root scope on this store, runs `f` with it and discards the scope.
    ///
    /// Standalone values cached in the scope are dropped with it unless `f` keeps their `Arc`s.
    pub fn with_root_scope<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&Scope<'_>) -> R,
    {
        let scope = Scope::root(self);
        f(&scope)
    }

    /// Clears every cached Global-mode value and every in-progress marker.
    ///
    /// The next resolution of a previously cached handle runs its factory again.
    pub fn reset(&self) {
        let mut state = self.state.write();
        let cleared = state.instances.len();
        state.instances.clear();
        state.creating.clear();
        state.generation += 1;
        drop(state);

        tracing::debug!(cleared, "global store reset");
    }

    /// Whether a value for `handle` is cached in this store.
    pub fn contains<T: Send + Sync + 'static>(&self, handle: &Handle<T>) -> bool {
        self.state.read().instances.contains_key(&handle.id())
    }

    /// Number of cached values.
    pub fn len(&self) -> usize {
        self.state.read().instances.len()
    }

    /// Whether no value is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of handles that may be under construction on one path.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn cached(&self, id: HandleId) -> Option<AnyArc> {
        self.state.read().instances.get(&id).cloned()
    }

    /// Number of resets so far. A construction records it before its factory runs.
    pub(crate) fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Stores `value` unless another path stored one first; returns whichever value is cached.
    ///
    /// A value built in an earlier `generation` is returned uncached.
    pub(crate) fn store(&self, id: HandleId, value: AnyArc, generation: u64) -> AnyArc {
        let mut state = self.state.write();
        if state.generation != generation {
            return value;
        }
        state.instances.entry(id).or_insert(value).clone()
    }

    pub(crate) fn is_creating(&self, id: HandleId, path: PathId) -> bool {
        self.state.read().creating.contains(&(id, path))
    }

    pub(crate) fn mark_creating(&self, id: HandleId, path: PathId) {
        self.state.write().creating.insert((id, path));
    }

    pub(crate) fn clear_creating(&self, id: HandleId, path: PathId) {
        self.state.write().creating.remove(&(id, path));
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a [`Registry`].
///
/// # Examples
///
/// ```
/// use ioc_ref::{Registry, TracingObserver};
/// use std::sync::Arc;
///
/// let registry = Registry::builder()
///     .max_depth(64)
///     .observer(Arc::new(TracingObserver::new()))
///     .build();
///
/// assert_eq!(registry.max_depth(), 64);
/// assert!(registry.is_empty());
/// ```
pub struct RegistryBuilder {
    max_depth: usize,
    observers: Observers,
}

impl RegistryBuilder {
    /// Builder with the default depth limit and no observers.
    pub fn new() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            observers: Observers::default(),
        }
    }

    /// Limits how many handles may be under construction on one path (default 1024).
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Adds an observer notified around every factory invocation.
    pub fn observer(mut self, observer: Arc<dyn ResolutionObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    /// Creates the configured, empty store.
    pub fn build(self) -> Registry {
        Registry {
            state: RwLock::new(StoreState::default()),
            max_depth: self.max_depth,
            observers: self.observers,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
