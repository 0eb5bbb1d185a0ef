//! Resolution scopes and the resolver algorithm.
//!
//! A [`Scope`] is a bounded resolution context with its own cache, override map and in-progress
//! set. Root scopes are opened with [`Registry::with_root_scope`]; child scopes are opened by the
//! resolver itself to host the local overrides of one factory invocation.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace, warn};

use super::Registry;
use crate::error::{DiError, DiResult};
use crate::internal::{thread_cycle, CreatingGuard, Marker, ResolutionPath};
use crate::key::{HandleId, IdMap, IdSet};
use crate::registration::{AnyArc, AnyHandle, Handle, Provider, ProviderRef};

/// Resolution context for one request.
///
/// # Caching
///
/// - **Global** handles resolved from a root scope are cached in the [`Registry`]
/// - **Global** handles resolved from a child scope are cached in that child scope
/// - **Standalone** handles are cached in the scope that resolves them
///
/// # Overrides
///
/// When a handle declares local overrides, its factory runs against a fresh child scope in which
/// each override shadows its target. Lookups walk outward through parent scopes, so a substitute
/// is visible to the whole factory subtree and to nothing else.
///
/// # Threading
///
/// A scope tree belongs to the call stack that opened its root. `Scope` is neither `Send` nor
/// `Sync`; independent root scopes on other threads share only the registry.
///
/// # Examples
///
/// ```
/// use ioc_ref::{Handle, RegisterOptions, Registry};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let built = Arc::new(AtomicUsize::new(0));
/// let request_id = {
///     let built = built.clone();
///     Handle::with_options(
///         move |_| Ok(format!("req-{}", built.fetch_add(1, Ordering::SeqCst) + 1)),
///         RegisterOptions::new().standalone(),
///     )
/// };
///
/// let registry = Registry::new();
/// registry.with_root_scope(|scope| {
///     let a = scope.resolve(&request_id).unwrap();
///     let b = scope.resolve(&request_id).unwrap();
///     assert!(Arc::ptr_eq(&a, &b));
///     assert_eq!(*a, "req-1");
/// });
///
/// let other = registry.with_root_scope(|scope| scope.resolve(&request_id).unwrap());
/// assert_eq!(*other, "req-2");
/// ```
pub struct Scope<'r> {
    registry: &'r Registry,
    parent: Option<&'r Scope<'r>>,
    path: Rc<ResolutionPath>,
    instances: RefCell<IdMap<AnyArc>>,
    in_progress: RefCell<IdSet>,
    overrides: IdMap<AnyHandle>,
}

impl<'r> Scope<'r> {
    pub(crate) fn root(registry: &'r Registry) -> Self {
        Self {
            registry,
            parent: None,
            path: Rc::new(ResolutionPath::new()),
            instances: RefCell::new(IdMap::default()),
            in_progress: RefCell::new(IdSet::default()),
            overrides: IdMap::default(),
        }
    }

    /// Opens a child scope hosting `overrides`.
    ///
    /// Each override is installed under its target, or under itself when it has none.
    fn child<'a>(&'a self, overrides: &[AnyHandle]) -> Scope<'a> {
        let mut installed = IdMap::default();
        for handle in overrides {
            installed.insert(handle.install_key(), handle.clone());
        }

        Scope {
            registry: self.registry,
            parent: Some(self),
            path: self.path.clone(),
            instances: RefCell::new(IdMap::default()),
            in_progress: RefCell::new(IdSet::default()),
            overrides: installed,
        }
    }

    /// Whether this scope has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The registry this scope resolves Global-mode handles against.
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Resolves `handle` to its value, building it and its dependencies on first use.
    ///
    /// # Errors
    ///
    /// - [`DiError::Circular`] when the effective handle is already under construction on this
    ///   resolution path, including a handle that depends on itself
    /// - [`DiError::DepthExceeded`] when the path is already as deep as the registry allows
    /// - [`DiError::Factory`] (or any other error) returned by a factory, unchanged
    pub fn resolve<T: Send + Sync + 'static>(&self, handle: &Handle<T>) -> DiResult<Arc<T>> {
        let effective = self.find_override(handle)?;
        let provider = effective.provider();
        let (id, label) = (provider.id, provider.label);
        let global = provider.mode.is_global() && self.is_root();

        if let Some(value) = self.cached(id, global) {
            trace!(handle = %id, label, global, "cache hit");
            return downcast(value, label);
        }

        if self.is_in_progress(id) {
            let path = self.path.describe(label);
            warn!(handle = %id, label, path = ?path, "circular dependency");
            return Err(DiError::Circular { handle: id, path });
        }

        // Re-entered through a root scope opened inside one of this thread's factories.
        if let Some(mut path) = thread_cycle(self.registry, id) {
            path.extend(self.path.describe(label));
            warn!(handle = %id, label, path = ?path, "circular dependency across root scopes");
            return Err(DiError::Circular { handle: id, path });
        }

        let depth = self.path.depth();
        if depth >= self.registry.max_depth() {
            warn!(handle = %id, label, depth, "resolution depth exceeded");
            return Err(DiError::DepthExceeded(depth));
        }

        let marker = if global {
            Marker::Global(self.registry)
        } else {
            Marker::Local(&self.in_progress)
        };
        let generation = if global { self.registry.generation() } else { 0 };
        let guard = CreatingGuard::enter(marker, &self.path, id, label);

        let observers = &self.registry.observers;
        if observers.has_observers() {
            observers.resolving(&effective);
        }

        debug!(handle = %id, label, global, overrides = provider.local_overrides.len(), "invoking factory");
        let start = Instant::now();
        let value = match self.instantiate(provider) {
            Ok(value) => value,
            Err(err) => {
                if observers.has_observers() {
                    observers.failed(&effective, &err);
                }
                return Err(err);
            }
        };
        let elapsed = start.elapsed();
        drop(guard);

        let value: AnyArc = Arc::new(value);
        let stored = if global {
            self.registry.store(id, value, generation)
        } else {
            self.instances
                .borrow_mut()
                .entry(id)
                .or_insert(value)
                .clone()
        };
        debug!(handle = %id, label, global, ?elapsed, "cached");

        if observers.has_observers() {
            observers.resolved(&effective, elapsed);
        }

        downcast(stored, label)
    }

    /// Finds the handle that actually answers a request for `handle`.
    ///
    /// Walks outward from this scope and returns the first substitute found. Substitutes are not
    /// substituted again.
    fn find_override<T: Send + Sync + 'static>(&self, handle: &Handle<T>) -> DiResult<Handle<T>> {
        let id = handle.id();
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(substitute) = scope.overrides.get(&id) {
                return substitute
                    .downcast::<T>()
                    .ok_or(DiError::TypeMismatch(substitute.label()));
            }
            current = scope.parent;
        }
        Ok(handle.clone())
    }

    fn cached(&self, id: HandleId, global: bool) -> Option<AnyArc> {
        if global {
            self.registry.cached(id)
        } else {
            self.instances.borrow().get(&id).cloned()
        }
    }

    /// Whether `id` is under construction anywhere on this resolution path.
    fn is_in_progress(&self, id: HandleId) -> bool {
        if self.registry.is_creating(id, self.path.id()) {
            return true;
        }
        let mut current = Some(self);
        while let Some(scope) = current {
            if scope.in_progress.borrow().contains(&id) {
                return true;
            }
            current = scope.parent;
        }
        false
    }

    fn instantiate<T>(&self, provider: &Provider<T>) -> DiResult<T> {
        if provider.local_overrides.is_empty() {
            return (provider.factory)(self);
        }
        let child = self.child(&provider.local_overrides);
        (provider.factory)(&child)
    }
}

// The one place a stored value re-enters typed code.
fn downcast<T: Send + Sync + 'static>(value: AnyArc, label: &'static str) -> DiResult<Arc<T>> {
    value.downcast::<T>().map_err(|_| DiError::TypeMismatch(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegisterOptions;

    #[test]
    fn child_scope_installs_overrides_under_target() {
        let registry = Registry::new();
        let target = Handle::new(|_| Ok(1u32));
        let substitute = Handle::with_options(|_| Ok(2u32), RegisterOptions::new().overrides(&target));
        let plain = Handle::new(|_| Ok(3u32));

        let root = Scope::root(&registry);
        let child = root.child(&[substitute.erase(), plain.erase()]);

        assert!(root.is_root());
        assert!(!child.is_root());
        assert_eq!(child.find_override(&target).unwrap(), substitute);
        assert_eq!(child.find_override(&plain).unwrap(), plain);
        assert_eq!(root.find_override(&target).unwrap(), target);
    }

    #[test]
    fn override_lookup_walks_parents_one_level_only() {
        let registry = Registry::new();
        let a = Handle::new(|_| Ok("a"));
        let b = Handle::with_options(|_| Ok("b"), RegisterOptions::new().overrides(&a));
        let c = Handle::with_options(|_| Ok("c"), RegisterOptions::new().overrides(&b));

        let root = Scope::root(&registry);
        let outer = root.child(&[b.erase()]);
        let inner = outer.child(&[c.erase()]);

        // a -> b found in the outer scope; b is not substituted again by c.
        assert_eq!(inner.find_override(&a).unwrap(), b);
        assert_eq!(inner.find_override(&b).unwrap(), c);
    }

    #[test]
    fn markers_are_cleared_after_resolution() {
        let registry = Registry::new();
        let global = Handle::new(|_| Ok(10u64));
        let local = Handle::with_options(|_| Ok(20u64), RegisterOptions::new().standalone());

        let root = Scope::root(&registry);
        assert_eq!(*root.resolve(&global).unwrap(), 10);
        assert_eq!(*root.resolve(&local).unwrap(), 20);

        assert!(!root.is_in_progress(global.id()));
        assert!(!root.is_in_progress(local.id()));
        assert_eq!(root.path.depth(), 0);
        assert!(registry.contains(&global));
        assert!(!registry.contains(&local));
    }
}
