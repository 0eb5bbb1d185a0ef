//! Observation hooks for resolution events.
//!
//! Observers are attached to a [`Registry`](crate::Registry) through its builder and are told
//! about every factory invocation made on its behalf. Cache hits are not reported; they are
//! visible as `trace` events from the resolver itself.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::registration::ProviderRef;

/// Observer trait for resolution events.
///
/// Calls are made synchronously on the resolving thread, around the factory invocation. Keep
/// implementations cheap.
///
/// # Examples
///
/// ```
/// use ioc_ref::{DiError, Handle, ProviderRef, Registry, ResolutionObserver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct CountingObserver {
///     built: AtomicUsize,
/// }
///
/// impl ResolutionObserver for CountingObserver {
///     fn resolving(&self, _handle: &dyn ProviderRef) {}
///
///     fn resolved(&self, _handle: &dyn ProviderRef, _duration: Duration) {
///         self.built.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let observer = Arc::new(CountingObserver::default());
/// let registry = Registry::builder().observer(observer.clone()).build();
///
/// let value = Handle::new(|_| Ok(5u8));
/// registry.with_root_scope(|s| s.resolve(&value).unwrap());
/// registry.with_root_scope(|s| s.resolve(&value).unwrap());
///
/// assert_eq!(observer.built.load(Ordering::SeqCst), 1);
/// ```
pub trait ResolutionObserver: Send + Sync {
    /// Called right before a factory is invoked.
    fn resolving(&self, handle: &dyn ProviderRef);

    /// Called after a factory returned a value, with the time spent inside it.
    fn resolved(&self, handle: &dyn ProviderRef, duration: Duration);

    /// Called when a factory returned an error. The error still propagates afterwards.
    fn failed(&self, handle: &dyn ProviderRef, error: &DiError) {
        let _ = (handle, error);
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// # Examples
///
/// ```
/// use ioc_ref::{Registry, TracingObserver};
/// use std::sync::Arc;
///
/// let registry = Registry::builder()
///     .observer(Arc::new(TracingObserver::with_prefix("orders")))
///     .build();
/// ```
pub struct TracingObserver {
    prefix: String,
}

impl TracingObserver {
    /// Creates an observer whose events carry the `ioc-ref` prefix.
    pub fn new() -> Self {
        Self {
            prefix: "ioc-ref".to_string(),
        }
    }

    /// Creates an observer whose events carry a custom `prefix` field.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionObserver for TracingObserver {
    fn resolving(&self, handle: &dyn ProviderRef) {
        tracing::debug!(
            prefix = %self.prefix,
            handle = %handle.handle_id(),
            label = handle.label(),
            "resolving"
        );
    }

    fn resolved(&self, handle: &dyn ProviderRef, duration: Duration) {
        tracing::debug!(
            prefix = %self.prefix,
            handle = %handle.handle_id(),
            label = handle.label(),
            ?duration,
            "resolved"
        );
    }

    fn failed(&self, handle: &dyn ProviderRef, error: &DiError) {
        tracing::warn!(
            prefix = %self.prefix,
            handle = %handle.handle_id(),
            label = handle.label(),
            %error,
            "factory failed"
        );
    }
}

/// Container for registered observers.
///
/// Designed to cost a single emptiness check when no observers are registered.
#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ResolutionObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn ResolutionObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, handle: &dyn ProviderRef) {
        for observer in &self.observers {
            observer.resolving(handle);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, handle: &dyn ProviderRef, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(handle, duration);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, handle: &dyn ProviderRef, error: &DiError) {
        for observer in &self.observers {
            observer.failed(handle, error);
        }
    }
}
