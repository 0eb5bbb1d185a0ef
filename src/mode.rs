//! Caching modes.

/// Caching policy of a handle.
///
/// The mode decides where a resolved value lives and therefore how widely it is shared.
///
/// - **Global**: one value per [`Registry`](crate::Registry), shared by every root scope
/// - **Standalone**: one value per scope, discarded with the scope
///
/// A Global handle is only cached in the registry when it is resolved from a root scope. When it
/// is resolved inside a child scope (one opened to host local overrides) it is cached in that child
/// scope instead, because the overrides visible there may change what its factory builds.
///
/// # Examples
///
/// ```rust
/// use ioc_ref::{Handle, Mode, RegisterOptions, Registry};
/// use std::sync::Arc;
///
/// let shared = Handle::new(|_| Ok(String::from("shared")));
/// let fresh = Handle::with_options(
///     |_| Ok(String::from("fresh")),
///     RegisterOptions::new().mode(Mode::Standalone),
/// );
///
/// let registry = Registry::new();
/// let (a, x) = registry.with_root_scope(|s| (s.resolve(&shared).unwrap(), s.resolve(&fresh).unwrap()));
/// let (b, y) = registry.with_root_scope(|s| (s.resolve(&shared).unwrap(), s.resolve(&fresh).unwrap()));
///
/// assert!(Arc::ptr_eq(&a, &b)); // Global: same value across root scopes
/// assert!(!Arc::ptr_eq(&x, &y)); // Standalone: one value per scope
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Singleton cached in the registry's global store.
    #[default]
    Global,
    /// Cached only within the scope that built it.
    Standalone,
}

impl Mode {
    /// Returns true for [`Mode::Global`].
    pub fn is_global(self) -> bool {
        matches!(self, Mode::Global)
    }
}
