//! # ioc-ref
//!
//! Compile-time typed dependency resolution with opaque handles.
//!
//! ## Features
//!
//! - **Typed handles**: each registered factory yields a `Handle<T>`; resolving it yields `Arc<T>`
//! - **Two caching modes**: Global (one value per registry) and Standalone (one value per scope)
//! - **Local overrides**: a handle can substitute other handles for the duration of its factory
//! - **Circular dependency detection**: cycles fail with the full path instead of recursing
//! - **Thread-safe store**: Global values are shared across threads behind one reader/writer lock
//!
//! ## Quick Start
//!
//! ```rust
//! use ioc_ref::{with_root_scope, Handle};
//! use once_cell::sync::Lazy;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db_url: String,
//! }
//!
//! static DATABASE: Lazy<Handle<Database>> = Lazy::new(|| {
//!     Handle::new(|_| Ok(Database { url: "postgres://localhost".to_string() }))
//! });
//!
//! static USER_SERVICE: Lazy<Handle<UserService>> = Lazy::new(|| {
//!     Handle::new(|scope| {
//!         let db = scope.resolve(&*DATABASE)?;
//!         Ok(UserService { db_url: db.url.clone() })
//!     })
//! });
//!
//! let service = with_root_scope(|scope| scope.resolve(&*USER_SERVICE)).unwrap();
//! assert_eq!(service.db_url, "postgres://localhost");
//! ```
//!
//! ## Local Overrides
//!
//! ```rust
//! use ioc_ref::{Handle, RegisterOptions, Registry};
//!
//! struct Config { url: String }
//!
//! let config = Handle::new(|_| Ok(Config { url: "prod.example.com".to_string() }));
//! let test_config = Handle::with_options(
//!     |_| Ok(Config { url: "test.example.com".to_string() }),
//!     RegisterOptions::new().overrides(&config),
//! );
//!
//! let app = {
//!     let config = config.clone();
//!     Handle::with_options(
//!         move |scope| Ok(format!("https://{}/api", scope.resolve(&config)?.url)),
//!         RegisterOptions::new().with_override(&test_config),
//!     )
//! };
//!
//! let registry = Registry::new();
//! registry.with_root_scope(|scope| {
//!     assert_eq!(*scope.resolve(&app).unwrap(), "https://test.example.com/api");
//!     assert_eq!(scope.resolve(&config).unwrap().url, "prod.example.com");
//! });
//! ```
//!
//! ## Errors
//!
//! Resolution returns [`DiResult`]. Factories propagate failures with `?`; a cycle is reported as
//! [`DiError::Circular`] and never retried. In-progress markers are released on every exit path,
//! so a failed request does not affect later ones.

pub mod error;
pub mod key;
pub mod mode;
pub mod observer;
pub mod provider;

// Internal modules
mod internal;
mod registration;

use std::sync::Arc;

pub use error::{DiError, DiResult};
pub use key::HandleId;
pub use mode::Mode;
pub use observer::{ResolutionObserver, TracingObserver};
pub use provider::{Registry, RegistryBuilder, Scope};
pub use registration::{is_handle, AnyHandle, Handle, ProviderRef, RegisterOptions};

/// Registers `factory` and returns its handle.
///
/// Equivalent to [`Handle::with_options`]. No factory is invoked and nothing is validated until
/// the handle is first resolved.
///
/// # Examples
///
/// ```rust
/// use ioc_ref::{register, RegisterOptions, Registry};
///
/// let answer = register(|_| Ok(42u32), RegisterOptions::new().standalone());
/// let value = Registry::new().with_root_scope(|scope| scope.resolve(&answer)).unwrap();
/// assert_eq!(*value, 42);
/// ```
pub fn register<T, F>(factory: F, options: RegisterOptions<T>) -> Handle<T>
where
    T: Send + Sync + 'static,
    F: Fn(&Scope<'_>) -> DiResult<T> + Send + Sync + 'static,
{
    Handle::with_options(factory, options)
}

/// Resolves `handle` within `scope`. Same as [`Scope::resolve`].
pub fn resolve<T: Send + Sync + 'static>(scope: &Scope<'_>, handle: &Handle<T>) -> DiResult<Arc<T>> {
    scope.resolve(handle)
}

/// Opens a root scope on the process-wide registry, runs `f` with it and discards the scope.
pub fn with_root_scope<R, F>(f: F) -> R
where
    F: FnOnce(&Scope<'_>) -> R,
{
    Registry::global().with_root_scope(f)
}

/// Clears every Global-mode value and in-progress marker of the process-wide registry.
///
/// Intended for isolating independent resolution runs, typically between tests.
pub fn reset_global_store() {
    Registry::global().reset();
}
