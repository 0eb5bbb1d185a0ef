//! Error types for handle resolution.

use crate::key::HandleId;

/// Resolution errors
///
/// Represents the failure conditions of [`Scope::resolve`](crate::Scope::resolve). Any error
/// aborts the whole resolution request; nothing is retried and no partial graph is returned.
///
/// # Examples
///
/// ```rust
/// use ioc_ref::{DiError, Handle, Registry};
///
/// let broken = Handle::<u32>::new(|_| Err(DiError::factory(anyhow::anyhow!("no database"))));
///
/// let registry = Registry::new();
/// let err = registry.with_root_scope(|s| s.resolve(&broken)).unwrap_err();
/// assert!(matches!(err, DiError::Factory(_)));
/// assert_eq!(err.to_string(), "no database");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DiError {
    /// A handle was requested while already under construction on the same resolution path.
    ///
    /// `path` lists the labels of every handle on the path, ending with the one requested again.
    #[error("circular dependency detected: {handle} ({})", .path.join(" -> "))]
    Circular {
        handle: HandleId,
        path: Vec<&'static str>,
    },
    /// A factory reported a failure. The factory's error is carried unchanged.
    #[error(transparent)]
    Factory(#[from] anyhow::Error),
    /// A cached value or override substitute did not have the requested result type.
    #[error("type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// The resolution path grew past the registry's maximum depth.
    #[error("max depth {0} exceeded")]
    DepthExceeded(usize),
}

impl DiError {
    /// Wraps an arbitrary error returned by a factory.
    pub fn factory<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        DiError::Factory(err.into())
    }

    /// Returns true for [`DiError::Circular`].
    pub fn is_circular(&self) -> bool {
        matches!(self, DiError::Circular { .. })
    }
}

/// Result type for resolution
pub type DiResult<T> = Result<T, DiError>;
