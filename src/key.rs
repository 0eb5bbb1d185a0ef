//! Identity keys for handles and resolution paths.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);
static NEXT_PATH: AtomicU64 = AtomicU64::new(1);

/// Identity of a registered handle.
///
/// Every call to [`Handle::with_options`](crate::Handle::with_options) allocates a fresh id from a
/// process-wide counter, so two handles are the same entity exactly when their ids match. Clones
/// of a handle share its id. Nothing about the factory or result type takes part in equality.
///
/// # Examples
///
/// ```rust
/// use ioc_ref::Handle;
///
/// let a = Handle::new(|_| Ok(1u32));
/// let b = Handle::new(|_| Ok(1u32));
///
/// assert_eq!(a.id(), a.clone().id());
/// assert_ne!(a.id(), b.id());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    pub(crate) fn next() -> Self {
        HandleId(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value of the id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle#{}", self.0)
    }
}

/// Identity of one resolution path: a root scope and every child scope opened beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PathId(u64);

impl PathId {
    pub(crate) fn next() -> Self {
        PathId(NEXT_PATH.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(feature = "ahash")]
pub(crate) type IdHasher = ahash::RandomState;
#[cfg(not(feature = "ahash"))]
pub(crate) type IdHasher = std::collections::hash_map::RandomState;

/// Identity-keyed map. Keys are handle ids, never structural hashes of handle contents.
pub(crate) type IdMap<V> = HashMap<HandleId, V, IdHasher>;
pub(crate) type IdSet = HashSet<HandleId, IdHasher>;
