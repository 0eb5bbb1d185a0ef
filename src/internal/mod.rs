//! Internal implementation details.

pub(crate) mod circular;

pub(crate) use circular::{thread_cycle, CreatingGuard, Marker, ResolutionPath, MAX_DEPTH};
