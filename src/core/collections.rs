//! Collection types tuned for the mesh core.
//!
//! Topological edits touch many small, short-lived sets of keys; these
//! aliases keep the hashing and buffering choices in one place.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Fast `HashMap` for hot paths keyed by mesh keys or vertex pairs.
///
/// Uses the FxHash algorithm, which is well suited to small integer-like
/// keys and does not need DoS resistance inside a mesh instance.
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Fast `HashSet` companion to [`FastHashMap`].
pub type FastHashSet<V> = FxHashSet<V>;

/// Stack-allocated buffer for small, bounded workloads.
///
/// Spills to the heap past `N` elements. Typical uses: the edges produced by
/// one vertex split (at most 4) and the triangle fan around a vertex.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;
