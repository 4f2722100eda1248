//! Deterministic hashing for the simulation.
//!
//! The standard library's `HashMap` seeds its hasher randomly per process, which would make
//! anything that iterates a map depend on more than the simulation seed. Everything in this
//! crate uses the `rustc-hash` (`FxHash`) variants re-exported here instead.
//!
//! `HashMap<K, V, S>` has no `new` method for non-default hashers; bring `HashMapExt` into
//! scope to keep the familiar constructors.
//!
//! `hash_str` derives per-stream seed offsets for `crate::random`.

use std::hash::BuildHasher;

pub use rustc_hash::FxHashMap as HashMap;
use xxhash_rust::xxh3::xxh3_64;

/// A stable 64-bit hash of a string, identical across platforms and runs.
#[must_use]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

pub trait HashMapExt {
    fn new() -> Self;
    fn with_capacity(capacity: usize) -> Self;
}

impl<K, V, S: BuildHasher + Default> HashMapExt for std::collections::HashMap<K, V, S> {
    fn new() -> Self {
        Self::with_hasher(S::default())
    }

    fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}
