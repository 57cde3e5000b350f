// MIT License
//
// Copyright (c) 2019 Gregory Meyer
//
// Permission is hereby granted, free of charge, to any person
// obtaining a copy of this software and associated documentation files
// (the "Software"), to deal in the Software without restriction,
// including without limitation the rights to use, copy, modify, merge,
// publish, distribute, sublicense, and/or sell copies of the Software,
// and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS
// BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN
// ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! An extendible hash table guarded by a single exclusive lock.

mod bucket;
mod table;


use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash, Hasher},
};

use parking_lot::Mutex;

use crate::error::Error;
use table::Table;

/// Default hasher for `ExtendibleHashMap`.
///
/// This is currently [aHash], a hashing algorithm designed around
/// acceleration by the [AES-NI] instruction set on x86 processors. aHash is
/// not cryptographically secure, but is fast and resistant to DoS attacks.
///
/// [aHash]: https://docs.rs/ahash
/// [AES-NI]: https://en.wikipedia.org/wiki/AES_instruction_set
pub type DefaultHashBuilder = ahash::RandomState;

/// Default bound on bucket occupancy before a split is attempted.
pub const DEFAULT_MAX_BUCKET_SIZE: usize = 50;

/// Default ceiling on local depth growth.
pub const DEFAULT_MAX_BUCKET_DEPTH: usize = 50;

/// An extendible hash table: a directory-indirected map that grows
/// incrementally by splitting individual buckets, never by rehashing the
/// whole table.
///
/// The table addresses a power-of-two-sized directory with the low
/// `global_depth` bits of each key's hash; each directory slot references a
/// bucket holding at most `max_bucket_size` pairs. Inserting into a full
/// bucket splits it along one more hash bit and, when the bucket's local
/// depth exceeds the global depth, doubles the directory. The directory
/// never shrinks and buckets are never merged, so memory is not reclaimed
/// after removals; callers that shrink their working set should rebuild the
/// table. Storage engines use this shape to map page identifiers to
/// in-memory page handles without a full-table rehash as the page set
/// grows.
///
/// A bucket whose keys collide on every hash bit up to `max_bucket_depth`
/// cannot be split; it is marked overflowed and permitted to exceed the
/// size cap. This degrades lookups in that bucket to a longer scan but is
/// not a failure: the table remains fully usable.
///
/// All operations serialize on one exclusive lock held for the duration of
/// the call. Splitting is a multi-step structural mutation that must not
/// interleave with any other operation, so there is no read/write
/// distinction and no per-bucket locking. Lookups therefore return copies
/// of values (or pass references to a closure) rather than handles into
/// the table.
///
/// Key types must implement [`Hash`] and [`Eq`]. The hashing algorithm can
/// be chosen on a per-map basis using the [`with_hasher`] and
/// [`with_limits_and_hasher`] methods.
///
/// [`Hash`]: std::hash::Hash
/// [`Eq`]: std::cmp::Eq
/// [`with_hasher`]: #method.with_hasher
/// [`with_limits_and_hasher`]: #method.with_limits_and_hasher
pub struct ExtendibleHashMap<K: Hash + Eq, V, S: BuildHasher = DefaultHashBuilder> {
    table: Mutex<Table<K, V>>,
    hash_builder: S,
}

impl<K: Hash + Eq, V> ExtendibleHashMap<K, V, DefaultHashBuilder> {
    /// Creates an empty map with the default occupancy and depth limits.
    ///
    /// The map starts with a single directory slot and a single empty
    /// bucket of local depth 0.
    pub fn new() -> ExtendibleHashMap<K, V, DefaultHashBuilder> {
        ExtendibleHashMap::with_limits(DEFAULT_MAX_BUCKET_SIZE, DEFAULT_MAX_BUCKET_DEPTH)
    }

    /// Creates an empty map that splits buckets holding more than
    /// `max_bucket_size` pairs and stops splitting at a local depth of
    /// `max_bucket_depth`.
    ///
    /// `max_bucket_size` is clamped to at least 1. `max_bucket_depth` is
    /// clamped to at most 63: a 64-bit hash supplies at most 63 usable
    /// split bits before the directory mask overflows.
    pub fn with_limits(
        max_bucket_size: usize,
        max_bucket_depth: usize,
    ) -> ExtendibleHashMap<K, V, DefaultHashBuilder> {
        ExtendibleHashMap::with_limits_and_hasher(
            max_bucket_size,
            max_bucket_depth,
            DefaultHashBuilder::default(),
        )
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ExtendibleHashMap<K, V, S> {
    /// Creates an empty map that uses `hash_builder` to hash keys.
    pub fn with_hasher(hash_builder: S) -> ExtendibleHashMap<K, V, S> {
        ExtendibleHashMap::with_limits_and_hasher(
            DEFAULT_MAX_BUCKET_SIZE,
            DEFAULT_MAX_BUCKET_DEPTH,
            hash_builder,
        )
    }

    /// Creates an empty map with the given limits that uses `hash_builder`
    /// to hash keys.
    ///
    /// The limits are clamped as in [`with_limits`](#method.with_limits).
    pub fn with_limits_and_hasher(
        max_bucket_size: usize,
        max_bucket_depth: usize,
        hash_builder: S,
    ) -> ExtendibleHashMap<K, V, S> {
        ExtendibleHashMap {
            table: Mutex::new(Table::new(max_bucket_size.max(1), max_bucket_depth.min(63))),
            hash_builder,
        }
    }

    /// Returns the number of key-value pairs in the map.
    ///
    /// The count is maintained incrementally on insert and remove; this is
    /// O(1) and never rescans the buckets.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// Returns true if the map holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the value corresponding to `key`.
    ///
    /// `Q` can be any borrowed form of `K`, but [`Hash`] and [`Eq`] on `Q`
    /// *must* match that of `K`. `V` must implement [`Clone`], as the value
    /// stays owned by the table; if it does not, use
    /// [`get_and`](#method.get_and) instead.
    ///
    /// Fails with [`Error::KeyNotFound`] on a miss — an ordinary negative
    /// result. A key whose hash prefix has no bucket assigned is absent by
    /// definition and misses the same way.
    ///
    /// [`Hash`]: std::hash::Hash
    /// [`Eq`]: std::cmp::Eq
    /// [`Clone`]: std::clone::Clone
    pub fn get<Q: ?Sized + Hash + Eq>(&self, key: &Q) -> Result<V, Error>
    where
        K: Borrow<Q>,
        V: Clone,
    {
        self.get_and(key, V::clone)
    }

    /// Invokes `func` with a reference to the value corresponding to `key`
    /// and returns its result.
    ///
    /// The lock is held while `func` runs; `func` should not call back into
    /// the map.
    pub fn get_and<Q: ?Sized + Hash + Eq, F: FnOnce(&V) -> T, T>(
        &self,
        key: &Q,
        func: F,
    ) -> Result<T, Error>
    where
        K: Borrow<Q>,
    {
        let hash = self.hash_key(key);

        self.table.lock().get(hash, key).map(func)
    }

    /// Returns true if `key` is present in the map.
    pub fn contains_key<Q: ?Sized + Hash + Eq>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
    {
        self.get_and(key, |_| ()).is_ok()
    }

    /// Inserts a key-value pair, returning the previous value associated
    /// with `key` if there was one.
    ///
    /// Overwriting an existing key is a pure update and never triggers a
    /// split. A fresh insertion that pushes a bucket past its size cap
    /// splits the bucket and, if needed, grows the directory before
    /// returning.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let hash = self.hash_key(&key);

        self.table.lock().insert(hash, key, value)
    }

    /// Removes the pair associated with `key`, returning its value.
    ///
    /// Fails with [`Error::KeyNotFound`] on a miss. Removal never merges
    /// buckets and never shrinks the directory.
    pub fn remove<Q: ?Sized + Hash + Eq>(&self, key: &Q) -> Result<V, Error>
    where
        K: Borrow<Q>,
    {
        let hash = self.hash_key(key);

        self.table.lock().remove(hash, key)
    }

    /// Returns the number of low-order hash bits currently used to address
    /// the directory.
    pub fn global_depth(&self) -> usize {
        self.table.lock().global_depth()
    }

    /// Returns the local depth of the bucket referenced by directory slot
    /// `slot`, or `None` if the slot is out of range or has no bucket
    /// assigned.
    pub fn local_depth(&self, slot: usize) -> Option<usize> {
        self.table.lock().local_depth(slot)
    }

    /// Returns the number of buckets backing the directory.
    pub fn bucket_count(&self) -> usize {
        self.table.lock().bucket_count()
    }

    /// Returns the current directory length, always `2^global_depth`.
    pub fn directory_len(&self) -> usize {
        self.table.lock().directory_len()
    }

    /// Returns the occupancy bound past which buckets split.
    pub fn max_bucket_size(&self) -> usize {
        self.table.lock().max_bucket_size()
    }

    /// Returns the ceiling on local depth growth.
    pub fn max_bucket_depth(&self) -> usize {
        self.table.lock().max_bucket_depth()
    }

    fn hash_key<Q: ?Sized + Hash>(&self, key: &Q) -> u64 {
        let mut hasher = self.hash_builder.build_hasher();
        key.hash(&mut hasher);

        hasher.finish()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher + Default> Default for ExtendibleHashMap<K, V, S> {
    fn default() -> Self {
        ExtendibleHashMap::with_limits_and_hasher(
            DEFAULT_MAX_BUCKET_SIZE,
            DEFAULT_MAX_BUCKET_DEPTH,
            S::default(),
        )
    }
}
