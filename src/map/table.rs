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

//! Unsynchronized core of the extendible hash table.
//!
//! [`Table`] holds the directory, the bucket arena, and the splitting and
//! directory-growth machinery. It never hashes keys itself; every method
//! takes the key's full 64-bit hash from the caller, and the facade wraps
//! the whole structure in a mutex.
//!
//! The directory is a `Vec` of arena indices whose length is always
//! `2^global_depth`. Slot `i` either names the bucket holding every key
//! whose hash ends in `i`'s low bits, or is `None` when no bucket has been
//! created for that prefix yet. After every structural mutation the
//! addressing invariant holds: a bucket with local depth `d` and id `b` is
//! referenced by exactly the slots congruent to `b` modulo `2^d`.

use std::{borrow::Borrow, mem};

use log::{debug, trace};

use super::bucket::{Bucket, Entry};
use crate::error::Error;

/// A mask selecting the low `depth` bits of a hash.
fn low_bits(depth: usize) -> u64 {
    debug_assert!(depth < 64);

    (1 << depth) - 1
}

pub(crate) struct Table<K, V> {
    directory: Vec<Option<usize>>,
    buckets: Vec<Bucket<K, V>>,
    global_depth: usize,
    num_pairs: usize,
    max_bucket_size: usize,
    max_bucket_depth: usize,
}

impl<K, V> Table<K, V> {
    /// Creates a table with a single directory slot referencing a single
    /// empty bucket of local depth 0.
    pub(crate) fn new(max_bucket_size: usize, max_bucket_depth: usize) -> Self {
        assert!(max_bucket_size >= 1);
        assert!(max_bucket_depth < 64);

        Self {
            directory: vec![Some(0)],
            buckets: vec![Bucket::new(0, 0)],
            global_depth: 0,
            num_pairs: 0,
            max_bucket_size,
            max_bucket_depth,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.num_pairs
    }

    pub(crate) fn global_depth(&self) -> usize {
        self.global_depth
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn directory_len(&self) -> usize {
        self.directory.len()
    }

    pub(crate) fn max_bucket_size(&self) -> usize {
        self.max_bucket_size
    }

    pub(crate) fn max_bucket_depth(&self) -> usize {
        self.max_bucket_depth
    }

    /// Returns the local depth of the bucket referenced by directory slot
    /// `slot`, or `None` if the slot is out of range or has no bucket.
    pub(crate) fn local_depth(&self, slot: usize) -> Option<usize> {
        let index = (*self.directory.get(slot)?)?;

        Some(self.buckets[index].depth)
    }

    /// The directory slot addressed by `hash`: its low `global_depth` bits.
    fn slot_of(&self, hash: u64) -> usize {
        (hash & low_bits(self.global_depth)) as usize
    }

    pub(crate) fn get<Q: ?Sized + Eq>(&self, hash: u64, key: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
    {
        let slot = self.slot_of(hash);

        // An unassigned slot is as much of a miss as an absent entry: no
        // bucket has ever claimed the key's prefix.
        let index = self.directory[slot].ok_or(Error::KeyNotFound)?;

        self.buckets[index]
            .get(hash, key)
            .ok_or(Error::KeyNotFound)
    }

    pub(crate) fn remove<Q: ?Sized + Eq>(&mut self, hash: u64, key: &Q) -> Result<V, Error>
    where
        K: Borrow<Q>,
    {
        let slot = self.slot_of(hash);
        let index = self.directory[slot].ok_or(Error::KeyNotFound)?;
        let bucket = &mut self.buckets[index];
        let position = bucket.position_of(hash, key).ok_or(Error::KeyNotFound)?;

        let entry = bucket.entries.swap_remove(position);
        self.num_pairs -= 1;

        // Removal never merges buckets or shrinks the directory; the
        // directory only ever grows.

        Ok(entry.value)
    }

    /// Inserts `key` and `value`, returning the previous value if the key
    /// was already present.
    ///
    /// An overwrite is a pure update: no size check, no split. A fresh
    /// insertion that pushes a non-overflowed bucket past the size cap
    /// triggers a split, which may in turn grow the directory.
    pub(crate) fn insert(&mut self, hash: u64, key: K, value: V) -> Option<V>
    where
        K: Eq,
    {
        let slot = self.slot_of(hash);
        let index = match self.directory[slot] {
            Some(index) => index,
            None => {
                // No bucket has claimed this prefix yet. A bucket created
                // at the full global depth has exactly one directory alias.
                let index = self.buckets.len();
                self.buckets
                    .push(Bucket::new(slot as u64, self.global_depth));
                self.directory[slot] = Some(index);

                trace!(
                    "materialized bucket {} for slot {:#x} at depth {}",
                    index,
                    slot,
                    self.global_depth
                );

                index
            }
        };

        let bucket = &mut self.buckets[index];

        if let Some(position) = bucket.position_of(hash, &key) {
            return Some(mem::replace(&mut bucket.entries[position].value, value));
        }

        bucket.entries.push(Entry { hash, key, value });
        self.num_pairs += 1;

        if bucket.len() > self.max_bucket_size && !bucket.overflowed {
            if let Some(sibling) = self.split(index) {
                self.reassign_aliases(index, sibling);
            }

            // Only splits and directory growth touch the structure; plain
            // inserts stay O(1) even with the sweep enabled.
            #[cfg(debug_assertions)]
            self.check_invariants();
        }

        None
    }

    /// Partitions an over-full bucket along additional hash bits until two
    /// non-empty buckets result, returning the arena index of the new
    /// sibling.
    ///
    /// When every entry collides on all bits up to the depth limit, the
    /// split is abandoned: the bucket's depth is restored, it is marked
    /// overflowed, and `None` is returned.
    fn split(&mut self, index: usize) -> Option<usize> {
        let original_depth = self.buckets[index].depth;
        let original_id = self.buckets[index].id;

        let moved = loop {
            let bucket = &mut self.buckets[index];

            if bucket.depth == self.max_bucket_depth {
                // The id may have absorbed bits from iterations in which
                // every entry carried the bit; roll that back too.
                bucket.depth = original_depth;
                bucket.id = original_id;
                bucket.overflowed = true;

                debug!(
                    "bucket {} overflowed: {} entries collide on the low {} bits",
                    index,
                    bucket.len(),
                    self.max_bucket_depth
                );

                return None;
            }

            bucket.depth += 1;
            let bit = 1u64 << (bucket.depth - 1);

            let entries = mem::take(&mut bucket.entries);
            let (set, clear): (Vec<_>, Vec<_>) =
                entries.into_iter().partition(|e| e.hash & bit != 0);
            bucket.entries = clear;

            if set.is_empty() {
                // Every entry still collides with the new bit clear; take
                // another bit.
                continue;
            }

            if bucket.entries.is_empty() {
                // Every entry carries the new bit set; the bucket keeps
                // them all, its id absorbs the bit, and the loop continues.
                bucket.entries = set;
                bucket.id |= bit;
                continue;
            }

            break set;
        };

        let parent = &self.buckets[index];
        let depth = parent.depth;
        let mut sibling = Bucket::new(parent.id | (1 << (depth - 1)), depth);
        sibling.entries = moved;

        let sibling_index = self.buckets.len();

        trace!(
            "split bucket {} at depth {}: {} entries stay, {} move to bucket {}",
            index,
            depth,
            parent.len(),
            sibling.len(),
            sibling_index
        );

        self.buckets.push(sibling);

        Some(sibling_index)
    }

    /// Restores the addressing invariant after `index` split off `sibling`.
    ///
    /// If the split raised the bucket's depth past the global depth, the
    /// directory first doubles as many times as needed, each new slot
    /// inheriting the bucket of the slot it aliased before the growth. Every
    /// slot that references the split bucket is then re-derived from its
    /// own low bits: it keeps the bucket, switches to the sibling, or (when
    /// its prefix matches neither id) becomes unassigned.
    fn reassign_aliases(&mut self, index: usize, sibling: usize) {
        let depth = self.buckets[index].depth;

        if depth > self.global_depth {
            let old_len = self.directory.len();
            let new_len = 1usize << depth;
            self.directory.reserve(new_len - old_len);

            for slot in old_len..new_len {
                let inherited = self.directory[slot % old_len];
                self.directory.push(inherited);
            }

            self.global_depth = depth;

            debug!(
                "directory grown from {} to {} slots (global depth {})",
                old_len, new_len, depth
            );
        }

        let parent_id = self.buckets[index].id;
        let sibling_id = self.buckets[sibling].id;
        let mask = low_bits(depth);

        for slot in 0..self.directory.len() {
            if self.directory[slot] != Some(index) {
                continue;
            }

            let prefix = slot as u64 & mask;

            self.directory[slot] = if prefix == parent_id {
                Some(index)
            } else if prefix == sibling_id {
                Some(sibling)
            } else {
                None
            };
        }
    }

    /// Asserts the structural invariants that must hold between mutations.
    ///
    /// Runs after every split in debug builds; tests call it directly.
    pub(crate) fn check_invariants(&self) {
        assert_eq!(self.directory.len(), 1 << self.global_depth);

        for (slot, &entry) in self.directory.iter().enumerate() {
            let Some(index) = entry else { continue };
            let bucket = &self.buckets[index];

            assert!(bucket.depth <= self.global_depth);
            assert!(bucket.depth <= self.max_bucket_depth);
            assert_eq!(slot as u64 & low_bits(bucket.depth), bucket.id);
        }

        let mut num_pairs = 0;

        for (index, bucket) in self.buckets.iter().enumerate() {
            assert!(bucket.overflowed || bucket.len() <= self.max_bucket_size);
            num_pairs += bucket.len();

            for entry in &bucket.entries {
                assert_eq!(entry.hash & low_bits(bucket.depth), bucket.id);
            }

            // Full reachability: every alias of the bucket's prefix points
            // back at it.
            let stride = 1usize << bucket.depth;
            let mut slot = bucket.id as usize;

            while slot < self.directory.len() {
                assert_eq!(self.directory[slot], Some(index));
                slot += stride;
            }
        }

        assert_eq!(num_pairs, self.num_pairs);
    }
}
