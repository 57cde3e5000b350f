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

use std::borrow::Borrow;

/// A key-value pair annotated with the key's full 64-bit hash.
///
/// The hash is computed once on insertion and carried with the pair so that
/// splits can re-partition entries without re-hashing and so that equality
/// checks can short-circuit on mismatched hashes.
pub(crate) struct Entry<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

/// A bounded container of entries whose hashes share the same low `depth`
/// bits, namely `id`.
pub(crate) struct Bucket<K, V> {
    /// The hash prefix common to every entry: the low `depth` bits.
    pub(crate) id: u64,

    /// Local depth: how many low-order hash bits address this bucket.
    pub(crate) depth: usize,

    /// Set once a split has been abandoned because every entry collides on
    /// all bits up to the depth limit. An overflowed bucket may exceed the
    /// nominal size cap and is never asked to split again.
    pub(crate) overflowed: bool,

    pub(crate) entries: Vec<Entry<K, V>>,
}

impl<K, V> Bucket<K, V> {
    pub(crate) fn new(id: u64, depth: usize) -> Self {
        Self {
            id,
            depth,
            overflowed: false,
            entries: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the position of `key` among this bucket's entries, if
    /// present.
    pub(crate) fn position_of<Q: ?Sized + Eq>(&self, hash: u64, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
    {
        self.entries
            .iter()
            .position(|e| e.hash == hash && e.key.borrow() == key)
    }

    pub(crate) fn get<Q: ?Sized + Eq>(&self, hash: u64, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
    {
        self.position_of(hash, key).map(|i| &self.entries[i].value)
    }
}
