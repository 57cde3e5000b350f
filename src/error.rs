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

//! Status values returned by lookups and removals.

/// A miss reported by [`get`] or [`remove`].
///
/// A miss is an ordinary negative result: the table remains fully usable
/// and nothing is logged. A key whose directory slot has no bucket assigned
/// is a miss like any other — no bucket means the key cannot be present.
/// (Such slots appear when a split consumes more than one hash bit at once;
/// [`local_depth`] reports them as `None`.)
///
/// [`get`]: crate::ExtendibleHashMap::get
/// [`remove`]: crate::ExtendibleHashMap::remove
/// [`local_depth`]: crate::ExtendibleHashMap::local_depth
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, thiserror::Error)]
pub enum Error {
    /// The key is not present in the table.
    #[error("key not found")]
    KeyNotFound,
}
