// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A persistent hash map.
//!
//! An immutable map using [hash array mapped tries][1]. Every update
//! returns a new map, sharing all the nodes the update didn't touch with
//! the map it was made from, so old versions stay valid and cheap to keep.
//!
//! Most operations on this map are O(log<sub>32</sub> n), with a tree at
//! most eight levels deep.
//!
//! Keys only need [`TryHash`] and [`TryEq`], which any type implementing
//! [`Hash`][std::hash::Hash] and [`PartialEq`] gets for free. Types whose
//! hashing or comparison can fail implement the traits directly, and the
//! failure comes back as a [`HamtError`] from whichever operation hit it.
//!
//! Map entries will have a predictable order based on the hasher
//! being used. Unless otherwise specified, this will be the standard
//! [`RandomState`][std::collections::hash_map::RandomState] hasher.
//!
//! [1]: https://en.wikipedia.org/wiki/Hash_array_mapped_trie
//! [std::hash::Hash]: https://doc.rust-lang.org/std/hash/trait.Hash.html
//! [std::collections::hash_map::RandomState]: https://doc.rust-lang.org/std/collections/hash_map/struct.RandomState.html

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt::{Debug, Error, Formatter};
use std::hash::{BuildHasher, Hash};
use std::iter::{FromIterator, FusedIterator};

use archery::{SharedPointer, SharedPointerKind};

use crate::error::HamtError;
use crate::hash::key::{hash_key, TryEq, TryHash};
use crate::nodes::hamt::{Assoc, Iter as NodeIter, Node, NodeRef, Without};
use crate::shared_ptr::DefaultSharedPtr;

/// Construct a hash map from a sequence of key/value pairs.
///
/// Keys have to implement [`Hash`][std::hash::Hash] and [`Eq`], and values
/// [`PartialEq`], so that building the map can't fail.
///
/// # Examples
///
/// ```
/// # #[macro_use] extern crate phamt;
/// # use phamt::HamtMap;
/// # fn main() {
/// let map: HamtMap<i32, i32> = hamtmap!{
///     1 => 11,
///     2 => 22,
///     3 => 33,
/// };
/// assert_eq!(Ok(Some(&22)), map.find(&2));
/// # }
/// ```
///
/// [std::hash::Hash]: https://doc.rust-lang.org/std/hash/trait.Hash.html
#[macro_export]
macro_rules! hamtmap {
    () => { $crate::hamtmap::HamtMap::new() };

    ( $( $key:expr => $value:expr ),* $(,)? ) => {{
        <$crate::hamtmap::HamtMap<_, _> as ::std::iter::FromIterator<_>>::from_iter(
            ::std::vec![$(($key, $value)),*]
        )
    }};
}

/// Type alias for [`GenericHamtMap`] that uses [`std::hash::RandomState`] as the default hasher and [`DefaultSharedPtr`] as the pointer type.
///
/// [GenericHamtMap]: ./struct.GenericHamtMap.html
/// [`std::hash::RandomState`]: https://doc.rust-lang.org/stable/std/collections/hash_map/struct.RandomState.html
/// [DefaultSharedPtr]: ../shared_ptr/type.DefaultSharedPtr.html
pub type HamtMap<K, V> = GenericHamtMap<K, V, RandomState, DefaultSharedPtr>;

/// A persistent hash map.
///
/// See the [module documentation][self] for an overview.
///
/// Cloning a map is O(1), and so is comparing two maps made from one
/// another without changes, through [`ptr_eq`][GenericHamtMap::ptr_eq].
pub struct GenericHamtMap<K, V, S, P: SharedPointerKind> {
    size: usize,
    root: NodeRef<K, V, P>,
    hasher: S,
}

impl<K, V, S, P> GenericHamtMap<K, V, S, P>
where
    S: Default,
    P: SharedPointerKind,
{
    /// Construct an empty hash map.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V, S, P: SharedPointerKind> GenericHamtMap<K, V, S, P> {
    /// Construct an empty hash map using the provided hasher.
    #[inline]
    #[must_use]
    pub fn with_hasher(hasher: S) -> Self {
        GenericHamtMap {
            size: 0,
            root: SharedPointer::new(Node::empty()),
            hasher,
        }
    }

    /// Test whether a hash map is empty.
    ///
    /// Time: O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate phamt;
    /// # use phamt::hamtmap::HamtMap;
    /// # fn main() {
    /// assert!(
    ///   !hamtmap!{1 => 2}.is_empty()
    /// );
    /// assert!(
    ///   HamtMap::<i32, i32>::new().is_empty()
    /// );
    /// # }
    /// ```
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of entries in a hash map.
    ///
    /// Time: O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate phamt;
    /// # fn main() {
    /// assert_eq!(3, hamtmap!{
    ///   1 => 11,
    ///   2 => 22,
    ///   3 => 33
    /// }.len());
    /// # }
    /// ```
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Test whether two maps refer to the same content in memory.
    ///
    /// This is true if the two sides are references to the same map,
    /// or if the two maps refer to the same root node.
    ///
    /// This would return true if you're comparing a map to itself, or
    /// if you're comparing a map to a fresh clone of itself, or to the
    /// result of an update which changed nothing.
    ///
    /// Time: O(1)
    pub fn ptr_eq(&self, other: &Self) -> bool {
        SharedPointer::ptr_eq(&self.root, &other.root)
    }

    /// Get a reference to the map's [`BuildHasher`].
    #[must_use]
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Get an iterator over the key/value pairs of a hash map.
    ///
    /// Please note that the order is consistent between maps using
    /// the same hasher, but no other ordering guarantee is offered.
    /// Items will not come out in insertion order or sort order.
    /// They will, however, come out in the same order every time for
    /// the same map.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter {
            it: NodeIter::new(&self.root, self.size),
        }
    }

    /// Get an iterator over a hash map's keys.
    ///
    /// Please note that the order is consistent between maps using
    /// the same hasher, but no other ordering guarantee is offered.
    /// Items will not come out in insertion order or sort order.
    /// They will, however, come out in the same order every time for
    /// the same map.
    #[inline]
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V, P> {
        Keys {
            it: NodeIter::new(&self.root, self.size),
        }
    }

    /// Get an iterator over a hash map's values.
    ///
    /// Please note that the order is consistent between maps using
    /// the same hasher, but no other ordering guarantee is offered.
    /// Items will not come out in insertion order or sort order.
    /// They will, however, come out in the same order every time for
    /// the same map.
    #[inline]
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V, P> {
        Values {
            it: NodeIter::new(&self.root, self.size),
        }
    }

    fn with_root(&self, root: Node<K, V, P>, size: usize) -> Self
    where
        S: Clone,
    {
        GenericHamtMap {
            size,
            root: SharedPointer::new(root),
            hasher: self.hasher.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &Node<K, V, P> {
        &self.root
    }

    /// Assert every structural invariant of the trie.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert!(self.root.is_bitmap() || self.root.is_array());
        assert_eq!(self.size, self.root.check(0, false).len());
        assert_eq!(self.size, self.iter().count());
    }
}

impl<K, V, S, P> GenericHamtMap<K, V, S, P>
where
    S: BuildHasher,
    P: SharedPointerKind,
{
    /// Get the value for a key from a hash map.
    ///
    /// An empty map answers `None` without hashing the key at all.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate phamt;
    /// # fn main() {
    /// let map = hamtmap!{123 => "lol"};
    /// assert_eq!(
    ///   Ok(Some(&"lol")),
    ///   map.find(&123)
    /// );
    /// # }
    /// ```
    pub fn find<BK>(&self, key: &BK) -> Result<Option<&V>, HamtError>
    where
        BK: TryHash + TryEq + ?Sized,
        K: Borrow<BK>,
    {
        Ok(self.find_key_value(key)?.map(|(_, value)| value))
    }

    /// Get the key/value pair for a key from a hash map.
    ///
    /// The key returned is the one stored in the map, which is the first
    /// equal key ever inserted.
    ///
    /// Time: O(log n)
    pub fn find_key_value<BK>(&self, key: &BK) -> Result<Option<(&K, &V)>, HamtError>
    where
        BK: TryHash + TryEq + ?Sized,
        K: Borrow<BK>,
    {
        if self.size == 0 {
            return Ok(None);
        }
        let hash = hash_key(&self.hasher, key)?;
        self.root.find(0, hash, key)
    }

    /// Test for the presence of a key in a hash map.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate phamt;
    /// # fn main() {
    /// let map = hamtmap!{123 => "lol"};
    /// assert_eq!(Ok(true), map.contains_key(&123));
    /// assert_eq!(Ok(false), map.contains_key(&321));
    /// # }
    /// ```
    pub fn contains_key<BK>(&self, key: &BK) -> Result<bool, HamtError>
    where
        BK: TryHash + TryEq + ?Sized,
        K: Borrow<BK>,
    {
        Ok(self.find_key_value(key)?.is_some())
    }

    /// Test whether two maps hold equal keys mapped to equal values.
    ///
    /// Maps sharing a root are equal without looking any further, and maps
    /// of different sizes are unequal. Otherwise each pair of `self` is
    /// looked up in `other`, stopping at the first difference.
    ///
    /// Time: O(n log n)
    pub fn try_eq(&self, other: &Self) -> Result<bool, HamtError>
    where
        K: TryHash + TryEq,
        V: TryEq,
    {
        if self.ptr_eq(other) {
            return Ok(true);
        }
        if self.size != other.size {
            return Ok(false);
        }
        for (key, value) in self.iter() {
            // Hashed with the other map's hasher, which needn't match ours.
            let found = match other.find(key)? {
                Some(found) => found,
                None => return Ok(false),
            };
            if !value.try_eq(found).map_err(HamtError::ValueEq)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<K, V, S, P> GenericHamtMap<K, V, S, P>
where
    K: TryHash + TryEq + Clone,
    V: TryEq + Clone,
    S: BuildHasher + Clone,
    P: SharedPointerKind,
{
    /// Construct a new hash map by inserting a key/value mapping into a
    /// map.
    ///
    /// If the map already has a mapping for the given key, the previous
    /// value is overwritten, and the previous key is kept. If that value
    /// is equal to the new one, the map returned shares its root with
    /// this one.
    ///
    /// The map this is called on never changes, whether the update
    /// succeeds or fails.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate phamt;
    /// # use phamt::hamtmap::HamtMap;
    /// # fn main() -> Result<(), phamt::HamtError> {
    /// let map = hamtmap!{};
    /// let map = map.assoc(123, "123")?;
    /// let map = map.assoc(456, "456")?;
    /// assert_eq!(
    ///   map,
    ///   hamtmap!{123 => "123", 456 => "456"}
    /// );
    /// # Ok(())
    /// # }
    /// ```
    pub fn assoc(&self, key: K, value: V) -> Result<Self, HamtError> {
        let hash = hash_key(&self.hasher, &key)?;
        Ok(match Node::assoc(&self.root, 0, hash, key, value)? {
            Assoc::Unchanged => self.clone(),
            Assoc::Updated(root) => self.with_root(root, self.size),
            Assoc::Inserted(root) => self.with_root(root, self.size + 1),
        })
    }

    /// Construct a hash map from a sequence of key/value pairs, stopping
    /// at the first key which fails to hash or compare.
    ///
    /// Later pairs overwrite earlier pairs with equal keys.
    pub fn try_from_iter<I>(iter: I) -> Result<Self, HamtError>
    where
        I: IntoIterator<Item = (K, V)>,
        S: Default,
    {
        iter.into_iter()
            .try_fold(Self::default(), |map, (key, value)| map.assoc(key, value))
    }
}

impl<K, V, S, P> GenericHamtMap<K, V, S, P>
where
    K: Clone,
    V: Clone,
    S: BuildHasher + Clone,
    P: SharedPointerKind,
{
    /// Construct a hash map without the given key.
    ///
    /// If the key isn't in the map, the map returned shares its root with
    /// this one. Removing the last key gives a fresh empty map with the
    /// same hasher.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate phamt;
    /// # use phamt::hamtmap::HamtMap;
    /// # fn main() -> Result<(), phamt::HamtError> {
    /// let map = hamtmap!{123 => "123", 456 => "456"};
    /// assert_eq!(
    ///   hamtmap!{456 => "456"},
    ///   map.without(&123)?
    /// );
    /// # Ok(())
    /// # }
    /// ```
    pub fn without<BK>(&self, key: &BK) -> Result<Self, HamtError>
    where
        BK: TryHash + TryEq + ?Sized,
        K: Borrow<BK>,
    {
        let hash = hash_key(&self.hasher, key)?;
        Ok(match self.root.without(0, hash, key)? {
            Without::NotFound => self.clone(),
            Without::Empty => Self::with_hasher(self.hasher.clone()),
            Without::Replaced(root) => self.with_root(root, self.size - 1),
            Without::Collapsed(..) => unreachable!("the root is never a collision node"),
        })
    }
}

/// Unwrap the outcome of an operation whose keys and values hash and
/// compare through [`Hash`] and [`PartialEq`].
fn infallible<A>(result: Result<A, HamtError>) -> A {
    match result {
        Ok(value) => value,
        Err(err) => unreachable!("infallible hashing or comparison failed: {}", err),
    }
}

// Core traits

impl<K, V, S, P> Clone for GenericHamtMap<K, V, S, P>
where
    S: Clone,
    P: SharedPointerKind,
{
    /// Clone a map.
    ///
    /// Time: O(1)
    #[inline]
    fn clone(&self) -> Self {
        GenericHamtMap {
            size: self.size,
            root: self.root.clone(),
            hasher: self.hasher.clone(),
        }
    }
}

impl<K, V, S, P> PartialEq for GenericHamtMap<K, V, S, P>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
    P: SharedPointerKind,
{
    fn eq(&self, other: &Self) -> bool {
        infallible(self.try_eq(other))
    }
}

impl<K, V, S, P> Eq for GenericHamtMap<K, V, S, P>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
    P: SharedPointerKind,
{
}

impl<K, V, S, P> Default for GenericHamtMap<K, V, S, P>
where
    S: Default,
    P: SharedPointerKind,
{
    #[inline]
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S, P> Debug for GenericHamtMap<K, V, S, P>
where
    K: Debug,
    V: Debug,
    P: SharedPointerKind,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let mut d = f.debug_map();
        for (k, v) in self {
            d.entry(k, v);
        }
        d.finish()
    }
}

#[cfg(any(test, feature = "debug"))]
impl<K, V, S, P> GenericHamtMap<K, V, S, P>
where
    K: Debug,
    V: Debug,
    P: SharedPointerKind,
{
    /// Render the trie node by node, for debugging.
    ///
    /// Each level is indented by two spaces. Subtrees hanging off a
    /// bitmap node are introduced by a `NULL:` line, and children of an
    /// array node by their index.
    ///
    /// ```text
    /// HAMT(len=2):
    ///   BitmapNode(count=2 bitmap=0b1010):
    ///     1: "a"
    ///     3: "b"
    /// ```
    pub fn dump(&self) -> String {
        struct Dump<'a, K, V, P: SharedPointerKind> {
            size: usize,
            root: &'a Node<K, V, P>,
        }

        impl<'a, K, V, P> std::fmt::Display for Dump<'a, K, V, P>
        where
            K: Debug,
            V: Debug,
            P: SharedPointerKind,
        {
            fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
                writeln!(f, "HAMT(len={}):", self.size)?;
                self.root.dump(f, 1)
            }
        }

        Dump {
            size: self.size,
            root: &self.root,
        }
        .to_string()
    }
}

// Iterators

/// An iterator over the elements of a map.
pub struct Iter<'a, K, V, P: SharedPointerKind> {
    it: NodeIter<'a, K, V, P>,
}

// We impl Clone instead of deriving it, because we want Clone even if K and V aren't.
impl<'a, K, V, P: SharedPointerKind> Clone for Iter<'a, K, V, P> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
        }
    }
}

impl<'a, K, V, P> Iterator for Iter<'a, K, V, P>
where
    P: SharedPointerKind,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Iter<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Iter<'a, K, V, P> {}

/// An iterator over the keys of a map.
pub struct Keys<'a, K, V, P: SharedPointerKind> {
    it: NodeIter<'a, K, V, P>,
}

impl<'a, K, V, P: SharedPointerKind> Clone for Keys<'a, K, V, P> {
    fn clone(&self) -> Self {
        Keys {
            it: self.it.clone(),
        }
    }
}

impl<'a, K, V, P> Iterator for Keys<'a, K, V, P>
where
    P: SharedPointerKind,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Keys<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Keys<'a, K, V, P> {}

/// An iterator over the values of a map.
pub struct Values<'a, K, V, P: SharedPointerKind> {
    it: NodeIter<'a, K, V, P>,
}

impl<'a, K, V, P: SharedPointerKind> Clone for Values<'a, K, V, P> {
    fn clone(&self) -> Self {
        Values {
            it: self.it.clone(),
        }
    }
}

impl<'a, K, V, P> Iterator for Values<'a, K, V, P>
where
    P: SharedPointerKind,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Values<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Values<'a, K, V, P> {}

impl<'a, K, V, S, P> IntoIterator for &'a GenericHamtMap<K, V, S, P>
where
    P: SharedPointerKind,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, P>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Conversions

impl<K, V, S, P> FromIterator<(K, V)> for GenericHamtMap<K, V, S, P>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from_iter<T>(i: T) -> Self
    where
        T: IntoIterator<Item = (K, V)>,
    {
        infallible(Self::try_from_iter(i))
    }
}

impl<K, V, S, P> Extend<(K, V)> for GenericHamtMap<K, V, S, P>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher + Clone,
    P: SharedPointerKind,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in iter {
            *self = infallible(self.assoc(key, value));
        }
    }
}

impl<K, V, S, P, const N: usize> From<[(K, V); N]> for GenericHamtMap<K, V, S, P>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from(arr: [(K, V); N]) -> Self {
        IntoIterator::into_iter(arr).collect()
    }
}

impl<K, V, S, P> From<Vec<(K, V)>> for GenericHamtMap<K, V, S, P>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from(m: Vec<(K, V)>) -> Self {
        m.into_iter().collect()
    }
}

// Tests
