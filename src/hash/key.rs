// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Hashing and equality as seen by the trie.
//!
//! The trie only ever asks two things of a key: a hash, and whether it's
//! equal to another key. Both are allowed to fail. Anything implementing
//! [`Hash`] gets [`TryHash`] for free, and anything implementing
//! [`PartialEq`] gets [`TryEq`] for free; neither of those ever fails.
//! Dynamically typed keys can implement the traits themselves instead.

use std::hash::{BuildHasher, Hash, Hasher};

use crate::error::{EqError, HashError};

/// The hash of a key as the trie consumes it, five bits per level.
pub type HashCode = i32;

/// Reserved to mean "hashing failed" by hosts with C style hash functions.
const FAILED_HASH: HashCode = -1;

/// Hashing which may fail.
pub trait TryHash {
    /// Feed this value into `state`.
    fn try_hash<H: Hasher>(&self, state: &mut H) -> Result<(), HashError>;
}

impl<A> TryHash for A
where
    A: Hash + ?Sized,
{
    #[inline]
    fn try_hash<H: Hasher>(&self, state: &mut H) -> Result<(), HashError> {
        self.hash(state);
        Ok(())
    }
}

/// Equality which may fail.
pub trait TryEq<Rhs: ?Sized = Self> {
    /// Test whether `self` equals `other`.
    fn try_eq(&self, other: &Rhs) -> Result<bool, EqError>;
}

impl<A, B> TryEq<B> for A
where
    A: PartialEq<B> + ?Sized,
    B: ?Sized,
{
    #[inline]
    fn try_eq(&self, other: &B) -> Result<bool, EqError> {
        Ok(self == other)
    }
}

/// Fold a 64 bit hash into a [`HashCode`].
///
/// The two halves are XORed together, and a result of `-1` becomes `-2`.
/// Tree shapes depend on this being exact.
#[inline]
pub fn reduce_hash(hash: u64) -> HashCode {
    let xored = (hash as u32 as HashCode) ^ ((hash >> 32) as u32 as HashCode);
    if xored == FAILED_HASH {
        -2
    } else {
        xored
    }
}

pub(crate) fn hash_key<K, S>(bh: &S, key: &K) -> Result<HashCode, HashError>
where
    K: TryHash + ?Sized,
    S: BuildHasher,
{
    let mut hasher = bh.build_hasher();
    key.try_hash(&mut hasher)?;
    Ok(reduce_hash(hasher.finish()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::IdentityHasher;
    use std::hash::BuildHasherDefault;

    #[test]
    fn reduction_xors_the_halves() {
        assert_eq!(0, reduce_hash(0));
        assert_eq!(3, reduce_hash(0x0000_0001_0000_0002));
        assert_eq!(0x1234_5678, reduce_hash(0x1234_5678));
        assert_eq!(0x1234_5678, reduce_hash(0x1234_5678_0000_0000));
        assert_eq!(0, reduce_hash(u64::MAX));
        assert_eq!(i32::MIN, reduce_hash(0x8000_0000));
    }

    #[test]
    fn reduction_never_yields_the_failure_sentinel() {
        assert_eq!(-2, reduce_hash(0xFFFF_FFFF));
        assert_eq!(-2, reduce_hash(0xFFFF_FFFF_0000_0000));
        assert_eq!(-2, reduce_hash(0x0F0F_0F0F_F0F0_F0F0));
    }

    #[test]
    fn hash_key_goes_through_the_build_hasher() {
        let bh = BuildHasherDefault::<IdentityHasher>::default();
        assert_eq!(Ok(1234), hash_key(&bh, &1234u64));
        assert_eq!(Ok(-2), hash_key(&bh, &0xFFFF_FFFFu64));
    }

    struct Unhashable;

    impl TryHash for Unhashable {
        fn try_hash<H: Hasher>(&self, _state: &mut H) -> Result<(), HashError> {
            Err(HashError::new("unhashable"))
        }
    }

    #[test]
    fn hash_key_propagates_failures() {
        let bh = BuildHasherDefault::<IdentityHasher>::default();
        assert_eq!(Err(HashError::new("unhashable")), hash_key(&bh, &Unhashable));
    }

    #[test]
    fn blanket_eq_never_fails() {
        assert_eq!(Ok(true), "a".try_eq("a"));
        assert_eq!(Ok(false), 1.0f64.try_eq(&f64::NAN));
        assert_eq!(Ok(true), String::from("x").try_eq("x"));
    }
}
