// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! # Persistent Hash Array Mapped Tries
//!
//! This crate provides [`HamtMap`], an immutable hash map. Updating it
//! never changes the map you started from: [`assoc`][GenericHamtMap::assoc]
//! and [`without`][GenericHamtMap::without] return new maps, which share
//! every node the update didn't have to touch with the original. Keeping
//! old versions around is cheap, and cloning a map is O(1).
//!
//! ## The Trie
//!
//! Keys are hashed to a 32 bit [`HashCode`], which is consumed five bits
//! at a time, one slice per level of the tree. Each level holds one of
//! three kinds of node:
//!
//! * bitmap nodes, for sparse levels, which keep a 32 bit occupancy
//!   bitmap and a compacted array of up to 16 entries;
//! * array nodes, for dense levels, which index 16 to 32 children
//!   directly by hash slice;
//! * collision nodes, for keys whose hashes are identical, which are
//!   searched linearly.
//!
//! Nodes change kind as the map grows and shrinks, so the tree never gets
//! deeper than eight levels.
//!
//! ## Fallible Keys
//!
//! The map doesn't insist on [`Hash`][std::hash::Hash] and [`Eq`]. Keys
//! only need [`TryHash`] and [`TryEq`], and values [`TryEq`], which lets
//! dynamically typed values refuse to be hashed or compared. Every
//! operation which may hash or compare returns a [`Result`], and a failed
//! operation leaves its map exactly as it was. Types implementing the
//! standard traits get the fallible ones for free and can't fail, and
//! for those the map also implements [`PartialEq`], [`FromIterator`] and
//! [`Extend`].
//!
//! ```
//! # use phamt::{HamtError, HamtMap};
//! # fn main() -> Result<(), HamtError> {
//! let map = HamtMap::new().assoc("a", 1)?.assoc("b", 2)?;
//! let smaller = map.without("a")?;
//! assert_eq!(Ok(Some(&1)), map.find("a"));
//! assert_eq!(Ok(None), smaller.find("a"));
//! assert_eq!(2, map.len());
//! assert_eq!(1, smaller.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! | ------- | ----------- |
//! | [`proptest`](https://crates.io/crates/proptest) | Strategies for the map in the [`proptest`][proptest] module |
//! | [`quickcheck`](https://crates.io/crates/quickcheck) | [`quickcheck::Arbitrary`](https://docs.rs/quickcheck/latest/quickcheck/trait.Arbitrary.html) implementation for the map |
//! | [`serde`](https://crates.io/crates/serde) | [`Serialize`](https://docs.rs/serde/latest/serde/trait.Serialize.html) and [`Deserialize`](https://docs.rs/serde/latest/serde/trait.Deserialize.html) implementations for the map |
//! | [`arbitrary`](https://crates.io/crates/arbitrary/) | [`arbitrary::Arbitrary`](https://docs.rs/arbitrary/latest/arbitrary/trait.Arbitrary.html) implementation for the map |
//! | [`triomphe`](https://crates.io/crates/triomphe/) | Use [`triomphe::Arc`](https://docs.rs/triomphe/latest/triomphe/struct.Arc.html) as the default shared pointer |
//! | `debug` | The [`dump`][GenericHamtMap::dump] method, rendering the trie node by node |

#![forbid(rust_2018_idioms)]
#![deny(nonstandard_style)]
#![warn(unreachable_pub, missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
mod util;

mod config;
mod hash;
mod nodes;

pub mod error;

#[cfg(any(test, feature = "proptest"))]
pub mod proptest;

#[cfg(feature = "serde")]
#[doc(hidden)]
pub mod ser;

#[cfg(feature = "arbitrary")]
#[doc(hidden)]
pub mod arbitrary;

#[cfg(feature = "quickcheck")]
#[doc(hidden)]
pub mod quickcheck;

pub mod shared_ptr;

pub mod hamtmap {
    //! A persistent hash map.
    //!
    //! See [`GenericHamtMap`] for the operations.
    pub use crate::hash::map::*;
}

pub use crate::error::{EqError, HamtError, HashError};
pub use crate::hamtmap::{GenericHamtMap, HamtMap};
pub use crate::hash::key::{reduce_hash, HashCode, TryEq, TryHash};
