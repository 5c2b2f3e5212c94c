// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

// Every codebase needs a `util` module.

use crate::config::HASH_LEVEL_SIZE;
use crate::hash::key::HashCode;

pub(crate) const SLICE_MASK: u32 = (1 << HASH_LEVEL_SIZE) - 1;

/// Count the set bits of a 32 bit word.
#[inline]
pub(crate) fn popcount32(x: u32) -> u32 {
    x.count_ones()
}

/// The 5 bit slice of `hash` consumed at `shift`, usable as a direct array index.
#[inline]
pub(crate) fn mask(hash: HashCode, shift: usize) -> usize {
    debug_assert!(shift < 32);
    ((hash as u32 >> shift) & SLICE_MASK) as usize
}

/// The hash slice at `shift` as a single bit.
#[inline]
pub(crate) fn bitpos(hash: HashCode, shift: usize) -> u32 {
    1 << mask(hash, shift)
}

/// Position of `bit`'s entry in a bitmap-compacted array.
#[inline]
pub(crate) fn bitindex(bitmap: u32, bit: u32) -> usize {
    popcount32(bitmap & (bit - 1)) as usize
}

#[cfg(test)]
macro_rules! assert_covariant {
    ($name:ident<$($gen:tt),*> in $param:ident) => {
        #[allow(dead_code, unused_assignments, unused_variables)]
        const _: () = {
            type Tmp<$param> = $name<$($gen),*>;
            fn assign<'a, 'b: 'a>(src: Tmp<&'b i32>, mut dst: Tmp<&'a i32>) {
                dst = src;
            }
        };
    }
}
