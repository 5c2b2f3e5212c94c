// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// The level size of HAMTs, in bits
/// Branching factor is 2 ^ HashLevelSize.
pub(crate) const HASH_LEVEL_SIZE: usize = 5;

/// Occupancy at which a bitmap node turns into an array node.
// An array node that drops below this is turned back into a bitmap node.
pub(crate) const ARRAY_NODE_THRESHOLD: usize = 16;

/// Seven levels of 5-bit hash slices, plus one for full-hash collisions.
pub(crate) const MAX_TREE_DEPTH: usize = 8;
