// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::borrow::Borrow;

use archery::{SharedPointer, SharedPointerKind};
use bitmaps::Bitmap;
use imbl_sized_chunks::SparseChunk;

use crate::config::ARRAY_NODE_THRESHOLD;
use crate::error::HamtError;
use crate::hash::key::{HashCode, TryEq};
use crate::nodes::hamt::{ArrayNode, Assoc, Node, Slot, Without, HASH_SHIFT, HASH_WIDTH};
use crate::util::{bitindex, bitpos, mask};

/// A sparse node: one bit per occupied hash slice, and a compacted array
/// of slots in bit order.
pub(crate) struct BitmapNode<K, V, P: SharedPointerKind> {
    bitmap: Bitmap<HASH_WIDTH>,
    slots: Vec<Slot<K, V, P>>,
}

impl<K, V, P> Clone for BitmapNode<K, V, P>
where
    K: Clone,
    V: Clone,
    P: SharedPointerKind,
{
    fn clone(&self) -> Self {
        BitmapNode {
            bitmap: self.bitmap,
            slots: self.slots.clone(),
        }
    }
}

impl<K, V, P: SharedPointerKind> Default for BitmapNode<K, V, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, P: SharedPointerKind> BitmapNode<K, V, P> {
    #[inline]
    pub(crate) fn new() -> Self {
        BitmapNode {
            bitmap: Bitmap::new(),
            slots: Vec::new(),
        }
    }

    /// A node holding a single pair.
    pub(crate) fn unit(shift: usize, key: K, value: V, hash: HashCode) -> Self {
        let mut bitmap = Bitmap::new();
        bitmap.set(mask(hash, shift), true);
        BitmapNode {
            bitmap,
            slots: vec![Slot::Pair(key, value, hash)],
        }
    }

    pub(crate) fn from_parts(bitmap: Bitmap<HASH_WIDTH>, slots: Vec<Slot<K, V, P>>) -> Self {
        debug_assert_eq!(bitmap.len(), slots.len());
        BitmapNode { bitmap, slots }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn bitmap(&self) -> u32 {
        self.bitmap.into_value()
    }

    #[inline]
    pub(crate) fn slots(&self) -> &[Slot<K, V, P>] {
        &self.slots
    }

    #[inline]
    fn contains(&self, bit: u32) -> bool {
        self.bitmap() & bit != 0
    }

    pub(crate) fn into_slot(mut self) -> Slot<K, V, P> {
        if let [Slot::Pair(..)] = self.slots.as_slice() {
            if let Some(pair) = self.slots.pop() {
                return pair;
            }
        }
        Slot::Node(SharedPointer::new(Node::Bitmap(self)))
    }

    pub(crate) fn find<BK>(
        &self,
        shift: usize,
        hash: HashCode,
        key: &BK,
    ) -> Result<Option<(&K, &V)>, HamtError>
    where
        BK: TryEq + ?Sized,
        K: Borrow<BK>,
    {
        let bit = bitpos(hash, shift);
        if !self.contains(bit) {
            return Ok(None);
        }
        match &self.slots[bitindex(self.bitmap(), bit)] {
            Slot::Pair(current, value, _) => {
                if key.try_eq(current.borrow()).map_err(HamtError::KeyEq)? {
                    Ok(Some((current, value)))
                } else {
                    Ok(None)
                }
            }
            Slot::Node(child) => child.find(shift + HASH_SHIFT, hash, key),
        }
    }

    pub(crate) fn assoc(
        &self,
        shift: usize,
        hash: HashCode,
        key: K,
        value: V,
    ) -> Result<Assoc<K, V, P>, HamtError>
    where
        K: TryEq + Clone,
        V: TryEq + Clone,
    {
        let bit = bitpos(hash, shift);
        let index = bitindex(self.bitmap(), bit);
        if !self.contains(bit) {
            let node = if self.len() >= ARRAY_NODE_THRESHOLD {
                Node::Array(self.promote(shift, hash, key, value))
            } else {
                Node::Bitmap(self.with_inserted(mask(hash, shift), index, Slot::Pair(key, value, hash)))
            };
            return Ok(Assoc::Inserted(node));
        }
        match &self.slots[index] {
            Slot::Node(child) => {
                let result = Node::assoc(child, shift + HASH_SHIFT, hash, key, value)?;
                Ok(result.map(|node| {
                    Node::Bitmap(self.with_slot(index, Slot::Node(SharedPointer::new(node))))
                }))
            }
            Slot::Pair(current_key, current_value, current_hash) => {
                if key.try_eq(current_key).map_err(HamtError::KeyEq)? {
                    // Values which can't be compared count as different.
                    if let Ok(true) = value.try_eq(current_value) {
                        return Ok(Assoc::Unchanged);
                    }
                    // The key already in the map stays.
                    let slot = Slot::Pair(current_key.clone(), value, *current_hash);
                    return Ok(Assoc::Updated(Node::Bitmap(self.with_slot(index, slot))));
                }
                let merged = Node::merge_pairs(
                    shift + HASH_SHIFT,
                    current_key.clone(),
                    current_value.clone(),
                    *current_hash,
                    key,
                    value,
                    hash,
                )?;
                let slot = Slot::Node(SharedPointer::new(merged));
                Ok(Assoc::Inserted(Node::Bitmap(self.with_slot(index, slot))))
            }
        }
    }

    pub(crate) fn without<BK>(
        &self,
        shift: usize,
        hash: HashCode,
        key: &BK,
    ) -> Result<Without<K, V, P>, HamtError>
    where
        BK: TryEq + ?Sized,
        K: Borrow<BK> + Clone,
        V: Clone,
    {
        let bit = bitpos(hash, shift);
        if !self.contains(bit) {
            return Ok(Without::NotFound);
        }
        let index = bitindex(self.bitmap(), bit);
        match &self.slots[index] {
            Slot::Node(child) => match child.without(shift + HASH_SHIFT, hash, key)? {
                Without::NotFound => Ok(Without::NotFound),
                Without::Empty => {
                    unreachable!("subtrees of a bitmap node always hold at least two pairs")
                }
                Without::Replaced(node) => Ok(Without::Replaced(Node::Bitmap(
                    self.with_slot(index, node.into_slot()),
                ))),
                Without::Collapsed(key, value, hash) => Ok(Without::Replaced(Node::Bitmap(
                    self.with_slot(index, Slot::Pair(key, value, hash)),
                ))),
            },
            Slot::Pair(current, _, _) => {
                if !key.try_eq(current.borrow()).map_err(HamtError::KeyEq)? {
                    Ok(Without::NotFound)
                } else if self.len() == 1 {
                    Ok(Without::Empty)
                } else {
                    Ok(Without::Replaced(Node::Bitmap(
                        self.with_removed(mask(hash, shift), index),
                    )))
                }
            }
        }
    }

    fn with_slot(&self, index: usize, slot: Slot<K, V, P>) -> Self
    where
        K: Clone,
        V: Clone,
    {
        let mut node = self.clone();
        node.slots[index] = slot;
        node
    }

    fn with_inserted(&self, bit_index: usize, index: usize, slot: Slot<K, V, P>) -> Self
    where
        K: Clone,
        V: Clone,
    {
        let mut bitmap = self.bitmap;
        bitmap.set(bit_index, true);
        let mut slots = Vec::with_capacity(self.len() + 1);
        slots.extend_from_slice(&self.slots[..index]);
        slots.push(slot);
        slots.extend_from_slice(&self.slots[index..]);
        BitmapNode { bitmap, slots }
    }

    fn with_removed(&self, bit_index: usize, index: usize) -> Self
    where
        K: Clone,
        V: Clone,
    {
        let mut bitmap = self.bitmap;
        bitmap.set(bit_index, false);
        let mut slots = Vec::with_capacity(self.len() - 1);
        slots.extend_from_slice(&self.slots[..index]);
        slots.extend_from_slice(&self.slots[index + 1..]);
        BitmapNode { bitmap, slots }
    }

    /// Spread a full node over an array node, with the new pair added.
    fn promote(&self, shift: usize, hash: HashCode, key: K, value: V) -> ArrayNode<K, V, P>
    where
        K: Clone,
        V: Clone,
    {
        let child_shift = shift + HASH_SHIFT;
        let mut children = SparseChunk::new();
        for (bit_index, slot) in self.bitmap.into_iter().zip(self.slots.iter()) {
            let child = match slot {
                Slot::Node(node) => node.clone(),
                Slot::Pair(key, value, hash) => SharedPointer::new(Node::Bitmap(
                    BitmapNode::unit(child_shift, key.clone(), value.clone(), *hash),
                )),
            };
            children.insert(bit_index, child);
        }
        let unit = BitmapNode::unit(child_shift, key, value, hash);
        children.insert(mask(hash, shift), SharedPointer::new(Node::Bitmap(unit)));
        ArrayNode::from_children(children)
    }
}
