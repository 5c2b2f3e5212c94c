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
use crate::nodes::hamt::{
    Assoc, BitmapNode, Node, NodeRef, Without, HASH_SHIFT, HASH_WIDTH,
};
use crate::util::mask;

/// A dense node: children indexed directly by hash slice.
///
/// Never holds pairs itself, and never fewer than
/// [`ARRAY_NODE_THRESHOLD`] children.
pub(crate) struct ArrayNode<K, V, P: SharedPointerKind> {
    children: SparseChunk<NodeRef<K, V, P>, HASH_WIDTH>,
}

// Children are shared pointers, so this doesn't need K or V to be Clone.
impl<K, V, P: SharedPointerKind> Clone for ArrayNode<K, V, P> {
    fn clone(&self) -> Self {
        ArrayNode {
            children: self.children.clone(),
        }
    }
}

impl<K, V, P: SharedPointerKind> ArrayNode<K, V, P> {
    pub(crate) fn from_children(children: SparseChunk<NodeRef<K, V, P>, HASH_WIDTH>) -> Self {
        debug_assert!(children.len() >= ARRAY_NODE_THRESHOLD);
        ArrayNode { children }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub(crate) fn children(&self) -> &SparseChunk<NodeRef<K, V, P>, HASH_WIDTH> {
        &self.children
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
        match self.children.get(mask(hash, shift)) {
            Some(child) => child.find(shift + HASH_SHIFT, hash, key),
            None => Ok(None),
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
        let index = mask(hash, shift);
        match self.children.get(index) {
            None => {
                let unit = BitmapNode::unit(shift + HASH_SHIFT, key, value, hash);
                let child = SharedPointer::new(Node::Bitmap(unit));
                Ok(Assoc::Inserted(Node::Array(self.with_child(index, child))))
            }
            Some(child) => {
                let result = Node::assoc(child, shift + HASH_SHIFT, hash, key, value)?;
                Ok(result.map(|node| {
                    Node::Array(self.with_child(index, SharedPointer::new(node)))
                }))
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
        let index = mask(hash, shift);
        let child = match self.children.get(index) {
            Some(child) => child,
            None => return Ok(Without::NotFound),
        };
        Ok(match child.without(shift + HASH_SHIFT, hash, key)? {
            Without::NotFound => Without::NotFound,
            Without::Replaced(node) => Without::Replaced(Node::Array(
                self.with_child(index, SharedPointer::new(node)),
            )),
            Without::Collapsed(key, value, hash) => {
                let unit = BitmapNode::unit(shift + HASH_SHIFT, key, value, hash);
                Without::Replaced(Node::Array(
                    self.with_child(index, SharedPointer::new(Node::Bitmap(unit))),
                ))
            }
            Without::Empty => {
                let remaining = self.len() - 1;
                if remaining == 0 {
                    Without::Empty
                } else if remaining >= ARRAY_NODE_THRESHOLD {
                    let mut node = self.clone();
                    node.children.remove(index);
                    Without::Replaced(Node::Array(node))
                } else {
                    Without::Replaced(Node::Bitmap(self.demote(index)))
                }
            }
        })
    }

    fn with_child(&self, index: usize, child: NodeRef<K, V, P>) -> Self {
        let mut node = self.clone();
        node.children.insert(index, child);
        node
    }

    /// Pack the children, bar the one at `removed`, into a bitmap node.
    fn demote(&self, removed: usize) -> BitmapNode<K, V, P>
    where
        K: Clone,
        V: Clone,
    {
        let mut bitmap = Bitmap::new();
        let mut slots = Vec::with_capacity(self.len() - 1);
        for index in self.children.indices() {
            if index == removed {
                continue;
            }
            bitmap.set(index, true);
            slots.push(Node::slot_for(&self.children[index]));
        }
        BitmapNode::from_parts(bitmap, slots)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nodes::hamt::Slot;
    use crate::shared_ptr::DefaultSharedPtr;

    type TestArray = ArrayNode<u32, u32, DefaultSharedPtr>;

    /// An array node with a unit bitmap child for each of `slices`.
    fn array(slices: impl IntoIterator<Item = u32>) -> TestArray {
        let mut children = SparseChunk::new();
        for slice in slices {
            let unit = BitmapNode::unit(HASH_SHIFT, slice, slice * 10, slice as HashCode);
            children.insert(slice as usize, SharedPointer::new(Node::Bitmap(unit)));
        }
        ArrayNode::from_children(children)
    }

    #[test]
    fn find_indexes_directly() {
        let node = array(0..17);
        assert_eq!(Some((&5, &50)), node.find(0, 5, &5u32).unwrap());
        assert_eq!(None, node.find(0, 20, &20u32).unwrap());
        assert_eq!(None, node.find(0, 5, &6u32).unwrap());
    }

    #[test]
    fn assoc_fills_empty_slices() {
        let node = array(0..17);
        match node.assoc(0, 30, 30, 300).unwrap() {
            Assoc::Inserted(Node::Array(grown)) => {
                assert_eq!(18, grown.len());
                assert!(grown.children().get(30).is_some());
            }
            _ => panic!("expected an insertion"),
        }
        assert_eq!(17, node.len());
    }

    #[test]
    fn removal_above_the_threshold_stays_an_array() {
        let node = array(0..17);
        match node.without(0, 3, &3u32).unwrap() {
            Without::Replaced(Node::Array(shrunk)) => {
                assert_eq!(16, shrunk.len());
                assert!(shrunk.children().get(3).is_none());
            }
            _ => panic!("expected an array node"),
        }
    }

    #[test]
    fn removal_below_the_threshold_packs_a_bitmap() {
        let node = array(0..16);
        match node.without(0, 3, &3u32).unwrap() {
            Without::Replaced(Node::Bitmap(packed)) => {
                assert_eq!(15, packed.len());
                assert_eq!(0xFFFF & !(1 << 3), packed.bitmap());
                // Unit children come back as plain pairs.
                assert!(packed.slots().iter().all(|slot| matches!(slot, Slot::Pair(..))));
            }
            _ => panic!("expected a bitmap node"),
        }
    }

    #[test]
    fn packing_keeps_subtrees_shared() {
        let mut children = SparseChunk::new();
        for slice in 2..16 {
            let unit = BitmapNode::unit(HASH_SHIFT, slice, slice * 10, slice as HashCode);
            children.insert(slice as usize, SharedPointer::new(Node::Bitmap(unit)));
        }
        let subtree: NodeRef<u32, u32, DefaultSharedPtr> =
            SharedPointer::new(Node::merge_pairs(HASH_SHIFT, 100, 0, 0, 101, 1, 1 << 5).unwrap());
        let collision: NodeRef<u32, u32, DefaultSharedPtr> =
            SharedPointer::new(Node::merge_pairs(HASH_SHIFT, 200, 0, 1, 201, 1, 1).unwrap());
        children.insert(0, subtree.clone());
        children.insert(1, collision.clone());
        let node = ArrayNode::from_children(children);
        assert_eq!(16, node.len());

        match node.without(0, 5, &5u32).unwrap() {
            Without::Replaced(packed @ Node::Bitmap(_)) => {
                let mut hashes = packed.check(0, false);
                hashes.sort_unstable();
                let mut expected: Vec<HashCode> = vec![0, 1, 1, 1 << 5];
                expected.extend((2..16).filter(|slice| *slice != 5));
                expected.sort_unstable();
                assert_eq!(expected, hashes);
                let slots = match &packed {
                    Node::Bitmap(bitmap) => bitmap.slots(),
                    _ => unreachable!(),
                };
                match slots {
                    [Slot::Node(first), Slot::Node(second), rest @ ..] => {
                        assert!(SharedPointer::ptr_eq(first, &subtree));
                        assert!(SharedPointer::ptr_eq(second, &collision));
                        assert_eq!(13, rest.len());
                    }
                    _ => panic!("expected the subtrees to stay nodes"),
                }
            }
            _ => panic!("expected a bitmap node"),
        }
    }

    #[test]
    fn collapsed_collision_becomes_a_unit_child() {
        let mut children = SparseChunk::new();
        for slice in 1..17 {
            let unit = BitmapNode::unit(HASH_SHIFT, slice, slice * 10, slice as HashCode);
            children.insert(slice as usize, SharedPointer::new(Node::Bitmap(unit)));
        }
        let collision = Node::merge_pairs(HASH_SHIFT, 200, 0, 32, 201, 1, 32).unwrap();
        children.insert(0, SharedPointer::new(collision));
        let node: TestArray = ArrayNode::from_children(children);
        match node.without(0, 32, &200u32).unwrap() {
            Without::Replaced(shrunk @ Node::Array(_)) => {
                let mut hashes = shrunk.check(0, false);
                hashes.sort_unstable();
                assert_eq!(17, hashes.len());
                assert_eq!(Some((&201, &1)), shrunk.find(0, 32, &201u32).unwrap());
                assert_eq!(None, shrunk.find(0, 32, &200u32).unwrap());
            }
            _ => panic!("expected an array node"),
        }
    }
}
