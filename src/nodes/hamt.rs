// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Trie nodes and the dispatch between their three kinds.
//!
//! Nodes are never mutated once they're reachable from a map. Every
//! operation either reads them or builds replacements, and reports
//! through [`Assoc`] and [`Without`] whether anything changed, so that
//! unchanged subtrees keep being shared between map versions.

use std::borrow::Borrow;
use std::fmt;
use std::iter::FusedIterator;
use std::slice::Iter as SliceIter;

use archery::{SharedPointer, SharedPointerKind};
use imbl_sized_chunks::sparse_chunk::Iter as ChunkIter;
use imbl_sized_chunks::Chunk;

use crate::config::MAX_TREE_DEPTH;
use crate::error::HamtError;
use crate::hash::key::{HashCode, TryEq};

pub(crate) use crate::config::HASH_LEVEL_SIZE as HASH_SHIFT;
pub(crate) use crate::nodes::array::ArrayNode;
pub(crate) use crate::nodes::bitmap::BitmapNode;
pub(crate) use crate::nodes::collision::CollisionNode;

pub(crate) const HASH_WIDTH: usize = 2_usize.pow(HASH_SHIFT as u32);

pub(crate) type NodeRef<K, V, P> = SharedPointer<Node<K, V, P>, P>;

pub(crate) enum Node<K, V, P: SharedPointerKind> {
    Bitmap(BitmapNode<K, V, P>),
    Array(ArrayNode<K, V, P>),
    Collision(CollisionNode<K, V>),
}

/// A bitmap node entry: either a key/value pair, or a subtree for keys
/// sharing this hash slice.
pub(crate) enum Slot<K, V, P: SharedPointerKind> {
    Pair(K, V, HashCode),
    Node(NodeRef<K, V, P>),
}

impl<K, V, P> Clone for Slot<K, V, P>
where
    K: Clone,
    V: Clone,
    P: SharedPointerKind,
{
    fn clone(&self) -> Self {
        match self {
            Slot::Pair(key, value, hash) => Slot::Pair(key.clone(), value.clone(), *hash),
            Slot::Node(node) => Slot::Node(node.clone()),
        }
    }
}

/// Outcome of inserting into a node.
pub(crate) enum Assoc<K, V, P: SharedPointerKind> {
    /// The key was already mapped to an equal value.
    Unchanged,
    /// An existing key got a new value.
    Updated(Node<K, V, P>),
    /// A new key was added.
    Inserted(Node<K, V, P>),
}

impl<K, V, P: SharedPointerKind> Assoc<K, V, P> {
    /// Rebuild the parent around a changed child.
    pub(crate) fn map<F>(self, f: F) -> Self
    where
        F: FnOnce(Node<K, V, P>) -> Node<K, V, P>,
    {
        match self {
            Assoc::Unchanged => Assoc::Unchanged,
            Assoc::Updated(node) => Assoc::Updated(f(node)),
            Assoc::Inserted(node) => Assoc::Inserted(f(node)),
        }
    }
}

/// Outcome of removing from a node.
pub(crate) enum Without<K, V, P: SharedPointerKind> {
    NotFound,
    /// The node held nothing but the removed key; drop it from its parent.
    Empty,
    Replaced(Node<K, V, P>),
    /// A collision node is down to one pair, which the parent holds at its
    /// own level.
    Collapsed(K, V, HashCode),
}

impl<K, V, P: SharedPointerKind> Node<K, V, P> {
    pub(crate) fn empty() -> Self {
        Node::Bitmap(BitmapNode::new())
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
        match self {
            Node::Bitmap(node) => node.find(shift, hash, key),
            Node::Array(node) => node.find(shift, hash, key),
            Node::Collision(node) => node.find(key),
        }
    }

    /// Collision nodes need their own pointer to nest themselves one level
    /// down, so this takes the shared reference rather than `&self`.
    pub(crate) fn assoc(
        this: &NodeRef<K, V, P>,
        shift: usize,
        hash: HashCode,
        key: K,
        value: V,
    ) -> Result<Assoc<K, V, P>, HamtError>
    where
        K: TryEq + Clone,
        V: TryEq + Clone,
    {
        match &**this {
            Node::Bitmap(node) => node.assoc(shift, hash, key, value),
            Node::Array(node) => node.assoc(shift, hash, key, value),
            Node::Collision(node) => node.assoc(this, shift, hash, key, value),
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
        match self {
            Node::Bitmap(node) => node.without(shift, hash, key),
            Node::Array(node) => node.without(shift, hash, key),
            Node::Collision(node) => node.without(hash, key),
        }
    }

    /// Build the node holding two distinct keys which share every hash
    /// slice above `shift`.
    pub(crate) fn merge_pairs(
        shift: usize,
        key1: K,
        value1: V,
        hash1: HashCode,
        key2: K,
        value2: V,
        hash2: HashCode,
    ) -> Result<Self, HamtError>
    where
        K: TryEq + Clone,
        V: TryEq + Clone,
    {
        if hash1 == hash2 {
            return Ok(Node::Collision(CollisionNode::new(
                hash1, key1, value1, key2, value2,
            )));
        }
        let unit = BitmapNode::unit(shift, key1, value1, hash1);
        Ok(match unit.assoc(shift, hash2, key2, value2)? {
            Assoc::Inserted(node) | Assoc::Updated(node) => node,
            Assoc::Unchanged => Node::Bitmap(unit),
        })
    }

    /// The slot a parent bitmap node should hold for this node. A bitmap
    /// node with a single key/value pair is folded into its parent.
    pub(crate) fn into_slot(self) -> Slot<K, V, P> {
        match self {
            Node::Bitmap(node) => node.into_slot(),
            node => Slot::Node(SharedPointer::new(node)),
        }
    }

    /// Like [`Node::into_slot`], for a node which stays shared.
    pub(crate) fn slot_for(this: &NodeRef<K, V, P>) -> Slot<K, V, P>
    where
        K: Clone,
        V: Clone,
    {
        match &**this {
            Node::Bitmap(node) => match node.slots() {
                [pair @ Slot::Pair(..)] => pair.clone(),
                _ => Slot::Node(this.clone()),
            },
            _ => Slot::Node(this.clone()),
        }
    }
}

impl<K, V, P> Clone for Node<K, V, P>
where
    K: Clone,
    V: Clone,
    P: SharedPointerKind,
{
    fn clone(&self) -> Self {
        match self {
            Node::Bitmap(node) => Node::Bitmap(node.clone()),
            Node::Array(node) => Node::Array(node.clone()),
            Node::Collision(node) => Node::Collision(node.clone()),
        }
    }
}

// Ref iterator

enum Cursor<'a, K, V, P: SharedPointerKind> {
    Bitmap(SliceIter<'a, Slot<K, V, P>>),
    Array(ChunkIter<'a, NodeRef<K, V, P>, HASH_WIDTH>),
    Collision(SliceIter<'a, (K, V)>),
}

impl<'a, K, V, P: SharedPointerKind> Cursor<'a, K, V, P> {
    fn new(node: &'a Node<K, V, P>) -> Self {
        match node {
            Node::Bitmap(node) => Cursor::Bitmap(node.slots().iter()),
            Node::Array(node) => Cursor::Array(node.children().iter()),
            Node::Collision(node) => Cursor::Collision(node.pairs().iter()),
        }
    }
}

// We impl Clone instead of deriving it, because we want Clone even if K and V aren't.
impl<'a, K, V, P: SharedPointerKind> Clone for Cursor<'a, K, V, P> {
    fn clone(&self) -> Self {
        match self {
            Cursor::Bitmap(it) => Cursor::Bitmap(it.clone()),
            Cursor::Array(it) => Cursor::Array(it.clone()),
            Cursor::Collision(it) => Cursor::Collision(it.clone()),
        }
    }
}

enum Step<'a, K, V, P: SharedPointerKind> {
    Yield(&'a K, &'a V),
    Descend(&'a Node<K, V, P>),
    Ascend,
}

/// Depth first walk over a trie, one cursor per level.
pub(crate) struct Iter<'a, K, V, P: SharedPointerKind> {
    count: usize,
    stack: Chunk<Cursor<'a, K, V, P>, MAX_TREE_DEPTH>,
}

impl<'a, K, V, P: SharedPointerKind> Clone for Iter<'a, K, V, P> {
    fn clone(&self) -> Self {
        Self {
            count: self.count,
            stack: self.stack.clone(),
        }
    }
}

impl<'a, K, V, P> Iter<'a, K, V, P>
where
    P: SharedPointerKind,
{
    pub(crate) fn new(root: &'a Node<K, V, P>, size: usize) -> Self {
        let mut stack = Chunk::new();
        stack.push_back(Cursor::new(root));
        Iter { count: size, stack }
    }
}

impl<'a, K, V, P> Iterator for Iter<'a, K, V, P>
where
    P: SharedPointerKind,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let step = match self.stack.last_mut()? {
                Cursor::Bitmap(slots) => match slots.next() {
                    Some(Slot::Pair(key, value, _)) => Step::Yield(key, value),
                    Some(Slot::Node(child)) => Step::Descend(child),
                    None => Step::Ascend,
                },
                Cursor::Array(children) => match children.next() {
                    Some(child) => Step::Descend(child),
                    None => Step::Ascend,
                },
                Cursor::Collision(pairs) => match pairs.next() {
                    Some((key, value)) => Step::Yield(key, value),
                    None => Step::Ascend,
                },
            };
            match step {
                Step::Yield(key, value) => {
                    self.count -= 1;
                    return Some((key, value));
                }
                Step::Descend(child) => {
                    self.stack.push_back(Cursor::new(child));
                }
                Step::Ascend => {
                    self.stack.pop_back();
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.count, Some(self.count))
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Iter<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Iter<'a, K, V, P> {}

// Debug dump

#[cfg(any(test, feature = "debug"))]
impl<K, V, P> Node<K, V, P>
where
    K: fmt::Debug,
    V: fmt::Debug,
    P: SharedPointerKind,
{
    pub(crate) fn dump(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        match self {
            Node::Bitmap(node) => {
                indent(f, level)?;
                writeln!(
                    f,
                    "BitmapNode(count={} bitmap={:#b}):",
                    node.len(),
                    node.bitmap()
                )?;
                for slot in node.slots() {
                    indent(f, level + 1)?;
                    match slot {
                        Slot::Pair(key, value, _) => writeln!(f, "{:?}: {:?}", key, value)?,
                        Slot::Node(child) => {
                            writeln!(f, "NULL:")?;
                            child.dump(f, level + 2)?;
                        }
                    }
                }
                Ok(())
            }
            Node::Array(node) => {
                indent(f, level)?;
                writeln!(f, "ArrayNode(count={}):", node.len())?;
                for index in node.children().indices() {
                    indent(f, level + 1)?;
                    writeln!(f, "{}::", index)?;
                    node.children()[index].dump(f, level + 2)?;
                }
                Ok(())
            }
            Node::Collision(node) => {
                indent(f, level)?;
                writeln!(
                    f,
                    "CollisionNode(hash={} count={}):",
                    node.hash(),
                    node.len()
                )?;
                for (key, value) in node.pairs() {
                    indent(f, level + 1)?;
                    writeln!(f, "{:?}: {:?}", key, value)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(any(test, feature = "debug"))]
fn indent(f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
    for _ in 0..level {
        f.write_str("  ")?;
    }
    Ok(())
}

impl<K, V, P> fmt::Debug for Node<K, V, P>
where
    K: fmt::Debug,
    V: fmt::Debug,
    P: SharedPointerKind,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Node::Bitmap(node) => {
                write!(f, "Bitmap[ ")?;
                for slot in node.slots() {
                    match slot {
                        Slot::Pair(k, v, h) => write!(f, "{:?} => {:?} :: {}, ", k, v, h)?,
                        Slot::Node(n) => write!(f, "{:?}, ", n)?,
                    }
                }
                write!(f, "]")
            }
            Node::Array(node) => {
                write!(f, "Array[ ")?;
                for i in node.children().indices() {
                    write!(f, "{}: {:?}, ", i, node.children()[i])?;
                }
                write!(f, "]")
            }
            Node::Collision(node) => write!(f, "Coll{:?} :: {}", node.pairs(), node.hash()),
        }
    }
}

// Structural checks for tests

#[cfg(test)]
impl<K, V, P: SharedPointerKind> Node<K, V, P> {
    /// Walk the subtree asserting every structural invariant, and return
    /// the hash of each pair found. `under_bitmap` is set for children of a
    /// bitmap node, which may never be a lone key/value pair.
    pub(crate) fn check(&self, shift: usize, under_bitmap: bool) -> Vec<HashCode> {
        use crate::config::ARRAY_NODE_THRESHOLD;
        use crate::util::{mask, popcount32};

        let mut hashes = Vec::new();
        match self {
            Node::Bitmap(node) => {
                assert_eq!(popcount32(node.bitmap()) as usize, node.len());
                if under_bitmap {
                    assert!(node.len() > 0, "empty bitmap node below the root");
                    assert!(
                        !matches!(node.slots(), [Slot::Pair(..)]),
                        "single pair bitmap node below a bitmap node"
                    );
                }
                let indices = (0..HASH_WIDTH).filter(|i| node.bitmap() & (1u32 << *i) != 0);
                for (index, slot) in indices.zip(node.slots()) {
                    let found = match slot {
                        Slot::Pair(_, _, hash) => vec![*hash],
                        Slot::Node(child) => child.check(shift + HASH_SHIFT, true),
                    };
                    for hash in &found {
                        assert_eq!(index, mask(*hash, shift), "pair in the wrong slot");
                    }
                    hashes.extend(found);
                }
            }
            Node::Array(node) => {
                assert!(node.len() >= ARRAY_NODE_THRESHOLD, "underfull array node");
                for index in node.children().indices() {
                    let found = node.children()[index].check(shift + HASH_SHIFT, false);
                    assert!(!found.is_empty());
                    for hash in &found {
                        assert_eq!(index, mask(*hash, shift), "pair in the wrong child");
                    }
                    hashes.extend(found);
                }
            }
            Node::Collision(node) => {
                assert!(node.len() >= 2, "collision node with a single pair");
                hashes.extend(node.pairs().iter().map(|_| node.hash()));
            }
        }
        hashes
    }

    pub(crate) fn is_bitmap(&self) -> bool {
        matches!(self, Node::Bitmap(_))
    }

    pub(crate) fn is_array(&self) -> bool {
        matches!(self, Node::Array(_))
    }

    /// Every collision node in the subtree.
    pub(crate) fn collisions(&self) -> Vec<&CollisionNode<K, V>> {
        match self {
            Node::Bitmap(node) => node
                .slots()
                .iter()
                .flat_map(|slot| match slot {
                    Slot::Pair(..) => Vec::new(),
                    Slot::Node(child) => child.collisions(),
                })
                .collect(),
            Node::Array(node) => node
                .children()
                .iter()
                .flat_map(|child| child.collisions())
                .collect(),
            Node::Collision(node) => vec![node],
        }
    }
}
