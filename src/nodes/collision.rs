// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::borrow::Borrow;

use archery::SharedPointerKind;
use bitmaps::Bitmap;

use crate::error::HamtError;
use crate::hash::key::{HashCode, TryEq};
use crate::nodes::hamt::{Assoc, BitmapNode, Node, NodeRef, Slot, Without};
use crate::util::mask;

/// Pairs whose keys share an entire hash, searched linearly.
#[derive(Clone)]
pub(crate) struct CollisionNode<K, V> {
    hash: HashCode,
    pairs: Vec<(K, V)>,
}

impl<K, V> CollisionNode<K, V> {
    pub(crate) fn new(hash: HashCode, key1: K, value1: V, key2: K, value2: V) -> Self {
        CollisionNode {
            hash,
            pairs: vec![(key1, value1), (key2, value2)],
        }
    }

    #[inline]
    pub(crate) fn hash(&self) -> HashCode {
        self.hash
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub(crate) fn pairs(&self) -> &[(K, V)] {
        &self.pairs
    }

    fn position<BK>(&self, key: &BK) -> Result<Option<usize>, HamtError>
    where
        BK: TryEq + ?Sized,
        K: Borrow<BK>,
    {
        for (index, (current, _)) in self.pairs.iter().enumerate() {
            if key.try_eq(current.borrow()).map_err(HamtError::KeyEq)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    pub(crate) fn find<BK>(&self, key: &BK) -> Result<Option<(&K, &V)>, HamtError>
    where
        BK: TryEq + ?Sized,
        K: Borrow<BK>,
    {
        Ok(self
            .position(key)?
            .map(|index| (&self.pairs[index].0, &self.pairs[index].1)))
    }

    pub(crate) fn assoc<P>(
        &self,
        this: &NodeRef<K, V, P>,
        shift: usize,
        hash: HashCode,
        key: K,
        value: V,
    ) -> Result<Assoc<K, V, P>, HamtError>
    where
        K: TryEq + Clone,
        V: TryEq + Clone,
        P: SharedPointerKind,
    {
        if hash != self.hash {
            // Nest this node under a bitmap node at its own slice, and let
            // that sort out where the new key goes.
            let mut bitmap = Bitmap::new();
            bitmap.set(mask(self.hash, shift), true);
            let wrapper = BitmapNode::from_parts(bitmap, vec![Slot::Node(this.clone())]);
            return wrapper.assoc(shift, hash, key, value);
        }
        match self.position(&key)? {
            Some(index) => {
                // Values which can't be compared count as different.
                if let Ok(true) = value.try_eq(&self.pairs[index].1) {
                    return Ok(Assoc::Unchanged);
                }
                let mut node = self.clone();
                node.pairs[index].1 = value;
                Ok(Assoc::Updated(Node::Collision(node)))
            }
            None => {
                let mut pairs = Vec::with_capacity(self.len() + 1);
                pairs.extend_from_slice(&self.pairs);
                pairs.push((key, value));
                Ok(Assoc::Inserted(Node::Collision(CollisionNode {
                    hash: self.hash,
                    pairs,
                })))
            }
        }
    }

    pub(crate) fn without<BK, P>(
        &self,
        hash: HashCode,
        key: &BK,
    ) -> Result<Without<K, V, P>, HamtError>
    where
        BK: TryEq + ?Sized,
        K: Borrow<BK> + Clone,
        V: Clone,
        P: SharedPointerKind,
    {
        if hash != self.hash {
            return Ok(Without::NotFound);
        }
        let removed = match self.position(key)? {
            Some(index) => index,
            None => return Ok(Without::NotFound),
        };
        match self.len() {
            1 => Ok(Without::Empty),
            2 => {
                let (key, value) = self.pairs[1 - removed].clone();
                Ok(Without::Collapsed(key, value, self.hash))
            }
            _ => {
                let pairs = self
                    .pairs
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| *index != removed)
                    .map(|(_, pair)| pair.clone())
                    .collect();
                Ok(Without::Replaced(Node::Collision(CollisionNode {
                    hash: self.hash,
                    pairs,
                })))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared_ptr::DefaultSharedPtr;
    use archery::SharedPointer;

    type TestNode = Node<&'static str, u32, DefaultSharedPtr>;

    fn collision(hash: HashCode, keys: &[&'static str]) -> CollisionNode<&'static str, u32> {
        let mut node = CollisionNode::new(hash, keys[0], 0, keys[1], 1);
        for (value, key) in keys.iter().enumerate().skip(2) {
            node.pairs.push((*key, value as u32));
        }
        node
    }

    #[test]
    fn find_scans_every_pair() {
        let node = collision(9, &["a", "b", "c"]);
        assert_eq!(Some((&"c", &2)), node.find("c").unwrap());
        assert_eq!(None, node.find("d").unwrap());
    }

    #[test]
    fn assoc_with_the_same_hash_appends() {
        let node = collision(9, &["a", "b"]);
        let this: NodeRef<_, _, DefaultSharedPtr> = SharedPointer::new(Node::Collision(node.clone()));
        match node.assoc(&this, 5, 9, "c", 2).unwrap() {
            Assoc::Inserted(Node::Collision(grown)) => {
                assert_eq!(&[("a", 0), ("b", 1), ("c", 2)], grown.pairs());
            }
            _ => panic!("expected a bigger collision node"),
        }
        assert!(matches!(node.assoc(&this, 5, 9, "b", 1), Ok(Assoc::Unchanged)));
        match node.assoc(&this, 5, 9, "b", 7).unwrap() {
            Assoc::Updated(Node::Collision(updated)) => {
                assert_eq!(&[("a", 0), ("b", 7)], updated.pairs());
            }
            _ => panic!("expected an updated collision node"),
        }
    }

    #[test]
    fn assoc_with_another_hash_nests_the_node() {
        let node = collision(1 << 5, &["a", "b"]);
        let this: NodeRef<_, _, DefaultSharedPtr> = SharedPointer::new(Node::Collision(node.clone()));
        let nested: TestNode = match node.assoc(&this, 5, 2 << 5, "c", 2).unwrap() {
            Assoc::Inserted(nested) => nested,
            _ => panic!("expected an insertion"),
        };
        let mut hashes = nested.check(5, true);
        hashes.sort_unstable();
        assert_eq!(vec![1 << 5, 1 << 5, 2 << 5], hashes);
        match &nested {
            Node::Bitmap(bitmap) => match bitmap.slots() {
                [Slot::Node(child), Slot::Pair("c", 2, _)] => {
                    assert!(SharedPointer::ptr_eq(child, &this));
                }
                _ => panic!("unexpected slots"),
            },
            _ => panic!("expected a bitmap node"),
        }
    }

    #[test]
    fn without_down_to_one_pair_hands_it_back() {
        let node = collision(3, &["a", "b"]);
        assert!(matches!(
            node.without::<_, DefaultSharedPtr>(3, "a"),
            Ok(Without::Collapsed("b", 1, 3))
        ));
        let node = collision(3, &["a", "b", "c"]);
        match node.without::<_, DefaultSharedPtr>(3, "b").unwrap() {
            Without::Replaced(Node::Collision(shrunk)) => {
                assert_eq!(&[("a", 0), ("c", 2)], shrunk.pairs());
            }
            _ => panic!("expected a smaller collision node"),
        }
        assert!(matches!(
            node.without::<_, DefaultSharedPtr>(4, "b"),
            Ok(Without::NotFound)
        ));
        assert!(matches!(
            node.without::<_, DefaultSharedPtr>(3, "z"),
            Ok(Without::NotFound)
        ));
    }
}
