use crate::{shared_ptr::SharedPointerKind, GenericHamtMap};
use ::quickcheck::{Arbitrary, Gen};
use std::hash::{BuildHasher, Hash};

impl<K, V, S, P> Arbitrary for GenericHamtMap<K, V, S, P>
where
    K: Hash + Eq + Clone + Arbitrary + Sync,
    V: PartialEq + Clone + Arbitrary + Sync,
    S: BuildHasher + Default + Clone + Send + Sync + 'static,
    P: SharedPointerKind + 'static,
{
    fn arbitrary(g: &mut Gen) -> Self {
        GenericHamtMap::from(Vec::<(K, V)>::arbitrary(g))
    }
}
