#![allow(dead_code)]
use rand::seq::SliceRandom;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Keys and values the benchmarks can generate in bulk.
pub trait TestData: Clone + Debug + Eq + Hash {
    fn random(rng: &mut SmallRng) -> Self;

    /// `size` distinct values, the same ones on every run.
    fn generate(size: usize) -> Vec<Self> {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut seen = HashSet::with_capacity(size);
        let mut out = Vec::with_capacity(size);
        while out.len() < size {
            let next = Self::random(&mut rng);
            if seen.insert(next.clone()) {
                out.push(next);
            }
        }
        out
    }
}

impl TestData for i64 {
    fn random(rng: &mut SmallRng) -> Self {
        rng.random()
    }
}

impl TestData for String {
    fn random(rng: &mut SmallRng) -> Self {
        let len = rng.random_range(5..20);
        (0..len)
            .map(|_| rng.random_range(b'a'..=b'z') as char)
            .collect()
    }
}

impl<T> TestData for Arc<T>
where
    T: TestData + 'static,
{
    fn random(rng: &mut SmallRng) -> Self {
        Arc::new(T::random(rng))
    }
}

/// A fixed shuffle of `vec`, so lookups don't follow insertion order.
pub fn reorder<A: Clone>(vec: &[A]) -> Vec<A> {
    let mut rng = SmallRng::seed_from_u64(2);
    let mut out = vec.to_vec();
    out.shuffle(&mut rng);
    out
}
