use criterion::{criterion_group, criterion_main, Bencher, Criterion};
use phamt::hamtmap::HamtMap;
use std::collections::HashMap as StdHashMap;
use std::hash::Hash;
use std::hint::black_box;
use std::iter::FromIterator;
use std::sync::Arc;

use archery::ArcTK;
use rpds::HashTrieMapSync;

mod utils;
use utils::*;

// The persistent operations, over the maps we compare against.
trait BenchMap<K, V>: Clone + FromIterator<(K, V)>
where
    K: Clone + Hash + Eq,
    V: Clone,
{
    type Iter<'a>: Iterator<Item = (&'a K, &'a V)>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    fn empty() -> Self;
    fn assoc(&self, k: K, v: V) -> Self;
    fn without(&self, k: &K) -> Self;
    fn find(&self, k: &K) -> Option<&V>;
    fn iter(&self) -> Self::Iter<'_>;
}

impl<K, V> BenchMap<K, V> for HamtMap<K, V>
where
    K: Clone + Hash + Eq,
    V: Clone + PartialEq,
{
    type Iter<'a>
        = phamt::hamtmap::Iter<'a, K, V, phamt::shared_ptr::DefaultSharedPtr>
    where
        K: 'a,
        V: 'a;

    fn empty() -> Self {
        HamtMap::new()
    }

    fn assoc(&self, k: K, v: V) -> Self {
        HamtMap::assoc(self, k, v).unwrap()
    }

    fn without(&self, k: &K) -> Self {
        HamtMap::without(self, k).unwrap()
    }

    fn find(&self, k: &K) -> Option<&V> {
        HamtMap::find(self, k).unwrap()
    }

    fn iter(&self) -> Self::Iter<'_> {
        HamtMap::iter(self)
    }
}

// Copy on write, as a baseline.
impl<K, V> BenchMap<K, V> for StdHashMap<K, V>
where
    K: Clone + Hash + Eq,
    V: Clone,
{
    type Iter<'a>
        = std::collections::hash_map::Iter<'a, K, V>
    where
        K: 'a,
        V: 'a;

    fn empty() -> Self {
        StdHashMap::new()
    }

    fn assoc(&self, k: K, v: V) -> Self {
        let mut ret = self.clone();
        ret.insert(k, v);
        ret
    }

    fn without(&self, k: &K) -> Self {
        let mut ret = self.clone();
        ret.remove(k);
        ret
    }

    fn find(&self, k: &K) -> Option<&V> {
        self.get(k)
    }

    fn iter(&self) -> Self::Iter<'_> {
        StdHashMap::iter(self)
    }
}

impl<K, V> BenchMap<K, V> for HashTrieMapSync<K, V>
where
    K: Clone + Hash + Eq,
    V: Clone,
{
    type Iter<'a>
        = rpds::map::hash_trie_map::Iter<'a, K, V, ArcTK>
    where
        K: 'a,
        V: 'a;

    fn empty() -> Self {
        HashTrieMapSync::new_sync()
    }

    fn assoc(&self, k: K, v: V) -> Self {
        self.insert(k, v)
    }

    fn without(&self, k: &K) -> Self {
        self.remove(k)
    }

    fn find(&self, k: &K) -> Option<&V> {
        self.get(k)
    }

    fn iter(&self) -> Self::Iter<'_> {
        HashTrieMapSync::iter(self)
    }
}

fn bench_find<M, K, V>(b: &mut Bencher<'_>, size: usize)
where
    M: BenchMap<K, V>,
    K: TestData,
    V: TestData,
{
    let keys = K::generate(size);
    let values = V::generate(size);
    let order = reorder(&keys);
    let m: M = keys.into_iter().zip(values).collect();
    b.iter(|| {
        for k in &order {
            black_box(m.find(k));
        }
    })
}

fn bench_find_missing<M, K, V>(b: &mut Bencher<'_>, size: usize)
where
    M: BenchMap<K, V>,
    K: TestData,
    V: TestData,
{
    let keys = K::generate(size * 2);
    let values = V::generate(size);
    let order = reorder(&keys[size..]);
    let m: M = keys.into_iter().zip(values).collect();
    b.iter(|| {
        for k in &order {
            black_box(m.find(k));
        }
    })
}

fn bench_assoc<M, K, V>(b: &mut Bencher<'_>, size: usize)
where
    M: BenchMap<K, V>,
    K: TestData,
    V: TestData,
{
    let keys = K::generate(size);
    let values = V::generate(size);
    b.iter(|| {
        let mut m = M::empty();
        for (k, v) in keys.iter().cloned().zip(values.iter().cloned()) {
            m = m.assoc(k, v);
        }
        m
    })
}

fn bench_without<M, K, V>(b: &mut Bencher<'_>, size: usize)
where
    M: BenchMap<K, V>,
    K: TestData,
    V: TestData,
{
    let keys = K::generate(size);
    let values = V::generate(size);
    let order = reorder(&keys);
    let map: M = keys.into_iter().zip(values).collect();
    b.iter(|| {
        let mut m = map.clone();
        for k in &order {
            m = m.without(k);
        }
        m
    })
}

// One update against a big map, keeping the original alive.
fn bench_assoc_once<M, K, V>(b: &mut Bencher<'_>, size: usize)
where
    M: BenchMap<K, V>,
    K: TestData,
    V: TestData,
{
    let keys = K::generate(size);
    let values = V::generate(size);
    let korder = reorder(&keys);
    let vorder = reorder(&values);
    let m: M = keys.into_iter().zip(values).collect();
    b.iter(|| {
        for (k, v) in korder.iter().zip(vorder.iter()).take(100) {
            black_box(m.assoc(k.clone(), v.clone()));
        }
    })
}

fn bench_without_once<M, K, V>(b: &mut Bencher<'_>, size: usize)
where
    M: BenchMap<K, V>,
    K: TestData,
    V: TestData,
{
    let keys = K::generate(size);
    let values = V::generate(size);
    let order = reorder(&keys);
    let map: M = keys.into_iter().zip(values).collect();
    b.iter(|| {
        for k in order.iter().take(100) {
            black_box(map.without(k));
        }
    })
}

fn bench_iter<M, K, V>(b: &mut Bencher<'_>, size: usize)
where
    M: BenchMap<K, V>,
    K: TestData,
    V: TestData,
{
    let keys = K::generate(size);
    let values = V::generate(size);
    let m: M = keys.into_iter().zip(values).collect();
    b.iter(|| {
        for p in m.iter() {
            black_box(p);
        }
    })
}

fn bench_group<M, K, V>(c: &mut Criterion, group_name: &str, copy_on_write: bool)
where
    M: BenchMap<K, V>,
    K: TestData,
    V: TestData,
{
    let mut group = c.benchmark_group(group_name);

    for size in &[100, 1000, 10000, 100000] {
        group.bench_function(format!("find_{}", size), |b| {
            bench_find::<M, K, V>(b, *size)
        });
    }

    for size in &[10000, 100000] {
        group.bench_function(format!("find_missing_{}", size), |b| {
            bench_find_missing::<M, K, V>(b, *size)
        });
    }

    for size in &[1000, 10000] {
        group.bench_function(format!("iter_{}", size), |b| {
            bench_iter::<M, K, V>(b, *size)
        });
    }

    // Copying a whole std map per update is quadratic, keep it small.
    let sizes: &[usize] = if copy_on_write {
        &[100, 1000]
    } else {
        &[100, 1000, 10000]
    };
    for size in sizes {
        group.bench_function(format!("assoc_{}", size), |b| {
            bench_assoc::<M, K, V>(b, *size)
        });

        group.bench_function(format!("without_{}", size), |b| {
            bench_without::<M, K, V>(b, *size)
        });
    }

    for size in &[100, 1000, 10000, 100000] {
        group.bench_function(format!("assoc_once_{}", size), |b| {
            bench_assoc_once::<M, K, V>(b, *size)
        });

        group.bench_function(format!("without_once_{}", size), |b| {
            bench_without_once::<M, K, V>(b, *size)
        });
    }

    group.finish();
}

fn hamtmap_benches(c: &mut Criterion) {
    bench_group::<HamtMap<i64, i64>, i64, i64>(c, "hamtmap_i64", false);
    bench_group::<HamtMap<Arc<String>, Arc<String>>, Arc<String>, Arc<String>>(
        c,
        "hamtmap_str",
        false,
    );

    if std::env::var("BENCH_STD").is_ok() {
        bench_group::<StdHashMap<i64, i64>, i64, i64>(c, "stdhashmap_i64", true);
    }

    if std::env::var("BENCH_RPDS").is_ok() {
        bench_group::<HashTrieMapSync<i64, i64>, i64, i64>(c, "rpds_i64", false);
        bench_group::<HashTrieMapSync<Arc<String>, Arc<String>>, Arc<String>, Arc<String>>(
            c, "rpds_str", false,
        );
    }
}

criterion_group!(benches, hamtmap_benches);
criterion_main!(benches);
