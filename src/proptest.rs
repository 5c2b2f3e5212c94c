// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Proptest strategies.
//!
//! These are only available when using the `proptest` feature flag.

use crate::hamtmap::HamtMap;
use ::proptest::strategy::{BoxedStrategy, Strategy, ValueTree};
use std::hash::Hash;
use std::ops::Range;

/// A strategy for a [`HamtMap`] of a given size.
///
/// Duplicate keys are generated and then collapsed, so the strategy keeps
/// drawing until it gets at least `size.start` distinct keys.
///
/// # Examples
///
/// ```rust,no_run
/// # use ::proptest::proptest;
/// # use phamt::proptest::hamt_map;
/// proptest! {
///     #[test]
///     fn proptest_works(ref m in hamt_map(0..9999, ".*", 10..100)) {
///         assert!(m.len() < 100);
///         assert!(m.len() >= 10);
///     }
/// }
/// ```
pub fn hamt_map<K: Strategy + 'static, V: Strategy + 'static>(
    key: K,
    value: V,
    size: Range<usize>,
) -> BoxedStrategy<HamtMap<<K::Tree as ValueTree>::Value, <V::Tree as ValueTree>::Value>>
where
    <K::Tree as ValueTree>::Value: Hash + Eq + Clone,
    <V::Tree as ValueTree>::Value: PartialEq + Clone,
{
    ::proptest::collection::vec((key, value), size.clone())
        .prop_map(HamtMap::from)
        .prop_filter("Map minimum size".to_owned(), move |m| {
            m.len() >= size.start
        })
        .boxed()
}
