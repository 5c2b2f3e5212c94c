// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use archery::SharedPointerKind;
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::hash::BuildHasher;
use std::marker::PhantomData;

use crate::hamtmap::GenericHamtMap;
use crate::hash::key::{TryEq, TryHash};

struct MapVisitor<'de, K, V, S, P> {
    phantom_k: PhantomData<K>,
    phantom_v: PhantomData<V>,
    phantom_s: PhantomData<S>,
    phantom_p: PhantomData<P>,
    phantom_lifetime: PhantomData<&'de ()>,
}

impl<'de, K, V, S, P> MapVisitor<'de, K, V, S, P> {
    pub(crate) fn new() -> MapVisitor<'de, K, V, S, P> {
        MapVisitor {
            phantom_k: PhantomData,
            phantom_v: PhantomData,
            phantom_s: PhantomData,
            phantom_p: PhantomData,
            phantom_lifetime: PhantomData,
        }
    }
}

impl<'de, K, V, S, P> Visitor<'de> for MapVisitor<'de, K, V, S, P>
where
    K: Deserialize<'de> + TryHash + TryEq + Clone,
    V: Deserialize<'de> + TryEq + Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    type Value = GenericHamtMap<K, V, S, P>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<Access>(self, mut access: Access) -> Result<Self::Value, Access::Error>
    where
        Access: MapAccess<'de>,
    {
        let mut map = GenericHamtMap::default();
        while let Some((key, value)) = access.next_entry()? {
            map = map.assoc(key, value).map_err(de::Error::custom)?;
        }
        Ok(map)
    }
}

impl<'de, K, V, S, P> Deserialize<'de> for GenericHamtMap<K, V, S, P>
where
    K: Deserialize<'de> + TryHash + TryEq + Clone,
    V: Deserialize<'de> + TryEq + Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn deserialize<D>(des: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        des.deserialize_map(MapVisitor::<'de, K, V, S, P>::new())
    }
}

impl<K, V, S, P> Serialize for GenericHamtMap<K, V, S, P>
where
    K: Serialize,
    V: Serialize,
    P: SharedPointerKind,
{
    fn serialize<Ser>(&self, ser: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: Serializer,
    {
        let mut s = ser.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            s.serialize_entry(k, v)?;
        }
        s.end()
    }
}

// Tests
