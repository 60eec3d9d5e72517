//! Serde support: a map serializes as a plain map in insertion order and
//! deserializes by applying every entry with `set`, in input order.

use core::fmt;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::marker::PhantomData;

use ::serde::de::Deserialize;
use ::serde::de::Deserializer;
use ::serde::de::Error as _;
use ::serde::de::MapAccess;
use ::serde::de::Visitor;
use ::serde::ser::Serialize;
use ::serde::ser::SerializeMap;
use ::serde::ser::Serializer;

use crate::HashMap;
use crate::resize;

/// Upper bound on pairs preallocated from an untrusted size hint.
const MAX_PREALLOCATED: usize = 4096;

impl<K, V, S> Serialize for HashMap<K, V, S>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<T>(&self, serializer: T) -> Result<T::Ok, T::Error>
    where
        T: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, K, V, S> Deserialize<'de> for HashMap<K, V, S>
where
    K: Deserialize<'de> + Hash + Eq,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(MapVisitor(PhantomData))
    }
}

struct MapVisitor<K, V, S>(PhantomData<fn() -> HashMap<K, V, S>>);

impl<'de, K, V, S> Visitor<'de> for MapVisitor<K, V, S>
where
    K: Deserialize<'de> + Hash + Eq,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    type Value = HashMap<K, V, S>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let hint = access.size_hint().unwrap_or(0).min(MAX_PREALLOCATED);
        let mut map = HashMap::with_capacity_and_hasher(resize::capacity_for(hint), S::default())
            .map_err(A::Error::custom)?;

        while let Some((key, value)) = access.next_entry()? {
            map.set(key, value);
        }
        Ok(map)
    }
}
