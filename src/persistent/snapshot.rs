//! Whole-mapping snapshot as written to a storage slot.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A mapping serialized as a sequence of `[key, value]` pairs.
///
/// JSON objects only take string keys; a pair sequence keeps any serializable
/// key type storable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<K: Eq + Hash, V>(HashMap<K, V>);

impl<K: Eq + Hash, V> Snapshot<K, V> {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn as_map(&self) -> &HashMap<K, V> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut HashMap<K, V> {
        &mut self.0
    }
}

impl<K: Eq + Hash, V> Default for Snapshot<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> From<HashMap<K, V>> for Snapshot<K, V> {
    fn from(map: HashMap<K, V>) -> Self {
        Self(map)
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for Snapshot<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<K, V> Serialize for Snapshot<K, V>
where
    K: Eq + Hash + Serialize,
    V: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de, K, V> Deserialize<'de> for Snapshot<K, V>
where
    K: Eq + Hash + Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(PairsVisitor(PhantomData))
    }
}

struct PairsVisitor<K, V>(PhantomData<(K, V)>);

impl<'de, K, V> Visitor<'de> for PairsVisitor<K, V>
where
    K: Eq + Hash + Deserialize<'de>,
    V: Deserialize<'de>,
{
    type Value = Snapshot<K, V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a sequence of [key, value] pairs")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut map = HashMap::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some((key, value)) = seq.next_element::<(K, V)>()? {
            map.insert(key, value);
        }
        Ok(Snapshot(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    struct CompositeKey {
        region: String,
        shard: u16,
    }

    #[test]
    fn test_structured_keys_survive_json() {
        let snapshot: Snapshot<CompositeKey, String> = [
            (
                CompositeKey { region: "eu".into(), shard: 1 },
                "first".to_string(),
            ),
            (
                CompositeKey { region: "us".into(), shard: 7 },
                "second".to_string(),
            ),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: Snapshot<CompositeKey, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_serializes_as_pairs() {
        let snapshot: Snapshot<u32, bool> = [(5, true)].into_iter().collect();
        assert_eq!(serde_json::to_string(&snapshot).unwrap(), "[[5,true]]");
    }

    #[test]
    fn test_rejects_object_layout() {
        let result: Result<Snapshot<String, u32>, _> = serde_json::from_str(r#"{"a": 1}"#);
        assert!(result.is_err());
    }
}
