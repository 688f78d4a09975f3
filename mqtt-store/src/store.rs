use serde::{Deserialize, Serialize};

use crate::matcher::{FilterSelector, NameSelector};
use crate::topic::{parse_filter, parse_name, Topic};
use crate::tree::TopicTree;
use crate::Result;

/// A stored entry found by a lookup: the literal key it is stored under and its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matched<V> {
    pub sections: Vec<String>,
    pub key: String,
    pub value: V,
}

impl<V> Matched<V> {
    #[inline]
    pub fn new(topic: &Topic, value: V) -> Self {
        Self { sections: topic.sections(), key: topic.to_string(), value }
    }

    #[inline]
    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> Matched<U> {
        Matched { sections: self.sections, key: self.key, value: f(self.value) }
    }
}

impl<V: Clone> Matched<&V> {
    #[inline]
    pub fn cloned(self) -> Matched<V> {
        self.map(V::clone)
    }
}

/// Associative store keyed by `/`-delimited topics.
///
/// Keys are stored literally, wildcards included; [`MqttStore::find_matching`] searches the stored
/// topics with a pattern, [`MqttStore::find_patterns`] searches stored patterns with a topic.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct MqttStore<V> {
    tree: TopicTree<V>,
}

impl<V> Default for MqttStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for MqttStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MqttStore {{ tree: {:?} }}", self.tree)
    }
}

impl<V> MqttStore<V> {
    #[inline]
    pub fn new() -> MqttStore<V> {
        Self { tree: TopicTree::default() }
    }

    /// Stores `value` under `key`, replacing what was there. `+` and `#` are plain labels here.
    /// An empty key is ignored.
    #[inline]
    pub fn put(&mut self, key: &str, value: V) -> &mut Self {
        self.tree.insert(&Topic::parse(key), value);
        self
    }

    /// Exact lookup, no wildcard expansion.
    #[inline]
    pub fn get(&self, key: &str) -> Option<Matched<&V>> {
        let topic = Topic::parse(key);
        self.tree.get(&topic).map(|v| Matched::new(&topic, v))
    }

    /// Clears the value at `key`. The path itself stays in the tree.
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.tree.remove(&Topic::parse(key))
    }

    /// Clears every value for which `f` returns `false`, returning how many were cleared.
    #[inline]
    pub fn retain<F>(&mut self, f: F) -> usize
    where
        F: FnMut(&mut V) -> bool,
    {
        self.tree.retain(f)
    }

    /// All stored topics matched by `pattern`, in no particular order.
    ///
    /// `+` matches exactly one level, a trailing `#` matches the parent level and everything
    /// beneath it. A `#` anywhere else is rejected with [`crate::StoreError::MalformedPattern`].
    pub fn find_matching(&self, pattern: &str) -> Result<Vec<Matched<&V>>> {
        let filter = parse_filter(pattern).inspect_err(|e| log::debug!("find_matching, {e}"))?;
        let matched = self.tree.matches(&FilterSelector, &filter);
        Ok(matched.into_iter().map(|(t, v)| Matched::new(&t, v)).collect())
    }

    /// All stored patterns that would match the concrete `key`, in no particular order.
    ///
    /// `key` must not contain `+` or `#`, see [`crate::StoreError::InvalidKey`].
    pub fn find_patterns(&self, key: &str) -> Result<Vec<Matched<&V>>> {
        let name = parse_name(key).inspect_err(|e| log::debug!("find_patterns, {e}"))?;
        let matched = self.tree.matches(&NameSelector, &name);
        Ok(matched.into_iter().map(|(t, v)| Matched::new(&t, v)).collect())
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.tree.get(&Topic::parse(key)).is_some()
    }

    /// Number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.values_size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn tree(&self) -> &TopicTree<V> {
        &self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::{Matched, MqttStore};
    use crate::StoreError;

    fn sorted<V: Clone>(matched: Vec<Matched<&V>>) -> Vec<(String, V)> {
        let mut out = matched.into_iter().map(|m| (m.key, m.value.clone())).collect::<Vec<_>>();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    fn keys<V>(matched: Vec<Matched<&V>>) -> Vec<String> {
        let mut out = matched.into_iter().map(|m| m.key).collect::<Vec<_>>();
        out.sort();
        out
    }

    #[test]
    fn put_then_get() {
        let mut store = MqttStore::new();
        for key in ["1", "2/2", "3/3/3/3", "/a", "a/", "4/+/4/#", "x//y"] {
            store.put(key, key.len());
            let m = store.get(key).unwrap();
            assert_eq!(*m.value, key.len());
            assert_eq!(m.key, key);
            assert_eq!(m.sections, key.split('/').collect::<Vec<_>>());
        }
        assert_eq!(store.len(), 7);
    }

    #[test]
    fn get_missing() {
        let mut store = MqttStore::new();
        assert!(store.get("1").is_none());
        store.put("a/b", 1);
        assert!(store.get("a").is_none());
        assert!(store.get("a/b/c").is_none());
        assert!(store.get("a/+").is_none());
        assert!(store.get("").is_none());
    }

    #[test]
    fn overwrite_and_chaining() {
        let mut store = MqttStore::new();
        store.put("3", "3").put("3", "33").put("", "ignored");
        assert_eq!(store.get("3").map(|m| *m.value), Some("33"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn empty_values_are_still_values() {
        let mut store: MqttStore<Option<i32>> = MqttStore::new();
        store.put("a", None);
        let m = store.get("a").unwrap();
        assert_eq!(m.value, &None);
        assert_eq!(store.find_matching("#").unwrap().len(), 1);

        assert_eq!(store.remove("a"), Some(None));
        assert!(store.get("a").is_none());
        assert!(store.find_matching("#").unwrap().is_empty());
    }

    #[test]
    fn find_matching_single_level() {
        let mut store = MqttStore::new();
        store.put("a/b", "x").put("a/c", "y").put("a", "z");
        assert_eq!(
            sorted(store.find_matching("a/+").unwrap()),
            [(String::from("a/b"), "x"), (String::from("a/c"), "y")]
        );

        let mut store = MqttStore::new();
        store.put("2/2", "2").put("22", "2").put("2/22", "2");
        assert_eq!(keys(store.find_matching("2/+").unwrap()), ["2/2", "2/22"]);
        assert!(MqttStore::<i32>::new().find_matching("1/+").unwrap().is_empty());
    }

    #[test]
    fn find_matching_multi_level() {
        let mut store = MqttStore::new();
        store.put("a", "z").put("a/b", "x").put("a/b/c", "y");
        assert_eq!(keys(store.find_matching("a/#").unwrap()), ["a", "a/b", "a/b/c"]);

        let mut store = MqttStore::new();
        store.put("3/3/3", 3).put("3/3", 3).put("3/3/3/3", 3).put("3", 3);
        assert_eq!(store.find_matching("#").unwrap().len(), 4);

        let mut store = MqttStore::new();
        store.put("4/4/4", 4).put("4/44/4/4", 4).put("4/444/444", 4);
        assert_eq!(keys(store.find_matching("4/+/#").unwrap()), ["4/4/4", "4/44/4/4", "4/444/444"]);
    }

    #[test]
    fn find_matching_skips_cleared_values() {
        let mut store = MqttStore::new();
        store.put("5/5/5", "5");
        assert_eq!(store.remove("5/5/5"), Some("5"));
        assert!(store.find_matching("5/#").unwrap().is_empty());
        assert!(store.find_patterns("5/5/5").unwrap().is_empty());
    }

    #[test]
    fn find_matching_malformed() {
        let store = MqttStore::<i32>::new();
        assert_eq!(store.find_matching("#/x").unwrap_err(), StoreError::MalformedPattern("#/x".into()));
        assert!(store.find_matching("a/#/b").is_err());
        assert!(store.find_matching("").unwrap().is_empty());
    }

    #[test]
    fn find_patterns() {
        let mut store = MqttStore::new();
        store.put("a/+/c", 1).put("a/#", 2).put("x/y", 3);
        assert_eq!(
            sorted(store.find_patterns("a/b/c").unwrap()),
            [(String::from("a/#"), 2), (String::from("a/+/c"), 1)]
        );

        let mut store = MqttStore::new();
        store.put("2/2", "2");
        assert_eq!(keys(store.find_patterns("2/2").unwrap()), ["2/2"]);
        assert!(store.find_patterns("1/1/1").unwrap().is_empty());

        let mut store = MqttStore::new();
        store.put("3/+", "3").put("4/#", "4").put("5/5/#", "5");
        assert_eq!(keys(store.find_patterns("3/3").unwrap()), ["3/+"]);
        assert_eq!(keys(store.find_patterns("4/4").unwrap()), ["4/#"]);
        assert_eq!(keys(store.find_patterns("5/5").unwrap()), ["5/5/#"]);

        let mut store = MqttStore::new();
        store.put("6/+/6", "6").put("6/6/6", "6").put("6/#", "6");
        assert_eq!(store.find_patterns("6/6/6").unwrap().len(), 3);
    }

    #[test]
    fn find_patterns_invalid_key() {
        let store = MqttStore::<i32>::new();
        assert_eq!(store.find_patterns("a/+").unwrap_err(), StoreError::InvalidKey("a/+".into()));
        assert!(store.find_patterns("#").is_err());
        assert!(store.find_patterns("").unwrap().is_empty());
    }

    #[test]
    fn matched_sections() {
        let mut store = MqttStore::new();
        store.put("/a/+", 1);
        let m = store.find_patterns("/a/b").unwrap().remove(0).cloned();
        assert_eq!(
            m,
            Matched { sections: vec!["".into(), "a".into(), "+".into()], key: "/a/+".into(), value: 1 }
        );
    }

    #[test]
    fn retain_and_len() {
        let mut store = MqttStore::new();
        store.put("a/1", 1).put("a/2", 2).put("a/3", 3);
        assert!(store.contains_key("a/2"));
        assert_eq!(store.retain(|v| *v != 2), 1);
        assert!(!store.contains_key("a/2"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.tree().nodes_size(), 4);
        assert!(!store.is_empty());
    }

    #[test]
    fn serialize() {
        let mut store = MqttStore::new();
        store.put("a/+/c", 1).put("a/#", 2).put("x/y", 3);

        let bytes = bincode::serialize(&store).unwrap();
        let store: MqttStore<i32> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(keys(store.find_patterns("a/b/c").unwrap()), ["a/#", "a/+/c"]);
        assert_eq!(store.len(), 3);

        let m = store.get("x/y").unwrap().cloned();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"sections":["x","y"],"key":"x/y","value":3}"#);

        let json = serde_json::to_string(&store).unwrap();
        let store: MqttStore<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(sorted(store.find_matching("#").unwrap()), [
            (String::from("a/#"), 2),
            (String::from("a/+/c"), 1),
            (String::from("x/y"), 3)
        ]);

        let store: MqttStore<i32> = serde_json::from_str(r#"{"/a":1,"/a/+":2}"#).unwrap();
        assert_eq!(keys(store.find_patterns("/a/b").unwrap()), ["/a/+"]);
    }

    #[test]
    fn deep_keys() {
        let key = vec!["x"; 50_000].join("/");
        let mut store = MqttStore::new();
        store.put(&key, 1).put("x", 2);

        assert_eq!(store.get(&key).map(|m| *m.value), Some(1));
        assert_eq!(store.find_matching("#").unwrap().len(), 2);
        assert_eq!(store.find_matching("x/#").unwrap().len(), 2);
        let m = store.find_patterns(&key).unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].sections.len(), 50_000);
        assert_eq!(store.len(), 2);
        assert_eq!(store.tree().nodes_size(), 50_000);
        assert_eq!(store.retain(|v| *v == 1), 1);

        let bytes = bincode::serialize(&store).unwrap();
        let restored: MqttStore<i32> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.get(&key).map(|m| *m.value), Some(1));
        drop(restored);
        drop(store);
    }
}
