use std::fmt;
use std::fmt::Debug;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::matcher::{walk, Selector};
use crate::topic::{Level, Topic};
use crate::HashMap;

pub type TopicTree<V> = Node<V>;

/// One level boundary of the trie. `value` is `None` until something is stored here, and goes
/// back to `None` when cleared. Nodes are never detached once created.
pub struct Node<V> {
    value: Option<V>,
    branches: HashMap<Level, Node<V>>,
}

impl<V> Default for Node<V> {
    #[inline]
    fn default() -> Node<V> {
        Self { value: None, branches: HashMap::default() }
    }
}

impl<V> Node<V> {
    /// Stores `value` at the literal path `topic`, creating missing nodes on the way.
    /// Returns the previous value. An empty topic is ignored.
    #[inline]
    pub fn insert(&mut self, topic: &Topic, value: V) -> Option<V> {
        if topic.is_empty() {
            return None;
        }
        let mut node = self;
        for level in topic.levels() {
            node = node.branches.entry(level.clone()).or_default();
        }
        node.value.replace(value)
    }

    /// Literal lookup. Wildcard levels only follow edges carrying the same wildcard label.
    #[inline]
    pub fn get(&self, topic: &Topic) -> Option<&V> {
        self.node(topic.levels()).and_then(|n| n.value.as_ref())
    }

    #[inline]
    fn node(&self, path: &[Level]) -> Option<&Node<V>> {
        if path.is_empty() {
            return None;
        }
        path.iter().try_fold(self, |node, level| node.branches.get(level))
    }

    #[inline]
    fn node_mut(&mut self, path: &[Level]) -> Option<&mut Node<V>> {
        if path.is_empty() {
            return None;
        }
        path.iter().try_fold(self, |node, level| node.branches.get_mut(level))
    }

    /// Clears the value stored at `topic`, keeping the node and everything beneath it.
    #[inline]
    pub fn remove(&mut self, topic: &Topic) -> Option<V> {
        self.node_mut(topic.levels()).and_then(|n| n.value.take())
    }

    //clear every value `v` for which `f(&mut v)` returns `false`.
    #[inline]
    pub fn retain<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(&mut V) -> bool,
    {
        let mut removeds = 0;
        let mut stack = self.branches.values_mut().collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            if let Some(v) = node.value.as_mut() {
                if !f(v) {
                    node.value = None;
                    removeds += 1;
                }
            }
            stack.extend(node.branches.values_mut());
        }
        removeds
    }

    /// Runs `selector` over the tree, returning every valued node it accepts together with the
    /// literal path that leads to it.
    #[inline]
    pub(crate) fn matches<S: Selector>(&self, selector: &S, topic: &Topic) -> Vec<(Topic, &V)> {
        let mut out = Vec::new();
        if !topic.is_empty() {
            walk(selector, self, topic.levels(), &mut out);
        }
        out
    }

    /// Every stored value with the key it is stored under, in no particular order.
    pub fn entries(&self) -> Vec<(Topic, &V)> {
        let mut out = Vec::new();
        let mut path: Vec<&Level> = Vec::new();
        let mut stack = self.branches.iter().map(|(l, n)| (0, l, n)).collect::<Vec<_>>();
        while let Some((depth, l, n)) = stack.pop() {
            path.truncate(depth);
            path.push(l);
            if let Some(v) = n.value.as_ref() {
                out.push((path.iter().copied().cloned().collect::<Vec<_>>().into(), v));
            }
            stack.extend(n.branches.iter().map(|(l, c)| (depth + 1, l, c)));
        }
        out
    }

    /// This node and every node beneath it, depth first.
    #[inline]
    fn nodes(&self) -> impl Iterator<Item = &Node<V>> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.branches.values());
            Some(node)
        })
    }

    #[inline]
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    #[inline]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    #[inline]
    pub fn children(&self) -> &HashMap<Level, Node<V>> {
        &self.branches
    }

    #[inline]
    pub fn child(&self, l: &Level) -> Option<&Node<V>> {
        self.branches.get(l)
    }

    #[inline]
    pub(crate) fn child_entry(&self, l: &Level) -> Option<(&Level, &Node<V>)> {
        self.branches.get_key_value(l)
    }

    #[inline]
    pub fn values_size(&self) -> usize {
        self.nodes().filter(|n| n.value.is_some()).count()
    }

    /// Number of nodes below this one.
    #[inline]
    pub fn nodes_size(&self) -> usize {
        self.nodes().count() - 1
    }
}

impl<V: Debug> Node<V> {
    pub fn list(&self, top: usize) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = self.branches.iter().map(|(l, n)| (0, l, n)).collect::<Vec<_>>();
        while let Some((depth, l, n)) = stack.pop() {
            if out.len() >= top {
                break;
            }
            out.push(format!("{} {:?}, value: {:?}", " ".repeat(depth * 3), l.to_string(), n.value));
            stack.extend(n.branches.iter().map(|(l, c)| (depth + 1, l, c)));
        }
        out
    }
}

impl<V> Drop for Node<V> {
    //unlink the levels one by one, the default drop glue recurses once per level
    fn drop(&mut self) {
        let mut stack = self.branches.drain().map(|(_, n)| n).collect::<Vec<_>>();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.branches.drain().map(|(_, n)| n));
        }
    }
}

impl<V> Debug for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node {{ nodes_size: {}, values_size: {} }}", self.nodes_size(), self.values_size())
    }
}

/// Serialized flat, as a map from each stored key to its value.
impl<V: Serialize> Serialize for Node<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries = self.entries();
        let mut s = serializer.serialize_map(Some(entries.len()))?;
        for (topic, v) in entries {
            s.serialize_entry(&topic.to_string(), v)?;
        }
        s.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Node<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NodeVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for NodeVisitor<V> {
            type Value = Node<V>;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of topic keys to values")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut node = Node::default();
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    node.insert(&Topic::parse(&key), value);
                }
                Ok(node)
            }
        }
        deserializer.deserialize_map(NodeVisitor(PhantomData))
    }
}
