//! Branch selection shared by both wildcard searches.
//!
//! The two searches differ only in which side holds the wildcards:
//!
//! - [`FilterSelector`]: the query is a pattern, the tree holds concrete topics
//!   (`find_matching`).
//! - [`NameSelector`]: the query is a concrete topic, the tree holds patterns
//!   (`find_patterns`).
//!
//! A selector looks at one node and the not yet consumed query levels and answers with the
//! [`Branch`]es worth following. [`walk`] does the traversal and the bookkeeping of the literal
//! path, so neither selector deals with either.

use crate::topic::{Level, Topic};
use crate::tree::Node;

pub(crate) enum Branch<'a, V> {
    /// Consume one query level and continue below the child.
    Descend(&'a Level, &'a Node<V>),
    /// The query is satisfied at this node; the level, if any, is appended to the path.
    Accept(Option<&'a Level>, &'a Node<V>),
    /// The child and every node beneath it are matched.
    Subtree(&'a Level, &'a Node<V>),
}

pub(crate) trait Selector {
    /// `depth` is the number of levels already descended; `0` means `node` is the root.
    fn select<'a, V>(&self, node: &'a Node<V>, rest: &[Level], depth: usize, out: &mut Vec<Branch<'a, V>>);
}

struct Frame<'a, 'q, V> {
    /// Path length before `level` is appended.
    depth: usize,
    level: Option<&'a Level>,
    node: &'a Node<V>,
    /// Unconsumed query levels, `None` inside a matched subtree.
    rest: Option<&'q [Level]>,
}

/// Depth-first search driven by `selector`. Runs on an explicit stack, so the key depth is not
/// bounded by the thread's stack size.
pub(crate) fn walk<'a, S, V>(selector: &S, root: &'a Node<V>, query: &[Level], out: &mut Vec<(Topic, &'a V)>)
where
    S: Selector,
{
    let mut stack = vec![Frame { depth: 0, level: None, node: root, rest: Some(query) }];
    let mut path: Vec<&'a Level> = Vec::new();
    let mut branches = Vec::new();

    while let Some(Frame { depth, level, node, rest }) = stack.pop() {
        path.truncate(depth);
        path.extend(level);
        let depth = path.len();

        let Some(rest) = rest else {
            if let Some(v) = node.value() {
                out.push((to_topic(&path, None), v));
            }
            stack.extend(node.children().iter().map(|(l, n)| Frame { depth, level: Some(l), node: n, rest: None }));
            continue;
        };

        selector.select(node, rest, depth, &mut branches);
        for branch in branches.drain(..) {
            match branch {
                Branch::Descend(l, child) => {
                    stack.push(Frame { depth, level: Some(l), node: child, rest: Some(&rest[1..]) });
                }
                Branch::Accept(l, n) => {
                    if let Some(v) = n.value() {
                        out.push((to_topic(&path, l), v));
                    }
                }
                Branch::Subtree(l, child) => {
                    stack.push(Frame { depth, level: Some(l), node: child, rest: None });
                }
            }
        }
    }
}

#[inline]
fn to_topic(path: &[&Level], last: Option<&Level>) -> Topic {
    path.iter().copied().chain(last).cloned().collect::<Vec<_>>().into()
}

/// Query is a pattern, stored keys are concrete.
pub(crate) struct FilterSelector;

impl Selector for FilterSelector {
    fn select<'a, V>(&self, node: &'a Node<V>, rest: &[Level], depth: usize, out: &mut Vec<Branch<'a, V>>) {
        match rest.first() {
            None => out.push(Branch::Accept(None, node)),
            Some(Level::MultiWildcard) => {
                //# matches the parent as well, but never the root
                if depth > 0 {
                    out.push(Branch::Accept(None, node));
                }
                out.extend(node.children().iter().map(|(l, n)| Branch::Subtree(l, n)));
            }
            Some(Level::SingleWildcard) => {
                out.extend(node.children().iter().map(|(l, n)| Branch::Descend(l, n)));
            }
            Some(level) => {
                if let Some((l, n)) = node.child_entry(level) {
                    out.push(Branch::Descend(l, n));
                }
            }
        }
    }
}

/// Query is concrete, stored keys may be patterns.
pub(crate) struct NameSelector;

impl Selector for NameSelector {
    fn select<'a, V>(&self, node: &'a Node<V>, rest: &[Level], _depth: usize, out: &mut Vec<Branch<'a, V>>) {
        //a trailing # also matches zero remaining levels
        if let Some((l, n)) = node.child_entry(&Level::MultiWildcard) {
            out.push(Branch::Accept(Some(l), n));
        }
        match rest.first() {
            None => out.push(Branch::Accept(None, node)),
            Some(level) => {
                if let Some((l, n)) = node.child_entry(&Level::SingleWildcard) {
                    out.push(Branch::Descend(l, n));
                }
                if let Some((l, n)) = node.child_entry(level) {
                    out.push(Branch::Descend(l, n));
                }
            }
        }
    }
}
