//! Path Resolution Module
//!
//! Navigates the cache tree by key. Writes create missing containers on the
//! way down; reads never touch the tree and report a missing container as
//! "not found".

use std::collections::HashMap;

use serde_json::Value;

use crate::cache::{CacheEntry, Key};

/// Children of a container, keyed by segment.
pub type Branch = HashMap<String, Node>;

// == Node ==
/// One slot of the cache tree: either a container or an entry.
#[derive(Debug, Clone)]
pub enum Node {
    Branch(Branch),
    Leaf(CacheEntry),
}

impl Node {
    /// Returns the children if this node is a container.
    fn as_branch_mut(&mut self) -> Option<&mut Branch> {
        match self {
            Node::Branch(children) => Some(children),
            Node::Leaf(_) => None,
        }
    }

    /// Number of entries in this subtree.
    pub fn entry_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Branch(children) => children.values().map(Node::entry_count).sum(),
        }
    }
}

// == Write Resolution ==
/// Resolves `key` to its parent container and final segment, creating every
/// missing intermediate container.
///
/// Returns `None` only for the empty key.
pub fn resolve_for_write<'a, 'k>(root: &'a mut Branch, key: &'k Key) -> Option<(&'a mut Branch, &'k str)> {
    let (last, parents) = key.segments().split_last()?;

    let mut map = root;
    for segment in parents {
        let node = map
            .entry(segment.clone())
            .or_insert_with(|| Node::Branch(Branch::new()));
        // An entry in the way is displaced by a container
        if !matches!(node, Node::Branch(_)) {
            *node = Node::Branch(Branch::new());
        }
        map = node.as_branch_mut()?;
    }

    Some((map, last.as_str()))
}

// == Read Resolution ==
/// Resolves `key` to its parent container and final segment without
/// modifying the tree.
///
/// Returns `None` if any intermediate container is missing or is an entry.
pub fn resolve_for_read<'a, 'k>(root: &'a Branch, key: &'k Key) -> Option<(&'a Branch, &'k str)> {
    let (last, parents) = key.segments().split_last()?;

    let mut map = root;
    for segment in parents {
        match map.get(segment)? {
            Node::Branch(children) => map = children,
            Node::Leaf(_) => return None,
        }
    }

    Some((map, last.as_str()))
}

/// Mutable variant of [`resolve_for_read`]. Still never creates containers.
pub fn resolve_for_read_mut<'a, 'k>(root: &'a mut Branch, key: &'k Key) -> Option<(&'a mut Branch, &'k str)> {
    let (last, parents) = key.segments().split_last()?;

    let mut map = root;
    for segment in parents {
        match map.get_mut(segment)? {
            Node::Branch(children) => map = children,
            Node::Leaf(_) => return None,
        }
    }

    Some((map, last.as_str()))
}

// == Value Extraction ==
/// Drills into a JSON value along a dot-separated path such as `"user.tags.0"`.
///
/// Objects are indexed by name and arrays by numeric position. Any missing
/// segment yields `None`.
pub fn extract_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(fields) => fields.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
        _ => None,
    })
}
