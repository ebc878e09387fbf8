// src/dump/tree.rs

//! Arena-backed tree produced by the dump decoder
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`], so
//! arbitrarily deep input never recurses on the native stack.

use std::collections::BTreeMap;

/// Index of a node inside a [`DumpTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// A single node of the decoded dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// `key:` followed by nested entries
    Map(BTreeMap<String, NodeId>),
    /// `key: #N items` followed by `- ` entries
    List(Vec<NodeId>),
    /// Literal text value
    Scalar(String),
    /// `|` accumulator, only present while the block is still open
    Block(Vec<u8>),
}

impl Node {
    /// Short name of the node kind, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Map(_) => "map",
            Node::List(_) => "list",
            Node::Scalar(_) => "scalar",
            Node::Block(_) => "block",
        }
    }
}

/// Owned, arena-free view of a subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpValue {
    Map(BTreeMap<String, DumpValue>),
    List(Vec<DumpValue>),
    Scalar(String),
}

/// Decoded dump: an arena of nodes with a map at the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for DumpTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DumpTree {
    /// Create a tree holding only an empty root map
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Map(BTreeMap::new())],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1 && self.map_keys(self.root).next().is_none()
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Look up `key` in a map node
    pub fn map_get(&self, id: NodeId, key: &str) -> Option<NodeId> {
        match self.get(id) {
            Node::Map(entries) => entries.get(key).copied(),
            _ => None,
        }
    }

    /// Keys of a map node (empty for other kinds)
    pub fn map_keys(&self, id: NodeId) -> impl Iterator<Item = &str> {
        let entries = match self.get(id) {
            Node::Map(entries) => Some(entries),
            _ => None,
        };
        entries.into_iter().flat_map(|e| e.keys().map(String::as_str))
    }

    /// Elements of a list node (empty for other kinds)
    pub fn list_items(&self, id: NodeId) -> &[NodeId] {
        match self.get(id) {
            Node::List(items) => items,
            _ => &[],
        }
    }

    /// Text of a scalar node
    pub fn scalar(&self, id: NodeId) -> Option<&str> {
        match self.get(id) {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar stored under `key` in a map node
    pub fn scalar_at(&self, id: NodeId, key: &str) -> Option<&str> {
        self.map_get(id, key).and_then(|child| self.scalar(child))
    }

    /// Follow a chain of map keys from the root
    pub fn path(&self, keys: &[&str]) -> Option<NodeId> {
        keys.iter()
            .try_fold(self.root, |node, key| self.map_get(node, key))
    }

    /// Scalars of a list stored under `key`, skipping non-scalar elements
    pub fn scalar_list(&self, id: NodeId, key: &str) -> Vec<&str> {
        self.map_get(id, key)
            .map(|list| {
                self.list_items(list)
                    .iter()
                    .filter_map(|item| self.scalar(*item))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Convert the subtree at `id` into an owned value
    ///
    /// Uses an explicit work stack; open blocks are rendered lossily.
    pub fn to_value(&self, id: NodeId) -> DumpValue {
        enum Step {
            Visit(NodeId),
            BuildMap(Vec<String>),
            BuildList(usize),
        }

        let mut work = vec![Step::Visit(id)];
        let mut built: Vec<DumpValue> = Vec::new();

        while let Some(step) = work.pop() {
            match step {
                Step::Visit(node) => match self.get(node) {
                    Node::Scalar(s) => built.push(DumpValue::Scalar(s.clone())),
                    Node::Block(bytes) => {
                        built.push(DumpValue::Scalar(String::from_utf8_lossy(bytes).into_owned()))
                    }
                    Node::List(items) => {
                        work.push(Step::BuildList(items.len()));
                        work.extend(items.iter().rev().map(|c| Step::Visit(*c)));
                    }
                    Node::Map(entries) => {
                        work.push(Step::BuildMap(entries.keys().cloned().collect()));
                        work.extend(entries.values().rev().map(|c| Step::Visit(*c)));
                    }
                },
                Step::BuildList(count) => {
                    let items = built.split_off(built.len() - count);
                    built.push(DumpValue::List(items));
                }
                Step::BuildMap(keys) => {
                    let values = built.split_off(built.len() - keys.len());
                    built.push(DumpValue::Map(keys.into_iter().zip(values).collect()));
                }
            }
        }

        built.pop().unwrap_or(DumpValue::Map(BTreeMap::new()))
    }
}
