//! Hierarchical inclusion tree for a scope.
//!
//! Keys are path segments. A directory maps names to child nodes; a file is a
//! boolean marker. Only `true` markers are included; `false` markers are kept
//! so a hand-edited scope can toggle a file out without losing its entry.

use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node of a [`ScopeTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Directory(BTreeMap<String, Node>),
    File(bool),
}

impl Node {
    fn empty_dir() -> Self {
        Node::Directory(BTreeMap::new())
    }

    /// True if any marker reachable from this node is `true`.
    pub fn has_included_descendant(&self) -> bool {
        match self {
            Node::File(included) => *included,
            Node::Directory(children) => children.values().any(Node::has_included_descendant),
        }
    }
}

/// Wire shape accepted when reading a node. Anything that is neither an
/// object nor a boolean is dropped instead of failing the whole file.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNode {
    Directory(BTreeMap<String, RawNode>),
    File(bool),
    Other(IgnoredAny),
}

impl RawNode {
    fn into_node(self, key: &str) -> Option<Node> {
        match self {
            RawNode::File(included) => Some(Node::File(included)),
            RawNode::Directory(children) => Some(Node::Directory(into_children(children))),
            RawNode::Other(_) => {
                tracing::warn!("skipping scope entry {key:?}: expected an object or a boolean");
                None
            }
        }
    }
}

fn into_children(raw: BTreeMap<String, RawNode>) -> BTreeMap<String, Node> {
    raw.into_iter().filter_map(|(key, node)| node.into_node(&key).map(|n| (key, n))).collect()
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawNode::deserialize(deserializer)? {
            RawNode::File(included) => Ok(Node::File(included)),
            RawNode::Directory(children) => Ok(Node::Directory(into_children(children))),
            RawNode::Other(_) => Err(serde::de::Error::custom("expected an object or a boolean")),
        }
    }
}

/// The set of files in a scope, rooted at a synthetic unnamed directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScopeTree {
    root: BTreeMap<String, Node>,
}

impl<'de> Deserialize<'de> for ScopeTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, RawNode>::deserialize(deserializer)?;
        Ok(Self { root: into_children(raw) })
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &BTreeMap<String, Node> {
        &self.root
    }

    /// Insert a `/`-separated path. Files get a `true` marker; directories only
    /// ensure a directory node exists. Every ancestor becomes a directory,
    /// replacing a file marker that sits where a directory is needed.
    pub fn insert(&mut self, path: &str, is_file: bool) {
        let segments: Vec<&str> =
            path.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
        let Some((last, ancestors)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.root;
        for segment in ancestors {
            let child = current.entry((*segment).to_string()).or_insert_with(Node::empty_dir);
            if let Node::File(_) = child {
                tracing::debug!("replacing file marker {segment} with a directory for {path}");
                *child = Node::empty_dir();
            }
            let Node::Directory(children) = child else {
                return;
            };
            current = children;
        }

        if is_file {
            current.insert((*last).to_string(), Node::File(true));
        } else {
            current.entry((*last).to_string()).or_insert_with(Node::empty_dir);
        }
    }

    /// Set the marker of an existing file entry. Returns false when `path`
    /// does not name a file in the tree.
    pub fn set_included(&mut self, path: &str, included: bool) -> bool {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((last, ancestors)) = segments.split_last() else {
            return false;
        };

        let mut current = &mut self.root;
        for segment in ancestors {
            match current.get_mut(*segment) {
                Some(Node::Directory(children)) => current = children,
                _ => return false,
            }
        }

        match current.get_mut(*last) {
            Some(Node::File(marker)) => {
                *marker = included;
                true
            }
            _ => false,
        }
    }

    /// Every path whose marker is `true`, depth first in key order.
    pub fn collect_included_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_into(&self.root, "", &mut paths);
        paths
    }

    pub fn included_count(&self) -> usize {
        self.collect_included_paths().len()
    }

    /// True when nothing in the tree is included.
    pub fn is_empty(&self) -> bool {
        !self.root.values().any(Node::has_included_descendant)
    }

    /// Render included entries as an ASCII tree, one line per entry.
    ///
    /// The synthetic root prints nothing and its children carry no connector;
    /// below that, `├── `/`└── ` connectors with `│   `/four-space
    /// continuation prefixes. Directories without included files are omitted.
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_dir(&self.root, "", None, &mut out);
        out
    }
}

fn collect_into(children: &BTreeMap<String, Node>, prefix: &str, paths: &mut Vec<String>) {
    for (name, node) in children {
        let path = if prefix.is_empty() { name.clone() } else { format!("{prefix}/{name}") };
        match node {
            Node::File(true) => paths.push(path),
            Node::File(false) => {}
            Node::Directory(grandchildren) => collect_into(grandchildren, &path, paths),
        }
    }
}

fn render_dir(
    children: &BTreeMap<String, Node>,
    prefix: &str,
    label: Option<&str>,
    out: &mut String,
) {
    // BTreeMap iteration is already sorted by key.
    let visible: Vec<(&String, &Node)> =
        children.iter().filter(|(_, node)| node.has_included_descendant()).collect();

    if let Some(label) = label {
        if !visible.is_empty() {
            out.push_str(label);
            out.push('\n');
        }
    }

    let total = visible.len();
    for (idx, (name, node)) in visible.into_iter().enumerate() {
        let is_last = idx + 1 == total;
        let child_prefix = if label.is_some() {
            out.push_str(prefix);
            out.push_str(if is_last { "└── " } else { "├── " });
            format!("{prefix}{}", if is_last { "    " } else { "│   " })
        } else {
            prefix.to_string()
        };

        match node {
            Node::File(_) => {
                out.push_str(name);
                out.push('\n');
            }
            Node::Directory(grandchildren) => {
                render_dir(grandchildren, &child_prefix, Some(name), out);
            }
        }
    }
}
