use std::sync::Arc;

use derive_more::{Deref, DerefMut, From, Into, IsVariant};
use hashlink::LinkedHashMap;
use serde_json::{Map, Value};

/// The ordered children of a group, or of the anonymous root.
///
/// Nodes are held behind `Arc` so that snapshots can share every subtree
/// that a mutation did not touch.
pub type Children = Vec<Arc<Node>>;

/// An immutable view of the whole tree at one point in time.
pub type Snapshot = Arc<Children>;

/// Key/value payload of an entry. Keys keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut, From, Into)]
pub struct EntryData(LinkedHashMap<String, Value>);

impl EntryData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes every key of `other` into `self`.
    ///
    /// Existing keys are overwritten where they stand, new keys go to the end.
    pub fn merge(&mut self, other: EntryData) {
        for (key, value) in other.0 {
            self.0.replace(key, value);
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }
}

impl From<Map<String, Value>> for EntryData {
    fn from(object: Map<String, Value>) -> Self {
        object.into_iter().collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for EntryData {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }
}

/// A named node of the tree: either a group holding further nodes, or an
/// entry holding data.
#[derive(Debug, Clone, PartialEq, Eq, IsVariant)]
pub enum Node {
    Group { name: String, children: Children },
    Entry { name: String, data: EntryData },
}

impl Node {
    pub fn group(name: impl Into<String>) -> Self {
        Node::Group {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn entry(name: impl Into<String>, data: EntryData) -> Self {
        Node::Entry {
            name: name.into(),
            data,
        }
    }

    /// Builds a group around already constructed children, mostly for seeding.
    pub fn group_with(name: impl Into<String>, children: impl IntoIterator<Item = Node>) -> Self {
        Node::Group {
            name: name.into(),
            children: children.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Group { name, .. } | Node::Entry { name, .. } => name,
        }
    }

    pub fn set_name(&mut self, new_name: String) {
        match self {
            Node::Group { name, .. } | Node::Entry { name, .. } => *name = new_name,
        }
    }

    pub fn children(&self) -> Option<&Children> {
        match self {
            Node::Group { children, .. } => Some(children),
            Node::Entry { .. } => None,
        }
    }

    pub fn data(&self) -> Option<&EntryData> {
        match self {
            Node::Group { .. } => None,
            Node::Entry { data, .. } => Some(data),
        }
    }
}

// Tear groups down with a worklist so dropping a deep tree never recurses.
// Subtrees still shared with another snapshot are only released, not walked.
impl Drop for Node {
    fn drop(&mut self) {
        let Node::Group { children, .. } = self else {
            return;
        };
        let mut pending = std::mem::take(children);
        while let Some(child) = pending.pop() {
            if let Some(mut node) = Arc::into_inner(child)
                && let Node::Group { children, .. } = &mut node
            {
                pending.append(children);
            }
        }
    }
}
