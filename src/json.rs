//! Typed path lookup over JSON values and the tree-widget edit shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step into a JSON tree: an object key or an array index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl PathSegment {
    /// The object key, if this segment is one.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) => Some(key),
            PathSegment::Index(_) => None,
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Walk `root` along `path`, returning the value at the end.
///
/// Resolution stops with `None` as soon as a segment fails: a key missing
/// from an object, an index out of bounds, or any segment applied to a
/// scalar.
pub fn extract<'a>(root: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    let (head, rest) = match path.split_first() {
        Some(split) => split,
        None => return Some(root),
    };
    let next = match (head, root) {
        (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
        (PathSegment::Index(index), Value::Array(items)) => items.get(*index)?,
        _ => return None,
    };
    extract(next, rest)
}

/// An edit or delete reported by the host's JSON tree widget.
///
/// The widget reports the touched node's own name plus the namespace path
/// of its ancestors; either side carries null slots at the tree root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeEdit {
    /// Name of the touched node (absent at the tree root).
    pub name: Option<PathSegment>,

    /// Ancestor path from the root down to the touched node's parent.
    pub namespace: Vec<Option<PathSegment>>,

    /// The full tree after the edit was applied.
    pub edited_tree: Value,
}

impl TreeEdit {
    /// The concrete path to the touched node: namespace then name, null
    /// slots dropped.
    pub fn path(&self) -> Vec<PathSegment> {
        self.namespace
            .iter()
            .flatten()
            .cloned()
            .chain(self.name.clone())
            .collect()
    }
}
