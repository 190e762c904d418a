use std::fmt;

use derive_more::{Deref, From, IntoIterator};

/// An ordered list of node names, from the root down.
///
/// For insertions the path names the group that receives the new child. For
/// every other operation the last name is the target node itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deref, From, IntoIterator)]
pub struct TreePath(Vec<String>);

impl TreePath {
    /// The empty path, addressing the root container.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new path with `name` appended.
    pub fn join(&self, name: impl Into<String>) -> Self {
        let mut names = self.0.clone();
        names.push(name.into());
        Self(names)
    }

    /// Splits off the last name, returning the parent path and the target.
    pub fn split_last(&self) -> Option<(&[String], &str)> {
        self.0
            .split_last()
            .map(|(last, parent)| (parent, last.as_str()))
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

impl From<&[String]> for TreePath {
    fn from(names: &[String]) -> Self {
        Self(names.to_vec())
    }
}

impl From<&[&str]> for TreePath {
    fn from(names: &[&str]) -> Self {
        names.iter().copied().collect()
    }
}

impl From<Vec<&str>> for TreePath {
    fn from(names: Vec<&str>) -> Self {
        names.into_iter().collect()
    }
}

impl<const N: usize> From<[&str; N]> for TreePath {
    fn from(names: [&str; N]) -> Self {
        names.into_iter().collect()
    }
}

impl From<&TreePath> for TreePath {
    fn from(path: &TreePath) -> Self {
        path.clone()
    }
}

impl<S: Into<String>> FromIterator<S> for TreePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
