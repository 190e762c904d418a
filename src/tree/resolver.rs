//! Name-based path resolution over a tree of [`Node`]s.
//!
//! Resolution walks the path with an explicit loop, so arbitrarily deep
//! user-supplied paths never grow the call stack. The read-only functions work
//! on any snapshot; [`resolve_mut`] walks a snapshot under construction and
//! unshares every container it descends through.

use std::sync::Arc;

use snafu::prelude::*;

use crate::tree::{Children, InvalidPathSnafu, Node, TreeError, TreePath};

/// Index of the first child called `name`, in insertion order.
pub fn position(container: &Children, name: &str) -> Option<usize> {
    container.iter().position(|node| node.name() == name)
}

/// Resolves `path` to the children of the group it names.
///
/// An empty path resolves to `root`. Stepping onto a missing name or onto an
/// entry fails with [`TreeError::InvalidPath`].
pub fn resolve<'a>(root: &'a Children, path: &[String]) -> Result<&'a Children, TreeError> {
    let mut container = root;
    for (depth, name) in path.iter().enumerate() {
        container = position(container, name)
            .and_then(|index| container[index].children())
            .context(InvalidPathSnafu {
                path: &path[..=depth],
            })?;
    }
    Ok(container)
}

/// Resolves a path whose last name is the node itself.
pub fn resolve_node<'a>(root: &'a Children, path: &[String]) -> Result<&'a Arc<Node>, TreeError> {
    let (target, parent) = path.split_last().context(InvalidPathSnafu { path })?;
    let container = resolve(root, parent)?;
    position(container, target)
        .map(|index| &container[index])
        .context(InvalidPathSnafu { path })
}

/// Like [`resolve`], but over a tree that is being rebuilt.
///
/// Each group on the way down is passed through [`Arc::make_mut`], which
/// copies it if any other snapshot still references it. The returned
/// container is therefore exclusively owned by `root`, while every sibling
/// subtree off the path stays shared.
pub fn resolve_mut<'a>(
    root: &'a mut Children,
    path: &[String],
) -> Result<&'a mut Children, TreeError> {
    let mut container = root;
    for (depth, name) in path.iter().enumerate() {
        let index = position(container, name)
            .filter(|&index| container[index].is_group())
            .context(InvalidPathSnafu {
                path: &path[..=depth],
            })?;
        let Node::Group { children, .. } = Arc::make_mut(&mut container[index]) else {
            return InvalidPathSnafu {
                path: &path[..=depth],
            }
            .fail();
        };
        container = children;
    }
    Ok(container)
}

/// Resolves the container of a node-targeting path and the target's index in it.
pub fn resolve_target_mut<'a>(
    root: &'a mut Children,
    path: &TreePath,
) -> Result<(&'a mut Children, usize), TreeError> {
    let (parent, target) = path.split_last().context(InvalidPathSnafu { path })?;
    let container = resolve_mut(root, parent)?;
    let index = position(container, target).context(InvalidPathSnafu { path })?;
    Ok((container, index))
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::tree::EntryData;

    fn names(path: &[&str]) -> Vec<String> {
        path.iter().map(|name| name.to_string()).collect()
    }

    #[fixture]
    fn tree() -> Children {
        vec![
            Arc::new(Node::group_with(
                "A",
                [
                    Node::group_with("B", [Node::entry("x", EntryData::new())]),
                    Node::entry("y", EntryData::new()),
                ],
            )),
            Arc::new(Node::group("C")),
        ]
    }

    #[rstest]
    fn empty_path_resolves_to_root(tree: Children) {
        let container = resolve(&tree, &[]).unwrap();
        assert_eq!(container.len(), 2);
    }

    #[rstest]
    #[case(&["A"], 2)]
    #[case(&["A", "B"], 1)]
    #[case(&["C"], 0)]
    fn resolves_nested_groups(tree: Children, #[case] path: &[&str], #[case] len: usize) {
        let container = resolve(&tree, &names(path)).unwrap();
        assert_eq!(container.len(), len);
    }

    #[rstest]
    #[case(&["missing"], &["missing"])]
    #[case(&["A", "missing"], &["A", "missing"])]
    #[case(&["A", "y"], &["A", "y"])]
    #[case(&["A", "B", "x", "deeper"], &["A", "B", "x"])]
    fn unresolvable_path_reports_failing_prefix(
        tree: Children,
        #[case] path: &[&str],
        #[case] failing: &[&str],
    ) {
        let error = resolve(&tree, &names(path)).unwrap_err();
        assert_eq!(
            error,
            TreeError::InvalidPath {
                path: TreePath::from(failing)
            }
        );
    }

    #[rstest]
    fn resolve_node_finds_groups_and_entries(tree: Children) {
        let group = resolve_node(&tree, &names(&["A", "B"])).unwrap();
        assert!(group.is_group());
        let entry = resolve_node(&tree, &names(&["A", "B", "x"])).unwrap();
        assert!(entry.is_entry());
    }

    #[rstest]
    #[case(&[])]
    #[case(&["A", "nope"])]
    #[case(&["nope", "x"])]
    fn resolve_node_rejects_invalid_paths(tree: Children, #[case] path: &[&str]) {
        let result = resolve_node(&tree, &names(path));
        assert!(matches!(result, Err(TreeError::InvalidPath { .. })));
    }

    #[test]
    fn first_sibling_wins_when_names_repeat() {
        let tree: Children = vec![
            Arc::new(Node::entry("dup", EntryData::new())),
            Arc::new(Node::group("dup")),
        ];
        assert!(resolve(&tree, &names(&["dup"])).is_err());
        assert!(resolve_node(&tree, &names(&["dup"])).unwrap().is_entry());
    }

    #[rstest]
    fn resolve_mut_unshares_only_the_walked_path(tree: Children) {
        let original = Arc::new(tree);
        let mut copy = Arc::clone(&original);

        let container = resolve_mut(Arc::make_mut(&mut copy), &names(&["A", "B"])).unwrap();
        container.push(Arc::new(Node::group("new")));

        assert!(!Arc::ptr_eq(&original[0], &copy[0]));
        assert!(Arc::ptr_eq(&original[1], &copy[1]));
        assert_eq!(resolve(&original, &names(&["A", "B"])).unwrap().len(), 1);
        assert_eq!(resolve(&copy, &names(&["A", "B"])).unwrap().len(), 2);

        let original_a = original[0].children().unwrap();
        let copy_a = copy[0].children().unwrap();
        assert!(Arc::ptr_eq(&original_a[1], &copy_a[1]));
    }

    #[rstest]
    fn resolve_target_mut_requires_a_target(mut tree: Children) {
        let result = resolve_target_mut(&mut tree, &TreePath::root());
        assert!(matches!(result, Err(TreeError::InvalidPath { .. })));
    }
}
