// File: src/core/triads.rs
use crate::core::tree::CanonicalTree;
use crate::core::types::{NodeId, Triad, TypeDictionary, NULL_LABEL, RETURN_STATEMENT};

/// How a leaf label was resolved against the type dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafResolution<'a> {
    /// The label is a known literal; it becomes its lexical category.
    Category(&'a str),
    /// An unknown `ReturnStatement` keeps its own label.
    Kept(&'a str),
    /// Unknown label, defaulted to `"Null"`.
    Unresolved,
}

impl<'a> LeafResolution<'a> {
    pub fn label(self) -> &'a str {
        match self {
            LeafResolution::Category(label) | LeafResolution::Kept(label) => label,
            LeafResolution::Unresolved => NULL_LABEL,
        }
    }
}

pub fn resolve_leaf<'a>(label: &'a str, dictionary: &'a TypeDictionary) -> LeafResolution<'a> {
    match dictionary.get(label) {
        Some(category) => LeafResolution::Category(category),
        None if label == RETURN_STATEMENT => LeafResolution::Kept(label),
        None => LeafResolution::Unresolved,
    }
}

/// Everything a full walk produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriadWalk {
    /// Root-to-leaf label paths, leaves already resolved.
    pub paths: Vec<Vec<String>>,
    pub triads: Vec<Triad>,
    pub null_leaves: usize,
}

enum Step {
    Enter(NodeId),
    Leave,
}

/// Depth-first pre-order walk over `tree`.
///
/// Every node at depth three or more appends one triad (grandparent, parent,
/// self) to `triads`. Leaf labels are resolved on the fly and carried on the
/// path; the tree itself is left untouched. `on_leaf` sees the full path of
/// each leaf. Returns the number of leaves that defaulted to `"Null"`.
pub fn walk_triads<F>(
    tree: &CanonicalTree,
    dictionary: &TypeDictionary,
    triads: &mut Vec<Triad>,
    mut on_leaf: F,
) -> usize
where
    F: FnMut(&[String]),
{
    let mut null_leaves = 0;
    let mut path: Vec<String> = Vec::new();
    let mut stack = vec![Step::Enter(tree.root())];

    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Enter(id) => id,
            Step::Leave => {
                path.pop();
                continue;
            }
        };

        let node = tree.node(id);
        let label = if node.is_leaf() {
            let resolution = resolve_leaf(&node.token, dictionary);
            if resolution == LeafResolution::Unresolved {
                null_leaves += 1;
                tracing::trace!(leaf = %node.token, id, "unresolved leaf defaulted to Null");
            }
            resolution.label()
        } else {
            node.token.as_str()
        };
        path.push(label.to_string());

        if let [.., grandparent, parent, current] = path.as_slice() {
            triads.push(Triad::new(grandparent.clone(), parent.clone(), current.clone()));
        }

        if node.is_leaf() {
            on_leaf(&path);
            path.pop();
        } else {
            stack.push(Step::Leave);
            stack.extend(node.children.iter().rev().map(|&child| Step::Enter(child)));
        }
    }

    null_leaves
}

/// Walks the tree and keeps both the leaf paths and the triads.
pub fn extract_triads(tree: &CanonicalTree, dictionary: &TypeDictionary) -> TriadWalk {
    let mut walk = TriadWalk::default();
    let mut paths = Vec::new();
    walk.null_leaves = walk_triads(tree, dictionary, &mut walk.triads, |path| paths.push(path.to_vec()));
    walk.paths = paths;
    walk
}
