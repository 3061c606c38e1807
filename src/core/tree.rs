// --- File: src/core/tree.rs
use crate::core::types::{NodeId, SyntaxNode};

/// Arena slot of a canonical tree. The slot index is the node id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub token: String,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl TreeNode {
    fn new(token: String, parent: Option<NodeId>) -> Self {
        Self { token, children: Vec::new(), parent }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A uniform, arena-allocated copy of a syntax tree.
/// Ids follow pre-order construction order and the root is always id 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalTree {
    nodes: Vec<TreeNode>,
}

impl CanonicalTree {
    /// A tree holding only the root container, with an empty label until a
    /// syntax tree is attached.
    pub fn new() -> Self {
        Self { nodes: vec![TreeNode::new(String::new(), None)] }
    }

    /// Copies `syntax` into the tree. The syntax root fills the root container;
    /// every other node is appended with the next id under its parent.
    pub fn attach(&mut self, syntax: &SyntaxNode) {
        self.nodes.truncate(1);
        self.nodes[0].children.clear();

        // Children are pushed in reverse so they pop in source order, which
        // keeps id assignment in pre-order without recursion.
        let mut stack: Vec<(&SyntaxNode, Option<NodeId>)> = vec![(syntax, None)];
        while let Some((node, parent)) = stack.pop() {
            let id = match parent {
                None => {
                    self.nodes[0].token = node.label().to_string();
                    0
                }
                Some(parent_id) => {
                    let new_id = self.nodes.len();
                    self.nodes.push(TreeNode::new(node.label().to_string(), Some(parent_id)));
                    self.nodes[parent_id].children.push(new_id);
                    new_id
                }
            };

            for child in node.children().iter().rev() {
                stack.push((child, Some(id)));
            }
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

}

impl Default for CanonicalTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the canonical tree of one syntax tree.
pub fn build_tree(root: &SyntaxNode) -> CanonicalTree {
    let mut tree = CanonicalTree::new();
    tree.attach(root);
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SyntaxNode {
        // MethodDeclaration
        // ├── Modifier { public, static }
        // ├── "main"
        // └── ReturnStatement
        SyntaxNode::typed(
            "MethodDeclaration",
            vec![
                SyntaxNode::ModifierGroup(vec![SyntaxNode::literal("public"), SyntaxNode::literal("static")]),
                SyntaxNode::literal("main"),
                SyntaxNode::typed("ReturnStatement", vec![]),
            ],
        )
    }

    #[test]
    fn assigns_preorder_ids() {
        let tree = build_tree(&sample());
        let labels: Vec<&str> = (0..tree.len()).map(|id| tree.node(id).token.as_str()).collect();
        assert_eq!(labels, ["MethodDeclaration", "Modifier", "public", "static", "main", "ReturnStatement"]);
        assert_eq!(tree.node(0).children, vec![1, 4, 5]);
        assert_eq!(tree.node(1).children, vec![2, 3]);
    }

    #[test]
    fn every_non_root_node_has_one_parent() {
        let tree = build_tree(&sample());
        assert_eq!(tree.node(tree.root()).parent, None);
        for id in 1..tree.len() {
            let parent = tree.node(id).parent.unwrap();
            assert!(parent < id);
            assert_eq!(tree.node(parent).children.iter().filter(|&&c| c == id).count(), 1);
        }
    }

    /// Labels from the root down to `id`, inclusive.
    fn path_to(tree: &CanonicalTree, id: NodeId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(idx) = current {
            path.push(tree.node(idx).token.as_str());
            current = tree.node(idx).parent;
        }
        path.reverse();
        path
    }

    #[test]
    fn parent_links_lead_back_to_the_root() {
        let tree = build_tree(&sample());
        assert_eq!(path_to(&tree, 3), ["MethodDeclaration", "Modifier", "static"]);
    }

    #[test]
    fn single_node_tree_is_just_the_root() {
        let tree = build_tree(&SyntaxNode::literal("x"));
        assert_eq!(tree.len(), 1);
        assert!(tree.node(0).is_leaf());
        assert_eq!(tree.node(0).token, "x");
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let mut node = SyntaxNode::literal("leaf");
        for _ in 0..100_000 {
            node = SyntaxNode::typed("BinaryOperation", vec![node]);
        }
        let tree = build_tree(&node);
        assert_eq!(tree.len(), 100_001);
        // Dropping a 100k-deep SyntaxNode recurses; keep it alive past the test body.
        std::mem::forget(node);
    }
}
