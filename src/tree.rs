//! Arena-backed syntax tree shared by the mutation pipeline.
//!
//! Nodes live in a flat arena and are addressed by stable indices, so an
//! [`Edit`] can be stored as a (node, old state, new state) triple instead of
//! a pair of closures aliasing the tree. Nodes are never removed from the
//! arena; detaching a subtree only rewrites its parent's child list, which is
//! what makes `revert` after `apply` an exact identity.

/// Stable index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: String,
    /// Token text including its leading trivia. Empty for interior nodes.
    pub text: String,
    pub children: Vec<NodeId>,
}

/// The mutable part of a node, captured before and after an edit.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeState {
    pub text: String,
    pub children: Vec<NodeId>,
}

/// One in-memory source file, exclusively owned by the pipeline for the
/// duration of a mutation run.
#[derive(Debug)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
    active_edits: usize,
}

impl SyntaxTree {
    pub fn with_root(kind: impl Into<String>) -> Self {
        SyntaxTree {
            nodes: vec![Node {
                kind: kind.into(),
                text: String::new(),
                children: Vec::new(),
            }],
            root: NodeId(0),
            active_edits: 0,
        }
    }

    /// Add an unattached node to the arena.
    pub fn push(&mut self, kind: impl Into<String>, text: impl Into<String>) -> NodeId {
        self.nodes.push(Node {
            kind: kind.into(),
            text: text.into(),
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> &str {
        &self.nodes[id.0].kind
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of applied-but-not-reverted edits. The walk keeps this at most
    /// one; tests assert it.
    pub fn active_edits(&self) -> usize {
        self.active_edits
    }

    /// Preorder node ids paired with their parent.
    pub fn preorder(&self) -> Vec<(NodeId, Option<NodeId>)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, None)];
        while let Some((id, parent)) = stack.pop() {
            out.push((id, parent));
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push((child, Some(id)));
            }
        }
        out
    }

    /// Serialize a subtree back to source text.
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        out
    }

    /// Serialize the whole file.
    pub fn source(&self) -> String {
        self.render(self.root)
    }

    fn render_into(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        if node.children.is_empty() {
            out.push_str(&node.text);
        } else {
            for &child in &node.children {
                self.render_into(child, out);
            }
        }
    }

    pub fn snapshot(&self, id: NodeId) -> NodeState {
        let node = &self.nodes[id.0];
        NodeState {
            text: node.text.clone(),
            children: node.children.clone(),
        }
    }

    fn restore(&mut self, id: NodeId, state: &NodeState) {
        let node = &mut self.nodes[id.0];
        node.text = state.text.clone();
        node.children = state.children.clone();
    }
}

/// A reversible change to one node of the shared tree, represented as data
/// rather than closures so it cannot outlive or alias the arena.
#[derive(Debug, Clone)]
pub struct Edit {
    target: NodeId,
    original: NodeState,
    replacement: NodeState,
}

impl Edit {
    /// An edit that replaces the rendered text of `target` with `text`,
    /// detaching its children while applied.
    pub fn replace_with_text(tree: &SyntaxTree, target: NodeId, text: impl Into<String>) -> Self {
        Edit {
            target,
            original: tree.snapshot(target),
            replacement: NodeState {
                text: text.into(),
                children: Vec::new(),
            },
        }
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn apply(&self, tree: &mut SyntaxTree) {
        tree.restore(self.target, &self.replacement);
        tree.active_edits += 1;
        debug_assert!(tree.active_edits <= 1, "more than one edit applied at once");
    }

    pub fn revert(&self, tree: &mut SyntaxTree) {
        tree.restore(self.target, &self.original);
        tree.active_edits -= 1;
    }
}
