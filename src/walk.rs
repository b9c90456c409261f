//! The mutation walk: drives one strategy over every node of a tree and
//! yields its edits one at a time as a pull iterator.
//!
//! `next()` reverts the previously applied edit before applying the next one,
//! and dropping the walk reverts whatever is still applied. The serialized
//! mutant text is captured while the edit is applied and handed out by value,
//! so a consumer can never observe the tree after it has moved on. At most
//! one edit is ever applied to the tree at any instant.

use std::collections::VecDeque;

use crate::parser::SymbolTable;
use crate::strategy::{MutationStrategy, NodeContext};
use crate::tree::{Edit, NodeId, SyntaxTree};
use crate::Language;

/// One mutant's worth of data, serialized while its edit was applied.
#[derive(Debug, Clone)]
pub struct MaterializedView {
    /// Full mutated source text of the file.
    pub text: String,
    /// The node the edit targeted.
    pub node: NodeId,
    /// Sequential index of this edit within the walk.
    pub index: usize,
}

pub struct MutationWalk<'t> {
    tree: &'t mut SyntaxTree,
    pending: VecDeque<Edit>,
    active: Option<Edit>,
    index: usize,
}

impl<'t> MutationWalk<'t> {
    /// Collect the strategy's edits over a preorder visit of the whole tree.
    /// Nothing is applied until the first `next()`.
    pub fn new(
        tree: &'t mut SyntaxTree,
        strategy: &dyn MutationStrategy,
        symbols: &SymbolTable,
        language: Language,
    ) -> Self {
        let mut pending = VecDeque::new();
        for (node, parent) in tree.preorder() {
            let ctx = NodeContext { language, parent };
            pending.extend(strategy.candidates(symbols, &ctx, tree, node));
        }
        MutationWalk {
            tree,
            pending,
            active: None,
            index: 0,
        }
    }

    /// Revert the previous edit, apply the next one, and return the mutated
    /// source. `None` once all edits are spent; the tree is back in its
    /// original state at that point.
    pub fn next(&mut self) -> Option<MaterializedView> {
        self.revert_active();
        let edit = self.pending.pop_front()?;
        edit.apply(self.tree);
        let view = MaterializedView {
            text: self.tree.source(),
            node: edit.target(),
            index: self.index,
        };
        self.index += 1;
        self.active = Some(edit);
        Some(view)
    }

    /// Edits not yet yielded.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn revert_active(&mut self) {
        if let Some(edit) = self.active.take() {
            edit.revert(self.tree);
        }
    }
}

impl Drop for MutationWalk<'_> {
    fn drop(&mut self) {
        self.revert_active();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Edit;

    /// Replaces every leaf whose text is exactly "1" with "2".
    struct OneToTwo;

    impl MutationStrategy for OneToTwo {
        fn candidates(
            &self,
            _symbols: &SymbolTable,
            _ctx: &NodeContext,
            tree: &SyntaxTree,
            node: NodeId,
        ) -> Vec<Edit> {
            if tree.children(node).is_empty() && tree.text(node) == "1" {
                vec![Edit::replace_with_text(tree, node, "2")]
            } else {
                vec![]
            }
        }
    }

    fn number_tree() -> SyntaxTree {
        let mut tree = SyntaxTree::with_root("module");
        let root = tree.root();
        for text in ["1", " + ", "1"] {
            let leaf = tree.push("number", text);
            tree.attach(root, leaf);
        }
        tree
    }

    #[test]
    fn walk_yields_each_edit_and_restores_between() {
        let mut tree = number_tree();
        let symbols = SymbolTable::default();
        let mut walk = MutationWalk::new(&mut tree, &OneToTwo, &symbols, Language::Python);

        let first = walk.next().unwrap();
        assert_eq!(first.text, "2 + 1");
        assert_eq!(first.index, 0);

        let second = walk.next().unwrap();
        assert_eq!(second.text, "1 + 2");
        assert_eq!(second.index, 1);

        assert!(walk.next().is_none());
        drop(walk);
        assert_eq!(tree.source(), "1 + 1");
        assert_eq!(tree.active_edits(), 0);
    }

    #[test]
    fn dropping_mid_walk_reverts_the_active_edit() {
        let mut tree = number_tree();
        let symbols = SymbolTable::default();
        let mut walk = MutationWalk::new(&mut tree, &OneToTwo, &symbols, Language::Python);

        walk.next().unwrap();
        assert_eq!(walk.remaining(), 1);
        drop(walk);

        assert_eq!(tree.source(), "1 + 1");
        assert_eq!(tree.active_edits(), 0);
    }

    #[test]
    fn at_most_one_edit_is_active() {
        let mut tree = number_tree();
        let symbols = SymbolTable::default();
        let mut walk = MutationWalk::new(&mut tree, &OneToTwo, &symbols, Language::Python);

        assert_eq!(walk.tree.active_edits(), 0);
        while walk.next().is_some() {
            assert_eq!(walk.tree.active_edits(), 1);
        }
        assert_eq!(walk.tree.active_edits(), 0);
    }
}
