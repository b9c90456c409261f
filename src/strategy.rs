//! Mutation strategies and their registry.
//!
//! A strategy is a pure rule: given one node (plus the file's symbol table
//! and a little context) it produces zero or more reversible [`Edit`]s. It
//! must not retain references across calls and must have no effect on the
//! tree until an edit is applied by the walk.

use std::collections::BTreeMap;

use crate::parser::SymbolTable;
use crate::tree::{Edit, NodeId, SyntaxTree};
use crate::Language;

/// Context handed to a strategy alongside the node under inspection.
#[derive(Debug, Clone, Copy)]
pub struct NodeContext {
    pub language: Language,
    pub parent: Option<NodeId>,
}

pub trait MutationStrategy {
    fn candidates(
        &self,
        symbols: &SymbolTable,
        ctx: &NodeContext,
        tree: &SyntaxTree,
        node: NodeId,
    ) -> Vec<Edit>;
}

/// Explicit strategy registry, passed through the pipeline instead of living
/// in process-wide state. Names use the `<group>/<rule>` convention.
pub struct StrategyRegistry {
    entries: BTreeMap<String, Box<dyn MutationStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        StrategyRegistry {
            entries: BTreeMap::new(),
        }
    }

    /// Registry preloaded with the built-in strategies.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("branch/if", Box::new(BranchIf));
        registry.register("branch/else", Box::new(BranchElse));
        registry.register("statement/remove", Box::new(StatementRemove));
        registry
    }

    pub fn register(&mut self, name: &str, strategy: Box<dyn MutationStrategy>) {
        self.entries.insert(name.to_string(), strategy);
    }

    pub fn get(&self, name: &str) -> Option<&dyn MutationStrategy> {
        self.entries.get(name).map(|s| s.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(|k| k.as_str()).collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Leading whitespace of a rendered subtree, so a replacement keeps the
/// original indentation and line breaks.
fn leading_trivia(rendered: &str) -> &str {
    let trimmed = rendered.trim_start();
    &rendered[..rendered.len() - trimmed.len()]
}

fn empty_block(rendered: &str, language: Language) -> String {
    let lead = leading_trivia(rendered);
    match language {
        Language::Python => format!("{lead}pass"),
        Language::Rust => format!("{lead}{{}}"),
    }
}

/// Gut the body of an `if`: the condition still evaluates but the branch
/// does nothing.
pub struct BranchIf;

impl MutationStrategy for BranchIf {
    fn candidates(
        &self,
        _symbols: &SymbolTable,
        ctx: &NodeContext,
        tree: &SyntaxTree,
        node: NodeId,
    ) -> Vec<Edit> {
        let if_kind = match ctx.language {
            Language::Python => "if_statement",
            Language::Rust => "if_expression",
        };
        if tree.kind(node) != if_kind {
            return vec![];
        }
        // The first block child is the consequence; else/elif clauses carry
        // their own blocks and are not touched here.
        let Some(&block) = tree
            .children(node)
            .iter()
            .find(|&&c| tree.kind(c) == "block")
        else {
            return vec![];
        };
        let replacement = empty_block(&tree.render(block), ctx.language);
        vec![Edit::replace_with_text(tree, block, replacement)]
    }
}

/// Drop an `else` clause entirely.
pub struct BranchElse;

impl MutationStrategy for BranchElse {
    fn candidates(
        &self,
        _symbols: &SymbolTable,
        _ctx: &NodeContext,
        tree: &SyntaxTree,
        node: NodeId,
    ) -> Vec<Edit> {
        if tree.kind(node) != "else_clause" {
            return vec![];
        }
        vec![Edit::replace_with_text(tree, node, "")]
    }
}

/// Remove a single expression statement.
pub struct StatementRemove;

impl MutationStrategy for StatementRemove {
    fn candidates(
        &self,
        _symbols: &SymbolTable,
        ctx: &NodeContext,
        tree: &SyntaxTree,
        node: NodeId,
    ) -> Vec<Edit> {
        if tree.kind(node) != "expression_statement" {
            return vec![];
        }
        let rendered = tree.render(node);
        let replacement = match ctx.language {
            // Python blocks cannot be empty, so the statement becomes `pass`.
            Language::Python => format!("{}pass", leading_trivia(&rendered)),
            Language::Rust => String::new(),
        };
        vec![Edit::replace_with_text(tree, node, replacement)]
    }
}
