//! Tree-sitter front end.
//!
//! Parses a source file into the arena [`SyntaxTree`] the pipeline mutates,
//! plus a small symbol table. Leaf nodes carry their token text together with
//! the trivia preceding it, so rendering the tree reproduces the input
//! byte-for-byte; that property is what the walk's revert law rests on.

use std::path::Path;

use tree_sitter::{Node as TsNode, Parser};

use crate::error::{Error, Result};
use crate::tree::{NodeId, SyntaxTree};
use crate::Language;

/// Symbols visible to mutation strategies. Currently the function names of
/// the file; strategies use it to scope or filter their candidates.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    functions: Vec<String>,
}

impl SymbolTable {
    pub fn functions(&self) -> &[String] {
        &self.functions
    }

    pub fn contains_function(&self, name: &str) -> bool {
        self.functions.iter().any(|f| f == name)
    }
}

/// Parse one source file into a mutation-ready tree and its symbol table.
pub fn parse_source(
    source: &str,
    language: Language,
    path: &Path,
) -> Result<(SyntaxTree, SymbolTable)> {
    let mut parser = Parser::new();
    let grammar: tree_sitter::Language = match language {
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
    };
    parser
        .set_language(&grammar)
        .map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let ts_tree = parser.parse(source, None).ok_or_else(|| Error::Parse {
        path: path.to_path_buf(),
        message: "parser produced no tree".into(),
    })?;
    let ts_root = ts_tree.root_node();
    if ts_root.has_error() {
        return Err(Error::Parse {
            path: path.to_path_buf(),
            message: "source contains syntax errors".into(),
        });
    }

    let mut tree = SyntaxTree::with_root(ts_root.kind());
    let mut cursor = 0usize;
    let root = tree.root();
    for i in 0..ts_root.child_count() {
        if let Some(child) = ts_root.child(i) {
            let converted = convert(child, source, &mut tree, &mut cursor);
            tree.attach(root, converted);
        }
    }
    // Trailing trivia after the last token.
    if cursor < source.len() {
        let trailing = tree.push("trivia", &source[cursor..]);
        tree.attach(root, trailing);
    }

    let mut symbols = SymbolTable::default();
    collect_functions(ts_root, source, language, &mut symbols.functions);

    Ok((tree, symbols))
}

fn convert(ts: TsNode, source: &str, tree: &mut SyntaxTree, cursor: &mut usize) -> NodeId {
    if ts.child_count() == 0 {
        let end = ts.end_byte().max(*cursor);
        let text = &source[*cursor..end];
        *cursor = end;
        return tree.push(ts.kind(), text);
    }
    let id = tree.push(ts.kind(), "");
    for i in 0..ts.child_count() {
        if let Some(child) = ts.child(i) {
            let converted = convert(child, source, tree, cursor);
            tree.attach(id, converted);
        }
    }
    id
}

fn collect_functions(node: TsNode, source: &str, language: Language, names: &mut Vec<String>) {
    let function_kind = match language {
        Language::Python => "function_definition",
        Language::Rust => "function_item",
    };
    if node.kind() == function_kind {
        if let Some(name_node) = node.child_by_field_name("name") {
            if let Ok(name) = name_node.utf8_text(source.as_bytes()) {
                names.push(name.to_string());
            }
        }
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect_functions(child, source, language, names);
        }
    }
}
