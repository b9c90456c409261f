pub mod config;
pub mod copy_tree;
pub mod error;
pub mod materialize;
pub mod output;
pub mod parser;
pub mod run;
pub mod runner;
pub mod stats;
pub mod strategy;
pub mod tree;
pub mod walk;

pub use error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Rust,
}

pub fn detect_language(path: &std::path::Path) -> Option<Language> {
    match path.extension()?.to_str()? {
        "py" => Some(Language::Python),
        "rs" => Some(Language::Rust),
        _ => None,
    }
}
