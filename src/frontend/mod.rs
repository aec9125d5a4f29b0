//! Tree-sitter frontends that emit [`Production`]s.
//!
//! The grammars are external; each frontend only walks a tree-sitter tree
//! and reports the productions the extractor cares about.
//!
//! # Adding a New Language
//!
//! 1. Create a module here (e.g., `kotlin.rs`)
//! 2. Implement the `Frontend` trait
//! 3. Register the frontend in `get_frontend`

mod java;
mod typescript;

pub use java::JavaFrontend;
pub use typescript::TypeScriptFrontend;

use std::path::Path;

use once_cell::sync::OnceCell;

use crate::extract::{IdentListener, Production};
use crate::model::{CodeFile, Position};

/// A parsed tree-sitter tree with its source.
pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    /// Kept for node text extraction.
    pub source: Vec<u8>,
    pub path: String,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

/// Position of a tree-sitter node (tree-sitter is 0-indexed).
pub fn node_position(node: tree_sitter::Node) -> Position {
    let start = node.start_position();
    let end = node.end_position();
    Position {
        start_line: start.row + 1,
        start_col: start.column + 1,
        end_line: end.row + 1,
        end_col: end.column + 1,
    }
}

/// Language-specific production source.
///
/// # Thread Safety
///
/// tree_sitter::Parser is not Sync, so implementations create a parser per
/// call.
pub trait Frontend: Send + Sync {
    /// Returns the language identifier (e.g., "java", "typescript").
    fn language_id(&self) -> &'static str;

    /// File extensions this frontend handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parse a source file. Partial parse errors still yield a tree.
    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile>;

    /// Walk the tree depth-first, reporting productions in source order.
    fn walk(&self, parsed: &ParsedFile, sink: &mut dyn FnMut(Production)) -> anyhow::Result<()>;

    /// Run the extractor over a parsed file.
    fn extract(&self, parsed: &ParsedFile) -> anyhow::Result<CodeFile> {
        let mut listener = IdentListener::new(parsed.path.clone());
        self.walk(parsed, &mut |production| listener.handle(production))?;
        Ok(listener.finish())
    }

    /// Parse and extract in one step.
    fn extract_source(&self, path: &Path, source: &[u8]) -> anyhow::Result<CodeFile> {
        let parsed = self.parse(path, source)?;
        if parsed.has_errors() {
            tracing::debug!(file = %path.display(), "source contains parse errors");
        }
        self.extract(&parsed)
    }

    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}

static JAVA_FRONTEND: OnceCell<JavaFrontend> = OnceCell::new();

static TYPESCRIPT_FRONTEND: OnceCell<TypeScriptFrontend> = OnceCell::new();

/// Get the frontend for a file extension (without dot).
pub fn get_frontend(ext: &str) -> Option<&'static dyn Frontend> {
    match ext {
        "java" => Some(JAVA_FRONTEND.get_or_init(JavaFrontend::new) as &'static dyn Frontend),
        "ts" | "tsx" | "mts" => {
            Some(TYPESCRIPT_FRONTEND.get_or_init(TypeScriptFrontend::new) as &'static dyn Frontend)
        }
        _ => None,
    }
}

/// Get the frontend responsible for `path`, if any.
pub fn frontend_for_path(path: &Path) -> Option<&'static dyn Frontend> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(get_frontend)
}

/// Read, parse and extract a single file.
pub fn extract_file(path: &Path) -> anyhow::Result<CodeFile> {
    let frontend = frontend_for_path(path)
        .ok_or_else(|| anyhow::anyhow!("no frontend for {}", path.display()))?;
    let source = std::fs::read(path)?;
    frontend.extract_source(path, &source)
}

/// Children of `node` with the given kind.
pub(crate) fn children_of_kind<'a>(
    node: tree_sitter::Node<'a>,
    kind: &str,
) -> Vec<tree_sitter::Node<'a>> {
    let mut cursor = node.walk();
    let children = node
        .children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect();
    children
}

/// First child of `node` with the given kind.
pub(crate) fn child_of_kind<'a>(
    node: tree_sitter::Node<'a>,
    kind: &str,
) -> Option<tree_sitter::Node<'a>> {
    children_of_kind(node, kind).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_frontend() {
        assert_eq!(get_frontend("java").unwrap().language_id(), "java");
        assert_eq!(get_frontend("ts").unwrap().language_id(), "typescript");
        assert!(get_frontend("py").is_none());
    }

    #[test]
    fn test_frontend_for_path() {
        let frontend = frontend_for_path(Path::new("src/app/user.service.ts")).unwrap();
        assert!(frontend.handles_extension("tsx"));
        assert!(frontend_for_path(Path::new("README")).is_none());
    }
}
