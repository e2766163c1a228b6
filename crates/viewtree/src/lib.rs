//! Viewtree - parsing and editor tooling for the view.tree component language
//!
//! view.tree is a declarative component description format with:
//! - Tab-indented tree structure, one node per line
//! - `$component $base` definitions with property overrides
//! - One-way and two-way binding operators (`<=`, `=>`, `<=>`)
//! - Raw strings, lists, dictionaries and localized strings
//!
//! # Example
//!
//! ```rust
//! let file = viewtree::parse("$my_app $mol_view\n\ttitle \\Hello\n").unwrap();
//! let component = file.components().next().unwrap();
//!
//! assert_eq!(component.name, "$my_app");
//! assert_eq!(component.base, "$mol_view");
//! ```

// Public modules
pub mod diagnostics;
pub mod error;
pub mod formatter;
pub mod index;
pub mod loader;

pub use diagnostics::{check, Diagnostic, Severity};
pub use error::{GrammarError, Location, ParseError, Result, ViewtreeError};
pub use formatter::format_text;
pub use index::{DocumentIndex, Spot, WorkspaceIndex};
pub use loader::{load_dependencies, scan_workspace, LoaderError, SourceLoader, WorkspaceLoader};
pub use viewtree_ast::{
    BindOp, BodyNode, CommentLine, Component, ListType, NumberLiteral, PathElement,
    PathElementKind, PropertyIdent, PropertyNode, RawLine, SourceFile, SourceItem, SpecialNumber,
};

use std::path::Path;

/// Parse a view.tree source string.
pub fn parse(source: &str) -> Result<SourceFile> {
    Ok(viewtree_ast::parse(source)?)
}

/// A workspace of component files under one root directory, with an index
/// kept in sync as components load.
pub struct Workspace {
    loader: WorkspaceLoader,
    index: WorkspaceIndex,
}

impl Workspace {
    /// Open a workspace rooted at a directory of `*.view.tree` files.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            loader: WorkspaceLoader::new(root)?,
            index: WorkspaceIndex::new(),
        })
    }

    /// Load and index a single component by class name.
    pub fn load_component(&mut self, class_name: &str) -> Result<SourceFile> {
        let file = self.loader.load(class_name)?;
        self.index.update_document(class_name, &file);
        Ok(file)
    }

    /// Load a component together with everything it refers to, transitively.
    /// Missing dependencies are skipped. Returns the class names loaded.
    pub fn load_with_dependencies(&mut self, class_name: &str) -> Vec<String> {
        loader::load_dependencies(&mut self.loader, &mut self.index, &[class_name], 64)
    }

    /// Index every `*.view.tree` file under the root, reachable from an
    /// entry component or not. Returns the indexed document keys.
    pub fn scan(&mut self) -> Result<Vec<String>> {
        loader::scan_workspace(self.loader.root(), &mut self.index)
    }

    /// The index over all components loaded so far.
    pub fn index(&self) -> &WorkspaceIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reuse() {
        let file = parse("$my_app $mol_view\n\ttitle \\One\n\tcount 2\n").unwrap();
        let component = file.components().next().unwrap();
        assert_eq!(component.body.len(), 2);
    }

    #[test]
    fn test_parse_error_surfaces() {
        let err = parse("$my_app\n").unwrap_err();
        assert!(matches!(err, ViewtreeError::Parse(_)));
    }
}
