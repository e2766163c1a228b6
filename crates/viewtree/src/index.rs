//! Workspace component index.
//!
//! Records where components are defined, which properties each one declares
//! and where names occur, per document and across the workspace. Name
//! resolution follows the $mol convention: `$mol_image` lives in
//! `mol/image/image.view.tree`.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

use viewtree_ast::{BodyNode, Component, Location, PathElementKind, SourceFile};

/// A 0-based position of a name in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spot {
    pub line: usize,
    pub col: usize,
    pub length: usize,
}

impl Spot {
    fn at(location: Location, length: usize) -> Self {
        Self {
            line: location.line.saturating_sub(1),
            col: location.column.saturating_sub(1),
            length,
        }
    }
}

/// Whether a name looks like a component class: an underscore with something
/// on both sides, after the optional `$` sigil.
pub fn class_like(name: &str) -> bool {
    let plain = name.strip_prefix('$').unwrap_or(name);
    match plain.find('_') {
        Some(i) => i > 0 && i + 1 < plain.len(),
        None => false,
    }
}

/// Relative path of a component's source file:
/// `$mol_image` -> `mol/image/image.view.tree`.
pub fn class_name_to_rel_path(name: &str) -> PathBuf {
    let plain = name.strip_prefix('$').unwrap_or(name);
    let parts: Vec<&str> = plain.split('_').collect();
    let last = parts.last().copied().unwrap_or(plain);
    let mut path = PathBuf::new();
    for part in &parts {
        path.push(part);
    }
    path.push(format!("{last}.view.tree"));
    path
}

/// All class-like component names a file refers to (bases and references,
/// not the definitions themselves).
pub fn extract_class_refs(file: &SourceFile) -> HashSet<String> {
    let mut refs = HashSet::new();
    for component in file.components() {
        if class_like(&component.base) {
            refs.insert(component.base.clone());
        }
        collect_refs(&component.body, &mut refs);
    }
    refs
}

fn collect_refs(body: &[BodyNode], refs: &mut HashSet<String>) {
    for node in body {
        let Some(node) = node.as_node() else { continue };
        for element in &node.path {
            let name = match &element.kind {
                PathElementKind::Component(name) => Some(name),
                PathElementKind::TypedList(viewtree_ast::ListType::Component(name)) => Some(name),
                _ => None,
            };
            if let Some(name) = name {
                if class_like(name) {
                    refs.insert(name.clone());
                }
            }
        }
        collect_refs(&node.children, refs);
    }
}

/// Info about one component definition within a document.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    pub properties: BTreeSet<String>,
    pub spot: Spot,
}

/// Index of a single parsed document.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    class_defs: HashMap<String, Spot>,
    prop_defs: HashMap<String, Vec<Spot>>,
    occurrences: HashMap<String, Vec<Spot>>,
    components: HashMap<String, ComponentInfo>,
}

impl DocumentIndex {
    pub fn build(file: &SourceFile) -> Self {
        let mut index = Self::default();
        for component in file.components() {
            index.index_component(component);
        }
        index
    }

    fn index_component(&mut self, component: &Component) {
        let spot = Spot::at(component.location, component.name.len());
        self.class_defs.insert(component.name.clone(), spot);
        self.add_occurrence(&component.name, spot);
        self.components.insert(
            component.name.clone(),
            ComponentInfo {
                properties: BTreeSet::new(),
                spot,
            },
        );

        // Base occupies the column right after the name and a space.
        let base_location = Location::new(
            component.location.line,
            component.location.column + component.name.len() + 1,
            component.location.byte_offset + component.name.len() + 1,
        );
        self.add_occurrence(&component.base, Spot::at(base_location, component.base.len()));

        self.index_body(&component.name.clone(), &component.body);
    }

    fn index_body(&mut self, class_name: &str, body: &[BodyNode]) {
        for node in body {
            let Some(node) = node.as_node() else { continue };
            for element in &node.path {
                match &element.kind {
                    PathElementKind::Property(ident) => {
                        let spot = Spot::at(element.location, ident.name.len());
                        self.prop_defs
                            .entry(ident.name.clone())
                            .or_default()
                            .push(spot);
                        self.add_occurrence(&ident.name, spot);
                        if let Some(info) = self.components.get_mut(class_name) {
                            info.properties.insert(ident.name.clone());
                        }
                    }
                    PathElementKind::Component(name) => {
                        let spot = Spot::at(element.location, name.len());
                        self.add_occurrence(name, spot);
                    }
                    _ => {}
                }
            }
            self.index_body(class_name, &node.children);
        }
    }

    fn add_occurrence(&mut self, name: &str, spot: Spot) {
        self.occurrences
            .entry(name.to_string())
            .or_default()
            .push(spot);
    }

    pub fn class_def(&self, name: &str) -> Option<Spot> {
        self.class_defs.get(name).copied()
    }

    pub fn class_defs(&self) -> impl Iterator<Item = (&str, Spot)> {
        self.class_defs.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn prop_defs(&self, name: &str) -> &[Spot] {
        self.prop_defs.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn occurrences(&self, name: &str) -> &[Spot] {
        self.occurrences
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn component(&self, name: &str) -> Option<&ComponentInfo> {
        self.components.get(name)
    }
}

/// Index over all loaded documents, keyed by document path or name.
#[derive(Debug, Default)]
pub struct WorkspaceIndex {
    docs: HashMap<String, DocumentIndex>,
}

impl WorkspaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_document(&mut self, key: impl Into<String>, file: &SourceFile) {
        self.docs.insert(key.into(), DocumentIndex::build(file));
    }

    pub fn remove_document(&mut self, key: &str) {
        self.docs.remove(key);
    }

    pub fn document(&self, key: &str) -> Option<&DocumentIndex> {
        self.docs.get(key)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Find the document defining a component.
    pub fn find_class_def(&self, name: &str) -> Option<(&str, Spot)> {
        self.docs
            .iter()
            .find_map(|(key, doc)| doc.class_def(name).map(|spot| (key.as_str(), spot)))
    }

    /// Union of the property names a component declares across documents.
    pub fn properties_of(&self, name: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for doc in self.docs.values() {
            if let Some(info) = doc.component(name) {
                out.extend(info.properties.iter().cloned());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_like() {
        assert!(class_like("$mol_image"));
        assert!(class_like("bog_card"));
        assert!(!class_like("$single"));
        assert!(!class_like("title"));
        assert!(!class_like("_leading"));
    }

    #[test]
    fn test_class_name_to_rel_path() {
        assert_eq!(
            class_name_to_rel_path("$mol_image"),
            PathBuf::from("mol/image/image.view.tree")
        );
        assert_eq!(
            class_name_to_rel_path("$bog_game_card"),
            PathBuf::from("bog/game/card/card.view.tree")
        );
    }

    #[test]
    fn test_extract_class_refs() {
        let file = viewtree_ast::parse(
            "$my_app $mol_book2\n\tsub /\n\t\t<= Card $my_card\n\titems /$mol_view\n",
        )
        .unwrap();
        let refs = extract_class_refs(&file);
        assert!(refs.contains("$mol_book2"));
        assert!(refs.contains("$my_card"));
        assert!(refs.contains("$mol_view"));
        assert!(!refs.contains("$my_app"), "definition itself is not a ref");
    }

    #[test]
    fn test_document_index() {
        let file = viewtree_ast::parse(
            "$my_app $mol_view\n\ttitle \\Hi\n\tsub /\n\t\t<= Body $mol_page\n",
        )
        .unwrap();
        let index = DocumentIndex::build(&file);

        let def = index.class_def("$my_app").unwrap();
        assert_eq!(def.line, 0);
        assert_eq!(def.col, 0);
        assert_eq!(def.length, "$my_app".len());

        let info = index.component("$my_app").unwrap();
        assert!(info.properties.contains("title"));
        assert!(info.properties.contains("sub"));

        assert!(!index.occurrences("$mol_page").is_empty());
        assert!(!index.prop_defs("title").is_empty());
    }

    #[test]
    fn test_mutable_property_indexed_by_name() {
        let file =
            viewtree_ast::parse("$my_app $mol_view\n\tclick? <=> selected? null\n").unwrap();
        let index = DocumentIndex::build(&file);
        let info = index.component("$my_app").unwrap();
        assert!(info.properties.contains("click"));
        assert!(info.properties.contains("selected"));
    }

    #[test]
    fn test_workspace_index_lookup() {
        let card = viewtree_ast::parse("$my_card $mol_view\n\ttitle \\Card\n").unwrap();
        let app = viewtree_ast::parse("$my_app $mol_view\n\tsub /\n\t\t<= Card $my_card\n").unwrap();

        let mut index = WorkspaceIndex::new();
        index.update_document("my/card/card.view.tree", &card);
        index.update_document("my/app/app.view.tree", &app);

        let (doc, spot) = index.find_class_def("$my_card").unwrap();
        assert_eq!(doc, "my/card/card.view.tree");
        assert_eq!(spot.line, 0);

        assert!(index.properties_of("$my_card").contains("title"));

        index.remove_document("my/card/card.view.tree");
        assert!(index.find_class_def("$my_card").is_none());
    }
}
