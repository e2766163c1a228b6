//! Loading of component sources from a workspace directory.

use crate::error::{Result, ViewtreeError};
use crate::formatter::format_text;
use crate::index::{class_name_to_rel_path, extract_class_refs, WorkspaceIndex};
use std::collections::{HashMap, HashSet, VecDeque};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use viewtree_ast::SourceFile;

pub type LoaderError = Box<dyn Error + Send + Sync>;

/// Source of parsed component files, by component class name.
pub trait SourceLoader {
    fn load(&mut self, class_name: &str) -> std::result::Result<SourceFile, LoaderError>;
}

struct ClassPathResolver {
    root: PathBuf,
}

impl ClassPathResolver {
    fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root
            .as_ref()
            .canonicalize()
            .map_err(|e| ViewtreeError::load(format!("Invalid workspace root: {e}")))?;
        Ok(Self { root })
    }

    fn resolve_class_path(&self, class_name: &str) -> PathBuf {
        let mut path = self.root.clone();
        path.push(class_name_to_rel_path(class_name));
        path
    }

    fn ensure_within_root(&self, path: &Path) -> Result<()> {
        let candidate = self.canonicalize_candidate(path)?;
        if candidate == self.root || candidate.starts_with(&self.root) {
            return Ok(());
        }

        Err(ViewtreeError::load(format!(
            "Path traversal detected: {}",
            path.display()
        )))
    }

    fn canonicalize_candidate(&self, path: &Path) -> Result<PathBuf> {
        if path.exists() {
            return path
                .canonicalize()
                .map_err(|e| ViewtreeError::load(format!("Failed to resolve path: {e}")));
        }

        let (existing_parent, missing_segments) = split_existing_parent(path);
        let mut resolved = existing_parent
            .canonicalize()
            .map_err(|e| ViewtreeError::load(format!("Failed to resolve path: {e}")))?;
        for segment in missing_segments {
            resolved.push(segment);
        }
        Ok(resolved)
    }
}

fn split_existing_parent(path: &Path) -> (PathBuf, Vec<String>) {
    let mut cursor = path.to_path_buf();
    let mut missing_segments = Vec::new();

    while !cursor.exists() {
        let Some(name) = cursor.file_name().and_then(|s| s.to_str()) else {
            break;
        };
        missing_segments.push(name.to_string());

        let Some(parent) = cursor.parent() else {
            break;
        };

        if parent == cursor {
            break;
        }
        cursor = parent.to_path_buf();
    }

    missing_segments.reverse();
    (cursor, missing_segments)
}

/// Loads and caches parsed `*.view.tree` files under a workspace root.
pub struct WorkspaceLoader {
    path_resolver: ClassPathResolver,
    cache: HashMap<String, SourceFile>,
}

impl WorkspaceLoader {
    /// Create a loader rooted at the given workspace directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            path_resolver: ClassPathResolver::new(root)?,
            cache: HashMap::new(),
        })
    }

    /// Load a component file by class name, e.g. `$mol_image`.
    pub fn load(&mut self, class_name: &str) -> Result<SourceFile> {
        validate_class_name(class_name)?;

        if let Some(file) = self.cache.get(class_name) {
            return Ok(file.clone());
        }

        let file = self.load_and_parse(class_name)?;
        self.cache.insert(class_name.to_string(), file.clone());
        Ok(file)
    }

    /// Relative path of a class within the workspace, for indexing keys.
    pub fn rel_path(&self, class_name: &str) -> PathBuf {
        class_name_to_rel_path(class_name)
    }

    /// The canonicalized workspace root.
    pub fn root(&self) -> &Path {
        &self.path_resolver.root
    }

    fn load_and_parse(&self, class_name: &str) -> Result<SourceFile> {
        let path = self.path_resolver.resolve_class_path(class_name);
        self.path_resolver.ensure_within_root(&path)?;

        if !path.is_file() {
            return Err(ViewtreeError::load(format!(
                "Component file not found: {} ({})",
                class_name,
                path.display()
            )));
        }

        let source = fs::read_to_string(&path)?;
        viewtree_ast::parse(&source).map_err(|e| {
            ViewtreeError::load(format!("Failed to parse component '{class_name}': {e}"))
        })
    }
}

impl SourceLoader for WorkspaceLoader {
    fn load(&mut self, class_name: &str) -> std::result::Result<SourceFile, LoaderError> {
        WorkspaceLoader::load(self, class_name).map_err(|e| Box::new(e) as LoaderError)
    }
}

/// Validate a component class name at runtime.
fn validate_class_name(name: &str) -> Result<()> {
    let Some(plain) = name.strip_prefix('$') else {
        return Err(ViewtreeError::load(format!(
            "Class name must start with '$': {name}"
        )));
    };

    let mut chars = plain.chars();
    let valid_head = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_head || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ViewtreeError::load(format!("Invalid class name: {name}")));
    }

    Ok(())
}

/// Breadth-first load of the entry components and everything they refer to,
/// indexing each loaded file. Missing or unparseable dependencies are skipped
/// so one broken reference does not poison the rest of the graph. Returns
/// the class names actually loaded.
pub fn load_dependencies(
    loader: &mut dyn SourceLoader,
    index: &mut WorkspaceIndex,
    entries: &[&str],
    max_depth: usize,
) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut loaded = Vec::new();
    let mut queue: VecDeque<(String, usize)> = entries
        .iter()
        .map(|name| (name.to_string(), 0usize))
        .collect();

    while let Some((name, depth)) = queue.pop_front() {
        if !visited.insert(name.clone()) {
            continue;
        }

        let Ok(file) = loader.load(&name) else {
            continue;
        };

        index.update_document(name.clone(), &file);
        loaded.push(name);

        if depth >= max_depth {
            continue;
        }
        for dep in extract_class_refs(&file) {
            if !visited.contains(&dep) {
                queue.push_back((dep, depth + 1));
            }
        }
    }

    loaded
}

/// Directories never descended into during a workspace scan.
const SCAN_IGNORE: &[&str] = &["node_modules", ".git", "out", "dist", "build", "target"];

/// Recursively index every `*.view.tree` file under `root`, reachable from
/// an entry component or not. Well-known build and VCS directories are
/// skipped. A file that fails to parse is retried once through the
/// formatter, then skipped. Returns the indexed document keys (paths
/// relative to the root).
pub fn scan_workspace(root: &Path, index: &mut WorkspaceIndex) -> Result<Vec<String>> {
    let root = root
        .canonicalize()
        .map_err(|e| ViewtreeError::load(format!("Invalid workspace root: {e}")))?;
    let mut keys = Vec::new();
    scan_dir(&root, &root, index, &mut keys)?;
    keys.sort();
    Ok(keys)
}

fn scan_dir(
    root: &Path,
    dir: &Path,
    index: &mut WorkspaceIndex,
    keys: &mut Vec<String>,
) -> Result<()> {
    // An unreadable directory drops out of the scan instead of failing it.
    let Ok(entries) = fs::read_dir(dir) else {
        return Ok(());
    };
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };

        if path.is_dir() {
            if !SCAN_IGNORE.contains(&name) {
                scan_dir(root, &path, index, keys)?;
            }
        } else if name.ends_with(".view.tree") {
            let Ok(source) = fs::read_to_string(&path) else {
                continue;
            };
            let Some(file) = parse_or_sanitize(&source) else {
                continue;
            };
            let key = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            index.update_document(key.clone(), &file);
            keys.push(key);
        }
    }
    Ok(())
}

/// Parse a scanned file, falling back to its formatted form once.
fn parse_or_sanitize(source: &str) -> Option<SourceFile> {
    if let Ok(file) = viewtree_ast::parse(source) {
        return Some(file);
    }
    viewtree_ast::parse(&format_text(source)).ok()
}
