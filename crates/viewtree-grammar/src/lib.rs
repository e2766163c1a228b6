//! Grammar definition and language handle for the view.tree language.
//!
//! The grammar is shipped as a JSON artifact compiled into the binary. At
//! runtime [`language`] deserializes it into an immutable [`Grammar`] handle
//! that the lexer and parser consult for operator literals, typed-list type
//! names and node kinds.

use serde::Deserialize;
use thiserror::Error;

/// Artifact format version this runtime understands.
pub const ABI_VERSION: u32 = 1;

/// The grammar artifact embedded at compile time.
const GRAMMAR_JSON: &str = include_str!("grammar.json");

/// Returns the JSON text of the embedded grammar artifact.
pub fn grammar_json() -> &'static str {
    GRAMMAR_JSON
}

/// Returns the [`Grammar`] handle for view.tree sources.
///
/// Loading is pure and deterministic: the embedded artifact either yields a
/// handle or a [`GrammarError`], never a partially constructed grammar.
pub fn language() -> Result<Grammar, GrammarError> {
    Grammar::from_json(GRAMMAR_JSON)
}

/// Errors raised while constructing a [`Grammar`] handle.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("malformed grammar artifact: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("grammar artifact is incomplete: missing {0}")]
    Incomplete(&'static str),

    #[error("grammar abi version {found} is not supported (expected {expected})")]
    AbiMismatch { found: u32, expected: u32 },
}

/// A node kind declared by the grammar.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NodeType {
    pub kind: String,
    pub named: bool,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// An immutable, loaded grammar definition.
///
/// Owned by whoever loaded it; all accessors borrow. There is no mutation
/// after construction.
#[derive(Debug, Clone, Deserialize)]
pub struct Grammar {
    name: String,
    abi_version: u32,
    externals: Vec<String>,
    extras: Vec<String>,
    operators: std::collections::BTreeMap<String, String>,
    type_names: Vec<String>,
    node_types: Vec<NodeType>,
}

impl Grammar {
    /// Construct a grammar handle from an artifact supplied by the caller.
    ///
    /// [`language`] applies the embedded artifact; tests substitute broken
    /// ones through this constructor.
    pub fn from_json(artifact: &str) -> Result<Self, GrammarError> {
        let grammar: Grammar = serde_json::from_str(artifact)?;
        grammar.validate()?;
        Ok(grammar)
    }

    fn validate(&self) -> Result<(), GrammarError> {
        if self.abi_version != ABI_VERSION {
            return Err(GrammarError::AbiMismatch {
                found: self.abi_version,
                expected: ABI_VERSION,
            });
        }
        if self.name.is_empty() {
            return Err(GrammarError::Incomplete("grammar name"));
        }
        if self.operators.is_empty() {
            return Err(GrammarError::Incomplete("operator table"));
        }
        for required in ["source_file", "component", "node"] {
            if !self.has_node_kind(required) {
                return Err(GrammarError::Incomplete("core node kinds"));
            }
        }
        for external in ["newline", "indent", "dedent"] {
            if !self.externals.iter().any(|e| e == external) {
                return Err(GrammarError::Incomplete("external scanner tokens"));
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abi_version(&self) -> u32 {
        self.abi_version
    }

    pub fn externals(&self) -> &[String] {
        &self.externals
    }

    pub fn extras(&self) -> &[String] {
        &self.extras
    }

    pub fn node_types(&self) -> &[NodeType] {
        &self.node_types
    }

    pub fn has_node_kind(&self, kind: &str) -> bool {
        self.node_types.iter().any(|n| n.kind == kind)
    }

    /// Literal for a named operator rule, e.g. `arrow_both` -> `<=>`.
    pub fn operator(&self, rule: &str) -> Option<&str> {
        self.operators.get(rule).map(String::as_str)
    }

    /// Operator literals sorted longest first, for maximal-munch lexing.
    pub fn operators_by_length(&self) -> Vec<(&str, &str)> {
        let mut ops: Vec<(&str, &str)> = self
            .operators
            .iter()
            .map(|(rule, literal)| (rule.as_str(), literal.as_str()))
            .collect();
        ops.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.1.cmp(b.1)));
        ops
    }

    /// Whether `word` names a typed-list primitive type (string/number/boolean).
    pub fn is_type_name(&self, word: &str) -> bool {
        self.type_names.iter().any(|t| t == word)
    }

    pub fn type_names(&self) -> &[String] {
        &self.type_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_loads() {
        let grammar = language().expect("Error loading Viewtree grammar");
        assert_eq!(grammar.name(), "viewtree");
        assert!(grammar.has_node_kind("source_file"));
        assert!(grammar.has_node_kind("component"));
    }

    #[test]
    fn loading_is_deterministic() {
        let first = language().unwrap();
        let second = language().unwrap();
        assert_eq!(first.name(), second.name());
        assert_eq!(first.node_types(), second.node_types());
        assert_eq!(first.operators_by_length(), second.operators_by_length());
    }

    #[test]
    fn corrupted_artifact_fails_to_load() {
        let result = Grammar::from_json("{ not json");
        let err = result.expect_err("corrupted artifact must not load");
        assert!(matches!(err, GrammarError::Malformed(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn incomplete_artifact_fails_to_load() {
        let artifact = r#"{
            "name": "viewtree",
            "abi_version": 1,
            "externals": ["newline", "indent", "dedent"],
            "extras": [],
            "operators": { "op_dash": "-" },
            "type_names": [],
            "node_types": [{ "kind": "source_file", "named": true }]
        }"#;
        let err = Grammar::from_json(artifact).expect_err("missing node kinds");
        assert!(matches!(err, GrammarError::Incomplete("core node kinds")));
    }

    #[test]
    fn abi_mismatch_fails_to_load() {
        let artifact = grammar_json().replace("\"abi_version\": 1", "\"abi_version\": 99");
        let err = Grammar::from_json(&artifact).expect_err("future abi must not load");
        assert!(matches!(
            err,
            GrammarError::AbiMismatch {
                found: 99,
                expected: ABI_VERSION
            }
        ));
    }

    #[test]
    fn operator_table() {
        let grammar = language().unwrap();
        assert_eq!(grammar.operator("arrow_both"), Some("<=>"));
        assert_eq!(grammar.operator("arrow_left"), Some("<="));
        assert_eq!(grammar.operator("arrow_right"), Some("=>"));
        assert_eq!(grammar.operator("nonexistent"), None);

        let ops = grammar.operators_by_length();
        assert_eq!(ops[0].1, "<=>", "longest literal first");
    }

    #[test]
    fn type_names() {
        let grammar = language().unwrap();
        assert!(grammar.is_type_name("string"));
        assert!(grammar.is_type_name("number"));
        assert!(grammar.is_type_name("boolean"));
        assert!(!grammar.is_type_name("object"));
    }
}
