// =============================================================================
// Typed result rows
// =============================================================================
// Solutions are converted once, at the gateway boundary, into rows of tagged
// values so that callers never compare against a textual `_:` prefix.

use indexmap::IndexMap;
use oxigraph::model::Term;
use oxigraph::sparql::QuerySolution;
use thiserror::Error;

/// Errors that can occur when reading values out of a row
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("Variable '{0}' is unbound")]
    Unbound(String),

    #[error("Expected {expected} for '{var}', got {actual}")]
    TypeMismatch {
        var: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Failed to convert '{var}' to a count: {value}")]
    NotACount { var: String, value: String },

    #[error("Multiple errors occurred:\n{}", .0.join("\n"))]
    Multiple(Vec<String>),
}

/// A single bound value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RdfValue {
    Iri(String),
    Literal {
        value: String,
        datatype: String,
        language: Option<String>,
    },
    Blank(String),
}

impl RdfValue {
    /// Plain literal with `xsd:string` datatype.
    pub fn literal(value: impl Into<String>) -> Self {
        RdfValue::Literal {
            value: value.into(),
            datatype: "http://www.w3.org/2001/XMLSchema#string".to_string(),
            language: None,
        }
    }

    pub fn iri(value: impl Into<String>) -> Self {
        RdfValue::Iri(value.into())
    }

    /// IRI text, lexical form, or blank node id.
    pub fn as_str(&self) -> &str {
        match self {
            RdfValue::Iri(s) | RdfValue::Blank(s) => s,
            RdfValue::Literal { value, .. } => value,
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            RdfValue::Iri(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, RdfValue::Blank(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            RdfValue::Iri(_) => "IRI",
            RdfValue::Literal { .. } => "Literal",
            RdfValue::Blank(_) => "BlankNode",
        }
    }

    fn from_term(term: &Term) -> Option<Self> {
        match term {
            Term::NamedNode(node) => Some(RdfValue::Iri(node.as_str().to_string())),
            Term::BlankNode(node) => Some(RdfValue::Blank(node.as_str().to_string())),
            Term::Literal(lit) => Some(RdfValue::Literal {
                value: lit.value().to_string(),
                datatype: lit.datatype().as_str().to_string(),
                language: lit.language().map(str::to_string),
            }),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

/// One solution: variable name (without sigil) to value, in projection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: IndexMap<String, RdfValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by fixtures and test doubles.
    pub fn with(mut self, var: &str, value: RdfValue) -> Self {
        self.values.insert(var.trim_start_matches('?').to_string(), value);
        self
    }

    pub fn from_solution(solution: &QuerySolution) -> Self {
        let values = solution
            .iter()
            .filter_map(|(var, term)| {
                RdfValue::from_term(term).map(|value| (var.as_str().to_string(), value))
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, var: &str) -> Option<&RdfValue> {
        self.values.get(var)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Required bound value of any kind.
    pub fn value(&self, var: &str) -> Result<&RdfValue, RowError> {
        self.get(var)
            .ok_or_else(|| RowError::Unbound(var.to_string()))
    }

    /// Required IRI.
    pub fn iri(&self, var: &str) -> Result<&str, RowError> {
        match self.value(var)? {
            RdfValue::Iri(iri) => Ok(iri),
            other => Err(RowError::TypeMismatch {
                var: var.to_string(),
                expected: "IRI",
                actual: other.kind_name(),
            }),
        }
    }

    /// IRI if bound to one; blank nodes and literals read as absent.
    pub fn iri_opt(&self, var: &str) -> Option<&str> {
        self.get(var).and_then(RdfValue::as_iri)
    }

    /// Lexical text of a literal or IRI. Blank nodes read as absent, as do empty strings.
    pub fn text_opt(&self, var: &str) -> Option<&str> {
        match self.get(var)? {
            RdfValue::Blank(_) => None,
            value => Some(value.as_str()).filter(|s| !s.is_empty()),
        }
    }

    /// Non-negative integer literal, typically an aggregate.
    pub fn count(&self, var: &str) -> Result<usize, RowError> {
        match self.value(var)? {
            RdfValue::Literal { value, .. } => {
                value.parse::<usize>().map_err(|_| RowError::NotACount {
                    var: var.to_string(),
                    value: value.clone(),
                })
            }
            other => Err(RowError::TypeMismatch {
                var: var.to_string(),
                expected: "Literal",
                actual: other.kind_name(),
            }),
        }
    }
}
