// =============================================================================
// Parameterized SELECT construction
// =============================================================================
// Query text comes from fixed templates and vocabulary constants. Entity and
// graph identifiers are attached as variable bindings and rendered as a single
// VALUES row from validated IRIs; caller strings never reach the text.

use crate::vocab;
use oxigraph::model::NamedNode;
use oxigraph::sparql::Variable;
use thiserror::Error;

/// Longest accepted variable name, sigil included.
const MAX_VARIABLE_LEN: usize = 128;

/// Keywords rejected as variable names (compared case-insensitively).
const RESERVED_NAMES: &[&str] = &[
    "select", "construct", "describe", "ask", "where", "optional", "filter", "values", "union",
    "minus", "bind", "service", "prefix", "base",
];

/// Errors raised while assembling a query.
///
/// These indicate a bug in a query template rather than bad caller input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryBuildError {
    #[error("Invalid variable name: {0}")]
    InvalidVariable(String),

    #[error("Variable name too long (max {MAX_VARIABLE_LEN} characters)")]
    VariableNameTooLong,

    #[error("Variable name is a reserved keyword: {0}")]
    ReservedKeyword(String),

    #[error("Variable '{0}' is bound but never used in the query")]
    UnusedBinding(String),

    #[error("Query has no WHERE pattern")]
    EmptyPattern,
}

pub type Result<T> = std::result::Result<T, QueryBuildError>;

/// A ready to evaluate SELECT query plus its parameter bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    text: String,
    bindings: Vec<(Variable, NamedNode)>,
}

impl SelectQuery {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bindings(&self) -> &[(Variable, NamedNode)] {
        &self.bindings
    }

    /// The IRI bound to `var` (sigil optional), if any.
    pub fn binding(&self, var: &str) -> Option<&NamedNode> {
        let name = var.trim_start_matches(['?', '$']);
        self.bindings
            .iter()
            .find(|(v, _)| v.as_str() == name)
            .map(|(_, iri)| iri)
    }
}

/// Builder for SELECT queries.
///
/// ```
/// use ait_introspect::sparql::QueryBuilder;
/// use oxigraph::model::NamedNode;
///
/// let class = NamedNode::new("http://example.org/soil#SoilProfile").unwrap();
/// let query = QueryBuilder::select()
///     .distinct()
///     .variable("?prop")
///     .where_clause("?prop rdfs:domain ?class")
///     .bind("?class", &class)
///     .order_by("?prop")
///     .build()
///     .unwrap();
/// assert!(query.text().contains("VALUES ?class { <http://example.org/soil#SoilProfile> }"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    projection: Vec<String>,
    where_clauses: Vec<String>,
    filters: Vec<String>,
    group_by: Vec<String>,
    order_by: Vec<String>,
    bindings: Vec<(String, NamedNode)>,
    limit: Option<usize>,
    distinct: bool,
    error: Option<QueryBuildError>,
}

impl QueryBuilder {
    /// Create a SELECT builder with the standard vocabulary prefixes.
    pub fn select() -> Self {
        Self::default()
    }

    /// Enable DISTINCT.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Add a projected variable.
    pub fn variable(mut self, var: &str) -> Self {
        if self.check(var) {
            self.projection.push(var.to_string());
        }
        self
    }

    /// Project `(COUNT(?var) AS ?alias)`, optionally with DISTINCT.
    pub fn count(mut self, var: &str, alias: &str, distinct: bool) -> Self {
        if self.check(var) && self.check(alias) {
            let modifier = if distinct { "DISTINCT " } else { "" };
            self.projection
                .push(format!("(COUNT({modifier}{var}) AS {alias})"));
        }
        self
    }

    /// Project `(SAMPLE(?var) AS ?alias)`.
    pub fn sample(mut self, var: &str, alias: &str) -> Self {
        if self.check(var) && self.check(alias) {
            self.projection.push(format!("(SAMPLE({var}) AS {alias})"));
        }
        self
    }

    /// Add a WHERE pattern. Patterns are template text, never caller data.
    pub fn where_clause(mut self, pattern: &str) -> Self {
        self.where_clauses.push(pattern.to_string());
        self
    }

    /// Add `OPTIONAL { pattern }`.
    pub fn optional(mut self, pattern: &str) -> Self {
        self.where_clauses.push(format!("OPTIONAL {{ {pattern} }}"));
        self
    }

    /// Add a FILTER expression.
    pub fn filter(mut self, expression: &str) -> Self {
        self.filters.push(expression.to_string());
        self
    }

    pub fn group_by(mut self, var: &str) -> Self {
        if self.check(var) {
            self.group_by.push(var.to_string());
        }
        self
    }

    pub fn order_by(mut self, var: &str) -> Self {
        if self.check(var) {
            self.order_by.push(var.to_string());
        }
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Bind a query variable to an IRI.
    pub fn bind(mut self, var: &str, iri: &NamedNode) -> Self {
        if self.check(var) {
            self.bindings.push((var.to_string(), iri.clone()));
        }
        self
    }

    /// Render the final query.
    pub fn build(self) -> Result<SelectQuery> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.where_clauses.is_empty() {
            return Err(QueryBuildError::EmptyPattern);
        }

        let mut head = String::new();
        for (prefix, iri) in vocab::QUERY_PREFIXES {
            head.push_str(&format!("PREFIX {prefix}: <{iri}>\n"));
        }
        head.push('\n');

        head.push_str("SELECT ");
        if self.distinct {
            head.push_str("DISTINCT ");
        }
        if self.projection.is_empty() {
            head.push('*');
        } else {
            head.push_str(&self.projection.join(" "));
        }
        head.push('\n');

        let mut body = String::new();
        for clause in &self.where_clauses {
            body.push_str("  ");
            body.push_str(clause);
            body.push_str(" .\n");
        }
        for filter in &self.filters {
            body.push_str("  FILTER(");
            body.push_str(filter);
            body.push_str(")\n");
        }

        let mut tail = String::new();
        if !self.group_by.is_empty() {
            tail.push_str("GROUP BY ");
            tail.push_str(&self.group_by.join(" "));
            tail.push('\n');
        }
        if !self.order_by.is_empty() {
            tail.push_str("ORDER BY ");
            tail.push_str(&self.order_by.join(" "));
            tail.push('\n');
        }
        if let Some(limit) = self.limit {
            tail.push_str(&format!("LIMIT {limit}\n"));
        }

        let mut bindings = Vec::with_capacity(self.bindings.len());
        for (var, iri) in self.bindings {
            let used = [&head, &body, &tail]
                .iter()
                .any(|part| mentions_variable(part, &var));
            if !used {
                return Err(QueryBuildError::UnusedBinding(var));
            }
            let name = &var[1..];
            let variable = Variable::new(name)
                .map_err(|e| QueryBuildError::InvalidVariable(format!("{var}: {e}")))?;
            bindings.push((variable, iri));
        }

        let mut query = head;
        query.push_str("WHERE {\n");
        query.push_str(&values_row(&bindings));
        query.push_str(&body);
        query.push_str("}\n");
        query.push_str(&tail);

        Ok(SelectQuery {
            text: query,
            bindings,
        })
    }

    fn check(&mut self, var: &str) -> bool {
        match VariableValidator::validate(var) {
            Ok(()) => true,
            Err(err) => {
                self.error.get_or_insert(err);
                false
            }
        }
    }
}

/// One-row VALUES block for `bindings`, empty when there are none.
fn values_row(bindings: &[(Variable, NamedNode)]) -> String {
    match bindings {
        [] => String::new(),
        [(variable, iri)] => format!("  VALUES {variable} {{ {iri} }}\n"),
        _ => {
            let vars: Vec<String> = bindings.iter().map(|(v, _)| v.to_string()).collect();
            let iris: Vec<String> = bindings.iter().map(|(_, iri)| iri.to_string()).collect();
            format!("  VALUES ({}) {{ ({}) }}\n", vars.join(" "), iris.join(" "))
        }
    }
}

/// True when `var` occurs in `text` as a whole variable token.
fn mentions_variable(text: &str, var: &str) -> bool {
    text.match_indices(var).any(|(idx, _)| {
        text[idx + var.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
    })
}

// ============================================================================
// VariableValidator
// ============================================================================

/// Validates SPARQL variable names.
///
/// - Must start with ? or $
/// - Can contain alphanumeric characters and underscore
/// - Maximum length of 128 characters
/// - Cannot be a SPARQL keyword
pub struct VariableValidator;

impl VariableValidator {
    pub fn validate(var: &str) -> Result<()> {
        if var.len() > MAX_VARIABLE_LEN {
            return Err(QueryBuildError::VariableNameTooLong);
        }

        let mut chars = var.chars();
        match chars.next() {
            Some('?') | Some('$') => {}
            Some(other) => {
                return Err(QueryBuildError::InvalidVariable(format!(
                    "Variable must start with ? or $, got: {other}"
                )));
            }
            None => {
                return Err(QueryBuildError::InvalidVariable(
                    "Variable name too short".to_string(),
                ));
            }
        }

        let rest = chars.as_str();
        if rest.is_empty() {
            return Err(QueryBuildError::InvalidVariable(
                "Variable name too short".to_string(),
            ));
        }
        if let Some(ch) = rest.chars().find(|c| !c.is_alphanumeric() && *c != '_') {
            return Err(QueryBuildError::InvalidVariable(format!(
                "Invalid character in variable name: {ch}"
            )));
        }

        Self::check_reserved_keywords(var, rest)
    }

    fn check_reserved_keywords(var: &str, name: &str) -> Result<()> {
        if RESERVED_NAMES.iter().any(|kw| kw.eq_ignore_ascii_case(name)) {
            return Err(QueryBuildError::ReservedKeyword(var.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn iri(value: &str) -> NamedNode {
        NamedNode::new(value).unwrap()
    }

    #[test]
    fn test_variable_validation() {
        assert!(VariableValidator::validate("?class").is_ok());
        assert!(VariableValidator::validate("$prop_label").is_ok());
        assert!(VariableValidator::validate("?123").is_ok());

        assert!(VariableValidator::validate("class").is_err());
        assert!(VariableValidator::validate("?").is_err());
        assert!(VariableValidator::validate("?per son").is_err());
        assert!(VariableValidator::validate("?a}").is_err());
        assert_matches!(
            VariableValidator::validate(&format!("?{}", "x".repeat(200))),
            Err(QueryBuildError::VariableNameTooLong)
        );
    }

    #[test]
    fn test_select_rendering() {
        let query = QueryBuilder::select()
            .distinct()
            .variable("?prop")
            .variable("?label")
            .where_clause("?prop rdfs:domain ?class")
            .optional("?prop rdfs:label ?label")
            .filter("isIRI(?prop)")
            .order_by("?prop")
            .limit(10)
            .bind("?class", &iri("http://example.org/A"))
            .build()
            .unwrap();

        let text = query.text();
        assert!(text.contains("PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>"));
        assert!(text.contains("SELECT DISTINCT ?prop ?label\n"));
        assert!(text.contains("  ?prop rdfs:domain ?class .\n"));
        assert!(text.contains("  OPTIONAL { ?prop rdfs:label ?label } .\n"));
        assert!(text.contains("  FILTER(isIRI(?prop))\n"));
        assert!(text.contains("ORDER BY ?prop\n"));
        assert!(text.ends_with("LIMIT 10\n"));
        assert!(text.contains("WHERE {\n  VALUES ?class { <http://example.org/A> }\n  ?prop rdfs:domain"));
        assert_eq!(query.binding("?class"), Some(&iri("http://example.org/A")));
        assert_eq!(query.bindings()[0].0.as_str(), "class");
    }

    #[test]
    fn test_aggregates_and_grouping() {
        let query = QueryBuilder::select()
            .variable("?scheme")
            .count("?member", "?count", true)
            .sample("?l", "?label")
            .where_clause("?member skos:inScheme ?scheme")
            .group_by("?scheme")
            .order_by("?scheme")
            .build()
            .unwrap();

        let text = query.text();
        assert!(text.contains("SELECT ?scheme (COUNT(DISTINCT ?member) AS ?count) (SAMPLE(?l) AS ?label)"));
        assert!(text.contains("GROUP BY ?scheme\nORDER BY ?scheme\n"));
    }

    #[test]
    fn test_first_invalid_variable_is_reported() {
        let result = QueryBuilder::select()
            .variable("bad")
            .variable("?ok")
            .order_by("?also bad")
            .where_clause("?ok a owl:Class")
            .build();
        assert_matches!(result, Err(QueryBuildError::InvalidVariable(msg)) if msg.contains("got: b"));
    }

    #[test]
    fn test_unused_binding_rejected() {
        let result = QueryBuilder::select()
            .variable("?class")
            .where_clause("?class a owl:Class")
            .bind("?cls", &iri("http://example.org/A"))
            .build();
        assert_matches!(result, Err(QueryBuildError::UnusedBinding(var)) if var == "?cls");
    }

    #[test]
    fn test_reserved_keywords_rejected() {
        assert_matches!(
            VariableValidator::validate("?select"),
            Err(QueryBuildError::ReservedKeyword(var)) if var == "?select"
        );
        assert_matches!(
            VariableValidator::validate("$Values"),
            Err(QueryBuildError::ReservedKeyword(_))
        );
        assert!(VariableValidator::validate("?selected").is_ok());
        assert!(VariableValidator::validate("?prefixIri").is_ok());

        let result = QueryBuilder::select()
            .variable("?where")
            .where_clause("?where a owl:Class")
            .build();
        assert_matches!(result, Err(QueryBuildError::ReservedKeyword(_)));
    }

    #[test]
    fn test_multiple_bindings_share_one_values_row() {
        let query = QueryBuilder::select()
            .variable("?label")
            .where_clause("?prop rdfs:domain ?class")
            .where_clause("?prop rdfs:label ?label")
            .bind("?class", &iri("http://example.org/A"))
            .bind("?prop", &iri("http://example.org/p"))
            .build()
            .unwrap();
        assert!(query.text().contains(
            "  VALUES (?class ?prop) { (<http://example.org/A> <http://example.org/p>) }\n"
        ));
        assert_eq!(query.bindings().len(), 2);
    }

    #[test]
    fn test_unbound_query_has_no_values_block() {
        let query = QueryBuilder::select()
            .variable("?class")
            .where_clause("?class a owl:Class")
            .build()
            .unwrap();
        assert!(!query.text().contains("VALUES"));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let result = QueryBuilder::select().variable("?x").build();
        assert_eq!(result, Err(QueryBuildError::EmptyPattern));
    }

    #[test]
    fn test_mentions_variable_matches_whole_tokens() {
        assert!(mentions_variable("?class a owl:Class .", "?class"));
        assert!(!mentions_variable("?classLabel a owl:Class .", "?class"));
        assert!(mentions_variable("FILTER(?p != ?class)", "?class"));
    }
}
