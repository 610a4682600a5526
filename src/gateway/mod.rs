//! Query gateway: the only seam between the introspection engine and storage.
//!
//! The engine issues parameterized SELECT queries scoped to one named graph
//! and receives typed [`Row`]s. Writes are expressed as typed
//! [`UpdateStatement`]s rather than update strings.

mod oxigraph_store;

pub use oxigraph_store::{LoadReport, OxigraphGateway, RdfSyntax};

use crate::sparql::{Row, SelectQuery};
use oxigraph::io::RdfParseError;
use oxigraph::model::{GraphName, IriParseError, NamedNode, NamedNodeRef, Triple};
use oxigraph::sparql::{QueryEvaluationError, SparqlSyntaxError};
use oxigraph::store::StorageError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failures raised by a gateway implementation. Never retried by the engine.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("query syntax error: {0}")]
    Syntax(#[from] SparqlSyntaxError),

    #[error("query evaluation failed: {0}")]
    Evaluation(#[from] QueryEvaluationError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("RDF parse error: {0}")]
    Parse(#[from] RdfParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("expected {expected} results from query")]
    UnexpectedResults { expected: &'static str },

    #[error("unsupported RDF syntax: {0}")]
    UnsupportedSyntax(String),

    #[error("could not parse input in any of the supported syntaxes: {0}")]
    NoSyntaxMatched(String),
}

/// Identifier of a named graph, one per loaded ontology.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphId(NamedNode);

impl GraphId {
    pub fn parse(iri: &str) -> Result<Self, IriParseError> {
        NamedNode::new(iri).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_named_node(&self) -> &NamedNode {
        &self.0
    }

    pub fn as_ref(&self) -> NamedNodeRef<'_> {
        self.0.as_ref()
    }

    pub fn graph_name(&self) -> GraphName {
        GraphName::NamedNode(self.0.clone())
    }

    /// The graph holding stored settings.
    pub fn meta() -> Self {
        Self(crate::vocab::META_GRAPH_NODE.clone())
    }

    pub fn is_meta(&self) -> bool {
        self.0.as_str() == crate::vocab::META_GRAPH
    }
}

impl From<NamedNode> for GraphId {
    fn from(node: NamedNode) -> Self {
        Self(node)
    }
}

impl Serialize for GraphId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Typed write operations.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateStatement {
    /// Insert triples into a graph.
    InsertTriples { graph: GraphId, triples: Vec<Triple> },
    /// Delete every triple in `graph` with this subject (and predicate, if given).
    DeleteMatching {
        graph: GraphId,
        subject: NamedNode,
        predicate: Option<NamedNode>,
    },
    /// Remove all triples of a graph.
    ClearGraph { graph: GraphId },
}

/// Abstraction over the RDF store consumed by the engine.
pub trait QueryGateway {
    /// Evaluate `query` with `graph` as the default graph.
    fn select(&self, graph: &GraphId, query: &SelectQuery) -> Result<Vec<Row>, GatewayError>;

    fn apply(&self, update: &UpdateStatement) -> Result<(), GatewayError>;

    /// Named graphs currently present in the store.
    fn graphs(&self) -> Result<Vec<GraphId>, GatewayError>;

    fn triple_count(&self, graph: &GraphId) -> Result<usize, GatewayError>;
}

impl<G: QueryGateway + ?Sized> QueryGateway for &G {
    fn select(&self, graph: &GraphId, query: &SelectQuery) -> Result<Vec<Row>, GatewayError> {
        (**self).select(graph, query)
    }

    fn apply(&self, update: &UpdateStatement) -> Result<(), GatewayError> {
        (**self).apply(update)
    }

    fn graphs(&self) -> Result<Vec<GraphId>, GatewayError> {
        (**self).graphs()
    }

    fn triple_count(&self, graph: &GraphId) -> Result<usize, GatewayError> {
        (**self).triple_count(graph)
    }
}
