use super::{GatewayError, GraphId, QueryGateway, UpdateStatement};
use crate::sparql::{Row, SelectQuery};
use indexmap::IndexMap;
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{GraphNameRef, NamedOrBlankNode, Quad};
use oxigraph::sparql::{QueryResults, SparqlEvaluator};
use oxigraph::store::Store;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, instrument};

/// Serializations accepted by [`OxigraphGateway::load`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RdfSyntax {
    RdfXml,
    Turtle,
    NTriples,
    NQuads,
}

impl RdfSyntax {
    /// Order tried when the syntax of an input is unknown.
    pub const FALLBACK_ORDER: [RdfSyntax; 3] = [RdfSyntax::RdfXml, RdfSyntax::Turtle, RdfSyntax::NTriples];

    pub fn format(self) -> RdfFormat {
        match self {
            RdfSyntax::RdfXml => RdfFormat::RdfXml,
            RdfSyntax::Turtle => RdfFormat::Turtle,
            RdfSyntax::NTriples => RdfFormat::NTriples,
            RdfSyntax::NQuads => RdfFormat::NQuads,
        }
    }

    /// Guess from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "rdf" | "owl" | "xml" => Some(RdfSyntax::RdfXml),
            "ttl" => Some(RdfSyntax::Turtle),
            "nt" => Some(RdfSyntax::NTriples),
            "nq" => Some(RdfSyntax::NQuads),
            _ => None,
        }
    }
}

/// Outcome of loading a document into a named graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub syntax: Option<RdfSyntax>,
    /// Triples newly added to the graph.
    pub triples_added: usize,
    /// Prefix declarations found in the document, namespace to prefix.
    pub prefixes: IndexMap<String, String>,
}

/// [`QueryGateway`] backed by an oxigraph [`Store`].
#[derive(Clone)]
pub struct OxigraphGateway {
    store: Store,
}

impl OxigraphGateway {
    pub fn in_memory() -> Result<Self, GatewayError> {
        Ok(Self {
            store: Store::new()?,
        })
    }

    /// Open (or create) an on-disk store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        Ok(Self {
            store: Store::open(path)?,
        })
    }

    pub fn from_store(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Parse `reader` as `syntax` and add its triples to `graph`.
    ///
    /// The document is fully parsed before anything is inserted, so a syntax
    /// error leaves the store untouched.
    #[instrument(skip(self, graph, reader), fields(graph = %graph))]
    pub fn load(
        &self,
        graph: &GraphId,
        reader: impl Read,
        syntax: RdfSyntax,
    ) -> Result<LoadReport, GatewayError> {
        let mut parser = RdfParser::from_format(syntax.format())
            .with_default_graph(graph.graph_name())
            .for_reader(reader);

        let mut quads: Vec<Quad> = Vec::new();
        for quad in &mut parser {
            quads.push(quad?);
        }
        let prefixes = parser
            .prefixes()
            .filter(|(prefix, _)| !prefix.is_empty())
            .map(|(prefix, namespace)| (namespace.to_string(), prefix.to_string()))
            .collect::<IndexMap<_, _>>();

        let before = self.store.len()?;
        self.store.extend(quads)?;
        let triples_added = self.store.len()?.saturating_sub(before);

        debug!(triples_added, prefixes = prefixes.len(), %syntax, "loaded RDF document");
        Ok(LoadReport {
            syntax: Some(syntax),
            triples_added,
            prefixes,
        })
    }

    /// Load bytes of unknown syntax, trying RDF/XML, Turtle, then N-Triples.
    pub fn load_any(&self, graph: &GraphId, data: &[u8]) -> Result<LoadReport, GatewayError> {
        let mut failures = Vec::new();
        for syntax in RdfSyntax::FALLBACK_ORDER {
            match self.load(graph, data, syntax) {
                Ok(report) => return Ok(report),
                Err(GatewayError::Parse(err)) => {
                    debug!(%syntax, error = %err, "syntax did not match");
                    failures.push(format!("{syntax}: {err}"));
                }
                Err(other) => return Err(other),
            }
        }
        Err(GatewayError::NoSyntaxMatched(failures.join("; ")))
    }

    fn graph_ref<'a>(graph: &'a GraphId) -> GraphNameRef<'a> {
        GraphNameRef::NamedNode(graph.as_ref())
    }
}

impl QueryGateway for OxigraphGateway {
    fn select(&self, graph: &GraphId, query: &SelectQuery) -> Result<Vec<Row>, GatewayError> {
        let mut prepared = SparqlEvaluator::new().parse_query(query.text())?;
        prepared
            .dataset_mut()
            .set_default_graph(vec![graph.graph_name()]);

        match prepared.on_store(&self.store).execute()? {
            QueryResults::Solutions(solutions) => {
                let mut rows = Vec::new();
                for solution in solutions {
                    rows.push(Row::from_solution(&solution?));
                }
                Ok(rows)
            }
            _ => Err(GatewayError::UnexpectedResults {
                expected: "SELECT",
            }),
        }
    }

    fn apply(&self, update: &UpdateStatement) -> Result<(), GatewayError> {
        match update {
            UpdateStatement::InsertTriples { graph, triples } => {
                for triple in triples {
                    let quad = triple.clone().in_graph(graph.graph_name());
                    self.store.insert(&quad)?;
                }
            }
            UpdateStatement::DeleteMatching {
                graph,
                subject,
                predicate,
            } => {
                let matching = self
                    .store
                    .quads_for_pattern(
                        Some(subject.as_ref().into()),
                        predicate.as_ref().map(|p| p.as_ref()),
                        None,
                        Some(Self::graph_ref(graph)),
                    )
                    .collect::<Result<Vec<_>, _>>()?;
                for quad in &matching {
                    self.store.remove(quad)?;
                }
            }
            UpdateStatement::ClearGraph { graph } => {
                self.store.clear_graph(Self::graph_ref(graph))?;
            }
        }
        Ok(())
    }

    fn graphs(&self) -> Result<Vec<GraphId>, GatewayError> {
        let mut graphs = Vec::new();
        for graph in self.store.named_graphs() {
            if let NamedOrBlankNode::NamedNode(node) = graph? {
                graphs.push(GraphId::from(node));
            }
        }
        Ok(graphs)
    }

    fn triple_count(&self, graph: &GraphId) -> Result<usize, GatewayError> {
        let mut count = 0;
        for quad in self
            .store
            .quads_for_pattern(None, None, None, Some(Self::graph_ref(graph)))
        {
            quad?;
            count += 1;
        }
        Ok(count)
    }
}
