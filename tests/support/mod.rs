#![allow(dead_code)]

use ait_introspect::sparql::{Row, SelectQuery};
use ait_introspect::{GatewayError, GraphId, OxigraphGateway, QueryGateway, RdfSyntax, UpdateStatement};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const SOIL: &str = "http://example.org/onto/soil";
pub const INHERIT: &str = "http://example.org/onto/inherit";

pub const SOIL_NS: &str = "http://example.org/soil#";
pub const EXT_NS: &str = "http://external.org/base#";
pub const INHERIT_NS: &str = "http://example.org/inherit#";

pub fn soil(local: &str) -> String {
    format!("{SOIL_NS}{local}")
}

pub fn ext(local: &str) -> String {
    format!("{EXT_NS}{local}")
}

pub fn inherit(local: &str) -> String {
    format!("{INHERIT_NS}{local}")
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("ontologies")
        .join(name)
}

/// Load a Turtle fixture into `graph`.
pub fn load_fixture(gateway: &OxigraphGateway, graph: &str, name: &str) {
    let data = std::fs::read(fixture_path(name)).expect("read fixture");
    let graph = GraphId::parse(graph).expect("graph IRI");
    gateway
        .load(&graph, data.as_slice(), RdfSyntax::Turtle)
        .expect("load fixture");
}

/// In-memory store with both fixture ontologies loaded.
pub fn fixture_gateway() -> OxigraphGateway {
    let gateway = OxigraphGateway::in_memory().expect("in-memory store");
    load_fixture(&gateway, SOIL, "soil.ttl");
    load_fixture(&gateway, INHERIT, "inherit.ttl");
    gateway
}

/// In-memory store holding a single Turtle document.
pub fn gateway_with(graph: &str, turtle: &str) -> OxigraphGateway {
    let gateway = OxigraphGateway::in_memory().expect("in-memory store");
    let graph = GraphId::parse(graph).expect("graph IRI");
    gateway
        .load(&graph, turtle.as_bytes(), RdfSyntax::Turtle)
        .expect("load turtle");
    gateway
}

/// Gateway wrapper counting the SELECT queries it forwards.
pub struct CountingGateway<G> {
    inner: G,
    selects: AtomicUsize,
}

impl<G: QueryGateway> CountingGateway<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            selects: AtomicUsize::new(0),
        }
    }

    pub fn selects(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.selects.store(0, Ordering::SeqCst);
    }
}

impl<G: QueryGateway> QueryGateway for CountingGateway<G> {
    fn select(&self, graph: &GraphId, query: &SelectQuery) -> Result<Vec<Row>, GatewayError> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        self.inner.select(graph, query)
    }

    fn apply(&self, update: &UpdateStatement) -> Result<(), GatewayError> {
        self.inner.apply(update)
    }

    fn graphs(&self) -> Result<Vec<GraphId>, GatewayError> {
        self.inner.graphs()
    }

    fn triple_count(&self, graph: &GraphId) -> Result<usize, GatewayError> {
        self.inner.triple_count(graph)
    }
}
