//! Ontology introspection over an RDF store.
//!
//! Reads OWL/SKOS ontologies loaded as named graphs and answers the questions
//! a browsing client asks: which namespaces are internal, what the class
//! hierarchy looks like, which entities are code lists and what they contain,
//! and which properties apply to a class.
//!
//! ```
//! use ait_introspect::{Introspector, OxigraphGateway, RdfSyntax, GraphId};
//!
//! let gateway = OxigraphGateway::in_memory()?;
//! let graph = GraphId::parse("http://example.org/soil")?;
//! gateway.load(
//!     &graph,
//!     "<http://example.org/soil#Layer> a <http://www.w3.org/2002/07/owl#Class> .".as_bytes(),
//!     RdfSyntax::Turtle,
//! )?;
//!
//! let hierarchy = Introspector::new(&gateway).build_hierarchy("http://example.org/soil")?;
//! assert_eq!(hierarchy[0].label, "Layer");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod introspector;
pub mod logging;
pub mod ontology;
pub mod sparql;
pub mod vocab;

pub use config::{AppConfig, CliArgs, Command};
pub use error::{ErrorCode, IntrospectError};
pub use gateway::{
    GatewayError, GraphId, LoadReport, OxigraphGateway, QueryGateway, RdfSyntax, UpdateStatement,
};
pub use introspector::Introspector;
pub use logging::{LoggingConfig, init_logging};
pub use ontology::{
    ClassProperties, CodeListInfo, CodeListMember, CodeListPattern, CodeListSummary, EntityInfo,
    EntityKind, EntityRef, HierarchyNode, NamespaceStat, OntologyConfig, OntologySummary,
    PropertyInfo, PropertyKind, classify,
};
