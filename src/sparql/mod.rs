//! Query construction and typed result rows.
//!
//! - [`QueryBuilder`] assembles SELECT text from fixed templates and renders
//!   IRI parameters as a VALUES row from validated nodes
//! - [`Row`] / [`RdfValue`] are the typed shape every solution takes once it
//!   crosses the gateway boundary
//! - [`FromRow`] maps rows into record structs with error accumulation

pub mod builder;
pub mod mapper;
pub mod row;

pub use builder::{QueryBuildError, QueryBuilder, SelectQuery, VariableValidator};
pub use mapper::{FromRow, map_first, map_rows};
pub use row::{RdfValue, Row, RowError};
