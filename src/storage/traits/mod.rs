//! Storage backend traits.

pub mod graph;

pub use graph::{
    Edge, EdgeQuery, GraphStats, GraphStore, GraphTxn, Predicate, Properties, PropertyUpdate,
    PropertyValue, Range, Vertex, VertexQuery,
};
