//! In-memory graph store.
//!
//! Provides a fast, non-persistent implementation of [`GraphStore`] for unit
//! tests, benchmarks and throwaway runs.
//!
//! A single `Mutex` guards the whole graph and is held for the duration of an
//! atomic step, so concurrent upserts of the same identity serialise exactly
//! as they would against a transactional store. Every mutation made inside a
//! step is recorded in an undo journal that is replayed backwards if the step
//! returns an error.

use crate::models::{EdgeLabel, ElementId, VertexLabel};
use crate::storage::traits::graph::{
    Edge, EdgeQuery, GraphStats, GraphStore, GraphTxn, Properties, PropertyUpdate, Vertex,
    VertexQuery,
};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use tracing::instrument;

/// In-memory graph store.
///
/// Data is not persisted between runs.
///
/// # Example
///
/// ```rust
/// use asset_inventory::storage::{GraphStore, InMemoryGraphStore};
/// use asset_inventory::models::VertexLabel;
///
/// let store = InMemoryGraphStore::new();
/// store
///     .atomically("seed", |txn| txn.create_vertex(VertexLabel::Team, Default::default()))
///     .unwrap();
/// assert_eq!(store.stats().unwrap().vertex_count, 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    state: Mutex<GraphState>,
}

/// Vertices and edges keyed by id; `BTreeMap` iteration is the id order.
#[derive(Debug, Default)]
struct GraphState {
    vertices: BTreeMap<ElementId, Vertex>,
    edges: BTreeMap<ElementId, Edge>,
}

/// Inverse of one mutation.
enum Undo {
    RemoveVertex(ElementId),
    RestoreVertex(Vertex),
    RemoveEdge(ElementId),
    RestoreEdge(Edge),
}

impl GraphState {
    fn revert(&mut self, journal: Vec<Undo>) {
        for undo in journal.into_iter().rev() {
            match undo {
                Undo::RemoveVertex(id) => {
                    self.vertices.remove(&id);
                },
                Undo::RestoreVertex(vertex) => {
                    self.vertices.insert(vertex.id.clone(), vertex);
                },
                Undo::RemoveEdge(id) => {
                    self.edges.remove(&id);
                },
                Undo::RestoreEdge(edge) => {
                    self.edges.insert(edge.id.clone(), edge);
                },
            }
        }
    }
}

impl InMemoryGraphStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphStore for InMemoryGraphStore {
    #[instrument(skip(self, f), fields(store = "memory"))]
    fn atomically<R, F>(&self, operation: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn GraphTxn) -> Result<R>,
    {
        let mut state = self.state.lock().map_err(|_| Error::OperationFailed {
            operation: operation.to_string(),
            cause: "Lock poisoned".to_string(),
        })?;

        let mut txn = MemoryTxn {
            state: &mut *state,
            journal: Vec::new(),
        };
        let result = f(&mut txn);
        let MemoryTxn { state, journal } = txn;

        let status = if result.is_ok() {
            "committed"
        } else {
            state.revert(journal);
            "rolled_back"
        };
        metrics::counter!(
            "inventory_store_transactions_total",
            "store" => "memory",
            "operation" => operation.to_string(),
            "status" => status
        )
        .increment(1);
        result
    }

    fn stats(&self) -> Result<GraphStats> {
        let state = self.state.lock().map_err(|_| Error::OperationFailed {
            operation: "graph_stats".to_string(),
            cause: "Lock poisoned".to_string(),
        })?;

        let mut stats = GraphStats::new();
        for vertex in state.vertices.values() {
            stats.add_vertices(vertex.label, 1);
        }
        for edge in state.edges.values() {
            stats.add_edges(edge.label, 1);
        }
        Ok(stats)
    }
}

/// One atomic step over the locked state.
struct MemoryTxn<'a> {
    state: &'a mut GraphState,
    journal: Vec<Undo>,
}

impl MemoryTxn<'_> {
    fn targets_of(&self, label: EdgeLabel, source: &ElementId) -> HashSet<ElementId> {
        self.state
            .edges
            .values()
            .filter(|e| e.label == label && &e.from == source)
            .map(|e| e.to.clone())
            .collect()
    }
}

impl GraphTxn for MemoryTxn<'_> {
    fn vertex(&mut self, id: &ElementId) -> Result<Option<Vertex>> {
        Ok(self.state.vertices.get(id).cloned())
    }

    fn find_vertices(&mut self, query: &VertexQuery) -> Result<Vec<Vertex>> {
        let linked = query
            .linked_from
            .as_ref()
            .map(|(label, source)| self.targets_of(*label, source));

        let matches: Vec<Vertex> = self
            .state
            .vertices
            .values()
            .filter(|v| v.label == query.label)
            .filter(|v| linked.as_ref().is_none_or(|ids| ids.contains(&v.id)))
            .filter(|v| query.predicates.iter().all(|p| p.matches(&v.properties)))
            .cloned()
            .collect();

        Ok(match query.range {
            Some(range) => range.slice(matches),
            None => matches,
        })
    }

    fn create_vertex(&mut self, label: VertexLabel, properties: Properties) -> Result<Vertex> {
        let vertex = Vertex {
            id: ElementId::generate(),
            label,
            properties,
        };
        self.state.vertices.insert(vertex.id.clone(), vertex.clone());
        self.journal.push(Undo::RemoveVertex(vertex.id.clone()));
        Ok(vertex)
    }

    fn update_vertex_properties(
        &mut self,
        id: &ElementId,
        updates: &[PropertyUpdate],
    ) -> Result<Option<Vertex>> {
        let Some(vertex) = self.state.vertices.get_mut(id) else {
            return Ok(None);
        };
        self.journal.push(Undo::RestoreVertex(vertex.clone()));
        for update in updates {
            update.apply(&mut vertex.properties);
        }
        Ok(Some(vertex.clone()))
    }

    fn delete_vertex(&mut self, id: &ElementId) -> Result<usize> {
        let Some(vertex) = self.state.vertices.remove(id) else {
            return Ok(0);
        };
        let incident: Vec<ElementId> = self
            .state
            .edges
            .values()
            .filter(|e| &e.from == id || &e.to == id)
            .map(|e| e.id.clone())
            .collect();
        for edge_id in incident {
            if let Some(edge) = self.state.edges.remove(&edge_id) {
                self.journal.push(Undo::RestoreEdge(edge));
            }
        }
        self.journal.push(Undo::RestoreVertex(vertex));
        Ok(1)
    }

    fn edge(&mut self, id: &ElementId) -> Result<Option<Edge>> {
        Ok(self.state.edges.get(id).cloned())
    }

    fn find_edges(&mut self, query: &EdgeQuery) -> Result<Vec<Edge>> {
        let matches: Vec<Edge> = self
            .state
            .edges
            .values()
            .filter(|e| e.label == query.label)
            .filter(|e| query.from.as_ref().is_none_or(|from| &e.from == from))
            .filter(|e| query.to.as_ref().is_none_or(|to| &e.to == to))
            .cloned()
            .collect();

        Ok(match query.range {
            Some(range) => range.slice(matches),
            None => matches,
        })
    }

    fn create_edge(
        &mut self,
        label: EdgeLabel,
        from: &ElementId,
        to: &ElementId,
        properties: Properties,
    ) -> Result<Edge> {
        let edge = Edge {
            id: ElementId::generate(),
            label,
            from: from.clone(),
            to: to.clone(),
            properties,
        };
        self.state.edges.insert(edge.id.clone(), edge.clone());
        self.journal.push(Undo::RemoveEdge(edge.id.clone()));
        Ok(edge)
    }

    fn update_edge_properties(
        &mut self,
        id: &ElementId,
        updates: &[PropertyUpdate],
    ) -> Result<Option<Edge>> {
        let Some(edge) = self.state.edges.get_mut(id) else {
            return Ok(None);
        };
        self.journal.push(Undo::RestoreEdge(edge.clone()));
        for update in updates {
            update.apply(&mut edge.properties);
        }
        Ok(Some(edge.clone()))
    }

    fn delete_edge(&mut self, id: &ElementId) -> Result<usize> {
        let Some(edge) = self.state.edges.remove(id) else {
            return Ok(0);
        };
        self.journal.push(Undo::RestoreEdge(edge));
        Ok(1)
    }
}
