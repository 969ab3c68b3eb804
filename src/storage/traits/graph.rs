//! Graph store contract for the inventory.
//!
//! The inventory delegates persistence to a transactional property graph
//! holding a fixed schema (see [`crate::models::graph`]). Stores expose vertex
//! and edge CRUD, property filters and ordered ranges, and nothing more.
//!
//! # Available Implementations
//!
//! | Store | Use Case | Atomicity |
//! |-------|----------|-----------|
//! | `SqliteGraphStore` | Default persistent store | One `BEGIN IMMEDIATE` transaction per step |
//! | `InMemoryGraphStore` | Testing, ephemeral runs | One mutex hold per step, undo journal on error |
//!
//! # Atomic Steps
//!
//! Every read-check-write sequence of the upsert engine runs inside
//! [`GraphStore::atomically`]. The closure receives a [`GraphTxn`]; all
//! primitives issued through it observe each other's effects and become
//! visible to other callers together. Returning `Err` from the closure
//! discards every change it made. Two concurrent steps on the same identity
//! therefore serialise: the second sees what the first created.
//!
//! # Primitive Operations
//!
//! | Operation | Notes |
//! |-----------|-------|
//! | `vertex` / `edge` | Point lookup by internal id |
//! | `find_vertices` | Label + conjunctive predicates, optional link constraint and range |
//! | `find_edges` | Label + optional endpoints, optional range |
//! | `create_vertex` / `create_edge` | Fresh UUIDv7 id |
//! | `update_*_properties` | `Set` or `Remove` individual keys |
//! | `delete_vertex` / `delete_edge` | Returns the number of elements removed |
//!
//! Results of `find_*` are always ordered by internal id ascending, so a
//! `Range` is a stable page as long as nothing is deleted in between.
//! Deleting a vertex also removes its incident edges; no other vertex is
//! ever removed implicitly.

use crate::models::temporal::normalize;
use crate::models::{EdgeLabel, ElementId, PageRequest, VertexLabel};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// A property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// UTF-8 text.
    Text(String),
    /// Signed integer.
    Int(i64),
    /// UTC instant, microsecond precision.
    Time(DateTime<Utc>),
}

impl PropertyValue {
    /// Returns the text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer, if this is an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the instant, if this is a time value.
    #[must_use]
    pub const fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// Orders two values of the same kind; values of different kinds are
    /// incomparable.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Time(normalize(t))
    }
}

/// Property map of a vertex or edge.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A single property mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyUpdate {
    /// Sets (or overwrites) a property.
    Set(String, PropertyValue),
    /// Removes a property; a no-op if it is absent.
    Remove(String),
}

impl PropertyUpdate {
    /// Builds a `Set` update.
    pub fn set(key: &str, value: impl Into<PropertyValue>) -> Self {
        Self::Set(key.to_string(), value.into())
    }

    /// Builds a `Remove` update.
    #[must_use]
    pub fn remove(key: &str) -> Self {
        Self::Remove(key.to_string())
    }

    /// Applies the update to a property map.
    pub fn apply(&self, properties: &mut Properties) {
        match self {
            Self::Set(key, value) => {
                properties.insert(key.clone(), value.clone());
            },
            Self::Remove(key) => {
                properties.remove(key);
            },
        }
    }
}

/// A property predicate. A missing property never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `property == value`.
    Eq(String, PropertyValue),
    /// `property <= value`.
    AtMost(String, PropertyValue),
    /// `property >= value`.
    AtLeast(String, PropertyValue),
}

impl Predicate {
    /// Builds an equality predicate.
    pub fn equals(key: &str, value: impl Into<PropertyValue>) -> Self {
        Self::Eq(key.to_string(), value.into())
    }

    /// Builds a `<=` predicate.
    pub fn at_most(key: &str, value: impl Into<PropertyValue>) -> Self {
        Self::AtMost(key.to_string(), value.into())
    }

    /// Builds a `>=` predicate.
    pub fn at_least(key: &str, value: impl Into<PropertyValue>) -> Self {
        Self::AtLeast(key.to_string(), value.into())
    }

    /// Key the predicate reads.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Eq(key, _) | Self::AtMost(key, _) | Self::AtLeast(key, _) => key,
        }
    }

    /// Evaluates the predicate against a property map.
    #[must_use]
    pub fn matches(&self, properties: &Properties) -> bool {
        let Some(actual) = properties.get(self.key()) else {
            return false;
        };
        match self {
            Self::Eq(_, expected) => actual == expected,
            Self::AtMost(_, bound) => {
                matches!(actual.compare(bound), Some(Ordering::Less | Ordering::Equal))
            },
            Self::AtLeast(_, bound) => matches!(
                actual.compare(bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

/// Slice of an id-ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// Elements to skip.
    pub offset: usize,
    /// Maximum elements to return.
    pub limit: usize,
}

impl Range {
    /// Applies the range to an already ordered list.
    #[must_use]
    pub fn slice<T>(self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}

impl From<PageRequest> for Range {
    fn from(page: PageRequest) -> Self {
        Self {
            offset: page.offset(),
            limit: page.size,
        }
    }
}

/// Vertex lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexQuery {
    /// Required label.
    pub label: VertexLabel,
    /// Conjunctive property predicates.
    pub predicates: Vec<Predicate>,
    /// Only vertices that are the target of an edge with this label from this
    /// vertex.
    pub linked_from: Option<(EdgeLabel, ElementId)>,
    /// Optional slice of the id-ordered result.
    pub range: Option<Range>,
}

impl VertexQuery {
    /// Matches every vertex with `label`.
    #[must_use]
    pub const fn new(label: VertexLabel) -> Self {
        Self {
            label,
            predicates: Vec::new(),
            linked_from: None,
            range: None,
        }
    }

    /// Adds a predicate.
    #[must_use]
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Requires an incoming `label` edge from `source`.
    #[must_use]
    pub fn linked_from(mut self, label: EdgeLabel, source: ElementId) -> Self {
        self.linked_from = Some((label, source));
        self
    }

    /// Restricts the result to a page.
    #[must_use]
    pub fn page(mut self, page: Option<PageRequest>) -> Self {
        self.range = page.map(Range::from);
        self
    }
}

/// Edge lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeQuery {
    /// Required label.
    pub label: EdgeLabel,
    /// Required source vertex.
    pub from: Option<ElementId>,
    /// Required target vertex.
    pub to: Option<ElementId>,
    /// Optional slice of the id-ordered result.
    pub range: Option<Range>,
}

impl EdgeQuery {
    /// Matches every edge with `label`.
    #[must_use]
    pub const fn new(label: EdgeLabel) -> Self {
        Self {
            label,
            from: None,
            to: None,
            range: None,
        }
    }

    /// Requires the source vertex.
    #[must_use]
    pub fn source(mut self, vid: ElementId) -> Self {
        self.from = Some(vid);
        self
    }

    /// Requires the target vertex.
    #[must_use]
    pub fn target(mut self, vid: ElementId) -> Self {
        self.to = Some(vid);
        self
    }

    /// Restricts the result to a page.
    #[must_use]
    pub fn page(mut self, page: Option<PageRequest>) -> Self {
        self.range = page.map(Range::from);
        self
    }
}

/// A stored vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertex {
    /// Internal id.
    pub id: ElementId,
    /// Label.
    pub label: VertexLabel,
    /// Properties.
    pub properties: Properties,
}

/// A stored edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Internal id.
    pub id: ElementId,
    /// Label.
    pub label: EdgeLabel,
    /// Source vertex.
    pub from: ElementId,
    /// Target vertex.
    pub to: ElementId,
    /// Properties.
    pub properties: Properties,
}

fn missing_property(id: &ElementId, key: &str) -> Error {
    Error::InconsistentState(format!("element {id} has no valid '{key}' property"))
}

macro_rules! property_accessors {
    ($ty:ty) => {
        impl $ty {
            /// Reads a required text property.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InconsistentState`] if the property is missing
            /// or not text.
            pub fn text(&self, key: &str) -> Result<&str> {
                self.properties
                    .get(key)
                    .and_then(PropertyValue::as_text)
                    .ok_or_else(|| missing_property(&self.id, key))
            }

            /// Reads a required integer property.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InconsistentState`] if the property is missing
            /// or not an integer.
            pub fn int(&self, key: &str) -> Result<i64> {
                self.properties
                    .get(key)
                    .and_then(PropertyValue::as_int)
                    .ok_or_else(|| missing_property(&self.id, key))
            }

            /// Reads a required time property.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InconsistentState`] if the property is missing
            /// or not a time.
            pub fn time(&self, key: &str) -> Result<DateTime<Utc>> {
                self.properties
                    .get(key)
                    .and_then(PropertyValue::as_time)
                    .ok_or_else(|| missing_property(&self.id, key))
            }

            /// Reads an optional time property.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InconsistentState`] if the property is present
            /// but not a time.
            pub fn opt_time(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
                self.properties
                    .get(key)
                    .map(|value| value.as_time().ok_or_else(|| missing_property(&self.id, key)))
                    .transpose()
            }
        }
    };
}

property_accessors!(Vertex);
property_accessors!(Edge);

/// Operations available inside one atomic step.
///
/// # Implementor Notes
///
/// - `find_*` results are ordered by internal id ascending before `range` applies
/// - `update_*_properties` and `delete_*` on a missing id return `None` / `0`
/// - `create_edge` does not check that the endpoints exist; callers do
/// - `delete_vertex` removes incident edges and counts only the vertex
pub trait GraphTxn {
    // ========================================================================
    // Vertex Operations
    // ========================================================================

    /// Looks up a vertex by id.
    fn vertex(&mut self, id: &ElementId) -> Result<Option<Vertex>>;

    /// Finds vertices matching a query.
    fn find_vertices(&mut self, query: &VertexQuery) -> Result<Vec<Vertex>>;

    /// Creates a vertex with a fresh id.
    fn create_vertex(&mut self, label: VertexLabel, properties: Properties) -> Result<Vertex>;

    /// Applies property updates to a vertex.
    fn update_vertex_properties(
        &mut self,
        id: &ElementId,
        updates: &[PropertyUpdate],
    ) -> Result<Option<Vertex>>;

    /// Deletes a vertex and its incident edges; returns 1 if it existed.
    fn delete_vertex(&mut self, id: &ElementId) -> Result<usize>;

    // ========================================================================
    // Edge Operations
    // ========================================================================

    /// Looks up an edge by id.
    fn edge(&mut self, id: &ElementId) -> Result<Option<Edge>>;

    /// Finds edges matching a query.
    fn find_edges(&mut self, query: &EdgeQuery) -> Result<Vec<Edge>>;

    /// Creates an edge with a fresh id.
    fn create_edge(
        &mut self,
        label: EdgeLabel,
        from: &ElementId,
        to: &ElementId,
        properties: Properties,
    ) -> Result<Edge>;

    /// Applies property updates to an edge.
    fn update_edge_properties(
        &mut self,
        id: &ElementId,
        updates: &[PropertyUpdate],
    ) -> Result<Option<Edge>>;

    /// Deletes an edge; returns 1 if it existed.
    fn delete_edge(&mut self, id: &ElementId) -> Result<usize>;
}

/// A transactional graph store.
///
/// Methods use `&self` so a store can be shared through `Arc`; implementors
/// use interior mutability.
pub trait GraphStore: Send + Sync {
    /// Runs `f` as one indivisible step.
    ///
    /// `operation` names the step for tracing and metrics.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or [`Error::OperationFailed`] if the store
    /// itself fails. On any error no change made by `f` is kept.
    fn atomically<R, F>(&self, operation: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn GraphTxn) -> Result<R>;

    /// Counts stored elements per label.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn stats(&self) -> Result<GraphStats>;
}

/// Element counts of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Total number of vertices.
    pub vertex_count: usize,
    /// Number of vertices by label.
    pub vertices_by_label: HashMap<VertexLabel, usize>,
    /// Total number of edges.
    pub edge_count: usize,
    /// Number of edges by label.
    pub edges_by_label: HashMap<EdgeLabel, usize>,
}

impl GraphStats {
    /// Creates empty stats.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `count` vertices with `label`.
    pub fn add_vertices(&mut self, label: VertexLabel, count: usize) {
        *self.vertices_by_label.entry(label).or_insert(0) += count;
        self.vertex_count += count;
    }

    /// Records `count` edges with `label`.
    pub fn add_edges(&mut self, label: EdgeLabel, count: usize) {
        *self.edges_by_label.entry(label).or_insert(0) += count;
        self.edge_count += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn props(pairs: &[(&str, PropertyValue)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_predicates() {
        let t = Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap();
        let p = props(&[("type", "host".into()), ("first_seen", t.into())]);

        assert!(Predicate::equals("type", "host").matches(&p));
        assert!(!Predicate::equals("type", "ip").matches(&p));
        assert!(Predicate::at_most("first_seen", t).matches(&p));
        assert!(Predicate::at_least("first_seen", t).matches(&p));
        assert!(!Predicate::at_least("first_seen", t + chrono::Duration::seconds(1)).matches(&p));
        assert!(!Predicate::equals("missing", "x").matches(&p));
        // Kind mismatch never matches.
        assert!(!Predicate::at_most("type", 5_i64).matches(&p));
    }

    #[test]
    fn test_property_update_apply() {
        let mut p = props(&[("end_time", PropertyValue::Int(1))]);
        PropertyUpdate::remove("end_time").apply(&mut p);
        assert!(p.is_empty());
        PropertyUpdate::set("name", "x").apply(&mut p);
        assert_eq!(p.get("name"), Some(&PropertyValue::Text("x".to_string())));
    }

    #[test]
    fn test_range_slice() {
        let range = Range::from(PageRequest::new(1, 2));
        assert_eq!(range.slice(vec![1, 2, 3, 4, 5]), vec![3, 4]);
        assert!(range.slice(vec![1]).is_empty());
    }

    #[test]
    fn test_vertex_accessors_report_inconsistency() {
        let v = Vertex {
            id: ElementId::new("v1"),
            label: VertexLabel::Team,
            properties: props(&[("identifier", "t1".into())]),
        };
        assert_eq!(v.text("identifier").unwrap(), "t1");
        assert!(matches!(v.text("name"), Err(Error::InconsistentState(_))));
        assert!(matches!(v.int("identifier"), Err(Error::InconsistentState(_))));
        assert_eq!(v.opt_time("end_time").unwrap(), None);
    }
}
