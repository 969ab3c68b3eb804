//! `SQLite` graph store.
//!
//! Persists the inventory graph in three tables and runs every atomic step
//! as one `BEGIN IMMEDIATE` transaction, so the find-then-write sequences of
//! the upsert engine cannot interleave, whether the writers share one store
//! handle or open the same database file independently.

// Allow cast_possible_truncation and cast_sign_loss for SQLite i64 to usize counts.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use crate::models::{EdgeLabel, ElementId, VertexLabel};
use crate::storage::traits::graph::{
    Edge, EdgeQuery, GraphStats, GraphStore, GraphTxn, Predicate, Properties, PropertyUpdate,
    PropertyValue, Range, Vertex, VertexQuery,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::instrument;

/// Helper to acquire mutex lock with poison recovery.
fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Graph SQLite mutex was poisoned, recovering");
            metrics::counter!("inventory_sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Maps a `rusqlite` error to [`Error::OperationFailed`].
fn sql_error(operation: &'static str) -> impl Fn(rusqlite::Error) -> Error {
    move |e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

/// Metrics status of a rolled back step.
///
/// A failed rollback is only logged; the caller still gets the step's own
/// error.
fn rollback_status(outcome: rusqlite::Result<()>) -> &'static str {
    match outcome {
        Ok(()) => "rolled_back",
        Err(e) => {
            tracing::warn!(error = %e, "Graph transaction rollback failed");
            "rollback_failed"
        },
    }
}

/// `SQLite`-based graph store.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` for thread-safe access within a process. Each
/// atomic step opens an `IMMEDIATE` transaction, taking the database write
/// lock up front; WAL mode and `busy_timeout` make other processes wait for
/// it instead of failing.
///
/// # Schema
///
/// - `graph_vertices`: id and label
/// - `graph_edges`: id, label and endpoints
/// - `graph_properties`: one typed row per element property (times are stored
///   as microseconds since the Unix epoch)
pub struct SqliteGraphStore {
    /// Connection to the `SQLite` database.
    conn: Mutex<Connection>,
    /// Path to the database (None for in-memory).
    db_path: Option<PathBuf>,
}

impl SqliteGraphStore {
    /// Opens (creating if needed) a store at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::operation_failed("create_graph_sqlite_dir", e))?;
        }
        let conn = Connection::open(&db_path).map_err(sql_error("open_graph_sqlite"))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };

        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory `SQLite` store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sql_error("open_graph_sqlite_memory"))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };

        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Initializes the database schema.
    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);

        // Enable WAL mode for better concurrent read performance
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.pragma_update(None, "synchronous", "NORMAL");
        let _ = conn.pragma_update(None, "busy_timeout", "5000");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS graph_vertices (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS graph_edges (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                from_id TEXT NOT NULL,
                to_id TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS graph_properties (
                element_id TEXT NOT NULL,
                key TEXT NOT NULL,
                kind TEXT NOT NULL,
                text_value TEXT,
                int_value INTEGER,
                PRIMARY KEY (element_id, key)
            );",
        )
        .map_err(sql_error("create_graph_tables"))?;

        Self::create_indexes(&conn);

        Ok(())
    }

    /// Creates indexes for optimized queries.
    fn create_indexes(conn: &Connection) {
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_graph_vertices_label ON graph_vertices(label, id)",
            [],
        );
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_graph_edges_from ON graph_edges(label, from_id)",
            [],
        );
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_graph_edges_to ON graph_edges(label, to_id)",
            [],
        );
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_graph_properties_text
             ON graph_properties(key, text_value)",
            [],
        );
    }
}

impl GraphStore for SqliteGraphStore {
    #[instrument(skip(self, f), fields(store = "sqlite"))]
    fn atomically<R, F>(&self, operation: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn GraphTxn) -> Result<R>,
    {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(sql_error("begin_graph_transaction"))?;

        let result = f(&mut SqliteTxn { conn: &*tx });

        let status = match &result {
            Ok(_) => {
                tx.commit().map_err(sql_error("commit_graph_transaction"))?;
                "committed"
            },
            Err(e) => {
                tracing::debug!(error = %e, "rolling back graph transaction");
                rollback_status(tx.rollback())
            },
        };
        metrics::counter!(
            "inventory_store_transactions_total",
            "store" => "sqlite",
            "operation" => operation.to_string(),
            "status" => status
        )
        .increment(1);
        result
    }

    #[instrument(skip(self))]
    fn stats(&self) -> Result<GraphStats> {
        let conn = acquire_lock(&self.conn);
        let mut stats = GraphStats::new();

        let mut stmt = conn
            .prepare("SELECT label, COUNT(*) FROM graph_vertices GROUP BY label")
            .map_err(sql_error("graph_stats"))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(sql_error("graph_stats"))?;
        for row in rows {
            let (label, count) = row.map_err(sql_error("graph_stats"))?;
            if let Some(label) = VertexLabel::parse(&label) {
                stats.add_vertices(label, count as usize);
            }
        }

        let mut stmt = conn
            .prepare("SELECT label, COUNT(*) FROM graph_edges GROUP BY label")
            .map_err(sql_error("graph_stats"))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(sql_error("graph_stats"))?;
        for row in rows {
            let (label, count) = row.map_err(sql_error("graph_stats"))?;
            if let Some(label) = EdgeLabel::parse(&label) {
                stats.add_edges(label, count as usize);
            }
        }

        Ok(stats)
    }
}

// ============================================================================
// Property encoding
// ============================================================================

/// Column layout of one property row: `(kind, text_value, int_value)`.
fn encode_property(value: &PropertyValue) -> (&'static str, Option<&str>, Option<i64>) {
    match value {
        PropertyValue::Text(s) => ("text", Some(s.as_str()), None),
        PropertyValue::Int(i) => ("int", None, Some(*i)),
        PropertyValue::Time(t) => ("time", None, Some(t.timestamp_micros())),
    }
}

fn decode_property(kind: &str, text: Option<String>, int: Option<i64>) -> Option<PropertyValue> {
    match kind {
        "text" => text.map(PropertyValue::Text),
        "int" => int.map(PropertyValue::Int),
        "time" => int
            .and_then(DateTime::<Utc>::from_timestamp_micros)
            .map(PropertyValue::Time),
        _ => None,
    }
}

/// SQL fragment and parameter for one predicate against element alias `alias`.
fn predicate_sql(alias: &str, predicate: &Predicate, params: &mut Vec<Value>) -> String {
    let (op, value) = match predicate {
        Predicate::Eq(_, v) => ("=", v),
        Predicate::AtMost(_, v) => ("<=", v),
        Predicate::AtLeast(_, v) => (">=", v),
    };
    let (kind, text, int) = encode_property(value);
    params.push(Value::Text(predicate.key().to_string()));
    params.push(Value::Text(kind.to_string()));
    let column = if let Some(text) = text {
        params.push(Value::Text(text.to_string()));
        "text_value"
    } else {
        params.push(Value::Integer(int.unwrap_or_default()));
        "int_value"
    };
    format!(
        " AND EXISTS (SELECT 1 FROM graph_properties p WHERE p.element_id = {alias}.id \
         AND p.key = ? AND p.kind = ? AND p.{column} {op} ?)"
    )
}

fn range_sql(range: Option<Range>, params: &mut Vec<Value>) -> &'static str {
    match range {
        Some(range) => {
            params.push(Value::Integer(i64::try_from(range.limit).unwrap_or(i64::MAX)));
            params.push(Value::Integer(i64::try_from(range.offset).unwrap_or(i64::MAX)));
            " LIMIT ? OFFSET ?"
        },
        None => "",
    }
}

// ============================================================================
// Transaction
// ============================================================================

/// One atomic step inside an open transaction.
struct SqliteTxn<'a> {
    conn: &'a Connection,
}

impl SqliteTxn<'_> {
    fn load_properties(&self, id: &ElementId) -> Result<Properties> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT key, kind, text_value, int_value FROM graph_properties WHERE element_id = ?1",
            )
            .map_err(sql_error("load_graph_properties"))?;
        let rows = stmt
            .query_map(params![id.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                ))
            })
            .map_err(sql_error("load_graph_properties"))?;

        let mut properties = Properties::new();
        for row in rows {
            let (key, kind, text, int) = row.map_err(sql_error("load_graph_properties"))?;
            let value = decode_property(&kind, text, int).ok_or_else(|| {
                Error::InconsistentState(format!("element {id} has a malformed '{key}' property"))
            })?;
            properties.insert(key, value);
        }
        Ok(properties)
    }

    fn write_properties(&self, id: &ElementId, updates: &[PropertyUpdate]) -> Result<()> {
        for update in updates {
            match update {
                PropertyUpdate::Set(key, value) => {
                    let (kind, text, int) = encode_property(value);
                    self.conn
                        .prepare_cached(
                            "INSERT INTO graph_properties (element_id, key, kind, text_value, int_value)
                             VALUES (?1, ?2, ?3, ?4, ?5)
                             ON CONFLICT(element_id, key) DO UPDATE SET
                                kind = excluded.kind,
                                text_value = excluded.text_value,
                                int_value = excluded.int_value",
                        )
                        .and_then(|mut stmt| stmt.execute(params![id.as_str(), key, kind, text, int]))
                        .map_err(sql_error("set_graph_property"))?;
                },
                PropertyUpdate::Remove(key) => {
                    self.conn
                        .execute(
                            "DELETE FROM graph_properties WHERE element_id = ?1 AND key = ?2",
                            params![id.as_str(), key],
                        )
                        .map_err(sql_error("remove_graph_property"))?;
                },
            }
        }
        Ok(())
    }

    fn insert_properties(&self, id: &ElementId, properties: &Properties) -> Result<()> {
        let updates: Vec<PropertyUpdate> = properties
            .iter()
            .map(|(key, value)| PropertyUpdate::Set(key.clone(), value.clone()))
            .collect();
        self.write_properties(id, &updates)
    }

    fn delete_properties(&self, id: &ElementId) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM graph_properties WHERE element_id = ?1",
                params![id.as_str()],
            )
            .map_err(sql_error("delete_graph_properties"))?;
        Ok(())
    }

    fn vertex_label(&self, id: &ElementId) -> Result<Option<VertexLabel>> {
        let label: Option<String> = self
            .conn
            .query_row(
                "SELECT label FROM graph_vertices WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_error("get_graph_vertex"))?;
        label
            .map(|label| {
                VertexLabel::parse(&label).ok_or_else(|| {
                    Error::InconsistentState(format!("vertex {id} has unknown label '{label}'"))
                })
            })
            .transpose()
    }

    fn edges_where(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Edge>> {
        let mut stmt = self.conn.prepare(sql).map_err(sql_error("find_graph_edges"))?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(sql_error("find_graph_edges"))?;

        let mut edges = Vec::new();
        for row in rows {
            let (id, label, from, to) = row.map_err(sql_error("find_graph_edges"))?;
            let id = ElementId::new(id);
            let label = EdgeLabel::parse(&label).ok_or_else(|| {
                Error::InconsistentState(format!("edge {id} has unknown label '{label}'"))
            })?;
            let properties = self.load_properties(&id)?;
            edges.push(Edge {
                id,
                label,
                from: ElementId::new(from),
                to: ElementId::new(to),
                properties,
            });
        }
        Ok(edges)
    }
}

impl GraphTxn for SqliteTxn<'_> {
    fn vertex(&mut self, id: &ElementId) -> Result<Option<Vertex>> {
        let Some(label) = self.vertex_label(id)? else {
            return Ok(None);
        };
        Ok(Some(Vertex {
            id: id.clone(),
            label,
            properties: self.load_properties(id)?,
        }))
    }

    fn find_vertices(&mut self, query: &VertexQuery) -> Result<Vec<Vertex>> {
        let mut params = vec![Value::Text(query.label.as_str().to_string())];
        let mut sql = String::from("SELECT v.id FROM graph_vertices v WHERE v.label = ?");

        if let Some((label, source)) = &query.linked_from {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM graph_edges e \
                 WHERE e.label = ? AND e.from_id = ? AND e.to_id = v.id)",
            );
            params.push(Value::Text(label.as_str().to_string()));
            params.push(Value::Text(source.as_str().to_string()));
        }
        for predicate in &query.predicates {
            sql.push_str(&predicate_sql("v", predicate, &mut params));
        }
        sql.push_str(" ORDER BY v.id");
        sql.push_str(range_sql(query.range, &mut params));

        let ids: Vec<String> = {
            let mut stmt = self.conn.prepare(&sql).map_err(sql_error("find_graph_vertices"))?;
            let rows = stmt
                .query_map(params_from_iter(params), |row| row.get(0))
                .map_err(sql_error("find_graph_vertices"))?;
            rows.collect::<rusqlite::Result<_>>()
                .map_err(sql_error("find_graph_vertices"))?
        };

        ids.into_iter()
            .map(|id| {
                let id = ElementId::new(id);
                let properties = self.load_properties(&id)?;
                Ok(Vertex {
                    id,
                    label: query.label,
                    properties,
                })
            })
            .collect()
    }

    fn create_vertex(&mut self, label: VertexLabel, properties: Properties) -> Result<Vertex> {
        let id = ElementId::generate();
        self.conn
            .execute(
                "INSERT INTO graph_vertices (id, label) VALUES (?1, ?2)",
                params![id.as_str(), label.as_str()],
            )
            .map_err(sql_error("create_graph_vertex"))?;
        self.insert_properties(&id, &properties)?;
        Ok(Vertex {
            id,
            label,
            properties,
        })
    }

    fn update_vertex_properties(
        &mut self,
        id: &ElementId,
        updates: &[PropertyUpdate],
    ) -> Result<Option<Vertex>> {
        if self.vertex_label(id)?.is_none() {
            return Ok(None);
        }
        self.write_properties(id, updates)?;
        self.vertex(id)
    }

    fn delete_vertex(&mut self, id: &ElementId) -> Result<usize> {
        if self.vertex_label(id)?.is_none() {
            return Ok(0);
        }

        let incident = self.edges_where(
            "SELECT id, label, from_id, to_id FROM graph_edges WHERE from_id = ?1 OR to_id = ?1",
            vec![Value::Text(id.as_str().to_string())],
        )?;
        for edge in &incident {
            self.delete_edge(&edge.id)?;
        }

        self.delete_properties(id)?;
        let deleted = self
            .conn
            .execute(
                "DELETE FROM graph_vertices WHERE id = ?1",
                params![id.as_str()],
            )
            .map_err(sql_error("delete_graph_vertex"))?;
        Ok(deleted)
    }

    fn edge(&mut self, id: &ElementId) -> Result<Option<Edge>> {
        let mut edges = self.edges_where(
            "SELECT id, label, from_id, to_id FROM graph_edges WHERE id = ?",
            vec![Value::Text(id.as_str().to_string())],
        )?;
        Ok(edges.pop())
    }

    fn find_edges(&mut self, query: &EdgeQuery) -> Result<Vec<Edge>> {
        let mut params = vec![Value::Text(query.label.as_str().to_string())];
        let mut sql =
            String::from("SELECT id, label, from_id, to_id FROM graph_edges WHERE label = ?");
        if let Some(from) = &query.from {
            sql.push_str(" AND from_id = ?");
            params.push(Value::Text(from.as_str().to_string()));
        }
        if let Some(to) = &query.to {
            sql.push_str(" AND to_id = ?");
            params.push(Value::Text(to.as_str().to_string()));
        }
        sql.push_str(" ORDER BY id");
        sql.push_str(range_sql(query.range, &mut params));

        self.edges_where(&sql, params)
    }

    fn create_edge(
        &mut self,
        label: EdgeLabel,
        from: &ElementId,
        to: &ElementId,
        properties: Properties,
    ) -> Result<Edge> {
        let id = ElementId::generate();
        self.conn
            .execute(
                "INSERT INTO graph_edges (id, label, from_id, to_id) VALUES (?1, ?2, ?3, ?4)",
                params![id.as_str(), label.as_str(), from.as_str(), to.as_str()],
            )
            .map_err(sql_error("create_graph_edge"))?;
        self.insert_properties(&id, &properties)?;
        Ok(Edge {
            id,
            label,
            from: from.clone(),
            to: to.clone(),
            properties,
        })
    }

    fn update_edge_properties(
        &mut self,
        id: &ElementId,
        updates: &[PropertyUpdate],
    ) -> Result<Option<Edge>> {
        if self.edge(id)?.is_none() {
            return Ok(None);
        }
        self.write_properties(id, updates)?;
        self.edge(id)
    }

    fn delete_edge(&mut self, id: &ElementId) -> Result<usize> {
        self.delete_properties(id)?;
        self.conn
            .execute("DELETE FROM graph_edges WHERE id = ?1", params![id.as_str()])
            .map_err(sql_error("delete_graph_edge"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn props(pairs: Vec<(&str, PropertyValue)>) -> Properties {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_properties_roundtrip_through_columns() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let t = Utc.with_ymd_and_hms(2021, 7, 1, 12, 30, 0).unwrap();
        let created = store
            .atomically("seed", |txn| {
                txn.create_vertex(
                    VertexLabel::Universe,
                    props(vec![("namespace", "ns".into()), ("version", 1_i64.into()), ("at", t.into())]),
                )
            })
            .unwrap();

        let loaded = store
            .atomically("get", |txn| txn.vertex(&created.id))
            .unwrap()
            .unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.time("at").unwrap(), t);
    }

    #[test]
    fn test_predicates_and_range() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let day = |d| Utc.with_ymd_and_hms(2021, 7, d, 0, 0, 0).unwrap();
        store
            .atomically("seed", |txn| {
                for d in 1..=5 {
                    txn.create_vertex(
                        VertexLabel::Asset,
                        props(vec![("type", "host".into()), ("first_seen", day(d).into())]),
                    )?;
                }
                txn.create_vertex(VertexLabel::Asset, props(vec![("type", "ip".into())]))
            })
            .unwrap();

        let query = VertexQuery::new(VertexLabel::Asset)
            .with(Predicate::equals("type", "host"))
            .with(Predicate::at_most("first_seen", day(3)));
        let found = store.atomically("find", |txn| txn.find_vertices(&query)).unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.windows(2).all(|w| w[0].id < w[1].id));

        let paged = query.page(Some(crate::models::PageRequest::new(1, 2)));
        let page = store.atomically("page", |txn| txn.find_vertices(&paged)).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, found[2].id);
    }

    #[test]
    fn test_error_rolls_back_transaction() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let result: Result<()> = store.atomically("failing", |txn| {
            txn.create_vertex(VertexLabel::Team, Properties::new())?;
            Err(Error::Conflict("t1".to_string()))
        });
        assert!(matches!(result, Err(Error::Conflict(_))));
        assert_eq!(store.stats().unwrap().vertex_count, 0);
    }

    #[test]
    fn test_remove_property_and_delete_vertex_cascades_edges() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let t = Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap();
        let (team, asset, owns) = store
            .atomically("seed", |txn| {
                let team = txn.create_vertex(VertexLabel::Team, Properties::new())?;
                let asset = txn.create_vertex(VertexLabel::Asset, Properties::new())?;
                let owns = txn.create_edge(
                    EdgeLabel::Owns,
                    &team.id,
                    &asset.id,
                    props(vec![("start_time", t.into()), ("end_time", t.into())]),
                )?;
                Ok((team, asset, owns))
            })
            .unwrap();

        let updated = store
            .atomically("clear", |txn| {
                txn.update_edge_properties(&owns.id, &[PropertyUpdate::remove("end_time")])
            })
            .unwrap()
            .unwrap();
        assert_eq!(updated.opt_time("end_time").unwrap(), None);
        assert_eq!(updated.time("start_time").unwrap(), t);

        assert_eq!(store.atomically("delete", |txn| txn.delete_vertex(&team.id)).unwrap(), 1);
        let stats = store.stats().unwrap();
        assert_eq!(stats.vertex_count, 1);
        assert_eq!(stats.edge_count, 0);
        assert!(store.atomically("get", |txn| txn.vertex(&asset.id)).unwrap().is_some());
    }

    #[test]
    fn test_reopen_file_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("graph.db");
        {
            let store = SqliteGraphStore::new(&path).unwrap();
            assert_eq!(store.db_path(), Some(path.as_path()));
            store
                .atomically("seed", |txn| txn.create_vertex(VertexLabel::Team, Properties::new()))
                .unwrap();
        }
        let store = SqliteGraphStore::new(&path).unwrap();
        assert_eq!(store.stats().unwrap().vertices_by_label.get(&VertexLabel::Team), Some(&1));
    }

    #[test]
    fn test_failed_rollback_is_reported_not_raised() {
        assert_eq!(rollback_status(Ok(())), "rolled_back");
        assert_eq!(
            rollback_status(Err(rusqlite::Error::ExecuteReturnedResults)),
            "rollback_failed"
        );
    }
}
