use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use uuid::Uuid;

/// One stored document: store-assigned opaque id plus the JSON payload.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub doc: Value,
}

/// A filtered scan over one collection. Clauses apply to top-level fields
/// of the document; strings compare lexicographically, numbers numerically.
/// That is the whole query surface the backing store offers: no joins, no
/// uniqueness constraints, no cross-document transactions.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone)]
enum Clause {
    Eq(String, Value),
    Gte(String, Value),
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(field.to_string(), value.into()));
        self
    }

    pub fn gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Gte(field.to_string(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|c| match c {
            Clause::Eq(field, want) => doc.get(field) == Some(want),
            Clause::Gte(field, want) => match (doc.get(field), want) {
                (Some(Value::String(have)), Value::String(want)) => have.as_str() >= want.as_str(),
                (Some(Value::Number(have)), Value::Number(want)) => {
                    match (have.as_f64(), want.as_f64()) {
                        (Some(h), Some(w)) => h >= w,
                        _ => false,
                    }
                }
                _ => false,
            },
        })
    }
}

#[derive(Debug)]
pub enum StoreError {
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Backend(msg) => write!(f, "store backend error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Keyed-document persistence: per-key CRUD plus filtered scans. The trait
/// is the seam the whole core talks through, so tests can inject `MemStore`
/// and production code can carry `SqliteStore` without the callers caring.
pub trait Store: Send {
    fn insert(&self, collection: &str, doc: &Value) -> Result<String, StoreError>;
    fn put(&self, collection: &str, id: &str, doc: &Value) -> Result<(), StoreError>;
    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;
    fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;
    fn scan(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;
}

/// SQLite-backed document store. Every document is a JSON blob in one
/// `documents` table keyed by (collection, id); filters run doc-side so the
/// store surface stays exactly the keyed-CRUD-plus-scan contract.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace)?;
        let db_path = workspace.join("rollbook.sqlite3");
        let conn = Connection::open(db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents(
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                doc TEXT NOT NULL,
                PRIMARY KEY(collection, id)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)",
            [],
        )?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }
}

impl Store for SqliteStore {
    fn insert(&self, collection: &str, doc: &Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn.lock().map_err(|e| StoreError::Backend(e.to_string()))?;
        conn.execute(
            "INSERT INTO documents(collection, id, doc) VALUES(?, ?, ?)",
            (collection, &id, serde_json::to_string(doc)?),
        )?;
        Ok(id)
    }

    fn put(&self, collection: &str, id: &str, doc: &Value) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|e| StoreError::Backend(e.to_string()))?;
        conn.execute(
            "INSERT INTO documents(collection, id, doc) VALUES(?, ?, ?)
             ON CONFLICT(collection, id) DO UPDATE SET doc = excluded.doc",
            (collection, id, serde_json::to_string(doc)?),
        )?;
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let conn = self.conn.lock().map_err(|e| StoreError::Backend(e.to_string()))?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT doc FROM documents WHERE collection = ? AND id = ?",
                (collection, id),
                |r| r.get(0),
            )
            .optional()?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().map_err(|e| StoreError::Backend(e.to_string()))?;
        let n = conn.execute(
            "DELETE FROM documents WHERE collection = ? AND id = ?",
            (collection, id),
        )?;
        Ok(n > 0)
    }

    fn scan(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let conn = self.conn.lock().map_err(|e| StoreError::Backend(e.to_string()))?;
        let mut stmt =
            conn.prepare("SELECT id, doc FROM documents WHERE collection = ? ORDER BY id")?;
        let rows = stmt
            .query_map([collection], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = Vec::new();
        for (id, raw) in rows {
            let doc: Value = serde_json::from_str(&raw)?;
            if filter.matches(&doc) {
                out.push(Document { id, doc });
            }
        }
        Ok(out)
    }
}

/// In-memory store for tests. Same contract, same id-ordered scans.
#[derive(Default)]
pub struct MemStore {
    collections: Mutex<BTreeMap<String, BTreeMap<String, Value>>>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }
}

impl Store for MemStore {
    fn insert(&self, collection: &str, doc: &Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut cols = self
            .collections
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        cols.entry(collection.to_string())
            .or_default()
            .insert(id.clone(), doc.clone());
        Ok(id)
    }

    fn put(&self, collection: &str, id: &str, doc: &Value) -> Result<(), StoreError> {
        let mut cols = self
            .collections
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        cols.entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc.clone());
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let cols = self
            .collections
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(cols.get(collection).and_then(|c| c.get(id)).cloned())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut cols = self
            .collections
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(cols
            .get_mut(collection)
            .map(|c| c.remove(id).is_some())
            .unwrap_or(false))
    }

    fn scan(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let cols = self
            .collections
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let Some(col) = cols.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(col
            .iter()
            .filter(|(_, doc)| filter.matches(doc))
            .map(|(id, doc)| Document {
                id: id.clone(),
                doc: doc.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mem_store_crud_roundtrip() {
        let store = MemStore::new();
        let id = store
            .insert("students", &json!({ "firstName": "Ana" }))
            .unwrap();
        let doc = store.get("students", &id).unwrap().unwrap();
        assert_eq!(doc["firstName"], "Ana");

        store
            .put("students", &id, &json!({ "firstName": "Ana", "active": true }))
            .unwrap();
        let doc = store.get("students", &id).unwrap().unwrap();
        assert_eq!(doc["active"], true);

        assert!(store.delete("students", &id).unwrap());
        assert!(!store.delete("students", &id).unwrap());
        assert!(store.get("students", &id).unwrap().is_none());
    }

    #[test]
    fn filter_eq_and_gte_clauses() {
        let f = Filter::new()
            .eq("status", "absent")
            .gte("date", "2026-03-01T00:00:00Z");
        assert!(f.matches(&json!({ "status": "absent", "date": "2026-03-02T09:00:00Z" })));
        assert!(!f.matches(&json!({ "status": "present", "date": "2026-03-02T09:00:00Z" })));
        assert!(!f.matches(&json!({ "status": "absent", "date": "2026-02-28T09:00:00Z" })));
        assert!(!f.matches(&json!({ "status": "absent" })));
    }

    #[test]
    fn scan_filters_within_one_collection() {
        let store = MemStore::new();
        store
            .insert("students", &json!({ "gradeId": "g1", "firstName": "Ana" }))
            .unwrap();
        store
            .insert("students", &json!({ "gradeId": "g2", "firstName": "Bruno" }))
            .unwrap();
        store
            .insert("grades", &json!({ "gradeId": "g1" }))
            .unwrap();

        let hits = store
            .scan("students", &Filter::new().eq("gradeId", "g1"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc["firstName"], "Ana");
    }
}
