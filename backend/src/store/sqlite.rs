use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{Document, DocumentStore, StoreError, StoredDocument};

/// SQLite-backed document store. Each document is one JSON row.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        // Create parent directories if needed
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Database(e.to_string()))?;
            }
        }

        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )",
            [],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::info!("Document store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:")
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

fn read_body(conn: &Connection, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))?;

    body.map(|b| parse_body(&b)).transpose()
}

fn parse_body(body: &str) -> Result<Document, StoreError> {
    match serde_json::from_str(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::InvalidDocument("body is not an object".to_string())),
        Err(e) => Err(StoreError::InvalidDocument(e.to_string())),
    }
}

fn encode_body(doc: &Document) -> Result<String, StoreError> {
    serde_json::to_string(doc).map_err(|e| StoreError::InvalidDocument(e.to_string()))
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let conn = self.lock()?;
        read_body(&conn, collection, id)
    }

    async fn set(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        let body = encode_body(doc)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
            params![collection, id, body],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!("Set document {}/{}", collection, id);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &Document,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;

        let mut doc = read_body(&conn, collection, id)?
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;

        for (key, value) in fields {
            doc.insert(key.clone(), value.clone());
        }

        conn.execute(
            "UPDATE documents SET body = ?1 WHERE collection = ?2 AND id = ?3",
            params![encode_body(&doc)?, collection, id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!("Updated {} field(s) of {}/{}", fields.len(), collection, id);
        Ok(())
    }

    async fn add(&self, collection: &str, doc: &Document) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let body = encode_body(doc)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
            params![collection, id, body],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!("Added document {}/{}", collection, id);
        Ok(id)
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let path = format!("$.\"{}\"", field);
        let needle = value.to_string();
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, body FROM documents
                 WHERE collection = ?1 AND json_extract(body, ?2) = json_extract(?3, '$')
                 ORDER BY rowid",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![collection, path, needle], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, body) = row.map_err(|e| StoreError::Database(e.to_string()))?;
            documents.push(StoredDocument {
                id,
                fields: parse_body(&body)?,
            });
        }
        Ok(documents)
    }
}
