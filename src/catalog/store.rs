use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, Connection};

use crate::catalog::schema::{CatalogSnapshot, GrantScheme};

const CATALOG_MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS grant_schemes (
    id TEXT PRIMARY KEY,
    scheme_name TEXT NOT NULL,
    is_active INTEGER NOT NULL,
    scheme_json TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

const UPSERT_SCHEME: &str = r#"
INSERT INTO grant_schemes(id, scheme_name, is_active, scheme_json, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(id) DO UPDATE SET
    scheme_name = excluded.scheme_name,
    is_active = excluded.is_active,
    scheme_json = excluded.scheme_json,
    updated_at = excluded.updated_at
"#;

#[derive(Debug)]
pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(CATALOG_MIGRATION)?;
        Ok(())
    }

    pub fn upsert_scheme(&self, scheme: &GrantScheme) -> Result<()> {
        self.conn.execute(
            UPSERT_SCHEME,
            params![
                scheme.id,
                scheme.name,
                if scheme.is_active { 1 } else { 0 },
                serde_json::to_string(scheme)?,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn upsert_all(&mut self, schemes: &[GrantScheme]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for scheme in schemes {
            tx.execute(
                UPSERT_SCHEME,
                params![
                    scheme.id,
                    scheme.name,
                    if scheme.is_active { 1 } else { 0 },
                    serde_json::to_string(scheme)?,
                    Utc::now().to_rfc3339()
                ],
            )?;
        }
        tx.commit()?;
        Ok(schemes.len())
    }

    pub fn get_scheme(&self, id: &str) -> Result<Option<GrantScheme>> {
        let mut stmt = self
            .conn
            .prepare("SELECT scheme_json FROM grant_schemes WHERE id = ?1")?;
        let result = stmt.query_row(params![id], |row| row.get::<_, String>(0));
        match result {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Activates or deactivates a scheme; inactive schemes are skipped by triage.
    pub fn set_active(&self, id: &str, active: bool) -> Result<()> {
        let mut scheme = self
            .get_scheme(id)?
            .ok_or_else(|| anyhow!("unknown grant scheme: {id}"))?;
        scheme.is_active = active;
        self.upsert_scheme(&scheme)
    }

    pub fn list_schemes(&self) -> Result<Vec<GrantScheme>> {
        let mut stmt = self
            .conn
            .prepare("SELECT scheme_json FROM grant_schemes ORDER BY id ASC")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut schemes = Vec::with_capacity(rows.len());
        for json in rows {
            schemes.push(serde_json::from_str(&json)?);
        }
        Ok(schemes)
    }

    pub fn is_empty(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM grant_schemes", [], |row| row.get(0))?;
        Ok(count == 0)
    }

    pub fn snapshot(&self) -> Result<CatalogSnapshot> {
        Ok(CatalogSnapshot::with_hash("catalog-db", self.list_schemes()?))
    }
}
