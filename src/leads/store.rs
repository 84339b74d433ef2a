use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::leads::migrations::LEADS_MIGRATION;
use crate::leads::LeadRecord;

pub struct LeadStore {
    conn: Connection,
}

impl LeadStore {
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

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(LEADS_MIGRATION)?;
        Ok(())
    }

    /// Persists a lead and returns its row id.
    pub fn insert_lead(&self, record: &LeadRecord) -> Result<i64> {
        self.conn.execute(
            r#"
INSERT INTO leads(
    full_name, email, business_name, best_grant_name, best_grant_amount,
    total_project_value, catalog_fingerprint, email_sent, email_sent_at, created_at, lead_json
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
"#,
            params![
                record.full_name,
                record.email,
                record.business_name,
                record.best_grant_name,
                record.best_grant_amount,
                record.total_project_value,
                record.catalog_fingerprint,
                if record.email_sent { 1 } else { 0 },
                record.email_sent_at.map(|at| at.to_rfc3339()),
                record.created_at.to_rfc3339(),
                serde_json::to_string(record)?
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent leads first.
    pub fn list_leads(&self, limit: usize) -> Result<Vec<LeadRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
SELECT id, email_sent, email_sent_at, lead_json
FROM leads
ORDER BY created_at DESC, id DESC
LIMIT ?1
"#,
        )?;
        let rows = stmt
            .query_map(params![limit as i64], row_to_parts)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut records = Vec::with_capacity(rows.len());
        for parts in rows {
            records.push(parts.into_record()?);
        }
        Ok(records)
    }

    pub fn latest_for_email(&self, email: &str) -> Result<Option<LeadRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
SELECT id, email_sent, email_sent_at, lead_json
FROM leads
WHERE email = ?1 COLLATE NOCASE
ORDER BY created_at DESC, id DESC
LIMIT 1
"#,
        )?;
        match stmt.query_row(params![email.trim()], row_to_parts) {
            Ok(parts) => Ok(Some(parts.into_record()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Flags the most recent lead for `email` as reported. Returns false when
    /// no lead exists for that address.
    pub fn mark_email_sent(&self, email: &str) -> Result<bool> {
        self.mark_email_sent_at(email, Utc::now())
    }

    pub fn mark_email_sent_at(&self, email: &str, sent_at: DateTime<Utc>) -> Result<bool> {
        let Some(lead) = self.latest_for_email(email)? else {
            return Ok(false);
        };
        let updated = self.conn.execute(
            "UPDATE leads SET email_sent = 1, email_sent_at = ?1 WHERE id = ?2",
            params![sent_at.to_rfc3339(), lead.id],
        )?;
        Ok(updated > 0)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

struct LeadRow {
    id: i64,
    email_sent: bool,
    email_sent_at: Option<String>,
    lead_json: String,
}

impl LeadRow {
    /// Row columns win over the stored JSON for fields updated after insert.
    fn into_record(self) -> Result<LeadRecord> {
        let mut record: LeadRecord = serde_json::from_str(&self.lead_json)?;
        record.id = self.id;
        record.email_sent = self.email_sent;
        record.email_sent_at = self.email_sent_at.as_deref().and_then(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        });
        Ok(record)
    }
}

fn row_to_parts(row: &rusqlite::Row<'_>) -> rusqlite::Result<LeadRow> {
    Ok(LeadRow {
        id: row.get(0)?,
        email_sent: row.get::<_, i64>(1)? != 0,
        email_sent_at: row.get(2)?,
        lead_json: row.get(3)?,
    })
}
