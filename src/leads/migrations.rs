pub const LEADS_MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS leads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL,
    email TEXT NOT NULL,
    business_name TEXT,
    best_grant_name TEXT,
    best_grant_amount REAL,
    total_project_value REAL NOT NULL,
    catalog_fingerprint TEXT NOT NULL,
    email_sent INTEGER NOT NULL DEFAULT 0,
    email_sent_at TEXT,
    created_at TEXT NOT NULL,
    lead_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_leads_email_created
    ON leads(email, created_at DESC);
"#;
