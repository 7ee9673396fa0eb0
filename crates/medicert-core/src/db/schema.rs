//! SQLite schema definition.

/// Complete database schema for medicert. Idempotent; applied inside one
/// transaction on every open.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL,
    birth_date TEXT,
    national_id TEXT UNIQUE,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_full_name ON patients(full_name);

-- ============================================================================
-- Certificates
-- ============================================================================

CREATE TABLE IF NOT EXISTS certificates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    issue_date TEXT NOT NULL,
    leave_duration_days INTEGER,
    diagnosis TEXT,
    pdf_path TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_certificates_patient ON certificates(patient_id);
CREATE INDEX IF NOT EXISTS idx_certificates_created ON certificates(created_at);

-- ============================================================================
-- Audit log (reserved; nothing writes or reads it yet)
-- ============================================================================

CREATE TABLE IF NOT EXISTS audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    action TEXT NOT NULL,
    details TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
