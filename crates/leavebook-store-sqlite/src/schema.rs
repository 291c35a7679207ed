//! SQL schema for the Leavebook SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Directory mirror. group_admin_id may name a user synced later.
CREATE TABLE IF NOT EXISTS users (
    user_id        INTEGER PRIMARY KEY,
    company_id     INTEGER NOT NULL,
    role           TEXT    NOT NULL,   -- 'employee' | 'group_admin' | 'management'
    gender         TEXT,               -- 'male' | 'female' | 'other' or NULL
    group_admin_id INTEGER,
    joined_on      TEXT,               -- YYYY-MM-DD
    is_active      INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS leave_types (
    leave_type_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id             INTEGER,    -- NULL: visible to every company
    name                   TEXT    NOT NULL,
    max_days               INTEGER NOT NULL CHECK (max_days > 0),
    is_paid                INTEGER NOT NULL DEFAULT 1,
    requires_documentation INTEGER NOT NULL DEFAULT 0,
    is_active              INTEGER NOT NULL DEFAULT 1
);

-- At most one policy per leave type.
CREATE TABLE IF NOT EXISTS leave_policies (
    leave_type_id        INTEGER PRIMARY KEY REFERENCES leave_types(leave_type_id),
    notice_period_days   INTEGER NOT NULL DEFAULT 0,
    max_consecutive_days INTEGER,
    min_service_days     INTEGER NOT NULL DEFAULT 0,
    gender_specific      TEXT,
    default_days         INTEGER NOT NULL,
    carry_forward_days   INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS leave_balances (
    user_id            INTEGER NOT NULL REFERENCES users(user_id),
    leave_type_id      INTEGER NOT NULL REFERENCES leave_types(leave_type_id),
    year               INTEGER NOT NULL,
    total_days         INTEGER NOT NULL,
    used_days          INTEGER NOT NULL DEFAULT 0,
    pending_days       INTEGER NOT NULL DEFAULT 0,
    carry_forward_days INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, leave_type_id, year),
    CHECK (used_days >= 0 AND pending_days >= 0),
    CHECK (used_days + pending_days <= total_days + carry_forward_days)
);

-- Requests are never deleted; status only moves through the lifecycle.
CREATE TABLE IF NOT EXISTS leave_requests (
    request_id       TEXT PRIMARY KEY,
    user_id          INTEGER NOT NULL REFERENCES users(user_id),
    leave_type_id    INTEGER NOT NULL REFERENCES leave_types(leave_type_id),
    start_date       TEXT    NOT NULL,
    end_date         TEXT    NOT NULL,
    days_requested   INTEGER NOT NULL,
    reason           TEXT    NOT NULL,
    contact_number   TEXT    NOT NULL,
    status           TEXT    NOT NULL DEFAULT 'pending',
    rejection_reason TEXT,
    group_admin_id   INTEGER,
    created_at       TEXT    NOT NULL,   -- RFC 3339 UTC, fixed width
    updated_at       TEXT    NOT NULL,
    CHECK (end_date >= start_date)
);

CREATE TABLE IF NOT EXISTS leave_documents (
    document_id   TEXT PRIMARY KEY,
    request_id    TEXT NOT NULL REFERENCES leave_requests(request_id) ON DELETE CASCADE,
    file_name     TEXT NOT NULL,
    file_type     TEXT NOT NULL,
    file_data     BLOB NOT NULL,
    upload_method TEXT NOT NULL,
    uploaded_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS leave_escalations (
    escalation_id    TEXT PRIMARY KEY,
    request_id       TEXT    NOT NULL REFERENCES leave_requests(request_id),
    escalated_by     INTEGER NOT NULL,
    escalated_to     INTEGER NOT NULL,
    reason           TEXT    NOT NULL,
    status           TEXT    NOT NULL DEFAULT 'pending',
    resolution_notes TEXT,
    created_at       TEXT    NOT NULL,
    resolved_at      TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS escalations_open_idx
    ON leave_escalations(request_id) WHERE status = 'pending';
CREATE INDEX IF NOT EXISTS users_company_role_idx ON users(company_id, role, is_active);
CREATE INDEX IF NOT EXISTS requests_user_idx      ON leave_requests(user_id, status);
CREATE INDEX IF NOT EXISTS requests_admin_idx     ON leave_requests(group_admin_id, status);
CREATE INDEX IF NOT EXISTS documents_request_idx  ON leave_documents(request_id);

PRAGMA user_version = 1;
";
