//! SQL schema for the ContObra SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    uid               TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    email             TEXT NOT NULL UNIQUE,
    password_hash     TEXT NOT NULL,   -- argon2 PHC string
    role              TEXT,            -- 'admin' | 'supervisor' | 'operador' | NULL
    assigned_projects TEXT NOT NULL DEFAULT '[]',  -- JSON array of project ids
    created_at        TEXT NOT NULL    -- ISO 8601 UTC
);

CREATE TABLE IF NOT EXISTS projects (
    project_id    TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    lat           REAL NOT NULL,
    lon           REAL NOT NULL,
    radius_m      REAL NOT NULL CHECK (radius_m >= 0),
    supervisor_id TEXT NOT NULL REFERENCES users(uid),
    status        TEXT NOT NULL DEFAULT 'iniciando',  -- 'iniciando' | 'proceso' | 'terminando'
    start_date    TEXT NOT NULL,
    estimated_end TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

-- Evidence rows are written once; the only update ever issued is the single
-- review transition out of 'pendiente'.
CREATE TABLE IF NOT EXISTS evidence (
    evidence_id  TEXT PRIMARY KEY,
    project_id   TEXT NOT NULL REFERENCES projects(project_id),
    operator_id  TEXT NOT NULL REFERENCES users(uid),
    kind         TEXT NOT NULL,   -- 'foto' | 'video'
    media_url    TEXT NOT NULL,
    lat          REAL NOT NULL,
    lon          REAL NOT NULL,
    description  TEXT NOT NULL,
    submitted_at TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'pendiente',  -- 'pendiente' | 'aprobado' | 'rechazado'
    reviewed_by  TEXT REFERENCES users(uid),
    reviewed_at  TEXT
);

-- One row per operator, overwritten in place. No history.
CREATE TABLE IF NOT EXISTS live_positions (
    operator_id    TEXT PRIMARY KEY REFERENCES users(uid),
    lat            REAL NOT NULL,
    lon            REAL NOT NULL,
    updated_at     TEXT NOT NULL,
    active_project TEXT             -- NULL when no obra is active
);

CREATE INDEX IF NOT EXISTS evidence_project_idx    ON evidence(project_id);
CREATE INDEX IF NOT EXISTS evidence_status_idx     ON evidence(status);
CREATE INDEX IF NOT EXISTS projects_supervisor_idx ON projects(supervisor_id);

PRAGMA user_version = 1;
";
