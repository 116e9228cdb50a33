//! SQL schema for the Siren SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id    TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    first_name    TEXT,
    last_name     TEXT,
    phone_number  TEXT,
    role          TEXT NOT NULL,   -- 'victim' | 'responder'
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- Reference data; rows are never updated.
CREATE TABLE IF NOT EXISTS emergency_types (
    emergency_type_id TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    description       TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS responders (
    responder_id   TEXT PRIMARY KEY,
    account_id     TEXT NOT NULL UNIQUE REFERENCES accounts(account_id) ON DELETE CASCADE,
    organization   TEXT NOT NULL,
    contact_number TEXT NOT NULL,
    available      INTEGER NOT NULL DEFAULT 1,
    latitude       REAL NOT NULL,
    longitude      REAL NOT NULL,
    last_updated   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS responder_emergency_types (
    responder_id      TEXT NOT NULL REFERENCES responders(responder_id) ON DELETE CASCADE,
    emergency_type_id TEXT NOT NULL REFERENCES emergency_types(emergency_type_id),
    PRIMARY KEY (responder_id, emergency_type_id)
);

CREATE TABLE IF NOT EXISTS alerts (
    alert_id              TEXT PRIMARY KEY,
    requester_id          TEXT NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    emergency_type_id     TEXT REFERENCES emergency_types(emergency_type_id) ON DELETE RESTRICT,
    latitude              REAL NOT NULL,
    longitude             REAL NOT NULL,
    created_at            TEXT NOT NULL,   -- immutable once set
    status                TEXT NOT NULL DEFAULT 'pending',
    description           TEXT NOT NULL DEFAULT '',
    assigned_responder_id TEXT REFERENCES responders(responder_id) ON DELETE SET NULL,
    CHECK (status IN ('pending', 'dispatched', 'in_progress', 'resolved'))
);

-- Messages are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS messages (
    message_id     TEXT PRIMARY KEY,
    alert_id       TEXT NOT NULL REFERENCES alerts(alert_id) ON DELETE CASCADE,
    sender_id      TEXT NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    body           TEXT NOT NULL,
    sent_at        TEXT NOT NULL,
    from_responder INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS responder_types_type_idx ON responder_emergency_types(emergency_type_id);
CREATE INDEX IF NOT EXISTS alerts_requester_idx     ON alerts(requester_id);
CREATE INDEX IF NOT EXISTS alerts_responder_idx     ON alerts(assigned_responder_id);
CREATE INDEX IF NOT EXISTS messages_alert_idx       ON messages(alert_id, sent_at);

PRAGMA user_version = 1;
";
