//! SQL schema for the SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    display_name TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS teams (
    team_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- user_id is the direct owner; team_id the team the stream was created under.
-- Both may be set.
CREATE TABLE IF NOT EXISTS streams (
    stream_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL,
    user_id    INTEGER REFERENCES users(user_id) ON DELETE SET NULL,
    team_id    INTEGER REFERENCES teams(team_id) ON DELETE SET NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS team_members (
    team_id   INTEGER NOT NULL REFERENCES teams(team_id) ON DELETE CASCADE,
    user_id   INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    role      TEXT NOT NULL CHECK (role IN ('owner', 'editor', 'viewer')),
    joined_at TEXT NOT NULL,
    PRIMARY KEY (team_id, user_id)
);

CREATE TABLE IF NOT EXISTS team_stream_shares (
    team_id      INTEGER NOT NULL REFERENCES teams(team_id) ON DELETE CASCADE,
    stream_id    INTEGER NOT NULL REFERENCES streams(stream_id) ON DELETE CASCADE,
    access_level TEXT NOT NULL CHECK (access_level IN ('view', 'edit')),
    shared_at    TEXT NOT NULL,
    PRIMARY KEY (team_id, stream_id)
);

CREATE TABLE IF NOT EXISTS contacts (
    contact_id INTEGER PRIMARY KEY AUTOINCREMENT,
    stream_id  INTEGER NOT NULL REFERENCES streams(stream_id) ON DELETE CASCADE,
    name       TEXT NOT NULL,
    email      TEXT,
    company    TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contact_notes (
    note_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id INTEGER NOT NULL REFERENCES contacts(contact_id) ON DELETE CASCADE,
    author_id  INTEGER NOT NULL REFERENCES users(user_id),
    body       TEXT NOT NULL,
    is_private INTEGER NOT NULL DEFAULT 0,
    notify     TEXT NOT NULL DEFAULT '[]',   -- JSON array of user ids
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cohorts (
    cohort_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    stream_id   INTEGER NOT NULL REFERENCES streams(stream_id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    description TEXT,
    created_by  INTEGER NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cohort_members (
    cohort_id  INTEGER NOT NULL REFERENCES cohorts(cohort_id) ON DELETE CASCADE,
    contact_id INTEGER NOT NULL REFERENCES contacts(contact_id) ON DELETE CASCADE,
    added_at   TEXT NOT NULL,
    PRIMARY KEY (cohort_id, contact_id)
);

CREATE INDEX IF NOT EXISTS streams_user_idx        ON streams(user_id);
CREATE INDEX IF NOT EXISTS streams_team_idx        ON streams(team_id);
CREATE INDEX IF NOT EXISTS team_members_user_idx   ON team_members(user_id);
CREATE INDEX IF NOT EXISTS shares_stream_idx       ON team_stream_shares(stream_id);
CREATE INDEX IF NOT EXISTS contacts_stream_idx     ON contacts(stream_id);
CREATE INDEX IF NOT EXISTS contact_notes_contact_idx ON contact_notes(contact_id);
CREATE INDEX IF NOT EXISTS cohorts_stream_idx      ON cohorts(stream_id);
CREATE INDEX IF NOT EXISTS cohort_members_contact_idx ON cohort_members(contact_id);

PRAGMA user_version = 1;
";
