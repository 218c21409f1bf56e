//! SQLite schema for the headword store.
//!
//! - `headwords` keeps one row per key with the display spelling and level
//! - `edges` keeps at most one typed edge per ordered pair; both endpoints
//!   reference `headwords` and cascade on delete
//! - `store_meta` mirrors the schema version for external tooling
//!
//! Edge types use the persisted integer codes (`0` undefined, `1` depends,
//! `2` subclass). Inverse kinds never reach the table.

/// Migration v1: headwords, edges and store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS headwords (
    headword_key TEXT PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    level INTEGER NOT NULL DEFAULT -1 CHECK (level >= -1)
);

CREATE TABLE IF NOT EXISTS edges (
    from_key TEXT NOT NULL REFERENCES headwords(headword_key) ON DELETE CASCADE,
    to_key TEXT NOT NULL REFERENCES headwords(headword_key) ON DELETE CASCADE,
    kind INTEGER NOT NULL DEFAULT 0 CHECK (kind IN (0, 1, 2)),
    PRIMARY KEY (from_key, to_key),
    CHECK (from_key <> to_key)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: reverse-lookup index and a display-name view over edges.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_edges_to_kind
    ON edges(to_key, kind, from_key);

CREATE INDEX IF NOT EXISTS idx_headwords_level
    ON headwords(level, headword_key);

CREATE VIEW IF NOT EXISTS edge_names AS
SELECT
    f.name AS from_name,
    t.name AS to_name,
    e.kind AS kind,
    e.from_key AS from_key,
    e.to_key AS to_key
FROM edges e
JOIN headwords f ON f.headword_key = e.from_key
JOIN headwords t ON t.headword_key = e.to_key;
";

/// Indexes the latest schema must contain.
pub const REQUIRED_INDEXES: &[&str] = &["idx_edges_to_kind", "idx_headwords_level"];
