//! SQLite schema definition.

/// Complete database schema for pet records.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Pets
-- ============================================================================

CREATE TABLE IF NOT EXISTS pets (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    species TEXT NOT NULL,
    breed TEXT,
    date_of_birth TEXT,
    owner_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pets_name ON pets(name);
CREATE INDEX IF NOT EXISTS idx_pets_owner ON pets(owner_id);

-- ============================================================================
-- Health Records (one table, payload is the kind's JSON field set)
-- ============================================================================

CREATE TABLE IF NOT EXISTS health_records (
    id TEXT PRIMARY KEY,
    pet_id TEXT NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
    kind TEXT NOT NULL CHECK (kind IN (
        'vaccination', 'medication', 'treatment', 'condition',
        'allergy', 'weight', 'document', 'visit'
    )),
    payload TEXT NOT NULL CHECK (json_valid(payload)),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_pet_kind ON health_records(pet_id, kind);

-- ============================================================================
-- Activity Log (append-only, outlives the records it mentions)
-- ============================================================================

CREATE TABLE IF NOT EXISTS activity_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    actor_id TEXT NOT NULL,
    pet_id TEXT NOT NULL,
    action TEXT NOT NULL CHECK (action IN ('record_added', 'record_updated', 'record_deleted')),
    kind TEXT NOT NULL,
    record_id TEXT NOT NULL,
    record_name TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_activity_pet ON activity_log(pet_id);

CREATE TRIGGER IF NOT EXISTS activity_log_no_update BEFORE UPDATE ON activity_log
BEGIN
    SELECT RAISE(ABORT, 'Activity log is append-only');
END;
"#;
