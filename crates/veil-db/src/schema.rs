//! SQL schema definitions.

/// Complete schema for Veil v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Currency ledger
-- ============================================================

CREATE TABLE IF NOT EXISTS currency_balances (
    user_id INTEGER PRIMARY KEY,
    balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
    total_earned INTEGER NOT NULL DEFAULT 0 CHECK (total_earned >= 0),
    total_spent INTEGER NOT NULL DEFAULT 0 CHECK (total_spent >= 0),
    CHECK (balance = total_earned - total_spent)
);

CREATE TABLE IF NOT EXISTS ledger_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    delta INTEGER NOT NULL CHECK (delta <> 0),
    reason TEXT NOT NULL CHECK (reason IN (
        'QUIZ_ENTER', 'QUIZ_WRONG', 'TRAIT_ADD', 'DAILY_BONUS', 'PAWN_PHOTO',
        'PAWN_INFO', 'BATTLE_ROYALE_ENTER', 'ADMIN_GRANT', 'REFUND'
    )),
    ref_id TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ledger_user ON ledger_entries(user_id, id);

CREATE TRIGGER IF NOT EXISTS ledger_entries_no_update
BEFORE UPDATE ON ledger_entries
BEGIN
    SELECT RAISE(ABORT, 'ledger entries are immutable');
END;

CREATE TRIGGER IF NOT EXISTS ledger_entries_no_delete
BEFORE DELETE ON ledger_entries
BEGIN
    SELECT RAISE(ABORT, 'ledger entries are immutable');
END;

-- ============================================================
-- Quiz sessions & answers
-- ============================================================

CREATE TABLE IF NOT EXISTS quiz_sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    asker_id INTEGER NOT NULL,
    target_id INTEGER NOT NULL,
    mode TEXT NOT NULL,
    entry_cost INTEGER NOT NULL CHECK (entry_cost >= 0),
    started_at INTEGER NOT NULL,
    ended_at INTEGER,
    CHECK (asker_id <> target_id)
);

CREATE INDEX IF NOT EXISTS idx_sessions_pair ON quiz_sessions(asker_id, target_id, started_at);

CREATE TABLE IF NOT EXISTS target_preferences (
    target_id INTEGER NOT NULL,
    question_id INTEGER NOT NULL,
    choice TEXT NOT NULL CHECK (choice IN ('LEFT', 'RIGHT')),
    PRIMARY KEY (target_id, question_id)
);

CREATE TABLE IF NOT EXISTS answer_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL REFERENCES quiz_sessions(id),
    question_id INTEGER NOT NULL,
    asker_guess TEXT NOT NULL CHECK (asker_guess IN ('LEFT', 'RIGHT')),
    target_choice TEXT NOT NULL CHECK (target_choice IN ('LEFT', 'RIGHT')),
    correct INTEGER NOT NULL,
    delta_affinity INTEGER NOT NULL,
    delta_currency INTEGER NOT NULL CHECK (delta_currency <= 0),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_answers_session ON answer_records(session_id, id);

CREATE TRIGGER IF NOT EXISTS answer_records_no_update
BEFORE UPDATE ON answer_records
BEGIN
    SELECT RAISE(ABORT, 'answer records are immutable');
END;

CREATE TRIGGER IF NOT EXISTS answer_records_no_delete
BEFORE DELETE ON answer_records
BEGIN
    SELECT RAISE(ABORT, 'answer records are immutable');
END;

-- ============================================================
-- Photos & profile (written by external pipelines)
-- ============================================================

CREATE TABLE IF NOT EXISTS photos (
    id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING'
        CHECK (status IN ('PENDING', 'APPROVED', 'REJECTED'))
);

CREATE INDEX IF NOT EXISTS idx_photos_owner ON photos(owner_id, status);

CREATE TABLE IF NOT EXISTS photo_variants (
    photo_id INTEGER NOT NULL REFERENCES photos(id) ON DELETE CASCADE,
    variant TEXT NOT NULL,
    storage_key TEXT NOT NULL,
    PRIMARY KEY (photo_id, variant)
);

CREATE TABLE IF NOT EXISTS profile_fields (
    user_id INTEGER NOT NULL,
    field_group TEXT NOT NULL,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (user_id, field_group, name)
);

-- ============================================================
-- Affinity & visibility
-- ============================================================

CREATE TABLE IF NOT EXISTS affinity_scores (
    viewer_id INTEGER NOT NULL,
    target_id INTEGER NOT NULL,
    score INTEGER NOT NULL DEFAULT 0 CHECK (score >= 0),
    stages_unlocked TEXT NOT NULL DEFAULT '[]',
    last_interaction_at INTEGER NOT NULL,
    PRIMARY KEY (viewer_id, target_id)
);

CREATE TABLE IF NOT EXISTS visibility_states (
    viewer_id INTEGER NOT NULL,
    photo_id INTEGER NOT NULL,
    tier TEXT NOT NULL CHECK (tier IN ('LOCKED', 'T1', 'T2', 'T3')),
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (viewer_id, photo_id)
);

CREATE TRIGGER IF NOT EXISTS visibility_states_ratchet
BEFORE UPDATE OF tier ON visibility_states
WHEN (CASE NEW.tier WHEN 'LOCKED' THEN 0 WHEN 'T1' THEN 1 WHEN 'T2' THEN 2 ELSE 3 END)
   < (CASE OLD.tier WHEN 'LOCKED' THEN 0 WHEN 'T1' THEN 1 WHEN 'T2' THEN 2 ELSE 3 END)
BEGIN
    SELECT RAISE(ABORT, 'visibility tier cannot regress');
END;

-- ============================================================
-- Skill
-- ============================================================

CREATE TABLE IF NOT EXISTS skill_stats (
    user_id INTEGER PRIMARY KEY,
    correct_count INTEGER NOT NULL DEFAULT 0,
    total_attempts INTEGER NOT NULL DEFAULT 0,
    accuracy REAL NOT NULL DEFAULT 0.0,
    updated_at INTEGER NOT NULL,
    CHECK (correct_count <= total_attempts)
);

CREATE INDEX IF NOT EXISTS idx_skill_rank ON skill_stats(accuracy DESC, total_attempts DESC);
"#;
