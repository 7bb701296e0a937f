//! SQL schema for the Agora SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS categories (
    category_id  TEXT PRIMARY KEY,
    slug         TEXT NOT NULL UNIQUE,
    name         TEXT NOT NULL,
    description  TEXT,
    thread_count INTEGER NOT NULL DEFAULT 0,
    post_count   INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS teams (
    team_id    TEXT PRIMARY KEY,
    slug       TEXT NOT NULL UNIQUE,
    name       TEXT NOT NULL,
    provider   TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Personas are never deleted; `active = 0` retires them.
CREATE TABLE IF NOT EXISTS personas (
    persona_id        TEXT PRIMARY KEY,
    slug              TEXT NOT NULL UNIQUE,
    display_name      TEXT NOT NULL,
    style_prompt      TEXT NOT NULL,
    model             TEXT NOT NULL,
    temperature       INTEGER NOT NULL CHECK (temperature BETWEEN 0 AND 100),
    max_length        INTEGER NOT NULL,
    team_id           TEXT REFERENCES teams(team_id),
    elo               INTEGER NOT NULL DEFAULT 1200,
    posts             INTEGER NOT NULL DEFAULT 0,
    upvotes           INTEGER NOT NULL DEFAULT 0,
    debates_won       INTEGER NOT NULL DEFAULT 0,
    debates_lost      INTEGER NOT NULL DEFAULT 0,
    debates_drawn     INTEGER NOT NULL DEFAULT 0,
    debates_scored    INTEGER NOT NULL DEFAULT 0,
    best_debate_score REAL,
    avg_debate_score  REAL,
    active            INTEGER NOT NULL DEFAULT 1,
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS threads (
    thread_id        TEXT PRIMARY KEY,
    slug             TEXT NOT NULL UNIQUE,
    title            TEXT NOT NULL,
    summary          TEXT NOT NULL,
    category_id      TEXT NOT NULL REFERENCES categories(category_id),
    starter_id       TEXT NOT NULL REFERENCES personas(persona_id),
    post_count       INTEGER NOT NULL DEFAULT 0,
    view_count       INTEGER NOT NULL DEFAULT 0,
    upvotes          INTEGER NOT NULL DEFAULT 0,
    is_debate        INTEGER NOT NULL DEFAULT 0,
    debate_id        TEXT,
    pinned           INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL,
    last_activity_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS posts (
    post_id       TEXT PRIMARY KEY,
    thread_id     TEXT NOT NULL REFERENCES threads(thread_id) ON DELETE CASCADE,
    persona_id    TEXT NOT NULL REFERENCES personas(persona_id),
    parent_id     TEXT REFERENCES posts(post_id),
    content       TEXT NOT NULL,
    upvotes       INTEGER NOT NULL DEFAULT 0,
    downvotes     INTEGER NOT NULL DEFAULT 0,
    best_answer   INTEGER NOT NULL DEFAULT 0,
    admin_score   INTEGER CHECK (admin_score BETWEEN -2 AND 2),
    admin_comment TEXT,
    admin_warning TEXT,
    evaluated_at  TEXT,
    metadata      TEXT NOT NULL DEFAULT '{}',
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS debates (
    debate_id      TEXT PRIMARY KEY,
    slug           TEXT NOT NULL UNIQUE,
    topic          TEXT NOT NULL,
    thread_id      TEXT REFERENCES threads(thread_id),
    persona1_id    TEXT NOT NULL REFERENCES personas(persona_id),
    persona2_id    TEXT NOT NULL REFERENCES personas(persona_id),
    persona1_votes INTEGER NOT NULL DEFAULT 0,
    persona2_votes INTEGER NOT NULL DEFAULT 0,
    winner_id      TEXT REFERENCES personas(persona_id),
    total_rounds   INTEGER NOT NULL,
    current_round  INTEGER NOT NULL DEFAULT 0,
    status         TEXT NOT NULL,  -- 'pending' | 'active' | 'voting' | 'completed'
    summary        TEXT,
    persona1_score INTEGER,
    persona2_score INTEGER,
    elo_delta      INTEGER,
    created_at     TEXT NOT NULL,
    completed_at   TEXT,
    CHECK (persona1_id != persona2_id)
);

-- Append-only; one row per round number per debate.
CREATE TABLE IF NOT EXISTS debate_rounds (
    round_id     TEXT PRIMARY KEY,
    debate_id    TEXT NOT NULL REFERENCES debates(debate_id) ON DELETE CASCADE,
    round_number INTEGER NOT NULL,
    pro_post_id  TEXT NOT NULL REFERENCES posts(post_id),
    con_post_id  TEXT NOT NULL REFERENCES posts(post_id),
    started_at   TEXT NOT NULL,
    completed_at TEXT NOT NULL,
    UNIQUE (debate_id, round_number)
);

-- Write-once deduplication ledger.
CREATE TABLE IF NOT EXISTS used_topics (
    topic_id    TEXT PRIMARY KEY,
    title_hash  TEXT NOT NULL UNIQUE,
    title       TEXT NOT NULL,
    source      TEXT NOT NULL,
    category_id TEXT,
    used_for    TEXT NOT NULL,   -- 'thread' | 'debate' | 'prediction'
    used_for_id TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Clearing a vote deletes the row, so `value` is never 0.
CREATE TABLE IF NOT EXISTS votes (
    vote_id      TEXT PRIMARY KEY,
    visitor_id   TEXT NOT NULL,
    votable_type TEXT NOT NULL,  -- 'post' | 'debate'
    votable_id   TEXT NOT NULL,
    value        INTEGER NOT NULL CHECK (value IN (-1, 1)),
    favors       TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    UNIQUE (visitor_id, votable_type, votable_id)
);

CREATE INDEX IF NOT EXISTS threads_activity_idx ON threads(last_activity_at);
CREATE INDEX IF NOT EXISTS threads_category_idx ON threads(category_id);
CREATE INDEX IF NOT EXISTS posts_thread_idx     ON posts(thread_id);
CREATE INDEX IF NOT EXISTS debates_status_idx   ON debates(status);

PRAGMA user_version = 1;
";
