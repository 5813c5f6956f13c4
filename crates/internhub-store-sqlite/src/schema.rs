//! SQL schema for the InternHub SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Local identity provider. Passwords are argon2 PHC strings; tokens are
-- stored only as SHA-256 hex digests.
CREATE TABLE IF NOT EXISTS identities (
    id                 TEXT PRIMARY KEY,
    email              TEXT NOT NULL UNIQUE,
    password_hash      TEXT NOT NULL,
    email_confirmed_at TEXT,
    metadata           TEXT NOT NULL DEFAULT '{}',
    created_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS identity_tokens (
    token_hash  TEXT PRIMARY KEY,
    identity_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
    purpose     TEXT NOT NULL CHECK (purpose IN ('session', 'reset')),
    expires_at  TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    id                  TEXT PRIMARY KEY,   -- shared with the identity provider
    email               TEXT NOT NULL UNIQUE,
    role                TEXT NOT NULL CHECK (role IN ('INTERN', 'GUIDE', 'ADMIN')),
    email_verified      INTEGER NOT NULL DEFAULT 0,
    must_reset_password INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS intern_profiles (
    id            TEXT PRIMARY KEY,
    account_id    TEXT NOT NULL UNIQUE REFERENCES accounts(id) ON DELETE CASCADE,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    phone         TEXT,
    bio           TEXT,
    skills        TEXT NOT NULL DEFAULT '[]',   -- JSON array
    institution   TEXT,
    year_of_study TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS guide_profiles (
    id           TEXT PRIMARY KEY,
    account_id   TEXT NOT NULL UNIQUE REFERENCES accounts(id) ON DELETE CASCADE,
    first_name   TEXT NOT NULL,
    last_name    TEXT NOT NULL,
    phone        TEXT,
    bio          TEXT,
    expertise    TEXT NOT NULL DEFAULT '[]',    -- JSON array
    organization TEXT,
    is_active    INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS admin_profiles (
    id         TEXT PRIMARY KEY,
    account_id TEXT NOT NULL UNIQUE REFERENCES accounts(id) ON DELETE CASCADE,
    first_name TEXT NOT NULL,
    last_name  TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS resumes (
    id           TEXT PRIMARY KEY,
    intern_id    TEXT NOT NULL REFERENCES intern_profiles(id) ON DELETE CASCADE,
    file_name    TEXT NOT NULL,
    storage_path TEXT NOT NULL UNIQUE,
    file_url     TEXT NOT NULL,
    file_size    INTEGER NOT NULL,
    mime_type    TEXT NOT NULL,
    is_primary   INTEGER NOT NULL DEFAULT 0,
    uploaded_at  TEXT NOT NULL
);

-- At most one primary resume per intern.
CREATE UNIQUE INDEX IF NOT EXISTS resumes_one_primary_idx
    ON resumes(intern_id) WHERE is_primary = 1;

CREATE TABLE IF NOT EXISTS projects (
    id                   TEXT PRIMARY KEY,
    guide_id             TEXT NOT NULL REFERENCES guide_profiles(id),
    title                TEXT NOT NULL,
    short_description    TEXT NOT NULL,
    detailed_description TEXT NOT NULL,
    scope                TEXT NOT NULL,
    use_cases            TEXT NOT NULL DEFAULT '[]',   -- JSON array
    duration_weeks       INTEGER NOT NULL CHECK (duration_weeks >= 1),
    status               TEXT NOT NULL DEFAULT 'DRAFT',
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS phases (
    id          TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    phase_order INTEGER NOT NULL CHECK (phase_order >= 1),
    status      TEXT NOT NULL DEFAULT 'NOT_STARTED'
);

CREATE TABLE IF NOT EXISTS project_roles (
    id              TEXT PRIMARY KEY,
    project_id      TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title           TEXT NOT NULL,
    description     TEXT NOT NULL,
    required_skills TEXT NOT NULL DEFAULT '[]',   -- JSON array
    max_interns     INTEGER NOT NULL DEFAULT 1 CHECK (max_interns >= 1)
);

CREATE TABLE IF NOT EXISTS applications (
    id            TEXT PRIMARY KEY,
    intern_id     TEXT NOT NULL REFERENCES intern_profiles(id) ON DELETE CASCADE,
    project_id    TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    role_id       TEXT NOT NULL REFERENCES project_roles(id) ON DELETE CASCADE,
    resume_id     TEXT REFERENCES resumes(id) ON DELETE SET NULL,
    status        TEXT NOT NULL DEFAULT 'APPLIED',
    fitment_score REAL,
    applied_at    TEXT NOT NULL,
    UNIQUE (intern_id, role_id)
);

CREATE TABLE IF NOT EXISTS assignments (
    id          TEXT PRIMARY KEY,
    intern_id   TEXT NOT NULL REFERENCES intern_profiles(id) ON DELETE CASCADE,
    project_id  TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    role_id     TEXT NOT NULL REFERENCES project_roles(id) ON DELETE CASCADE,
    status      TEXT NOT NULL DEFAULT 'ACTIVE',
    assigned_at TEXT NOT NULL,
    UNIQUE (intern_id, project_id)
);

CREATE TABLE IF NOT EXISTS certificates (
    id              TEXT PRIMARY KEY,
    intern_id       TEXT NOT NULL REFERENCES intern_profiles(id) ON DELETE CASCADE,
    project_id      TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    certificate_url TEXT NOT NULL,
    issued_at       TEXT NOT NULL,
    UNIQUE (intern_id, project_id)
);

CREATE INDEX IF NOT EXISTS resumes_intern_idx      ON resumes(intern_id);
CREATE INDEX IF NOT EXISTS projects_guide_idx      ON projects(guide_id);
CREATE INDEX IF NOT EXISTS phases_project_idx      ON phases(project_id);
CREATE INDEX IF NOT EXISTS roles_project_idx       ON project_roles(project_id);
CREATE INDEX IF NOT EXISTS applications_intern_idx ON applications(intern_id);
CREATE INDEX IF NOT EXISTS applications_project_idx ON applications(project_id);
CREATE INDEX IF NOT EXISTS tokens_identity_idx     ON identity_tokens(identity_id);

PRAGMA user_version = 1;
";
