/// SQL DDL for the enrollment store.
/// WAL mode + foreign keys enabled at connection time.
pub const SCHEMA_VERSION: u32 = 1;

pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS roles (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cohorts (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    auto_populate INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS programs (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    prerequisite INTEGER NOT NULL DEFAULT 0,
    auto_populate INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cohort_programs (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    cohort_id TEXT NOT NULL REFERENCES cohorts(id),
    program_id TEXT NOT NULL REFERENCES programs(id),
    start_date TEXT,
    auto_populate INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    first_name TEXT,
    last_name TEXT,
    password TEXT NOT NULL,
    provider TEXT NOT NULL DEFAULT 'local',
    role_id TEXT NOT NULL REFERENCES roles(id),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS invites (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    role_id TEXT REFERENCES roles(id),
    inviter_id TEXT REFERENCES users(id),
    cohort_program_schedule TEXT REFERENCES cohort_programs(id),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS enrollments (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    trainee_id TEXT NOT NULL REFERENCES users(id),
    cohort_program_id TEXT NOT NULL REFERENCES cohort_programs(id),
    manager_id TEXT REFERENCES users(id),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cohort_programs_cohort ON cohort_programs(cohort_id);
CREATE INDEX IF NOT EXISTS idx_cohort_programs_program ON cohort_programs(program_id);
CREATE INDEX IF NOT EXISTS idx_enrollments_trainee ON enrollments(trainee_id);
CREATE INDEX IF NOT EXISTS idx_enrollments_cohort_program ON enrollments(cohort_program_id);
CREATE INDEX IF NOT EXISTS idx_users_role ON users(role_id);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;
