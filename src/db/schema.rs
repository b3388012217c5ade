//! SQL DDL for the marketplace tables, applied at startup.

/// SQLite schema:
/// - every table keyed by `id` INTEGER PRIMARY KEY AUTOINCREMENT
/// - `users.username`, `users.email` and `books.isbn` UNIQUE (NULL isbns never collide)
/// - books are owned by families, users belong to families
/// - timestamps stored as RFC3339 TEXT
/// - exchange status constrained to the known set
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS families (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_families_name ON families(name);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    hashed_password TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    family_id INTEGER NOT NULL REFERENCES families(id)
);

CREATE INDEX IF NOT EXISTS idx_users_family_id ON users(family_id);

CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    grade INTEGER NULL,
    isbn TEXT NULL UNIQUE,
    owner_id INTEGER NOT NULL REFERENCES families(id),
    added_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_owner_id ON books(owner_id);
CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);

CREATE TABLE IF NOT EXISTS exchanges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    proposer_family_id INTEGER NOT NULL REFERENCES families(id),
    receiver_family_id INTEGER NOT NULL REFERENCES families(id),
    offered_book_id INTEGER NOT NULL REFERENCES books(id),
    requested_book_id INTEGER NOT NULL REFERENCES books(id),
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'accepted', 'rejected')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_exchanges_proposer ON exchanges(proposer_family_id);
CREATE INDEX IF NOT EXISTS idx_exchanges_receiver ON exchanges(receiver_family_id)
"#;
