//! Database module: models, schema and queries for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows plus request-side inputs
//! - `schema.rs`: SQL DDL for initializing the database (SQLite)
//! - `sqlite.rs`: the `Storage` handle, connection and schema bootstrap
//! - `families.rs`, `users.rs`, `books.rs`, `exchanges.rs`: per-table queries

pub mod books;
pub mod exchanges;
pub mod families;
pub mod models;
pub mod schema;
pub mod sqlite;
pub mod users;

pub use models::{Book, Exchange, ExchangeStatus, Family, User, UserRead};
pub use schema::SQLITE_INIT;
pub use sqlite::{Page, SqlitePool, Storage};
