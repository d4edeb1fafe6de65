//! SQLite backend for the order engine.
//!
//! Schema migrations live in `migrations/`. The engine never applies them itself.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
