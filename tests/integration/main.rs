//! End-to-end tests against an in-memory SQLite database.

mod common;
mod crud;
mod relations;
