//! Backend implementations for the graph traits.
//!
//! | Backend | Module | Traits |
//! |---------|--------|--------|
//! | PostgreSQL + Apache AGE | [`postgres`] | all four |
//!
//! The in-memory store does not speak Cypher; it implements the repository
//! traits directly (see [`crate::repositories::memory`]).

pub mod postgres;
