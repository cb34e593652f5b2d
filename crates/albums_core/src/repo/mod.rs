//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the album data access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Album::validate()` before persistence.
//! - Repository APIs return semantic errors (`RecordNotFound`,
//!   `EditConflict`) in addition to DB transport errors.

pub mod album_repo;
