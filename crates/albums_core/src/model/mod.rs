//! Domain model for the album catalog.
//!
//! # Responsibility
//! - Define canonical data structures used by the store and HTTP layers.
//!
//! # Invariants
//! - An album is identified by a store-assigned positive `AlbumId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod album;
