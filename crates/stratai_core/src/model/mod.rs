//! Domain model for the Space → Area → Document hierarchy.
//!
//! # Responsibility
//! - Define canonical data structures used by services and the HTTP layer.
//! - Keep validation of single-record invariants next to the records.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Deletion of areas and documents is a soft-delete tombstone.

pub mod arena;
pub mod area;
pub mod document;
pub mod member;
pub mod space;
pub mod user;
