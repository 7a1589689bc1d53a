//! # trellis-store
//!
//! In-memory table store standing in for the persistence layer. Every
//! mutation fires the matching `db_*` hook so plugins can observe data
//! changes.

pub mod memory;

pub use memory::{MemoryStore, TableStats};
