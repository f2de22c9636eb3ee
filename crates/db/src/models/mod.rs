//! Row structs and DTOs for the entity store.

pub mod entity;
