//! Repository structs, one per table.

pub mod entity_repo;

pub use entity_repo::EntityRepo;
