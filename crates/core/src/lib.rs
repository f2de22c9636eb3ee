//! Domain core for the cadrage template-zone extraction platform.
//!
//! Everything in this crate is synchronous and side-effect-free: the
//! geometry primitives, the four-anchor reference frame and its derived
//! parameters, the bidirectional zone coordinate transform, the legacy
//! frame migration, and the entity/zone data model. I/O (persistence,
//! anchor detection, HTTP) lives in the sibling crates and talks to this
//! one through plain values.

pub mod anchor;
pub mod detection;
pub mod entity;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod media;
pub mod migration;
pub mod types;

pub use error::CoreError;
