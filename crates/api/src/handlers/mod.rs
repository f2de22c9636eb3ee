//! HTTP handler implementations, grouped by resource.

pub mod detection;
pub mod entity;
