//! REST client for the external anchor-detection service.
//!
//! The detection algorithms (OCR, template matching) live in a
//! separate service; this crate only speaks its HTTP protocol, using
//! the request and report types from `cadrage_core::detection`.

pub mod client;

pub use client::{DetectorClient, DetectorError};
