//! Crate-level tests spanning several modules.
//!
//! - `integration.rs`: end-to-end scenarios through the arena
//! - `properties.rs`: property tests of damage and launcher invariants
//! - `helpers.rs`: reference classes and setup utilities shared by every
//!   test module in the crate

pub(crate) mod helpers;
