//! # Vanguard Core
//!
//! Combat spacecraft simulation core for Vanguard.
//!
//! This crate provides the per-spacecraft state machine of a space combat
//! game: equipment simulation, damage and scoring resolution, per-entity
//! event dispatch and the fixed-layout records used by the host-authoritative
//! multiplayer mode.
//!
//! ## Architecture
//!
//! - **Spacecraft**: the aggregate root owning a physical body, equipment,
//!   an event bus, mission statistics and network scratch buffers
//! - **Equipment**: weapons, missile launchers, propulsion, shield, targeting
//!   computer and jump engine, each a small owned capability object
//! - **Arena**: owns every spacecraft and hosts all cross-entity operations
//!   (targeting back-references, damage credit, fire notifications)
//! - **Sync**: encode/decode of the host and guest network records
//!
//! Rendering, audio, input and AI are external. They drain the spacecraft
//! outbox ([`effect`]) and drive the public control surface.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use vanguard_core::arena::Arena;
//! use vanguard_core::class::SpacecraftClass;
//! use vanguard_core::config::SimulationContext;
//! use vanguard_core::physics::FIXED_DT;
//! use vanguard_core::spacecraft::Spacecraft;
//!
//! let ctx = SimulationContext::default();
//! let class = Arc::new(SpacecraftClass::new("falcon", 100.0));
//!
//! let mut arena = Arena::new();
//! let id = arena.spawn(Spacecraft::from_class(class));
//!
//! for _ in 0..10 {
//!     arena.simulate(FIXED_DT, &ctx);
//! }
//! assert!(arena.get(id).unwrap().is_alive());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod arena;
pub mod class;
pub mod config;
pub mod effect;
pub mod equipment;
pub mod error;
pub mod event;
pub mod physics;
pub mod spacecraft;
pub mod sync;

pub use arena::Arena;
pub use config::{GameplayConfig, SimulationContext};
pub use error::{ConfigError, SyncError};
pub use event::{EventData, EventId};
pub use spacecraft::{Hit, HitReport, LifeState, Spacecraft, SpacecraftId, TeamId};

#[cfg(test)]
mod tests;
