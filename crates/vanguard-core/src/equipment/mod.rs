//! Equipment owned by a spacecraft.
//!
//! Each module is a small capability object built from an immutable class
//! (`Arc`-shared) plus per-instance state. Equipment never reaches back into
//! its owner: the spacecraft passes in whatever it needs (body frame, target
//! view, outbox) and applies what the equipment returns.

pub mod jump;
pub mod launcher;
pub mod maneuvering;
pub mod propulsion;
pub mod shield;
pub mod targeting;
pub mod weapon;

pub use jump::{JumpEngine, JumpState, JumpTransition};
pub use launcher::MissileLauncher;
pub use maneuvering::{ManeuveringComputer, ManeuveringTargets};
pub use propulsion::{Propulsion, ThrusterBurn};
pub use shield::Shield;
pub use targeting::{TargetView, TargetingComputer};
pub use weapon::Weapon;
