//! Per-spacecraft event bus.
//!
//! Every spacecraft owns an [`EventBus`] mapping a closed set of
//! [`EventId`]s to ordered handler lists. Handlers receive the spacecraft
//! that raised the event (read-only) and a payload, and return a boolean.
//! Dispatch runs every handler for the event and returns the AND of their
//! results; with no handlers registered it returns `true`.
//!
//! Handler return values are meaningful for [`EventId::Destructed`]: any
//! `false` vetoes immediate cleanup of a destroyed spacecraft.
//!
//! # Re-entrancy
//!
//! Handlers get `&Spacecraft`, so they cannot mutate the spacecraft or
//! register handlers while a dispatch is running. Cross-entity reactions
//! go through the [`Arena`](crate::arena::Arena) after dispatch returns.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::spacecraft::{Spacecraft, SpacecraftId};

/// Identifier of a spacecraft event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventId {
    /// The spacecraft finished exploding. Handlers may veto cleanup.
    Destructed,
    /// The spacecraft fired at least one projectile.
    Fired,
    /// A spacecraft targeting this one fired.
    TargetFired,
    /// The spacecraft was credited with a kill.
    GainKill,
    /// The spacecraft took collision damage.
    Collided,
    /// The spacecraft was hit by a projectile or missile.
    BeingHit,
    /// The spacecraft hit its current target.
    TargetHit,
    /// The spacecraft hit any spacecraft.
    AnySpacecraftHit,
    /// The jump engine started preparing.
    PreparingJump,
    /// The jump engine engaged after preparation.
    JumpEngaged,
    /// A jump preparation was cancelled.
    JumpCancelled,
    /// The spacecraft left the battlefield through a jump.
    JumpedOut,
    /// The spacecraft finished jumping in.
    Arrived,
    /// The active missile launcher switched to a different missile class.
    MissileChanged,
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Destructed => "destructed",
            Self::Fired => "fired",
            Self::TargetFired => "target_fired",
            Self::GainKill => "gain_kill",
            Self::Collided => "collided",
            Self::BeingHit => "being_hit",
            Self::TargetHit => "target_hit",
            Self::AnySpacecraftHit => "any_spacecraft_hit",
            Self::PreparingJump => "preparing_jump",
            Self::JumpEngaged => "jump_engaged",
            Self::JumpCancelled => "jump_cancelled",
            Self::JumpedOut => "jumped_out",
            Self::Arrived => "arrived",
            Self::MissileChanged => "missile_changed",
        };
        f.write_str(name)
    }
}

/// Payload passed to event handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    /// No payload.
    None,
    /// The spacecraft received a hit (`BeingHit`, `Collided`).
    Hit {
        /// Damage left after shield and armor
        damage: f64,
        /// World-space hit position
        position: Vec3,
        /// Direction of the incoming projectile or impact
        direction: Vec3,
        /// Spacecraft credited for the hit
        by: Option<SpacecraftId>,
        /// Whether a missile caused the hit
        by_missile: bool,
    },
    /// The spacecraft dealt a hit (`TargetHit`, `AnySpacecraftHit`).
    HitDealt {
        /// Spacecraft that was hit
        target: Option<SpacecraftId>,
        /// Damage credited
        damage: f64,
        /// Whether a missile caused the hit
        by_missile: bool,
    },
    /// The spacecraft scored a kill (`GainKill`).
    Kill {
        /// Spacecraft that was destroyed
        victim: Option<SpacecraftId>,
    },
    /// The spacecraft fired (`Fired`).
    Fired {
        /// Number of projectiles emitted
        projectiles: u32,
    },
    /// A spacecraft targeting this one fired (`TargetFired`).
    TargetFired {
        /// The spacecraft that fired
        shooter: SpacecraftId,
    },
    /// The active launcher changed (`MissileChanged`).
    MissileChanged {
        /// Index of the new active launcher
        launcher: Option<usize>,
    },
}

/// Boxed event handler.
pub type EventHandler = Box<dyn FnMut(&Spacecraft, &EventData) -> bool>;

/// Ordered handler lists keyed by event.
#[derive(Default)]
pub struct EventBus {
    handlers: BTreeMap<EventId, Vec<EventHandler>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.handlers.iter().map(|(id, list)| (id, list.len())))
            .finish()
    }
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler for an event. Handlers run in registration order.
    pub fn add_handler<F>(&mut self, event: EventId, handler: F)
    where
        F: FnMut(&Spacecraft, &EventData) -> bool + 'static,
    {
        self.handlers
            .entry(event)
            .or_default()
            .push(Box::new(handler));
    }

    /// Removes every handler for an event.
    pub fn clear(&mut self, event: EventId) {
        self.handlers.remove(&event);
    }

    /// Removes every handler.
    pub fn clear_all(&mut self) {
        self.handlers.clear();
    }

    /// Number of handlers registered for an event.
    #[must_use]
    pub fn handler_count(&self, event: EventId) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }

    /// Detaches the handler list of an event for the duration of a dispatch.
    pub(crate) fn take(&mut self, event: EventId) -> Option<Vec<EventHandler>> {
        self.handlers.remove(&event)
    }

    /// Reattaches a handler list detached with [`take`](Self::take).
    pub(crate) fn restore(&mut self, event: EventId, mut handlers: Vec<EventHandler>) {
        if let Some(added) = self.handlers.remove(&event) {
            handlers.extend(added);
        }
        self.handlers.insert(event, handlers);
    }
}

/// Runs every handler and ANDs their results.
pub(crate) fn dispatch(
    handlers: &mut [EventHandler],
    owner: &Spacecraft,
    data: &EventData,
) -> bool {
    handlers.iter_mut().fold(true, |all, handler| {
        let result = handler(owner, data);
        all && result
    })
}
