//! Jump engine state machine.
//!
//! ```text
//! Idle -> Preparing -> JumpingOut -> Away -> JumpingIn -> Idle
//!            |
//!            +-- (toggle) --> Idle
//! ```
//!
//! The engine only tracks phases and timers. The owning spacecraft applies
//! the motion of each phase and raises the matching events.

use std::sync::Arc;

use crate::class::JumpEngineClass;
use crate::config::GameplayConfig;

/// Phase of the jump engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpState {
    /// Not jumping.
    Idle,
    /// Counting down to the jump.
    Preparing {
        /// Seconds until the jump engages
        remaining: f32,
    },
    /// Accelerating out of the battlefield.
    JumpingOut {
        /// Seconds until departure
        remaining: f32,
    },
    /// Outside the battlefield.
    Away,
    /// Decelerating into the battlefield.
    JumpingIn {
        /// Seconds until arrival
        remaining: f32,
    },
}

/// Phase change reported to the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTransition {
    /// Preparation started.
    Preparing,
    /// Preparation cancelled.
    Cancelled,
    /// Preparation finished; jumping out.
    Engaged,
    /// Jump-out finished; the spacecraft is away.
    Departed,
    /// Jump-in started.
    JumpingIn,
    /// Jump-in finished.
    Arrived,
}

/// An equipped jump engine.
#[derive(Debug, Clone)]
pub struct JumpEngine {
    class: Arc<JumpEngineClass>,
    state: JumpState,
    prepare_duration: f32,
    jump_out_duration: f32,
    jump_in_duration: f32,
    pending: Option<JumpTransition>,
}

impl JumpEngine {
    /// Installs an idle engine; durations the class leaves unset come from `config`.
    #[must_use]
    pub fn new(class: Arc<JumpEngineClass>, config: &GameplayConfig) -> Self {
        Self {
            prepare_duration: class.prepare_duration.unwrap_or(config.jump_prepare_duration),
            jump_out_duration: class.jump_out_duration.unwrap_or(config.jump_out_duration),
            jump_in_duration: class.jump_in_duration.unwrap_or(config.jump_in_duration),
            class,
            state: JumpState::Idle,
            pending: None,
        }
    }

    /// Jump engine class.
    #[must_use]
    pub fn class(&self) -> &Arc<JumpEngineClass> {
        &self.class
    }

    /// Current phase.
    #[must_use]
    pub fn state(&self) -> JumpState {
        self.state
    }

    /// Returns true in every phase that blocks weapons.
    #[must_use]
    pub fn is_jumping(&self) -> bool {
        matches!(
            self.state,
            JumpState::Preparing { .. } | JumpState::JumpingOut { .. } | JumpState::JumpingIn { .. }
        )
    }

    /// Returns true while outside the battlefield.
    #[must_use]
    pub fn is_away(&self) -> bool {
        self.state == JumpState::Away
    }

    /// Duration of the jump-in phase.
    #[must_use]
    pub fn jump_in_duration(&self) -> f32 {
        self.jump_in_duration
    }

    /// Duration of the jump-out phase.
    #[must_use]
    pub fn jump_out_duration(&self) -> f32 {
        self.jump_out_duration
    }

    /// Requests a jump out.
    ///
    /// From `Idle` preparation starts. While preparing, `toggle` cancels it.
    /// Everything else is refused.
    pub fn jump_out(&mut self, toggle: bool) -> bool {
        match self.state {
            JumpState::Idle => {
                self.state = JumpState::Preparing {
                    remaining: self.prepare_duration,
                };
                self.pending = Some(JumpTransition::Preparing);
                true
            }
            JumpState::Preparing { .. } if toggle => {
                self.state = JumpState::Idle;
                self.pending = Some(JumpTransition::Cancelled);
                true
            }
            _ => false,
        }
    }

    /// Starts jumping in. Only valid while away.
    pub fn jump_in(&mut self) -> bool {
        if self.state != JumpState::Away {
            return false;
        }
        self.state = JumpState::JumpingIn {
            remaining: self.jump_in_duration,
        };
        self.pending = Some(JumpTransition::JumpingIn);
        true
    }

    /// Puts the engine away without a jump (spawned outside the battlefield).
    pub fn set_away(&mut self) {
        self.state = JumpState::Away;
    }

    /// Drains the transition caused by the last command.
    pub fn take_transition(&mut self) -> Option<JumpTransition> {
        self.pending.take()
    }

    /// Advances the phase timers.
    pub fn simulate(&mut self, dt: f32) -> Option<JumpTransition> {
        let (next, transition) = match self.state {
            JumpState::Preparing { remaining } if remaining - dt <= 0.0 => (
                JumpState::JumpingOut {
                    remaining: self.jump_out_duration,
                },
                Some(JumpTransition::Engaged),
            ),
            JumpState::Preparing { remaining } => (
                JumpState::Preparing {
                    remaining: remaining - dt,
                },
                None,
            ),
            JumpState::JumpingOut { remaining } if remaining - dt <= 0.0 => {
                (JumpState::Away, Some(JumpTransition::Departed))
            }
            JumpState::JumpingOut { remaining } => (
                JumpState::JumpingOut {
                    remaining: remaining - dt,
                },
                None,
            ),
            JumpState::JumpingIn { remaining } if remaining - dt <= 0.0 => {
                (JumpState::Idle, Some(JumpTransition::Arrived))
            }
            JumpState::JumpingIn { remaining } => (
                JumpState::JumpingIn {
                    remaining: remaining - dt,
                },
                None,
            ),
            state @ (JumpState::Idle | JumpState::Away) => (state, None),
        };
        self.state = next;
        transition
    }

    /// Score contribution.
    #[must_use]
    pub fn score_value(&self) -> f64 {
        self.class.score_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> JumpEngine {
        let class = Arc::new(JumpEngineClass {
            name: "drive".into(),
            prepare_duration: Some(1.0),
            jump_out_duration: None,
            jump_in_duration: None,
            score_value: 0.0,
        });
        let config = GameplayConfig {
            jump_out_duration: 0.5,
            jump_in_duration: 0.5,
            ..GameplayConfig::default()
        };
        JumpEngine::new(class, &config)
    }

    #[test]
    fn full_cycle() {
        let mut engine = engine();
        assert!(engine.jump_out(false));
        assert_eq!(engine.take_transition(), Some(JumpTransition::Preparing));
        assert!(engine.is_jumping());

        assert_eq!(engine.simulate(0.5), None);
        assert_eq!(engine.simulate(0.5), Some(JumpTransition::Engaged));
        assert_eq!(engine.simulate(0.5), Some(JumpTransition::Departed));
        assert!(engine.is_away());
        assert!(!engine.is_jumping());
        assert_eq!(engine.simulate(10.0), None);

        assert!(engine.jump_in());
        assert_eq!(engine.take_transition(), Some(JumpTransition::JumpingIn));
        assert_eq!(engine.simulate(0.5), Some(JumpTransition::Arrived));
        assert_eq!(engine.state(), JumpState::Idle);
    }

    #[test]
    fn toggle_cancels_preparation() {
        let mut engine = engine();
        engine.jump_out(true);
        engine.take_transition();
        assert!(!engine.jump_out(false));
        assert!(engine.jump_out(true));
        assert_eq!(engine.take_transition(), Some(JumpTransition::Cancelled));
        assert_eq!(engine.state(), JumpState::Idle);
    }

    #[test]
    fn refuses_out_of_order_commands() {
        let mut engine = engine();
        assert!(!engine.jump_in());
        engine.set_away();
        assert!(!engine.jump_out(false));
        assert!(!engine.jump_out(true));
        assert_eq!(engine.take_transition(), None);
    }
}
