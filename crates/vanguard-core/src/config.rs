//! Gameplay configuration and the per-simulation context.
//!
//! [`GameplayConfig`] holds the tunables shared by every spacecraft. It is
//! loaded once (usually from JSON) and wrapped in a [`SimulationContext`]
//! together with the multiplayer role, then passed by reference into
//! `simulate` and the damage path.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Gameplay tunables shared by all spacecraft.
///
/// Every field has a default, so a JSON document only needs to name the
/// values it overrides.
///
/// # Example
///
/// ```
/// use vanguard_core::config::GameplayConfig;
///
/// let config = GameplayConfig::from_json(r#"{ "killScoreFraction": 0.5 }"#).unwrap();
/// assert_eq!(config.kill_score_fraction, 0.5);
/// assert_eq!(config.missile_change_cooldown, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameplayConfig {
    /// Share of a target's score value granted for the kill itself.
    /// The remaining share is distributed in proportion to damage dealt.
    pub kill_score_fraction: f64,
    /// Fraction of the explosion duration after which a destroyed
    /// spacecraft stops being shown.
    pub explosion_show_time_ratio: f64,
    /// Cooldown (s) applied when switching to a launcher of another class.
    pub missile_change_cooldown: f32,
    /// Salvo mode applied when switching to a launcher of another class.
    pub default_salvo_mode: bool,
    /// Minimum squared distance between a hull re-test result and the raw
    /// hit position for the re-test result to be used.
    pub damage_indicator_min_distance_squared: f32,
    /// Remaining aim angle (rad) above which turrets keep turning.
    pub turret_turn_threshold: f32,
    /// Remaining aim angle (rad) within which a weapon counts as aimed.
    pub turret_fire_threshold: f32,
    /// Time (s) between a jump-out request and the jump itself.
    pub jump_prepare_duration: f32,
    /// Duration (s) of the jump-out acceleration phase.
    pub jump_out_duration: f32,
    /// Duration (s) of the jump-in deceleration phase.
    pub jump_in_duration: f32,
    /// Forward acceleration (m/s²) while jumping out.
    pub jump_out_acceleration: f32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            kill_score_fraction: 0.3,
            explosion_show_time_ratio: 0.9,
            missile_change_cooldown: 1.0,
            default_salvo_mode: false,
            damage_indicator_min_distance_squared: 1.0,
            turret_turn_threshold: 0.01,
            turret_fire_threshold: 0.05,
            jump_prepare_duration: 2.0,
            jump_out_duration: 1.0,
            jump_in_duration: 1.0,
            jump_out_acceleration: 2000.0,
        }
    }
}

impl GameplayConfig {
    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Explicit simulation context threaded through `simulate` and damage.
///
/// The context replaces process-wide cached flags: it is built once by the
/// driver and passed by reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationContext {
    /// True on a multiplayer guest. Guests run hits speculatively: effects
    /// and events happen, but hitpoints are reverted afterwards because
    /// only the host owns authoritative health.
    pub multi_guest: bool,
    /// Gameplay tunables.
    pub config: GameplayConfig,
}

impl SimulationContext {
    /// Context for a single-player game or a multiplayer host.
    #[must_use]
    pub fn host(config: GameplayConfig) -> Self {
        Self {
            multi_guest: false,
            config,
        }
    }

    /// Context for a multiplayer guest.
    #[must_use]
    pub fn guest(config: GameplayConfig) -> Self {
        Self {
            multi_guest: true,
            config,
        }
    }

    /// Returns true if permanent effects of hits must be reverted.
    #[must_use]
    pub const fn is_speculative(&self) -> bool {
        self.multi_guest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = GameplayConfig::default();
        assert!(config.kill_score_fraction > 0.0 && config.kill_score_fraction < 1.0);
        assert!(config.explosion_show_time_ratio <= 1.0);
        assert!(!config.default_salvo_mode);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            GameplayConfig::from_json(r#"{ "defaultSalvoMode": true, "jumpOutDuration": 3.5 }"#)
                .unwrap();
        assert!(config.default_salvo_mode);
        assert_eq!(config.jump_out_duration, 3.5);
        assert_eq!(config.kill_score_fraction, 0.3);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            GameplayConfig::from_json("[1, 2"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn context_roles() {
        assert!(!SimulationContext::default().is_speculative());
        assert!(!SimulationContext::host(GameplayConfig::default()).is_speculative());
        assert!(SimulationContext::guest(GameplayConfig::default()).is_speculative());
    }
}
