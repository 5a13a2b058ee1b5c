//! Error types for construction and synchronization paths.
//!
//! Gameplay commands never fail loudly: gated or invalid commands are no-ops
//! that log a diagnostic and return a falsy value. Errors are reserved for
//! building spacecraft from configuration and for decoding network records.

use thiserror::Error;

/// Errors raised while loading classes, loadouts and spacecraft specs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No spacecraft class with this name is registered.
    #[error("unknown spacecraft class `{0}`")]
    UnknownClass(String),
    /// No named loadout with this name is registered.
    #[error("unknown loadout `{0}`")]
    UnknownLoadout(String),
    /// A loadout's `basedOn` chain refers back to itself.
    #[error("loadout `{0}` is based on itself")]
    LoadoutCycle(String),
    /// No weapon class with this name is registered.
    #[error("unknown weapon class `{0}`")]
    UnknownWeaponClass(String),
    /// No missile class with this name is registered.
    #[error("unknown missile class `{0}`")]
    UnknownMissileClass(String),
    /// No propulsion class with this name is registered.
    #[error("unknown propulsion class `{0}`")]
    UnknownPropulsionClass(String),
    /// No shield class with this name is registered.
    #[error("unknown shield class `{0}`")]
    UnknownShieldClass(String),
    /// No jump engine class with this name is registered.
    #[error("unknown jump engine class `{0}`")]
    UnknownJumpEngineClass(String),
    /// A squad designation is not of the form `"name"` or `"name index"`.
    #[error("invalid squad designation `{0}`")]
    InvalidSquad(String),
    /// The configuration document could not be parsed.
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while decoding multiplayer records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The buffer ends before the record does.
    #[error("sync buffer too short: needed {needed} values, got {got}")]
    BufferTooShort {
        /// Number of values required from the start of the buffer
        needed: usize,
        /// Number of values available
        got: usize,
    },
    /// A guest record names a spacecraft index the arena does not hold.
    #[error("no spacecraft with multiplayer index {0}")]
    NoSuchSpacecraft(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_messages_name_the_culprit() {
        let err = ConfigError::UnknownClass("falcon".to_string());
        assert_eq!(err.to_string(), "unknown spacecraft class `falcon`");

        let err = ConfigError::InvalidSquad("alpha one two".to_string());
        assert!(err.to_string().contains("alpha one two"));
    }

    #[test]
    fn json_errors_convert() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{ nope");
        let err: ConfigError = parse.unwrap_err().into();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn sync_error_reports_sizes() {
        let err = SyncError::BufferTooShort { needed: 30, got: 12 };
        assert_eq!(
            err.to_string(),
            "sync buffer too short: needed 30 values, got 12"
        );
    }
}
