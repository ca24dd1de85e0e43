//! Error types for the combat engine.
//!
//! Geometry, hit resolution and damage math never fail; errors are
//! reserved for content/config loading and for contract violations by
//! the caller.

use thiserror::Error;

use crate::components::EntityId;

/// Result type alias using [`CombatError`].
pub type Result<T> = std::result::Result<T, CombatError>;

/// Top-level error type for the combat engine.
#[derive(Debug, Error)]
pub enum CombatError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Ability id not present in the loaded content.
    #[error("Unknown ability: {0}")]
    UnknownAbility(String),

    /// Monster id not present in the loaded content.
    #[error("Unknown monster: {0}")]
    UnknownMonster(String),

    /// A movement step was requested while the previous one is still interpolating.
    #[error("Entity {0} requested a step while its previous step is still in progress")]
    MoveInProgress(EntityId),

    /// An attack or ability was used before its cooldown elapsed.
    #[error("{action} is not ready for another {ready_in_ms} ms")]
    NotReady {
        /// Attack or ability id.
        action: String,
        /// Time left on the cooldown.
        ready_in_ms: u64,
    },

    /// The acting entity is dead.
    #[error("Entity {0} is dead")]
    EntityDead(EntityId),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or label) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Content or configuration parsed but failed validation.
    #[error("Invalid {kind} '{id}': {reason}")]
    InvalidData {
        /// Kind of record ("ability", "monster", "config").
        kind: &'static str,
        /// Identifier of the offending record.
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Failed to read a data file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// Path that could not be read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
