//! Game error types and the non-fatal diagnostics sink.
//!
//! Nothing in the simulation is allowed to crash the process: a missing
//! collaborator, an ineligible upgrade request, or an unavailable prefab all
//! degrade to a no-op.  They are reported through [`Diagnostics`] so they
//! still fail loudly in the log during development.
//!
//! ## Usage
//!
//! ```rust
//! use santet_survivors::error::{Diagnostics, GameError};
//!
//! let mut diagnostics = Diagnostics::default();
//! diagnostics.report(GameError::MissingCollaborator {
//!     collaborator: "PlayerStats",
//!     context: "apply_upgrade",
//! });
//! assert_eq!(diagnostics.count(), 1);
//! ```

use crate::progression::UpgradeKind;
use bevy::prelude::*;
use std::collections::HashSet;
use std::fmt;

/// Top-level error enum for the game simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    /// A required component or resource was absent at the point of use.
    /// The dependent feature stays inert.
    MissingCollaborator {
        /// Name of the missing collaborator.
        collaborator: &'static str,
        /// Human-readable description of where the lookup occurred.
        context: &'static str,
    },

    /// `SelectUpgrade` was called with a kind that is capped, already
    /// unlocked, or not yet unlocked.  Treated as a no-op.
    InvalidUpgradeRequest {
        kind: UpgradeKind,
        reason: &'static str,
    },

    /// A prefab/asset factory had nothing to spawn for the given key.
    ResourceUnavailable {
        resource: String,
    },

    /// Config value is outside its safe operating range.
    UnsafeConstant {
        /// Name of the config field (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the safe range.
        safe_range: &'static str,
    },

    /// The preference file could not be read or written.
    PreferenceIo {
        path: String,
        details: String,
    },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::MissingCollaborator {
                collaborator,
                context,
            } => write!(
                f,
                "missing collaborator '{}' during '{}'; feature disabled",
                collaborator, context
            ),
            GameError::InvalidUpgradeRequest { kind, reason } => {
                write!(f, "upgrade request {:?} ignored: {}", kind, reason)
            }
            GameError::ResourceUnavailable { resource } => {
                write!(f, "resource '{}' unavailable; spawn skipped", resource)
            }
            GameError::UnsafeConstant {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "constant '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
            GameError::PreferenceIo { path, details } => {
                write!(f, "preference file '{}': {}", path, details)
            }
        }
    }
}

impl std::error::Error for GameError {}

/// Convenience alias: a `Result` using `GameError` as the error type.
pub type GameResult<T> = Result<T, GameError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error if `value` is not strictly positive.
pub fn validate_positive(name: &'static str, value: f32) -> GameResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(GameError::UnsafeConstant {
            name,
            value,
            safe_range: "(0.0, ∞)",
        })
    }
}

/// Returns an error if a fire rate would produce a zero or infinite interval.
pub fn validate_fire_rate(name: &'static str, value: f32) -> GameResult<()> {
    validate_positive(name, value)
}

/// Returns an error if `value` lies outside `[0, 1]`.
pub fn validate_unit_interval(name: &'static str, value: f32) -> GameResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GameError::UnsafeConstant {
            name,
            value,
            safe_range: "[0.0, 1.0]",
        })
    }
}

// ── Diagnostics sink ──────────────────────────────────────────────────────────

/// Keeps at most this many recent reports in memory.
const DIAGNOSTIC_HISTORY: usize = 64;

/// Collects non-fatal errors.  Every report is logged with `warn!`.
#[derive(Resource, Debug, Default)]
pub struct Diagnostics {
    recent: Vec<GameError>,
    total: usize,
    reported_once: HashSet<String>,
}

impl Diagnostics {
    pub fn report(&mut self, error: GameError) {
        warn!("{}", error);
        self.total += 1;
        if self.recent.len() == DIAGNOSTIC_HISTORY {
            self.recent.remove(0);
        }
        self.recent.push(error);
    }

    /// Report `error` only the first time `key` is seen.
    pub fn report_once(&mut self, key: &str, error: GameError) {
        if self.reported_once.insert(key.to_string()) {
            self.report(error);
        }
    }

    /// Total reports since startup.
    pub fn count(&self) -> usize {
        self.total
    }

    pub fn recent(&self) -> &[GameError] {
        &self.recent
    }
}
