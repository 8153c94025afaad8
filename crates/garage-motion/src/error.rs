//! Error types for the motion layer.
//!
//! None of these reach the host's data channel: bindings log and swallow
//! activation errors, and strategies fall back to showing their final state.

use crate::types::{ActivationToken, TweenId};

/// Failure reported by an animation engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid tween timing: duration {duration}s, delay {delay}s")]
    InvalidTiming { duration: f64, delay: f64 },
    #[error("engine capacity of {limit} active tweens exhausted")]
    CapacityExhausted { limit: usize },
    #[error("unknown tween {0}")]
    UnknownTween(TweenId),
}

/// Misuse of an animation scope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    /// A member tried to join a scope that was already torn down.
    #[error("scope {token} was revoked; refusing to register {member}")]
    Revoked {
        token: ActivationToken,
        member: String,
    },
}

/// Failure of a controller activation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActivationError {
    #[error("animation engine failed: {0}")]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Scope(#[from] ScopeError),
}

/// Invalid strategy options read from configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptionsError {
    #[error(transparent)]
    Easing(#[from] crate::easing::ParseEasingError),
    #[error(transparent)]
    Threshold(#[from] crate::viewport::ParseThresholdError),
    #[error("`{field}` must be a finite, non-negative number of seconds, got {value}")]
    Timing { field: &'static str, value: f64 },
    #[error("unknown stagger origin {0:?}, expected start, center, end or edges")]
    Origin(String),
}

/// Check a configured time value.
pub(crate) fn seconds(field: &'static str, value: f64) -> Result<f64, OptionsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(OptionsError::Timing { field, value })
    }
}
