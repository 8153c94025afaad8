//! The controller contract shared by all scoped strategies.
//!
//! A controller is constructed with configuration and services only; it
//! touches elements only inside [`AnimationController::activate`]. Each
//! controller owns at most one live [`AnimationScope`] through a
//! [`ScopeSlot`], which enforces the activate/deactivate discipline:
//!
//! - `activate` while active fully deactivates first;
//! - a setup failure revokes the partial scope before the error is returned;
//! - `deactivate` is idempotent.

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::element::ElementRef;
use crate::engine::AnimationEngine;
use crate::error::ActivationError;
use crate::scope::AnimationScope;

pub trait AnimationController {
    /// Start the strategy against `container`.
    fn activate(&mut self, container: &ElementRef) -> Result<(), ActivationError>;

    /// Revoke everything spawned by the current activation. Idempotent.
    fn deactivate(&mut self);

    fn is_active(&self) -> bool;
}

/// Holder of a controller's current scope.
pub struct ScopeSlot {
    label: &'static str,
    engine: Rc<dyn AnimationEngine>,
    scope: Option<AnimationScope>,
}

impl ScopeSlot {
    pub fn new(label: &'static str, engine: Rc<dyn AnimationEngine>) -> Self {
        Self {
            label,
            engine,
            scope: None,
        }
    }

    /// Replace the current scope with a fresh one and run `setup` in it.
    ///
    /// The previous scope is revoked before the new one opens. If `setup`
    /// fails the new scope is revoked and the slot is left empty.
    pub fn activate_with<F>(&mut self, container: &ElementRef, setup: F) -> Result<(), ActivationError>
    where
        F: FnOnce(&mut AnimationScope) -> Result<(), ActivationError>,
    {
        self.clear();
        let mut scope = AnimationScope::open(container, self.engine.clone());
        match setup(&mut scope) {
            Ok(()) => {
                debug!(controller = self.label, scope = %scope.token(), members = scope.member_count(), "activated");
                self.scope = Some(scope);
                Ok(())
            }
            Err(err) => {
                scope.revoke();
                Err(err)
            }
        }
    }

    /// Revoke and drop the current scope; returns false if there was none.
    pub fn clear(&mut self) -> bool {
        match self.scope.take() {
            Some(mut scope) => {
                scope.revoke();
                debug!(controller = self.label, scope = %scope.token(), "deactivated");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.scope.is_some()
    }

    pub fn scope(&self) -> Option<&AnimationScope> {
        self.scope.as_ref()
    }

    pub fn engine(&self) -> &Rc<dyn AnimationEngine> {
        &self.engine
    }
}

impl fmt::Debug for ScopeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeSlot")
            .field("label", &self.label)
            .field("scope", &self.scope)
            .finish()
    }
}

impl Drop for ScopeSlot {
    fn drop(&mut self) {
        self.clear();
    }
}
