//! Scoped animation context.
//!
//! An [`AnimationScope`] collects every tween and viewport watch spawned
//! during one activation of one controller against one container, so the
//! whole activation can be torn down with a single [`AnimationScope::revoke`].
//!
//! ```text
//!   open()          register()/spawn()           revoke()
//!     │                   │                         │
//!     ▼                   ▼                         ▼
//!   Live ───────────── Live ──────────────────── Revoked (terminal)
//! ```
//!
//! A scope is live or revoked and never returns to live. Dropping a live
//! scope revokes it.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error};

use crate::element::{Element, ElementRef};
use crate::engine::{AnimationEngine, CancelMode, TweenRequest};
use crate::error::{ActivationError, ScopeError};
use crate::types::{ActivationToken, TweenId, WatchId};
use crate::viewport::ViewportObserver;

/// Shared flag that turns false once the owning scope is revoked.
///
/// Callbacks handed to collaborators capture a clone and check it before
/// acting, so late notifications after teardown are ignored.
#[derive(Debug, Clone)]
pub struct Liveness(Rc<Cell<bool>>);

impl Liveness {
    pub fn is_live(&self) -> bool {
        self.0.get()
    }
}

struct Watch {
    observer: Rc<dyn ViewportObserver>,
    id: WatchId,
}

pub struct AnimationScope {
    token: ActivationToken,
    container: Weak<Element>,
    engine: Rc<dyn AnimationEngine>,
    live: Rc<Cell<bool>>,
    tweens: Vec<TweenId>,
    watches: Vec<Watch>,
}

impl AnimationScope {
    /// Open a live scope bound to `container`.
    ///
    /// Only a weak reference to the container is kept.
    pub fn open(container: &ElementRef, engine: Rc<dyn AnimationEngine>) -> Self {
        let scope = Self {
            token: ActivationToken::new(),
            container: Rc::downgrade(container),
            engine,
            live: Rc::new(Cell::new(true)),
            tweens: Vec::new(),
            watches: Vec::new(),
        };
        debug!(scope = %scope.token, container = ?container.id(), "scope opened");
        scope
    }

    pub fn token(&self) -> ActivationToken {
        self.token
    }

    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    pub fn liveness(&self) -> Liveness {
        Liveness(self.live.clone())
    }

    /// The container, if it is still alive.
    pub fn container(&self) -> Option<ElementRef> {
        self.container.upgrade()
    }

    pub fn engine(&self) -> &Rc<dyn AnimationEngine> {
        &self.engine
    }

    /// Number of registered tweens and watches.
    pub fn member_count(&self) -> usize {
        self.tweens.len() + self.watches.len()
    }

    pub fn tweens(&self) -> &[TweenId] {
        &self.tweens
    }

    /// Start `request` through the engine and register the tween.
    pub fn spawn(&mut self, request: TweenRequest) -> Result<TweenId, ActivationError> {
        if !self.is_live() {
            return Err(self.rejected("tween request").into());
        }
        let id = self.engine.animate(request)?;
        self.register(id)?;
        Ok(id)
    }

    /// Add an already started tween to the scope.
    ///
    /// On a revoked scope the tween is cancelled immediately and
    /// [`ScopeError::Revoked`] is returned.
    pub fn register(&mut self, id: TweenId) -> Result<(), ScopeError> {
        if !self.is_live() {
            self.engine.cancel(id, CancelMode::Revert);
            return Err(self.rejected(&id.to_string()));
        }
        self.tweens.push(id);
        Ok(())
    }

    /// Add an armed viewport watch to the scope.
    pub fn register_watch(
        &mut self,
        observer: Rc<dyn ViewportObserver>,
        id: WatchId,
    ) -> Result<(), ScopeError> {
        if !self.is_live() {
            observer.unobserve(id);
            return Err(self.rejected(&id.to_string()));
        }
        self.watches.push(Watch { observer, id });
        Ok(())
    }

    /// Cancel every member and mark the scope revoked. Idempotent.
    ///
    /// Tweens are cancelled with revert semantics; watches that have not fired
    /// are unregistered. The liveness flag flips before any cancellation so
    /// callbacks dropped during teardown observe a dead scope.
    pub fn revoke(&mut self) {
        if !self.live.replace(false) {
            return;
        }
        let tweens = std::mem::take(&mut self.tweens);
        let watches = std::mem::take(&mut self.watches);
        let mut cancelled = 0;
        for id in &tweens {
            if self.engine.cancel(*id, CancelMode::Revert) {
                cancelled += 1;
            }
        }
        for watch in &watches {
            watch.observer.unobserve(watch.id);
        }
        debug!(
            scope = %self.token,
            tweens = tweens.len(),
            in_flight = cancelled,
            watches = watches.len(),
            "scope revoked"
        );
    }

    fn rejected(&self, member: &str) -> ScopeError {
        let err = ScopeError::Revoked {
            token: self.token,
            member: member.to_string(),
        };
        error!("{err}");
        err
    }
}

impl Drop for AnimationScope {
    fn drop(&mut self) {
        self.revoke();
    }
}

impl fmt::Debug for AnimationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationScope")
            .field("token", &self.token)
            .field("live", &self.is_live())
            .field("tweens", &self.tweens)
            .field("watches", &self.watches.len())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(AnimationScope: Send, Sync);
static_assertions::assert_not_impl_any!(Liveness: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::EasingFunction;
    use crate::engine::{FrameEngine, Timing};
    use crate::error::EngineError;
    use crate::types::{Property, PropertySet};
    use crate::viewport::{ScrollViewport, Threshold};

    fn setup() -> (Rc<FrameEngine>, ElementRef) {
        (Rc::new(FrameEngine::new()), Element::new("div"))
    }

    fn fade(el: &ElementRef) -> TweenRequest {
        TweenRequest::element(
            el.clone(),
            PropertySet::new().with(Property::Opacity, 1.0),
            Timing::new(1.0, EasingFunction::Linear),
        )
        .from(PropertySet::new().with(Property::Opacity, 0.0))
    }

    #[test]
    fn test_revoke_cancels_all_members() {
        let (engine, el) = setup();
        let viewport = Rc::new(ScrollViewport::new(800.0));
        let mut scope = AnimationScope::open(&el, engine.clone());

        scope.spawn(fade(&el)).unwrap();
        scope.spawn(fade(&el)).unwrap();
        let watch = viewport.observe(&el, Threshold::default(), Box::new(|| {}));
        scope.register_watch(viewport.clone(), watch).unwrap();
        assert_eq!(scope.member_count(), 3);
        assert_eq!(engine.active_count(), 2);

        scope.revoke();
        assert!(!scope.is_live());
        assert_eq!(engine.active_count(), 0);
        assert_eq!(viewport.watch_count(), 0);
        assert!(!el.has_style_overrides(), "revert restores styling");

        scope.revoke();
        assert_eq!(scope.member_count(), 0);
    }

    #[test]
    fn test_register_after_revoke_is_rejected() {
        let (engine, el) = setup();
        let mut scope = AnimationScope::open(&el, engine.clone());
        scope.revoke();

        let orphan = engine.animate(fade(&el)).unwrap();
        let err = scope.register(orphan).unwrap_err();
        assert!(matches!(err, ScopeError::Revoked { token, .. } if token == scope.token()));
        assert_eq!(engine.active_count(), 0, "orphan cancelled");
        assert!(!scope.is_live());

        let err = scope.spawn(fade(&el)).unwrap_err();
        assert!(matches!(err, ActivationError::Scope(_)));
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_register_watch_after_revoke_unobserves() {
        let (engine, el) = setup();
        let viewport = Rc::new(ScrollViewport::new(800.0));
        let mut scope = AnimationScope::open(&el, engine);
        scope.revoke();

        let watch = viewport.observe(&el, Threshold::default(), Box::new(|| {}));
        assert!(scope.register_watch(viewport.clone(), watch).is_err());
        assert_eq!(viewport.watch_count(), 0);
    }

    #[test]
    fn test_drop_revokes() {
        let (engine, el) = setup();
        let liveness = {
            let mut scope = AnimationScope::open(&el, engine.clone());
            scope.spawn(fade(&el)).unwrap();
            scope.liveness()
        };
        assert!(!liveness.is_live());
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_container_is_weak() {
        let (engine, el) = setup();
        let scope = AnimationScope::open(&el, engine);
        assert!(scope.container().is_some());
        drop(el);
        assert!(scope.container().is_none());
    }

    #[test]
    fn test_engine_error_propagates() {
        let engine = Rc::new(FrameEngine::with_capacity(1));
        let el = Element::new("div");
        let mut scope = AnimationScope::open(&el, engine.clone());
        scope.spawn(fade(&el)).unwrap();
        let err = scope.spawn(fade(&el)).unwrap_err();
        assert_eq!(
            err,
            ActivationError::Engine(EngineError::CapacityExhausted { limit: 1 })
        );
        assert!(scope.is_live());
        assert_eq!(scope.member_count(), 1);
    }

    #[test]
    fn test_tokens_are_unique() {
        let (engine, el) = setup();
        let a = AnimationScope::open(&el, engine.clone());
        let b = AnimationScope::open(&el, engine);
        assert_ne!(a.token(), b.token());
    }
}
