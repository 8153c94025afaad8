//! Animation engine contract and the headless frame-stepped engine.
//!
//! The motion layer never interpolates on its own: strategies describe a tween
//! with a [`TweenRequest`] and hand it to an [`AnimationEngine`]. The engine
//! owns per-frame scheduling, easing and cancellation. [`FrameEngine`] is a
//! deterministic implementation driven by explicit [`FrameEngine::tick`] calls,
//! used by the demo driver and by tests.
//!
//! # Usage
//!
//! ```
//! use garage_motion::easing::EasingFunction;
//! use garage_motion::engine::{AnimationEngine, FrameEngine, Timing, TweenRequest};
//!
//! let engine = FrameEngine::new();
//! engine
//!     .animate(TweenRequest::scalar(
//!         0.0,
//!         410.0,
//!         Timing::new(1.5, EasingFunction::EaseOutQuadratic),
//!     ))
//!     .unwrap();
//!
//! engine.run_until_idle(1.0 / 60.0, 1_000);
//! assert_eq!(engine.active_count(), 0);
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

use crate::easing::EasingFunction;
use crate::element::{ElementId, ElementRef, InlineStyle};
use crate::error::EngineError;
use crate::events::{EventQueue, TweenEvent};
use crate::types::{Property, PropertySet, TweenId, TweenState};

/// Per-frame progress callback.
pub type UpdateFn = Box<dyn FnMut(&TweenFrame)>;
/// Completion callback, invoked at most once.
pub type CompleteFn = Box<dyn FnOnce()>;

/// What a tween animates.
#[derive(Debug, Clone)]
pub enum TweenTarget {
    /// Inline style properties of an element.
    Element(ElementRef),
    /// A proxy value with no element behind it.
    Scalar,
}

impl TweenTarget {
    pub fn element_id(&self) -> Option<ElementId> {
        match self {
            Self::Element(el) => Some(el.id()),
            Self::Scalar => None,
        }
    }
}

/// Duration, delay and easing of a tween. Times are in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub duration: f64,
    pub delay: f64,
    pub easing: EasingFunction,
}

impl Timing {
    pub fn new(duration: f64, easing: EasingFunction) -> Self {
        Self {
            duration,
            delay: 0.0,
            easing,
        }
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    fn validate(&self) -> Result<(), EngineError> {
        let ok = |v: f64| v.is_finite() && v >= 0.0;
        if ok(self.duration) && ok(self.delay) {
            Ok(())
        } else {
            Err(EngineError::InvalidTiming {
                duration: self.duration,
                delay: self.delay,
            })
        }
    }
}

/// Snapshot handed to the per-frame callback.
#[derive(Debug, Clone, PartialEq)]
pub struct TweenFrame {
    pub tween_id: TweenId,
    /// Linear progress in [0, 1].
    pub progress: f64,
    /// Current values of every animated property.
    pub values: PropertySet,
}

impl TweenFrame {
    pub fn value(&self, property: Property) -> Option<f64> {
        self.values.get(property)
    }

    pub fn is_last(&self) -> bool {
        self.progress >= 1.0
    }
}

/// A request to animate one target.
///
/// Properties present in `to` but missing from `from` start at the target's
/// current value. The start values are rendered onto an element target as
/// soon as the engine accepts the request, so delayed or paused tweens hold
/// their from-state.
pub struct TweenRequest {
    pub target: TweenTarget,
    pub from: PropertySet,
    pub to: PropertySet,
    pub timing: Timing,
    /// Hold the tween until [`AnimationEngine::play`] is called.
    pub paused: bool,
    /// Remove every inline override from the element once the tween finishes.
    pub clear_on_complete: bool,
    pub on_update: Option<UpdateFn>,
    pub on_complete: Option<CompleteFn>,
}

impl TweenRequest {
    /// Animate an element's inline style towards `to`.
    pub fn element(element: ElementRef, to: PropertySet, timing: Timing) -> Self {
        Self {
            target: TweenTarget::Element(element),
            from: PropertySet::new(),
            to,
            timing,
            paused: false,
            clear_on_complete: false,
            on_update: None,
            on_complete: None,
        }
    }

    /// Animate a scalar proxy from `from` to `to`.
    pub fn scalar(from: f64, to: f64, timing: Timing) -> Self {
        Self {
            target: TweenTarget::Scalar,
            from: PropertySet::new().with(Property::Scalar, from),
            to: PropertySet::new().with(Property::Scalar, to),
            timing,
            paused: false,
            clear_on_complete: false,
            on_update: None,
            on_complete: None,
        }
    }

    pub fn from(mut self, from: PropertySet) -> Self {
        self.from = from;
        self
    }

    pub fn paused(mut self) -> Self {
        self.paused = true;
        self
    }

    pub fn clear_on_complete(mut self) -> Self {
        self.clear_on_complete = true;
        self
    }

    pub fn on_update(mut self, f: impl FnMut(&TweenFrame) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for TweenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenRequest")
            .field("target", &self.target.element_id())
            .field("from", &self.from)
            .field("to", &self.to)
            .field("timing", &self.timing)
            .field("paused", &self.paused)
            .field("clear_on_complete", &self.clear_on_complete)
            .field("on_update", &self.on_update.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// How a cancelled tween leaves its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelMode {
    /// Stop where it is.
    Halt,
    /// Stop and restore the pre-animation inline style.
    Revert,
}

/// Contract of the external animation engine.
///
/// Implementations must not hold interior borrows while invoking callbacks:
/// a callback may call back into the engine. Cancelled tweens never invoke
/// their callbacks again.
pub trait AnimationEngine {
    /// Start a tween; the id is the revocation handle.
    fn animate(&self, request: TweenRequest) -> Result<TweenId, EngineError>;

    /// Release a paused tween. Playing a running tween is a no-op.
    fn play(&self, id: TweenId) -> Result<(), EngineError>;

    /// Cancel a tween; returns false if it already finished or never existed.
    fn cancel(&self, id: TweenId, mode: CancelMode) -> bool;

    /// Number of tweens that have neither finished nor been cancelled.
    fn active_count(&self) -> usize;
}

/// Read-only view of a tween held by [`FrameEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct TweenInfo {
    pub state: TweenState,
    pub element: Option<ElementId>,
    pub timing: Timing,
    pub elapsed: f64,
}

struct ActiveTween {
    target: TweenTarget,
    start: PropertySet,
    to: PropertySet,
    timing: Timing,
    elapsed: f64,
    state: TweenState,
    clear_on_complete: bool,
    /// Inline style before the engine touched the element.
    snapshot: Option<InlineStyle>,
    on_update: Option<UpdateFn>,
    on_complete: Option<CompleteFn>,
}

struct Step {
    progress: f64,
    values: PropertySet,
    finished: bool,
}

impl ActiveTween {
    fn advance(&mut self, delta: f64) -> Option<Step> {
        if matches!(
            self.state,
            TweenState::Paused | TweenState::Finished | TweenState::Cancelled
        ) {
            return None;
        }

        self.elapsed += delta;
        if self.elapsed < self.timing.delay {
            self.state = TweenState::Pending;
            return None;
        }
        self.state = TweenState::Running;

        let active = self.elapsed - self.timing.delay;
        let progress = if self.timing.duration <= 0.0 {
            1.0
        } else {
            (active / self.timing.duration).min(1.0)
        };
        let eased = if progress >= 1.0 {
            1.0
        } else {
            self.timing.easing.evaluate(progress as f32) as f64
        };

        Some(Step {
            progress,
            values: self.start.interpolate(&self.to, eased, |p| p.natural_value()),
            finished: progress >= 1.0,
        })
    }

    fn element(&self) -> Option<&ElementRef> {
        match &self.target {
            TweenTarget::Element(el) => Some(el),
            TweenTarget::Scalar => None,
        }
    }
}

#[derive(Default)]
struct EngineInner {
    tweens: BTreeMap<TweenId, ActiveTween>,
    capacity: Option<usize>,
    events: EventQueue,
    frames: u64,
}

/// Headless engine advanced by explicit frame ticks.
///
/// Frames are delivered in tween creation order. Every tween produces at
/// least one frame, so zero-length tweens still report their end values.
#[derive(Default)]
pub struct FrameEngine {
    inner: RefCell<EngineInner>,
}

impl FrameEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that rejects new tweens once `limit` are active.
    pub fn with_capacity(limit: usize) -> Self {
        let engine = Self::default();
        engine.inner.borrow_mut().capacity = Some(limit);
        engine
    }

    /// Advance every tween by `delta` seconds and deliver their frames.
    ///
    /// Returns the number of frames delivered.
    pub fn tick(&self, delta: f64) -> usize {
        let steps: Vec<(TweenId, Step)> = {
            let mut inner = self.inner.borrow_mut();
            inner.frames += 1;
            inner
                .tweens
                .iter_mut()
                .filter_map(|(id, tween)| tween.advance(delta).map(|step| (*id, step)))
                .collect()
        };

        let mut delivered = 0;
        for (id, step) in steps {
            if self.deliver(id, step) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Tick until no tween is active or `max_frames` have elapsed.
    ///
    /// Paused tweens keep the engine busy, so the frame cap bounds the loop.
    pub fn run_until_idle(&self, delta: f64, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && self.active_count() > 0 {
            self.tick(delta);
            frames += 1;
        }
        frames
    }

    fn deliver(&self, id: TweenId, step: Step) -> bool {
        let (mut update, complete) = {
            let mut inner = self.inner.borrow_mut();
            if step.finished {
                // Possibly cancelled by a callback earlier in this frame.
                let Some(mut tween) = inner.tweens.remove(&id) else {
                    return false;
                };
                tween.state = TweenState::Finished;
                if let Some(el) = tween.element() {
                    // Finishing drops every override, including ones that predate
                    // the tween; only a reverting cancel puts the snapshot back.
                    if tween.clear_on_complete {
                        el.clear_styles();
                    } else {
                        el.apply_styles(&step.values);
                    }
                }
                inner.events.push(TweenEvent::Ended {
                    tween_id: id,
                    element: tween.target.element_id(),
                });
                (tween.on_update.take(), tween.on_complete.take())
            } else {
                let Some(tween) = inner.tweens.get_mut(&id) else {
                    return false;
                };
                if let Some(el) = tween.element() {
                    el.apply_styles(&step.values);
                }
                (tween.on_update.take(), None)
            }
        };

        trace!(tween = %id, progress = step.progress, "frame");
        let frame = TweenFrame {
            tween_id: id,
            progress: step.progress,
            values: step.values,
        };
        if let Some(cb) = update.as_mut() {
            cb(&frame);
        }
        if !step.finished {
            if let Some(cb) = update {
                if let Some(tween) = self.inner.borrow_mut().tweens.get_mut(&id) {
                    tween.on_update = Some(cb);
                }
            }
        }
        if let Some(done) = complete {
            done();
        }
        true
    }

    pub fn frame_count(&self) -> u64 {
        self.inner.borrow().frames
    }

    pub fn tween_info(&self, id: TweenId) -> Option<TweenInfo> {
        self.inner.borrow().tweens.get(&id).map(|t| TweenInfo {
            state: t.state,
            element: t.target.element_id(),
            timing: t.timing,
            elapsed: t.elapsed,
        })
    }

    /// Ids of all active tweens in creation order.
    pub fn active_ids(&self) -> Vec<TweenId> {
        self.inner.borrow().tweens.keys().copied().collect()
    }

    pub fn drain_events(&self) -> Vec<TweenEvent> {
        self.inner.borrow_mut().events.drain()
    }

    pub fn pending_event_count(&self) -> usize {
        self.inner.borrow().events.len()
    }

    /// Events discarded because nobody drained the queue in time.
    pub fn dropped_event_count(&self) -> u64 {
        self.inner.borrow().events.dropped()
    }
}

impl AnimationEngine for FrameEngine {
    fn animate(&self, request: TweenRequest) -> Result<TweenId, EngineError> {
        request.timing.validate()?;

        let mut inner = self.inner.borrow_mut();
        if let Some(limit) = inner.capacity {
            if inner.tweens.len() >= limit {
                return Err(EngineError::CapacityExhausted { limit });
            }
        }

        let TweenRequest {
            target,
            from,
            to,
            timing,
            paused,
            clear_on_complete,
            on_update,
            on_complete,
        } = request;

        // Resolve start values now so later frames interpolate from a fixed origin.
        let start: PropertySet = to
            .properties()
            .map(|p| {
                let current = match &target {
                    TweenTarget::Element(el) => el.style_value(p),
                    TweenTarget::Scalar => p.natural_value(),
                };
                (p, from.get(p).unwrap_or(current))
            })
            .collect();

        let snapshot = match &target {
            TweenTarget::Element(el) => {
                let snapshot = el.inline_style();
                el.apply_styles(&start);
                Some(snapshot)
            }
            TweenTarget::Scalar => None,
        };

        let id = TweenId::new();
        inner.events.push(TweenEvent::Started {
            tween_id: id,
            element: target.element_id(),
            delay: timing.delay,
            paused,
        });
        inner.tweens.insert(
            id,
            ActiveTween {
                target,
                start,
                to,
                timing,
                elapsed: 0.0,
                state: if paused {
                    TweenState::Paused
                } else {
                    TweenState::Pending
                },
                clear_on_complete,
                snapshot,
                on_update,
                on_complete,
            },
        );
        trace!(tween = %id, paused, delay = timing.delay, "tween started");
        Ok(id)
    }

    fn play(&self, id: TweenId) -> Result<(), EngineError> {
        let mut inner = self.inner.borrow_mut();
        let tween = inner
            .tweens
            .get_mut(&id)
            .ok_or(EngineError::UnknownTween(id))?;
        if tween.state == TweenState::Paused {
            tween.state = TweenState::Pending;
            inner.events.push(TweenEvent::Played { tween_id: id });
        }
        Ok(())
    }

    fn cancel(&self, id: TweenId, mode: CancelMode) -> bool {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let removed = inner.tweens.remove(&id);
            if let Some(tween) = &removed {
                inner.events.push(TweenEvent::Cancelled {
                    tween_id: id,
                    element: tween.target.element_id(),
                    reverted: mode == CancelMode::Revert,
                });
            }
            removed
        };

        // Callbacks are dropped outside the borrow; their captures may own
        // handles that call back into the engine.
        let Some(mut tween) = removed else {
            return false;
        };
        tween.state = TweenState::Cancelled;
        if mode == CancelMode::Revert {
            if let (Some(el), Some(snapshot)) = (tween.element().cloned(), tween.snapshot.take()) {
                el.restore_style(snapshot);
            }
        }
        trace!(tween = %id, ?mode, "tween cancelled");
        true
    }

    fn active_count(&self) -> usize {
        self.inner.borrow().tweens.len()
    }
}

static_assertions::assert_not_impl_any!(FrameEngine: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use std::cell::Cell;
    use std::rc::Rc;

    const FRAME: f64 = 1.0 / 60.0;

    fn fade_in(el: &ElementRef, duration: f64) -> TweenRequest {
        TweenRequest::element(
            el.clone(),
            PropertySet::new().with(Property::Opacity, 1.0),
            Timing::new(duration, EasingFunction::Linear),
        )
        .from(PropertySet::new().with(Property::Opacity, 0.0))
    }

    #[test]
    fn test_scalar_tween_reaches_target_exactly() {
        let engine = FrameEngine::new();
        let last = Rc::new(Cell::new(f64::NAN));
        let sink = last.clone();
        engine
            .animate(
                TweenRequest::scalar(0.0, 1500.0, Timing::new(1.5, EasingFunction::EaseOutQuadratic))
                    .on_update(move |f| sink.set(f.value(Property::Scalar).unwrap())),
            )
            .unwrap();

        engine.run_until_idle(FRAME, 1_000);
        assert_eq!(last.get(), 1500.0);
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_from_state_rendered_immediately() {
        let engine = FrameEngine::new();
        let el = Element::new("div");
        engine.animate(fade_in(&el, 0.5).paused()).unwrap();
        assert_eq!(el.style_value(Property::Opacity), 0.0);

        engine.tick(FRAME);
        assert_eq!(el.style_value(Property::Opacity), 0.0, "paused tweens hold");
    }

    #[test]
    fn test_play_releases_paused_tween() {
        let engine = FrameEngine::new();
        let el = Element::new("div");
        let id = engine.animate(fade_in(&el, 0.1).paused()).unwrap();
        assert_eq!(engine.tween_info(id).unwrap().state, TweenState::Paused);

        engine.play(id).unwrap();
        engine.run_until_idle(FRAME, 100);
        assert_eq!(el.style_value(Property::Opacity), 1.0);
        assert!(engine.play(id).is_err());
    }

    #[test]
    fn test_delay_holds_from_state() {
        let engine = FrameEngine::new();
        let el = Element::new("div");
        let id = engine
            .animate(TweenRequest {
                timing: Timing::new(0.1, EasingFunction::Linear).with_delay(0.5),
                ..fade_in(&el, 0.1)
            })
            .unwrap();

        assert_eq!(engine.tick(0.25), 0);
        assert_eq!(engine.tween_info(id).unwrap().state, TweenState::Pending);
        assert_eq!(el.style_value(Property::Opacity), 0.0);
        assert_eq!(engine.tick(0.3), 1);
    }

    #[test]
    fn test_clear_on_complete_restores_natural_style() {
        let engine = FrameEngine::new();
        let el = Element::new("div");
        engine.animate(fade_in(&el, 0.1).clear_on_complete()).unwrap();
        engine.run_until_idle(FRAME, 100);
        assert!(!el.has_style_overrides());
    }

    #[test]
    fn test_clear_on_complete_drops_earlier_overrides() {
        let engine = FrameEngine::new();
        let el = Element::new("div");
        el.set_style(Property::Opacity, 0.0);
        el.set_style(Property::TranslateY, -16.0);
        engine.animate(fade_in(&el, 0.1).clear_on_complete()).unwrap();
        engine.run_until_idle(FRAME, 100);
        assert!(!el.has_style_overrides());
        assert_eq!(el.style_value(Property::Opacity), 1.0);
        assert_eq!(el.style_value(Property::TranslateY), 0.0);
    }

    #[test]
    fn test_revert_still_restores_earlier_overrides() {
        let engine = FrameEngine::new();
        let el = Element::new("div");
        el.set_style(Property::TranslateY, -16.0);
        let id = engine.animate(fade_in(&el, 1.0).clear_on_complete()).unwrap();
        engine.tick(FRAME);
        assert!(engine.cancel(id, CancelMode::Revert));
        assert_eq!(el.style_value(Property::TranslateY), -16.0);
        assert_eq!(el.style_value(Property::Opacity), 1.0);
    }

    #[test]
    fn test_missing_from_starts_at_current_value() {
        let engine = FrameEngine::new();
        let el = Element::new("div");
        el.set_style(Property::Opacity, 0.5);
        engine
            .animate(TweenRequest::element(
                el.clone(),
                PropertySet::new().with(Property::Opacity, 0.0),
                Timing::new(1.0, EasingFunction::Linear),
            ))
            .unwrap();

        engine.tick(0.5);
        assert!((el.style_value(Property::Opacity) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_cancel_revert_and_halt() {
        let engine = FrameEngine::new();
        let a = Element::new("div");
        let b = Element::new("div");
        let ia = engine.animate(fade_in(&a, 1.0)).unwrap();
        let ib = engine.animate(fade_in(&b, 1.0)).unwrap();
        engine.tick(0.5);

        assert!(engine.cancel(ia, CancelMode::Revert));
        assert!(!a.has_style_overrides());

        assert!(engine.cancel(ib, CancelMode::Halt));
        assert!((b.style_value(Property::Opacity) - 0.5).abs() < 1e-9);

        assert!(!engine.cancel(ia, CancelMode::Revert));
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_cancelled_tween_never_calls_back() {
        let engine = FrameEngine::new();
        let calls = Rc::new(Cell::new(0));
        let (c1, c2) = (calls.clone(), calls.clone());
        let id = engine
            .animate(
                TweenRequest::scalar(0.0, 1.0, Timing::new(0.2, EasingFunction::Linear))
                    .on_update(move |_| c1.set(c1.get() + 1))
                    .on_complete(move || c2.set(c2.get() + 100)),
            )
            .unwrap();
        engine.tick(FRAME);
        engine.cancel(id, CancelMode::Revert);
        engine.run_until_idle(FRAME, 100);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_zero_duration_reports_one_frame() {
        let engine = FrameEngine::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        engine
            .animate(
                TweenRequest::scalar(0.0, 0.0, Timing::new(0.0, EasingFunction::Linear))
                    .on_update(move |f| sink.borrow_mut().push(f.value(Property::Scalar).unwrap())),
            )
            .unwrap();
        engine.tick(FRAME);
        assert_eq!(*seen.borrow(), vec![0.0]);
    }

    #[test]
    fn test_callback_may_reenter_engine() {
        let engine = Rc::new(FrameEngine::new());
        let el = Element::new("div");
        let chained = Rc::new(Cell::new(None));

        let (eng, target, slot) = (engine.clone(), el.clone(), chained.clone());
        engine
            .animate(fade_in(&el, 0.05).on_complete(move || {
                let id = eng
                    .animate(TweenRequest::element(
                        target,
                        PropertySet::new().with(Property::TranslateY, 10.0),
                        Timing::new(0.05, EasingFunction::Linear),
                    ))
                    .unwrap();
                slot.set(Some(id));
            }))
            .unwrap();

        engine.run_until_idle(FRAME, 100);
        assert!(chained.get().is_some());
        assert_eq!(el.style_value(Property::TranslateY), 10.0);
    }

    #[test]
    fn test_invalid_timing_rejected() {
        let engine = FrameEngine::new();
        let err = engine
            .animate(TweenRequest::scalar(
                0.0,
                1.0,
                Timing::new(f64::NAN, EasingFunction::Linear),
            ))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTiming { .. }));

        let err = engine
            .animate(TweenRequest::scalar(
                0.0,
                1.0,
                Timing::new(1.0, EasingFunction::Linear).with_delay(-0.1),
            ))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTiming { .. }));
    }

    #[test]
    fn test_capacity_exhausted() {
        let engine = FrameEngine::with_capacity(1);
        let timing = Timing::new(1.0, EasingFunction::Linear);
        engine.animate(TweenRequest::scalar(0.0, 1.0, timing)).unwrap();
        let err = engine
            .animate(TweenRequest::scalar(0.0, 1.0, timing))
            .unwrap_err();
        assert_eq!(err, EngineError::CapacityExhausted { limit: 1 });
    }

    #[test]
    fn test_events_recorded() {
        let engine = FrameEngine::new();
        let el = Element::new("div");
        let id = engine.animate(fade_in(&el, 0.05).paused()).unwrap();
        engine.play(id).unwrap();
        engine.run_until_idle(FRAME, 100);

        let events = engine.drain_events();
        assert_eq!(events.len(), 3);
        assert!(events[0].is_started());
        assert!(events[1].is_played());
        assert!(events[2].is_ended());
        assert_eq!(engine.pending_event_count(), 0);
    }
}
