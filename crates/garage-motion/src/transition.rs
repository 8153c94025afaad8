//! Route transition presets.
//!
//! Stateless enter/leave pairs used by transition groups when pages and
//! overlays are swapped. Each call starts one tween and reports completion
//! through `done`, exactly once. Nothing is scoped or memoized: the host owns
//! the element for the duration of the transition.
//!
//! | preset  | enter from            | enter                    | leave to              | leave                  |
//! |---------|-----------------------|--------------------------|-----------------------|------------------------|
//! | `page`  | opacity 0, y 16       | 0.35s ease-out-quadratic | opacity 0, y -16      | 0.2s ease-in-quadratic |
//! | `fade`  | opacity 0             | 0.25s ease-out-sine      | opacity 0             | 0.2s ease-in-sine      |
//! | `scale` | opacity 0, scale 0.94 | 0.3s back-out(1.4)       | opacity 0, scale 0.94 | 0.2s ease-in-quadratic |

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::easing::EasingFunction;
use crate::element::ElementRef;
use crate::engine::{AnimationEngine, Timing, TweenRequest};
use crate::types::{Property, PropertySet};

/// Completion callback of a transition.
pub type DoneFn = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPreset {
    /// Route changes: fade with a short vertical slide.
    #[default]
    Page,
    Fade,
    /// Dialogs and popovers: fade with a slight zoom.
    Scale,
}

/// Direction of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Enter,
    Leave,
}

impl TransitionPreset {
    pub const ALL: [Self; 3] = [Self::Page, Self::Fade, Self::Scale];

    /// Hidden state an entering element starts from.
    pub fn enter_from(&self) -> PropertySet {
        let hidden = PropertySet::new().with(Property::Opacity, 0.0);
        match self {
            Self::Page => hidden.with(Property::TranslateY, 16.0),
            Self::Fade => hidden,
            Self::Scale => hidden.with(Property::Scale, 0.94),
        }
    }

    /// Hidden state a leaving element ends in.
    pub fn leave_to(&self) -> PropertySet {
        let hidden = PropertySet::new().with(Property::Opacity, 0.0);
        match self {
            Self::Page => hidden.with(Property::TranslateY, -16.0),
            Self::Fade => hidden,
            Self::Scale => hidden.with(Property::Scale, 0.94),
        }
    }

    pub fn timing(&self, phase: Phase) -> Timing {
        match (self, phase) {
            (Self::Page, Phase::Enter) => Timing::new(0.35, EasingFunction::EaseOutQuadratic),
            (Self::Fade, Phase::Enter) => Timing::new(0.25, EasingFunction::EaseOutSine),
            (Self::Scale, Phase::Enter) => Timing::new(0.3, EasingFunction::back_out(1.4)),
            (Self::Fade, Phase::Leave) => Timing::new(0.2, EasingFunction::EaseInSine),
            (Self::Page | Self::Scale, Phase::Leave) => {
                Timing::new(0.2, EasingFunction::EaseInQuadratic)
            }
        }
    }

    /// Whether inline overrides are removed once the element has entered.
    pub fn clears_after_enter(&self) -> bool {
        !matches!(self, Self::Fade)
    }
}

/// Wrap `done` so that it runs at most once across all holders.
fn once(done: DoneFn) -> Rc<dyn Fn()> {
    let slot = Cell::new(Some(done));
    Rc::new(move || {
        if let Some(done) = slot.take() {
            done();
        }
    })
}

/// Animate `element` in from the preset's hidden state.
pub fn enter(
    engine: &dyn AnimationEngine,
    preset: TransitionPreset,
    element: &ElementRef,
    done: DoneFn,
) {
    let from = preset.enter_from();
    let to = from.neutral();
    let mut request =
        TweenRequest::element(element.clone(), to.clone(), preset.timing(Phase::Enter)).from(from);
    if preset.clears_after_enter() {
        request = request.clear_on_complete();
    }
    run(engine, request, element, &to, preset.clears_after_enter(), done);
}

/// Animate `element` out to the preset's hidden state.
pub fn leave(
    engine: &dyn AnimationEngine,
    preset: TransitionPreset,
    element: &ElementRef,
    done: DoneFn,
) {
    let to = preset.leave_to();
    let request = TweenRequest::element(element.clone(), to.clone(), preset.timing(Phase::Leave));
    run(engine, request, element, &to, false, done);
}

fn run(
    engine: &dyn AnimationEngine,
    request: TweenRequest,
    element: &ElementRef,
    end: &PropertySet,
    clear: bool,
    done: DoneFn,
) {
    let done = once(done);
    let on_complete = done.clone();
    if let Err(err) = engine.animate(request.on_complete(move || on_complete())) {
        warn!("transition fell back to its final state: {err}");
        if clear {
            element.clear_styles();
        } else {
            element.apply_styles(end);
        }
        done();
    }
}
