//! Scroll-triggered reveal.
//!
//! The container (or, with a stagger, each of its children) is rendered in a
//! hidden offset state and animated in the first time the container crosses
//! its viewport threshold. The reveal runs once per activation.

use std::fmt;
use std::rc::Rc;

use garage_config::{MotionConfig, ScrollRevealConfig};
use tracing::{debug, trace};

use crate::controller::{AnimationController, ScopeSlot};
use crate::easing::EasingFunction;
use crate::element::ElementRef;
use crate::engine::{Timing, TweenRequest};
use crate::error::{seconds, ActivationError, OptionsError};
use crate::services::MotionServices;
use crate::types::{Property, PropertySet, TweenId};
use crate::viewport::{Threshold, ViewportObserver};

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollRevealOptions {
    pub y: f64,
    pub x: f64,
    /// Starting opacity.
    pub opacity: f64,
    pub duration: f64,
    pub easing: EasingFunction,
    /// When the reveal triggers, e.g. `"top 85%"`.
    pub start: Threshold,
    /// Zero reveals the container as a whole; otherwise each direct child
    /// is revealed in turn with this delay between them.
    pub stagger: f64,
}

impl Default for ScrollRevealOptions {
    fn default() -> Self {
        Self {
            y: 40.0,
            x: 0.0,
            opacity: 0.0,
            duration: 0.7,
            easing: EasingFunction::EaseOutCubic,
            start: Threshold::default(),
            stagger: 0.0,
        }
    }
}

impl ScrollRevealOptions {
    pub fn from_config(
        config: &ScrollRevealConfig,
        motion: &MotionConfig,
    ) -> Result<Self, OptionsError> {
        let duration = seconds("scroll_reveal.duration", config.duration)?;
        let stagger = seconds("scroll_reveal.stagger", config.stagger)?;
        let (duration, stagger) = if motion.reduced_motion {
            (0.0, 0.0)
        } else {
            (duration, stagger)
        };
        Ok(Self {
            y: config.y,
            x: config.x,
            opacity: config.opacity,
            duration,
            easing: config.easing.parse()?,
            start: config.start.parse()?,
            stagger,
        })
    }

    pub fn from_state(&self) -> PropertySet {
        PropertySet::new()
            .with(Property::Opacity, self.opacity)
            .with(Property::TranslateY, self.y)
            .with(Property::TranslateX, self.x)
    }

    /// Elements revealed for `container`. A staggered reveal of a container
    /// without children animates nothing.
    pub fn targets(&self, container: &ElementRef) -> Vec<ElementRef> {
        if self.stagger > 0.0 {
            container.children()
        } else {
            vec![container.clone()]
        }
    }
}

pub struct ScrollRevealAnimation {
    options: ScrollRevealOptions,
    viewport: Rc<dyn ViewportObserver>,
    slot: ScopeSlot,
}

impl ScrollRevealAnimation {
    pub fn new(options: ScrollRevealOptions, services: &MotionServices) -> Self {
        Self {
            options,
            viewport: services.viewport.clone(),
            slot: ScopeSlot::new("scroll-reveal", services.engine.clone()),
        }
    }

    pub fn options(&self) -> &ScrollRevealOptions {
        &self.options
    }
}

impl AnimationController for ScrollRevealAnimation {
    fn activate(&mut self, container: &ElementRef) -> Result<(), ActivationError> {
        let options = &self.options;
        let viewport = &self.viewport;
        self.slot.activate_with(container, |scope| {
            let from = options.from_state();
            let to = from.neutral();
            let mut held: Vec<TweenId> = Vec::new();
            for (index, element) in options.targets(container).into_iter().enumerate() {
                let timing = Timing::new(options.duration, options.easing)
                    .with_delay(index as f64 * options.stagger);
                held.push(scope.spawn(
                    TweenRequest::element(element, to.clone(), timing)
                        .from(from.clone())
                        .paused()
                        .clear_on_complete(),
                )?);
            }

            let live = scope.liveness();
            let engine = scope.engine().clone();
            let token = scope.token();
            let watch = viewport.observe(
                container,
                options.start,
                Box::new(move || {
                    if !live.is_live() {
                        return;
                    }
                    debug!(scope = %token, targets = held.len(), "scroll reveal triggered");
                    for id in held {
                        if let Err(err) = engine.play(id) {
                            trace!("reveal tween already gone: {err}");
                        }
                    }
                }),
            );
            scope.register_watch(viewport.clone(), watch)?;
            Ok(())
        })
    }

    fn deactivate(&mut self) {
        self.slot.clear();
    }

    fn is_active(&self) -> bool {
        self.slot.is_active()
    }
}

impl fmt::Debug for ScrollRevealAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollRevealAnimation")
            .field("options", &self.options)
            .field("slot", &self.slot)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::engine::AnimationEngine;
    use crate::services::HeadlessRuntime;

    const FRAME: f64 = 1.0 / 60.0;

    fn section(top: f64) -> ElementRef {
        let el = Element::new("section");
        el.set_layout(top, 300.0);
        el
    }

    #[test]
    fn test_hidden_until_crossing() {
        let runtime = HeadlessRuntime::new(800.0);
        let el = section(1500.0);
        let mut reveal =
            ScrollRevealAnimation::new(ScrollRevealOptions::default(), &runtime.services());
        reveal.activate(&el).unwrap();

        for _ in 0..30 {
            runtime.frame(FRAME);
        }
        assert_eq!(el.style_value(Property::Opacity), 0.0);
        assert_eq!(el.style_value(Property::TranslateY), 40.0);

        runtime.viewport.scroll_to(900.0);
        runtime.settle(FRAME, 1_000);
        assert!(!el.has_style_overrides());
        assert_eq!(runtime.viewport.watch_count(), 0);
    }

    #[test]
    fn test_fires_once() {
        let runtime = HeadlessRuntime::new(800.0);
        let el = section(1500.0);
        let mut reveal =
            ScrollRevealAnimation::new(ScrollRevealOptions::default(), &runtime.services());
        reveal.activate(&el).unwrap();

        assert_eq!(runtime.viewport.scroll_to(900.0), 1);
        runtime.settle(FRAME, 1_000);
        assert_eq!(runtime.viewport.scroll_to(0.0), 0);
        assert_eq!(runtime.viewport.scroll_to(900.0), 0);
        assert_eq!(runtime.engine.active_count(), 0);
        assert!(!el.has_style_overrides());
    }

    #[test]
    fn test_deactivate_before_trigger_unregisters_watch() {
        let runtime = HeadlessRuntime::new(800.0);
        let el = section(1500.0);
        let mut reveal =
            ScrollRevealAnimation::new(ScrollRevealOptions::default(), &runtime.services());
        reveal.activate(&el).unwrap();
        assert_eq!(runtime.viewport.watch_count(), 1);

        reveal.deactivate();
        reveal.deactivate();
        assert_eq!(runtime.viewport.watch_count(), 0);
        assert_eq!(runtime.engine.active_count(), 0);
        assert!(!el.has_style_overrides());
        assert_eq!(runtime.viewport.scroll_to(900.0), 0);
    }

    #[test]
    fn test_staggered_children() {
        let runtime = HeadlessRuntime::new(800.0);
        let el = section(0.0);
        for _ in 0..3 {
            el.append_child(Element::new("article"));
        }
        let options = ScrollRevealOptions {
            stagger: 0.1,
            ..ScrollRevealOptions::default()
        };
        let mut reveal = ScrollRevealAnimation::new(options, &runtime.services());
        reveal.activate(&el).unwrap();

        let delays: Vec<f64> = runtime
            .engine
            .active_ids()
            .into_iter()
            .map(|id| runtime.engine.tween_info(id).unwrap().timing.delay)
            .collect();
        assert_eq!(delays.len(), 3);
        assert!((delays[2] - 0.2).abs() < 1e-12);
        assert!(!el.has_style_overrides(), "container itself is not animated");
    }

    #[test]
    fn test_staggered_reveal_without_children_animates_nothing() {
        let runtime = HeadlessRuntime::new(800.0);
        let section = Element::new("section");
        section.set_layout(1200.0, 300.0);
        let options = ScrollRevealOptions {
            stagger: 0.1,
            ..ScrollRevealOptions::default()
        };
        assert!(options.targets(&section).is_empty());

        let mut reveal = ScrollRevealAnimation::new(options, &runtime.services());
        reveal.activate(&section).unwrap();
        assert_eq!(runtime.engine.active_count(), 0);
        assert!(!section.has_style_overrides());

        runtime.viewport.scroll_to(1000.0);
        runtime.settle(FRAME, 100);
        assert!(!section.has_style_overrides());
        reveal.deactivate();
        assert_eq!(runtime.viewport.watch_count(), 0);
    }

    #[test]
    fn test_options_from_config() {
        let options =
            ScrollRevealOptions::from_config(&ScrollRevealConfig::default(), &MotionConfig::default())
                .unwrap();
        assert_eq!(options, ScrollRevealOptions::default());

        let bad = ScrollRevealConfig {
            start: "middle".into(),
            ..ScrollRevealConfig::default()
        };
        assert!(matches!(
            ScrollRevealOptions::from_config(&bad, &MotionConfig::default()),
            Err(OptionsError::Threshold(_))
        ));
    }
}
