//! Animated numeric counter.
//!
//! Counts a scalar from 0 up to a target and reports every frame's value,
//! rounded to the nearest integer, to a display callback. Used for the
//! dashboard stat cards (build count, total horsepower, spend).

use std::fmt;
use std::rc::Rc;

use garage_config::{CounterConfig, MotionConfig};

use crate::controller::{AnimationController, ScopeSlot};
use crate::easing::EasingFunction;
use crate::element::ElementRef;
use crate::engine::{Timing, TweenRequest};
use crate::error::{seconds, ActivationError, OptionsError};
use crate::services::MotionServices;
use crate::types::Property;

#[derive(Debug, Clone, PartialEq)]
pub struct CounterOptions {
    /// Seconds from 0 to the target.
    pub duration: f64,
    pub easing: EasingFunction,
    /// Prepended by [`CounterOptions::format`], e.g. `"$"`.
    pub prefix: String,
    pub suffix: String,
}

impl Default for CounterOptions {
    fn default() -> Self {
        Self {
            duration: 1.5,
            easing: EasingFunction::EaseOutQuadratic,
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

impl CounterOptions {
    pub fn from_config(config: &CounterConfig, motion: &MotionConfig) -> Result<Self, OptionsError> {
        let duration = seconds("counter.duration", config.duration)?;
        Ok(Self {
            duration: if motion.reduced_motion { 0.0 } else { duration },
            easing: config.easing.parse()?,
            prefix: config.prefix.clone(),
            suffix: config.suffix.clone(),
        })
    }

    /// Display form of a counter value.
    pub fn format(&self, value: i64) -> String {
        format!("{}{}{}", self.prefix, value, self.suffix)
    }
}

pub struct CounterAnimation {
    target: f64,
    on_update: Rc<dyn Fn(i64)>,
    options: CounterOptions,
    slot: ScopeSlot,
}

impl CounterAnimation {
    pub fn new(
        target: f64,
        on_update: impl Fn(i64) + 'static,
        services: &MotionServices,
        options: CounterOptions,
    ) -> Self {
        Self {
            target,
            on_update: Rc::new(on_update),
            options,
            slot: ScopeSlot::new("counter", services.engine.clone()),
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Change the goal used by the next activation. A running count keeps
    /// its original target.
    pub fn update_target(&mut self, target: f64) {
        self.target = target;
    }

    pub fn options(&self) -> &CounterOptions {
        &self.options
    }
}

impl AnimationController for CounterAnimation {
    fn activate(&mut self, container: &ElementRef) -> Result<(), ActivationError> {
        let target = self.target;
        let timing = Timing::new(self.options.duration, self.options.easing);
        let on_update = self.on_update.clone();

        let result = self.slot.activate_with(container, |scope| {
            let live = scope.liveness();
            let report = on_update.clone();
            let request = TweenRequest::scalar(0.0, target, timing).on_update(move |frame| {
                if live.is_live() {
                    let value = frame.value(Property::Scalar).unwrap_or_default();
                    report(value.round() as i64);
                }
            });
            scope.spawn(request).map(|_| ())
        });

        if let Err(ActivationError::Engine(_)) = &result {
            on_update(target.round() as i64);
        }
        result
    }

    fn deactivate(&mut self) {
        self.slot.clear();
    }

    fn is_active(&self) -> bool {
        self.slot.is_active()
    }
}

impl fmt::Debug for CounterAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterAnimation")
            .field("target", &self.target)
            .field("options", &self.options)
            .field("active", &self.slot.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::engine::{AnimationEngine, FrameEngine};
    use crate::services::HeadlessRuntime;
    use std::cell::RefCell;

    const FRAME: f64 = 1.0 / 60.0;

    fn recording(
        target: f64,
        runtime: &HeadlessRuntime,
    ) -> (CounterAnimation, Rc<RefCell<Vec<i64>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let counter = CounterAnimation::new(
            target,
            move |v| sink.borrow_mut().push(v),
            &runtime.services(),
            CounterOptions::default(),
        );
        (counter, seen)
    }

    #[test]
    fn test_counts_up_to_target() {
        let runtime = HeadlessRuntime::new(800.0);
        let (mut counter, seen) = recording(410.0, &runtime);
        counter.activate(&Element::new("span")).unwrap();
        runtime.settle(FRAME, 1_000);

        let seen = seen.borrow();
        assert!(seen.len() > 1);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(seen.iter().all(|v| *v >= 0));
        assert_eq!(*seen.last().unwrap(), 410);
    }

    #[test]
    fn test_zero_target_reports_zero() {
        let runtime = HeadlessRuntime::new(800.0);
        let (mut counter, seen) = recording(0.0, &runtime);
        counter.activate(&Element::new("span")).unwrap();
        runtime.settle(FRAME, 1_000);
        assert!(!seen.borrow().is_empty());
        assert!(seen.borrow().iter().all(|v| *v == 0));
    }

    #[test]
    fn test_silent_after_deactivate() {
        let runtime = HeadlessRuntime::new(800.0);
        let (mut counter, seen) = recording(1500.0, &runtime);
        counter.activate(&Element::new("span")).unwrap();
        runtime.frame(FRAME);
        counter.deactivate();
        let count = seen.borrow().len();

        runtime.settle(FRAME, 1_000);
        assert_eq!(seen.borrow().len(), count);
        assert_eq!(runtime.engine.active_count(), 0);
    }

    #[test]
    fn test_update_target_applies_on_next_activation() {
        let runtime = HeadlessRuntime::new(800.0);
        let (mut counter, seen) = recording(10.0, &runtime);
        let el = Element::new("span");
        counter.update_target(20.0);
        assert!(seen.borrow().is_empty());
        assert!(!counter.is_active());

        counter.activate(&el).unwrap();
        runtime.settle(FRAME, 1_000);
        assert_eq!(*seen.borrow().last().unwrap(), 20);
    }

    #[test]
    fn test_engine_failure_shows_final_value() {
        let engine = Rc::new(FrameEngine::with_capacity(0));
        let runtime = HeadlessRuntime::new(800.0);
        let services = MotionServices {
            engine: engine.clone(),
            ..runtime.services()
        };
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut counter = CounterAnimation::new(
            42.0,
            move |v| sink.borrow_mut().push(v),
            &services,
            CounterOptions::default(),
        );

        assert!(counter.activate(&Element::new("span")).is_err());
        assert!(!counter.is_active());
        assert_eq!(*seen.borrow(), vec![42]);
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_options_from_config() {
        let mut config = CounterConfig::default();
        config.prefix = "$".into();
        config.suffix = " hp".into();
        let options = CounterOptions::from_config(&config, &MotionConfig::default()).unwrap();
        assert_eq!(options.duration, 1.5);
        assert_eq!(options.easing, EasingFunction::EaseOutQuadratic);
        assert_eq!(options.format(410), "$410 hp");

        let reduced = MotionConfig {
            reduced_motion: true,
        };
        assert_eq!(CounterOptions::from_config(&config, &reduced).unwrap().duration, 0.0);

        config.easing = "bouncy".into();
        assert!(matches!(
            CounterOptions::from_config(&config, &MotionConfig::default()),
            Err(OptionsError::Easing(_))
        ));
    }
}
