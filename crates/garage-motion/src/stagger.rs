//! Staggered list entrance.
//!
//! Every selected element fades in from an offset, one after another. The
//! from-state is rendered when the tweens are spawned so items waiting for
//! their turn stay hidden, and each element's inline overrides are removed
//! once its entrance completes.

use std::str::FromStr;

use garage_config::{MotionConfig, StaggerConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::controller::{AnimationController, ScopeSlot};
use crate::easing::EasingFunction;
use crate::element::{ElementRef, Selector};
use crate::engine::{Timing, TweenRequest};
use crate::error::{seconds, ActivationError, OptionsError};
use crate::services::MotionServices;
use crate::types::{Property, PropertySet};

/// Item the stagger wave starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaggerOrigin {
    #[default]
    Start,
    Center,
    End,
    /// Both ends first, meeting in the middle.
    Edges,
}

impl StaggerOrigin {
    /// Distance of `index` from the origin, in items. The item(s) closest to
    /// the origin are at distance zero.
    pub fn distance(&self, index: usize, count: usize) -> f64 {
        let last = count.saturating_sub(1) as f64;
        let i = index as f64;
        match self {
            Self::Start => i,
            Self::End => last - i,
            Self::Center => {
                let mid = last / 2.0;
                ((i - mid).abs() - (mid - mid.floor())).max(0.0)
            }
            Self::Edges => i.min(last - i),
        }
    }
}

impl FromStr for StaggerOrigin {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "center" => Ok(Self::Center),
            "end" => Ok(Self::End),
            "edges" => Ok(Self::Edges),
            other => Err(OptionsError::Origin(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaggerOptions {
    /// Delay between consecutive elements, in seconds.
    pub stagger: f64,
    pub duration: f64,
    pub easing: EasingFunction,
    /// Initial vertical offset in pixels.
    pub y: f64,
    pub x: f64,
    /// Initial scale; only animated when below 1.
    pub scale: f64,
    pub from: StaggerOrigin,
}

impl Default for StaggerOptions {
    fn default() -> Self {
        Self {
            stagger: 0.08,
            duration: 0.5,
            easing: EasingFunction::EaseOutCubic,
            y: 20.0,
            x: 0.0,
            scale: 1.0,
            from: StaggerOrigin::Start,
        }
    }
}

impl StaggerOptions {
    pub fn from_config(config: &StaggerConfig, motion: &MotionConfig) -> Result<Self, OptionsError> {
        let stagger = seconds("stagger.stagger", config.stagger)?;
        let duration = seconds("stagger.duration", config.duration)?;
        let (stagger, duration) = if motion.reduced_motion {
            (0.0, 0.0)
        } else {
            (stagger, duration)
        };
        Ok(Self {
            stagger,
            duration,
            easing: config.easing.parse()?,
            y: config.y,
            x: config.x,
            scale: config.scale,
            from: config.from.parse()?,
        })
    }

    /// Hidden state each element starts from.
    pub fn from_state(&self) -> PropertySet {
        let mut from = PropertySet::new()
            .with(Property::Opacity, 0.0)
            .with(Property::TranslateY, self.y)
            .with(Property::TranslateX, self.x);
        if self.scale < 1.0 {
            from.set(Property::Scale, self.scale);
        }
        from
    }

    /// Start delay of the element at `index` out of `count`.
    pub fn delay_for(&self, index: usize, count: usize) -> f64 {
        self.from.distance(index, count) * self.stagger
    }
}

#[derive(Debug)]
pub struct StaggerAnimation {
    selector: Selector,
    options: StaggerOptions,
    slot: ScopeSlot,
}

impl StaggerAnimation {
    pub fn new(selector: Selector, options: StaggerOptions, services: &MotionServices) -> Self {
        Self {
            selector,
            options,
            slot: ScopeSlot::new("stagger", services.engine.clone()),
        }
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn options(&self) -> &StaggerOptions {
        &self.options
    }
}

impl AnimationController for StaggerAnimation {
    /// Zero matching elements is a no-op: nothing is spawned and no scope is
    /// left behind.
    fn activate(&mut self, container: &ElementRef) -> Result<(), ActivationError> {
        self.deactivate();
        let targets = self.selector.select(container);
        if targets.is_empty() {
            debug!(selector = ?self.selector, "stagger: no matching elements");
            return Ok(());
        }

        let options = &self.options;
        let from = options.from_state();
        let to = from.neutral();
        let count = targets.len();
        self.slot.activate_with(container, |scope| {
            for (index, element) in targets.into_iter().enumerate() {
                let timing = Timing::new(options.duration, options.easing)
                    .with_delay(options.delay_for(index, count));
                scope.spawn(
                    TweenRequest::element(element, to.clone(), timing)
                        .from(from.clone())
                        .clear_on_complete(),
                )?;
            }
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
