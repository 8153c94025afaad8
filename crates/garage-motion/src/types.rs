//! Core animation types and data structures.
//!
//! - `TweenId`, `WatchId`, `TaskId`, `ActivationToken`: unique identifiers
//! - `TweenState`: current state of a tween
//! - `Property`: the animatable properties of an element (plus the scalar proxy)
//! - `PropertySet`: a sparse set of property values

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

macro_rules! unique_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Generate a new process-unique id.
            pub fn new() -> Self {
                static COUNTER: AtomicU64 = AtomicU64::new(1);
                Self(COUNTER.fetch_add(1, Ordering::Relaxed))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

unique_id!(
    /// Identifier of a tween started through an animation engine.
    TweenId
);
unique_id!(
    /// Identifier of a viewport observation.
    WatchId
);
unique_id!(
    /// Identifier of a deferred task queued on a render scheduler.
    TaskId
);
unique_id!(
    /// Opaque token identifying one activation's scope.
    ActivationToken
);

/// Current state of a tween.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweenState {
    /// Created but still waiting out its delay.
    #[default]
    Pending,
    /// Actively interpolating.
    Running,
    /// Held until explicitly played (e.g. waiting for a viewport trigger).
    Paused,
    /// Completed normally.
    Finished,
    /// Cancelled before completion.
    Cancelled,
}

/// Animatable properties.
///
/// The first four are inline style properties of an element. `Scalar` is the
/// value of a proxy target that has no element behind it (counters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    Opacity,
    /// Horizontal offset in pixels.
    TranslateX,
    /// Vertical offset in pixels.
    TranslateY,
    /// Uniform scale factor.
    Scale,
    /// Proxy value animated without an element.
    Scalar,
}

impl Property {
    /// Value of the property when no override is applied.
    pub fn natural_value(&self) -> f64 {
        match self {
            Self::Opacity | Self::Scale => 1.0,
            Self::TranslateX | Self::TranslateY | Self::Scalar => 0.0,
        }
    }
}

/// A sparse set of property values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    values: BTreeMap<Property, f64>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, property: Property, value: f64) -> Self {
        self.values.insert(property, value);
        self
    }

    pub fn set(&mut self, property: Property, value: f64) {
        self.values.insert(property, value);
    }

    pub fn get(&self, property: Property) -> Option<f64> {
        self.values.get(&property).copied()
    }

    pub fn contains(&self, property: Property) -> bool {
        self.values.contains_key(&property)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Property, f64)> + '_ {
        self.values.iter().map(|(p, v)| (*p, *v))
    }

    pub fn properties(&self) -> impl Iterator<Item = Property> + '_ {
        self.values.keys().copied()
    }

    /// The same properties, each at its natural value.
    pub fn neutral(&self) -> Self {
        Self {
            values: self.values.keys().map(|p| (*p, p.natural_value())).collect(),
        }
    }

    /// Interpolate every property present in `to`; properties missing from
    /// `self` start at `fallback(property)`.
    pub fn interpolate(&self, to: &Self, t: f64, fallback: impl Fn(Property) -> f64) -> Self {
        let values = to
            .values
            .iter()
            .map(|(p, end)| {
                let start = self.get(*p).unwrap_or_else(|| fallback(*p));
                (*p, lerp(start, *end, t))
            })
            .collect();
        Self { values }
    }
}

impl FromIterator<(Property, f64)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (Property, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Linear interpolation. `t == 1.0` yields `to` exactly; `t` may overshoot.
#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    if t == 1.0 {
        return to;
    }
    from + (to - from) * t
}
