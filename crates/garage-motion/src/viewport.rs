//! Viewport observer contract and a scroll-position-driven implementation.
//!
//! A watch fires once, the first time its target's edge crosses the
//! threshold line of the viewport. Thresholds use the `"<edge> <percent>%"`
//! text form, e.g. `"top 85%"`: the top edge of the element reaches 85% of
//! the viewport height measured from the viewport's top.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Weak;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::element::{Element, ElementRef};
use crate::types::WatchId;

/// One-shot viewport callback.
pub type WatchFn = Box<dyn FnOnce()>;

/// Edge of the target element compared against the threshold line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    #[default]
    Top,
    Center,
    Bottom,
}

impl Edge {
    fn offset(&self, element: &Element) -> f64 {
        match self {
            Self::Top => element.top(),
            Self::Center => element.top() + element.height() / 2.0,
            Self::Bottom => element.top() + element.height(),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }
}

/// Visibility threshold of a watch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Threshold {
    pub edge: Edge,
    /// Position of the threshold line as a fraction of the viewport height.
    pub viewport_fraction: f64,
}

impl Default for Threshold {
    fn default() -> Self {
        Self {
            edge: Edge::Top,
            viewport_fraction: 0.85,
        }
    }
}

impl Threshold {
    pub fn new(edge: Edge, viewport_fraction: f64) -> Self {
        Self {
            edge,
            viewport_fraction,
        }
    }

    /// Whether `element` has crossed the line for the given scroll position.
    pub fn is_crossed(&self, element: &Element, scroll_top: f64, viewport_height: f64) -> bool {
        self.edge.offset(element) - scroll_top <= self.viewport_fraction * viewport_height
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid viewport threshold `{0}`, expected e.g. \"top 85%\"")]
pub struct ParseThresholdError(pub String);

impl FromStr for Threshold {
    type Err = ParseThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseThresholdError(s.to_string());
        let mut parts = s.split_whitespace();
        let edge = match parts.next().ok_or_else(err)? {
            "top" => Edge::Top,
            "center" => Edge::Center,
            "bottom" => Edge::Bottom,
            _ => return Err(err()),
        };
        let percent = parts
            .next()
            .and_then(|p| p.strip_suffix('%'))
            .and_then(|p| p.parse::<f64>().ok())
            .filter(|p| p.is_finite())
            .ok_or_else(err)?;
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(Self::new(edge, percent / 100.0))
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let percent = (self.viewport_fraction * 100.0 * 1e6).round() / 1e6;
        write!(f, "{} {}%", self.edge.as_str(), percent)
    }
}

impl TryFrom<String> for Threshold {
    type Error = ParseThresholdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Threshold> for String {
    fn from(value: Threshold) -> Self {
        value.to_string()
    }
}

/// Contract of the external viewport observer.
///
/// A callback fires at most once per registration and never from inside
/// `observe`. Implementations must not hold interior borrows while invoking
/// callbacks.
pub trait ViewportObserver {
    fn observe(&self, target: &ElementRef, threshold: Threshold, callback: WatchFn) -> WatchId;

    /// Cancel a watch; returns false if it already fired or never existed.
    fn unobserve(&self, id: WatchId) -> bool;

    /// Number of armed watches.
    fn watch_count(&self) -> usize;
}

struct Watch {
    target: Weak<Element>,
    threshold: Threshold,
    callback: WatchFn,
}

/// Observer that evaluates watches against an explicit scroll position.
pub struct ScrollViewport {
    height: Cell<f64>,
    scroll_top: Cell<f64>,
    watches: RefCell<BTreeMap<WatchId, Watch>>,
}

impl ScrollViewport {
    pub fn new(height: f64) -> Self {
        Self {
            height: Cell::new(height),
            scroll_top: Cell::new(0.0),
            watches: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn height(&self) -> f64 {
        self.height.get()
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top.get()
    }

    pub fn resize(&self, height: f64) -> usize {
        self.height.set(height);
        self.refresh()
    }

    /// Scroll to `y` and fire every watch whose target is now past its line.
    pub fn scroll_to(&self, y: f64) -> usize {
        self.scroll_top.set(y);
        self.refresh()
    }

    /// Re-evaluate all watches at the current position; returns how many fired.
    ///
    /// Watches whose target element has been dropped are discarded.
    pub fn refresh(&self) -> usize {
        let (scroll_top, height) = (self.scroll_top.get(), self.height.get());
        let due: Vec<Watch> = {
            let mut watches = self.watches.borrow_mut();
            let ids: Vec<WatchId> = watches
                .iter()
                .filter(|(_, w)| match w.target.upgrade() {
                    Some(el) => w.threshold.is_crossed(&el, scroll_top, height),
                    None => true,
                })
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| watches.remove(id)).collect()
        };

        let mut fired = 0;
        for watch in due {
            if watch.target.upgrade().is_some() {
                trace!(threshold = %watch.threshold, scroll_top, "viewport watch fired");
                (watch.callback)();
                fired += 1;
            }
        }
        fired
    }
}

impl ViewportObserver for ScrollViewport {
    fn observe(&self, target: &ElementRef, threshold: Threshold, callback: WatchFn) -> WatchId {
        let id = WatchId::new();
        self.watches.borrow_mut().insert(
            id,
            Watch {
                target: std::rc::Rc::downgrade(target),
                threshold,
                callback,
            },
        );
        debug!(watch = %id, %threshold, "viewport watch armed");
        id
    }

    fn unobserve(&self, id: WatchId) -> bool {
        // Dropped outside the borrow.
        let removed = self.watches.borrow_mut().remove(&id);
        removed.is_some()
    }

    fn watch_count(&self) -> usize {
        self.watches.borrow().len()
    }
}

static_assertions::assert_not_impl_any!(ScrollViewport: Send, Sync);
