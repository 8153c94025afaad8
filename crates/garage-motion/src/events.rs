//! Tween lifecycle events.
//!
//! The headless engine records an event whenever a tween is started, played,
//! finished or cancelled. Hosts and tests poll them after each frame; the
//! queue is bounded, so hosts that never poll lose the oldest events instead
//! of growing without limit.
//!
//! ```ignore
//! engine.tick(1.0 / 60.0);
//! for event in engine.drain_events() {
//!     if let TweenEvent::Ended { element: Some(id), .. } = event {
//!         println!("entrance finished for {id:?}");
//!     }
//! }
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::element::ElementId;
use crate::types::TweenId;

/// Event emitted when a tween changes state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TweenEvent {
    /// Tween was accepted by the engine.
    Started {
        tween_id: TweenId,
        /// Target element, `None` for scalar proxies.
        element: Option<ElementId>,
        /// Start delay in seconds.
        delay: f64,
        /// Whether the tween waits for an explicit `play`.
        paused: bool,
    },
    /// A paused tween was released.
    Played { tween_id: TweenId },
    /// Tween reached its end values.
    Ended {
        tween_id: TweenId,
        element: Option<ElementId>,
    },
    /// Tween was cancelled before completion.
    Cancelled {
        tween_id: TweenId,
        element: Option<ElementId>,
        /// Whether pre-animation values were restored.
        reverted: bool,
    },
}

impl TweenEvent {
    pub fn tween_id(&self) -> TweenId {
        match self {
            Self::Started { tween_id, .. }
            | Self::Played { tween_id }
            | Self::Ended { tween_id, .. }
            | Self::Cancelled { tween_id, .. } => *tween_id,
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }

    pub fn is_played(&self) -> bool {
        matches!(self, Self::Played { .. })
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Events kept by a default queue before the oldest are discarded.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Bounded queue for collecting tween events during update cycles.
///
/// Hosts that never poll still hold at most `capacity` events: pushing into a
/// full queue discards the oldest one.
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<TweenEvent>,
    capacity: usize,
    dropped: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue holding at most `capacity` events (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)),
            capacity,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: TweenEvent) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn pop(&mut self) -> Option<TweenEvent> {
        self.events.pop_front()
    }

    /// Remove and return all pending events in emission order.
    pub fn drain(&mut self) -> Vec<TweenEvent> {
        self.events.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Events concerning one element (without removing them).
    pub fn events_for_element(&self, element: ElementId) -> Vec<&TweenEvent> {
        self.events
            .iter()
            .filter(|e| match e {
                TweenEvent::Started { element: el, .. }
                | TweenEvent::Ended { element: el, .. }
                | TweenEvent::Cancelled { element: el, .. } => *el == Some(element),
                TweenEvent::Played { .. } => false,
            })
            .collect()
    }
}
