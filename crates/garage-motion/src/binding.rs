//! Lifecycle bindings between host components and animation controllers.
//!
//! A binding owns one controller and the component's container [`NodeRef`],
//! and translates mount, update and unmount notifications into
//! activate/deactivate calls:
//!
//! - [`ScalarBinding`]: re-runs whenever a watched number changes (counters);
//! - [`RevealBinding`]: activates once on mount (scroll reveals);
//! - [`ListLengthBinding`]: re-runs when a list's length changes, deferring
//!   activation until the new children have rendered (staggered lists).
//!
//! Every binding follows the same state machine:
//!
//! ```text
//! Unbound ──activate──▶ Active ──deactivate──▶ Inactive ──activate──▶ Active ...
//! ```
//!
//! The previous activation is always deactivated before a new one starts.
//! Activation errors are logged and never reach the host.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::controller::AnimationController;
use crate::counter::CounterAnimation;
use crate::element::NodeRef;
use crate::scheduler::RenderScheduler;
use crate::types::TaskId;

/// Host component lifecycle notifications.
pub trait Lifecycle {
    fn mounted(&mut self);
    fn unmounted(&mut self);
    fn phase(&self) -> BindingPhase;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingPhase {
    /// Never activated.
    #[default]
    Unbound,
    Active,
    Inactive,
}

/// Controllers whose numeric goal can be changed between activations.
pub trait Retarget {
    fn retarget(&mut self, value: f64);
}

impl Retarget for CounterAnimation {
    fn retarget(&mut self, value: f64) {
        self.update_target(value);
    }
}

/// Controller plus container, shared by all binding kinds.
struct Activation<C> {
    controller: C,
    node: NodeRef,
    phase: BindingPhase,
}

impl<C: AnimationController> Activation<C> {
    fn new(controller: C, node: NodeRef) -> Self {
        Self {
            controller,
            node,
            phase: BindingPhase::Unbound,
        }
    }

    /// Activate against the current container; no-op when it is absent.
    fn activate(&mut self) {
        let Some(container) = self.node.get() else {
            debug!("binding: container not rendered, skipping activation");
            return;
        };
        self.deactivate();
        match self.controller.activate(&container) {
            Ok(()) => self.phase = BindingPhase::Active,
            Err(err) => {
                warn!("animation activation failed: {err}");
                self.phase = BindingPhase::Inactive;
            }
        }
    }

    fn deactivate(&mut self) {
        self.controller.deactivate();
        if self.phase == BindingPhase::Active {
            self.phase = BindingPhase::Inactive;
        }
    }
}

// ============================================================================
// Scalar-driven
// ============================================================================

/// Re-runs its controller from scratch whenever the bound value changes.
pub struct ScalarBinding<C: AnimationController + Retarget> {
    inner: Activation<C>,
    value: f64,
    mounted: bool,
}

impl<C: AnimationController + Retarget> ScalarBinding<C> {
    pub fn new(mut controller: C, node: NodeRef, value: f64) -> Self {
        controller.retarget(value);
        Self {
            inner: Activation::new(controller, node),
            value,
            mounted: false,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Reactive update of the bound value. Non-finite values are ignored.
    pub fn set_value(&mut self, value: f64) {
        if !value.is_finite() {
            warn!("ignoring non-finite bound value {value}");
            return;
        }
        if value == self.value {
            return;
        }
        self.value = value;
        self.inner.deactivate();
        self.inner.controller.retarget(value);
        if self.mounted {
            self.inner.activate();
        }
    }

    pub fn controller(&self) -> &C {
        &self.inner.controller
    }
}

impl<C: AnimationController + Retarget> Lifecycle for ScalarBinding<C> {
    fn mounted(&mut self) {
        self.mounted = true;
        self.inner.activate();
    }

    fn unmounted(&mut self) {
        self.mounted = false;
        self.inner.deactivate();
    }

    fn phase(&self) -> BindingPhase {
        self.inner.phase
    }
}

impl<C: AnimationController + Retarget> Drop for ScalarBinding<C> {
    fn drop(&mut self) {
        if self.mounted {
            self.unmounted();
        }
    }
}

// ============================================================================
// One-shot
// ============================================================================

/// Activates once when mounted and tears down on unmount.
pub struct RevealBinding<C: AnimationController> {
    inner: Activation<C>,
    mounted: bool,
}

impl<C: AnimationController> RevealBinding<C> {
    pub fn new(controller: C, node: NodeRef) -> Self {
        Self {
            inner: Activation::new(controller, node),
            mounted: false,
        }
    }

    pub fn controller(&self) -> &C {
        &self.inner.controller
    }
}

impl<C: AnimationController> Lifecycle for RevealBinding<C> {
    fn mounted(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        self.inner.activate();
    }

    fn unmounted(&mut self) {
        self.mounted = false;
        self.inner.deactivate();
    }

    fn phase(&self) -> BindingPhase {
        self.inner.phase
    }
}

impl<C: AnimationController> Drop for RevealBinding<C> {
    fn drop(&mut self) {
        if self.mounted {
            self.unmounted();
        }
    }
}

// ============================================================================
// List-length-driven with deferred remount
// ============================================================================

struct ListState<C> {
    inner: Activation<C>,
    length: usize,
    mounted: bool,
    pending: Option<TaskId>,
}

/// Re-runs its controller when the bound list changes length.
///
/// Activation waits one render cycle so the controller sees the new
/// children. The deferred activation is cancelled by the next length change
/// or by unmount, and silently dropped if the container is gone by the time
/// it runs.
pub struct ListLengthBinding<C: AnimationController + 'static> {
    state: Rc<RefCell<ListState<C>>>,
    scheduler: Rc<dyn RenderScheduler>,
}

impl<C: AnimationController + 'static> ListLengthBinding<C> {
    pub fn new(
        controller: C,
        node: NodeRef,
        scheduler: Rc<dyn RenderScheduler>,
        length: usize,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(ListState {
                inner: Activation::new(controller, node),
                length,
                mounted: false,
                pending: None,
            })),
            scheduler,
        }
    }

    pub fn length(&self) -> usize {
        self.state.borrow().length
    }

    /// Reactive update of the list length; equal lengths are ignored.
    pub fn set_length(&mut self, length: usize) {
        let mounted = {
            let mut state = self.state.borrow_mut();
            if state.length == length {
                return;
            }
            debug!(from = state.length, to = length, "list length changed");
            state.length = length;
            state.mounted
        };
        if mounted {
            self.restart();
        }
    }

    /// Whether a deferred activation is queued.
    pub fn is_pending(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    pub fn with_controller<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.state.borrow().inner.controller)
    }

    fn restart(&mut self) {
        let stale = {
            let mut state = self.state.borrow_mut();
            state.inner.deactivate();
            state.pending.take()
        };
        if let Some(task) = stale {
            self.scheduler.cancel(task);
        }

        let weak = Rc::downgrade(&self.state);
        let task = self
            .scheduler
            .schedule(Box::new(move || run_deferred(&weak)));
        self.state.borrow_mut().pending = Some(task);
    }
}

fn run_deferred<C: AnimationController>(state: &Weak<RefCell<ListState<C>>>) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = state.borrow_mut();
    state.pending = None;
    if !state.mounted {
        return;
    }
    state.inner.activate();
}

impl<C: AnimationController + 'static> Lifecycle for ListLengthBinding<C> {
    fn mounted(&mut self) {
        self.state.borrow_mut().mounted = true;
        self.restart();
    }

    fn unmounted(&mut self) {
        let stale = {
            let mut state = self.state.borrow_mut();
            state.mounted = false;
            state.inner.deactivate();
            state.pending.take()
        };
        if let Some(task) = stale {
            self.scheduler.cancel(task);
        }
    }

    fn phase(&self) -> BindingPhase {
        self.state.borrow().inner.phase
    }
}

impl<C: AnimationController + 'static> Drop for ListLengthBinding<C> {
    fn drop(&mut self) {
        let (mounted, pending) = {
            let state = self.state.borrow();
            (state.mounted, state.pending.is_some())
        };
        if mounted || pending {
            self.unmounted();
        }
    }
}

macro_rules! debug_binding {
    ($name:ident, $($bound:tt)+) => {
        impl<C: $($bound)+> fmt::Debug for $name<C> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("phase", &self.phase())
                    .finish_non_exhaustive()
            }
        }
    };
}

debug_binding!(ScalarBinding, AnimationController + Retarget);
debug_binding!(RevealBinding, AnimationController);
debug_binding!(ListLengthBinding, AnimationController + 'static);
