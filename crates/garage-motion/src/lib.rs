//! Animation lifecycle and scoped resource management for the garage dashboard.
//!
//! This crate provides:
//! - **Scopes**: every tween and viewport watch spawned by one activation,
//!   revocable as a unit
//! - **Controllers**: counter, staggered list and scroll reveal strategies
//!   sharing one activate/deactivate contract
//! - **Transitions**: stateless enter/leave presets for route changes
//! - **Bindings**: mount/update/unmount glue between host components and
//!   controllers
//! - **Headless collaborators**: a frame-stepped engine, a scroll-driven
//!   viewport observer and a render queue, for tests and the demo driver
//!
//! # Architecture
//!
//! ```text
//! Binding (ScalarBinding / RevealBinding / ListLengthBinding)
//!   └── AnimationController (Counter / Stagger / ScrollReveal)
//!         └── ScopeSlot
//!               └── AnimationScope ──▶ AnimationEngine, ViewportObserver
//!
//! MotionServices { engine, viewport, scheduler }  (built once, passed down)
//! ```
//!
//! All types are single-threaded (`Rc`/`RefCell`) and driven by the host's
//! frame loop.

pub mod binding;
pub mod controller;
pub mod counter;
pub mod easing;
pub mod element;
pub mod engine;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod scope;
pub mod scroll_reveal;
pub mod services;
pub mod stagger;
pub mod transition;
pub mod types;
pub mod viewport;

pub use binding::{BindingPhase, Lifecycle, ListLengthBinding, RevealBinding, Retarget, ScalarBinding};
pub use controller::{AnimationController, ScopeSlot};
pub use counter::{CounterAnimation, CounterOptions};
pub use easing::{EasingFunction, ParseEasingError};
pub use element::{Element, ElementId, ElementRef, NodeRef, Selector};
pub use engine::{
    AnimationEngine, CancelMode, FrameEngine, Timing, TweenFrame, TweenRequest, TweenTarget,
};
pub use error::{ActivationError, EngineError, OptionsError, ScopeError};
pub use events::{DEFAULT_EVENT_CAPACITY, EventQueue, TweenEvent};
pub use scheduler::{FrameQueue, RenderScheduler};
pub use scope::{AnimationScope, Liveness};
pub use scroll_reveal::{ScrollRevealAnimation, ScrollRevealOptions};
pub use services::{HeadlessRuntime, MotionServices};
pub use stagger::{StaggerAnimation, StaggerOptions, StaggerOrigin};
pub use transition::{TransitionPreset, enter, leave};
pub use types::{ActivationToken, Property, PropertySet, TaskId, TweenId, TweenState, WatchId};
pub use viewport::{Edge, ParseThresholdError, ScrollViewport, Threshold, ViewportObserver};
