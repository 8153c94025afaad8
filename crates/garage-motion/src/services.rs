//! Motion services: the collaborators strategies and bindings depend on.
//!
//! Built once at startup and passed explicitly; nothing in this crate
//! registers global state.

use std::rc::Rc;

use crate::engine::{AnimationEngine, FrameEngine};
use crate::scheduler::{FrameQueue, RenderScheduler};
use crate::viewport::{ScrollViewport, ViewportObserver};

#[derive(Clone)]
pub struct MotionServices {
    pub engine: Rc<dyn AnimationEngine>,
    pub viewport: Rc<dyn ViewportObserver>,
    pub scheduler: Rc<dyn RenderScheduler>,
}

impl MotionServices {
    pub fn new(
        engine: Rc<dyn AnimationEngine>,
        viewport: Rc<dyn ViewportObserver>,
        scheduler: Rc<dyn RenderScheduler>,
    ) -> Self {
        Self {
            engine,
            viewport,
            scheduler,
        }
    }
}

/// The headless collaborators, kept with their concrete types so the host
/// can drive frames.
pub struct HeadlessRuntime {
    pub engine: Rc<FrameEngine>,
    pub viewport: Rc<ScrollViewport>,
    pub scheduler: Rc<FrameQueue>,
}

impl HeadlessRuntime {
    pub fn new(viewport_height: f64) -> Self {
        Self {
            engine: Rc::new(FrameEngine::new()),
            viewport: Rc::new(ScrollViewport::new(viewport_height)),
            scheduler: Rc::new(FrameQueue::new()),
        }
    }

    pub fn services(&self) -> MotionServices {
        MotionServices::new(
            self.engine.clone(),
            self.viewport.clone(),
            self.scheduler.clone(),
        )
    }

    /// One host frame: run tasks deferred past the last render, evaluate
    /// viewport watches, then advance the engine by `delta` seconds.
    pub fn frame(&self, delta: f64) {
        self.scheduler.flush();
        self.viewport.refresh();
        self.engine.tick(delta);
    }

    /// Run frames until no tween or deferred task is pending, up to `max_frames`.
    ///
    /// Paused tweens waiting on a viewport crossing count as pending.
    pub fn settle(&self, delta: f64, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames
            && (self.engine.active_count() > 0 || self.scheduler.pending_count() > 0)
        {
            self.frame(delta);
            frames += 1;
        }
        frames
    }
}
