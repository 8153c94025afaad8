//! Headless dashboard session.
//!
//! Drives the motion layer through one simulated visit of the garage
//! dashboard: stat counters, the mods list growing after a fetch, a section
//! revealed on scroll, then a route change while everything is mid-flight.
//! Exits with an error if anything is still running after teardown.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use garage_config::GarageConfig;
use garage_motion::{
    AnimationEngine, CounterAnimation, CounterOptions, Element, ElementRef, HeadlessRuntime,
    Lifecycle, ListLengthBinding, NodeRef, RenderScheduler, RevealBinding, ScalarBinding,
    ScrollRevealAnimation, ScrollRevealOptions, Selector, StaggerAnimation, StaggerOptions,
    TransitionPreset, ViewportObserver, transition,
};

struct Dashboard {
    page: ElementRef,
    mods: ElementRef,
    horsepower: ScalarBinding<CounterAnimation>,
    builds: ScalarBinding<CounterAnimation>,
    mod_list: ListLengthBinding<StaggerAnimation>,
    timeline: RevealBinding<ScrollRevealAnimation>,
    readout: Rc<RefCell<String>>,
}

impl Dashboard {
    fn mount(runtime: &HeadlessRuntime, config: &GarageConfig) -> Result<Self> {
        let services = runtime.services();
        let counter = CounterOptions::from_config(&config.counter, &config.motion)
            .context("invalid [counter] options")?;
        let stagger = StaggerOptions::from_config(&config.stagger, &config.motion)
            .context("invalid [stagger] options")?;
        let reveal = ScrollRevealOptions::from_config(&config.scroll_reveal, &config.motion)
            .context("invalid [scroll_reveal] options")?;

        let page = Element::new("main");
        let stat = Element::with_class("span", "stat");
        page.append_child(stat.clone());

        let mods = Element::new("ul");
        page.append_child(mods.clone());
        for _ in 0..3 {
            mods.append_child(Element::with_class("li", "mod-row"));
        }

        let timeline = Element::new("section");
        timeline.set_layout(1400.0, 400.0);
        page.append_child(timeline.clone());

        let readout = Rc::new(RefCell::new(String::new()));
        let sink = readout.clone();
        let hp_format = CounterOptions {
            suffix: " hp".into(),
            ..counter.clone()
        };
        let hp_display = hp_format.clone();
        let horsepower = CounterAnimation::new(
            0.0,
            move |v| *sink.borrow_mut() = hp_display.format(v),
            &services,
            hp_format,
        );
        let builds = CounterAnimation::new(0.0, |_| {}, &services, counter);

        let mut dashboard = Self {
            horsepower: ScalarBinding::new(horsepower, NodeRef::with(stat.clone()), 0.0),
            builds: ScalarBinding::new(builds, NodeRef::with(stat), 0.0),
            mod_list: ListLengthBinding::new(
                StaggerAnimation::new(Selector::Children, stagger, &services),
                NodeRef::with(mods.clone()),
                runtime.scheduler.clone(),
                3,
            ),
            timeline: RevealBinding::new(
                ScrollRevealAnimation::new(reveal, &services),
                NodeRef::with(timeline),
            ),
            page,
            mods,
            readout,
        };
        dashboard.horsepower.mounted();
        dashboard.builds.mounted();
        dashboard.mod_list.mounted();
        dashboard.timeline.mounted();
        Ok(dashboard)
    }

    fn unmount(mut self) {
        self.horsepower.unmounted();
        self.builds.unmounted();
        self.mod_list.unmounted();
        self.timeline.unmounted();
    }
}

fn run_frames(runtime: &HeadlessRuntime, delta: f64, frames: usize) {
    for _ in 0..frames {
        runtime.frame(delta);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GarageConfig::load();
    log::info!(
        "garage demo: reduced_motion={} frame={}ms viewport={}px",
        config.motion.reduced_motion,
        config.demo.frame_ms,
        config.demo.viewport_height
    );
    if config.demo.frame_ms.is_nan() || config.demo.frame_ms <= 0.0 {
        bail!("demo.frame_ms must be positive, got {}", config.demo.frame_ms);
    }
    let delta = config.demo.frame_ms / 1000.0;
    let runtime = HeadlessRuntime::new(config.demo.viewport_height);

    let mut dashboard = Dashboard::mount(&runtime, &config)?;
    transition::enter(
        runtime.engine.as_ref(),
        TransitionPreset::Page,
        &dashboard.page,
        Box::new(|| log::info!("dashboard entered")),
    );

    // Stats arrive from the API.
    run_frames(&runtime, delta, 5);
    dashboard.horsepower.set_value(410.0);
    dashboard.builds.set_value(7.0);
    log::info!("stats loaded, {} tweens running", runtime.engine.active_count());

    // Mods fetch resolves with two more rows.
    for _ in 0..2 {
        dashboard.mods.append_child(Element::with_class("li", "mod-row"));
    }
    dashboard.mod_list.set_length(dashboard.mods.child_count());
    run_frames(&runtime, delta, 30);
    log::info!("horsepower readout: {}", dashboard.readout.borrow());

    // Scroll the build timeline into view.
    let fired = runtime.viewport.scroll_to(900.0);
    log::info!("scrolled to 900px, {fired} reveal(s) triggered");
    run_frames(&runtime, delta, 10);

    // Navigate away mid-flight.
    log::info!(
        "navigating away with {} tweens, {} watches and {} deferred tasks pending",
        runtime.engine.active_count(),
        runtime.viewport.watch_count(),
        runtime.scheduler.pending_count()
    );
    let page = dashboard.page.clone();
    dashboard.unmount();
    transition::leave(
        runtime.engine.as_ref(),
        TransitionPreset::Page,
        &page,
        Box::new(|| log::info!("dashboard left")),
    );

    let frames = runtime.settle(delta, 10_000);
    log::info!("settled after {frames} frames");
    for event in runtime.engine.drain_events().iter().filter(|e| e.is_cancelled()) {
        log::debug!("cancelled: {event:?}");
    }

    let (tweens, watches, tasks) = (
        runtime.engine.active_count(),
        runtime.viewport.watch_count(),
        runtime.scheduler.pending_count(),
    );
    if tweens + watches + tasks > 0 {
        bail!("leaked {tweens} tweens, {watches} watches and {tasks} tasks after teardown");
    }
    log::info!("teardown clean");
    Ok(())
}
