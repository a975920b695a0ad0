//! Render loop driver
//!
//! Owns the simulation state and the drawing surface, runs one tick and one
//! draw per animation frame, and mediates host events:
//! - hidden surfaces keep the frame loop alive but skip all work (no catch-up)
//! - resize reinitializes the pad before the next frame
//! - pointer moves update the repulsion point; leaving keeps the last one
//!
//! Everything is single-threaded. State is shared with the frame and event
//! callbacks through `Rc<RefCell<_>>`; no borrow is held across a yield.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::error::Result;
use crate::platform::{FrameHandle, FrameScheduler, HostSignals, PointerEvent, Subscription};
use crate::renderer::{DrawingSurface, draw_frame};
use crate::settings::PadSettings;
use crate::sim::{PadState, SurfaceSize, tick};

/// Frame loop counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Frame callbacks received
    pub frames: u64,
    /// Frames that stepped and drew
    pub ticks: u64,
    /// Frames skipped while hidden
    pub paused_frames: u64,
    /// Timestamp of the latest frame (ms)
    pub last_timestamp: Option<f64>,
}

struct Shared<S> {
    state: PadState,
    surface: S,
    settings: PadSettings,
    rng: Pcg32,
    visible: bool,
    running: bool,
    pending: Option<FrameHandle>,
    stats: FrameStats,
}

impl<S: DrawingSurface> Shared<S> {
    fn advance(&mut self, timestamp: f64) {
        self.stats.frames += 1;
        self.stats.last_timestamp = Some(timestamp);

        if !self.visible {
            self.stats.paused_frames += 1;
            return;
        }

        tick(&mut self.state, &self.settings.physics);
        draw_frame(&mut self.surface, &self.state, &self.settings);
        self.stats.ticks += 1;
    }

    fn resize(&mut self, size: SurfaceSize) {
        log::info!("Pad resized to {}x{}", size.width, size.height);
        self.surface.resize(size);
        self.state.reinitialize(size, &self.settings, &mut self.rng);
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            log::debug!("Pad {}", if visible { "visible, resuming" } else { "hidden, pausing" });
        }
        self.visible = visible;
    }

    fn pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Move(pos) => self.state.pointer = Some(pos),
            // Falloff reaches zero at the repulsion radius anyway
            PointerEvent::Leave => {}
        }
    }
}

/// A running pad
pub struct PadDriver<S: DrawingSurface + 'static> {
    shared: Rc<RefCell<Shared<S>>>,
    scheduler: Rc<dyn FrameScheduler>,
    subscriptions: Vec<Subscription>,
}

impl<S: DrawingSurface + 'static> PadDriver<S> {
    /// Spawn the particles for the surface's current size, hook up the host
    /// signals and schedule the first frame
    pub fn start(
        surface: S,
        scheduler: Rc<dyn FrameScheduler>,
        host: HostSignals,
        settings: PadSettings,
    ) -> Result<Self> {
        settings.validate()?;

        let seed = settings.seed.unwrap_or_else(host_seed);
        let mut rng = Pcg32::seed_from_u64(seed);
        let size = surface.size();
        let state = PadState::spawn(size, &settings, &mut rng);
        log::info!(
            "Gravity pad starting: {} particles on {}x{} (seed {})",
            state.particles.len(),
            size.width,
            size.height,
            seed
        );

        let shared = Rc::new(RefCell::new(Shared {
            state,
            surface,
            settings,
            rng,
            visible: true,
            running: true,
            pending: None,
            stats: FrameStats::default(),
        }));

        let subscriptions = vec![
            host.visibility.subscribe(handler(&shared, Shared::set_visible)),
            host.pointer.subscribe(handler(&shared, Shared::pointer)),
            host.resize.subscribe(handler(&shared, Shared::resize)),
        ];

        schedule(&shared, &scheduler);

        Ok(Self {
            shared,
            scheduler,
            subscriptions,
        })
    }

    /// Stop the frame loop and release every host subscription.
    ///
    /// Safe to call more than once; also runs on drop.
    pub fn teardown(&mut self) {
        let pending = {
            let mut shared = self.shared.borrow_mut();
            if !shared.running {
                return;
            }
            shared.running = false;
            shared.pending.take()
        };

        if let Some(handle) = pending {
            self.scheduler.cancel(handle);
        }
        for subscription in &mut self.subscriptions {
            subscription.cancel();
        }
        self.subscriptions.clear();

        log::info!("Gravity pad stopped");
    }

    pub fn is_running(&self) -> bool {
        self.shared.borrow().running
    }

    pub fn is_visible(&self) -> bool {
        self.shared.borrow().visible
    }

    pub fn stats(&self) -> FrameStats {
        self.shared.borrow().stats
    }

    /// Read the current simulation state
    pub fn with_state<R>(&self, f: impl FnOnce(&PadState) -> R) -> R {
        f(&self.shared.borrow().state)
    }

    /// Read the drawing surface
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.shared.borrow().surface)
    }

    /// Mutate the drawing surface between frames
    pub fn with_surface_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.shared.borrow_mut().surface)
    }

    pub fn settings(&self) -> PadSettings {
        self.shared.borrow().settings.clone()
    }
}

impl<S: DrawingSurface + 'static> Drop for PadDriver<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Wrap a `Shared` method as a signal handler. Holds the state weakly so a
/// signal that outlives the driver cannot keep it alive.
fn handler<S, T>(
    shared: &Rc<RefCell<Shared<S>>>,
    apply: fn(&mut Shared<S>, T),
) -> Box<dyn FnMut(T)>
where
    S: DrawingSurface + 'static,
    T: 'static,
{
    let weak: Weak<RefCell<Shared<S>>> = Rc::downgrade(shared);
    Box::new(move |value| {
        if let Some(shared) = weak.upgrade() {
            let mut shared = shared.borrow_mut();
            if shared.running {
                apply(&mut shared, value);
            }
        }
    })
}

fn schedule<S: DrawingSurface + 'static>(
    shared: &Rc<RefCell<Shared<S>>>,
    scheduler: &Rc<dyn FrameScheduler>,
) {
    let frame_shared = Rc::clone(shared);
    let frame_scheduler = Rc::clone(scheduler);
    let handle = scheduler.schedule_next(Box::new(move |timestamp| {
        on_frame(&frame_shared, &frame_scheduler, timestamp);
    }));
    shared.borrow_mut().pending = Some(handle);
}

fn on_frame<S: DrawingSurface + 'static>(
    shared: &Rc<RefCell<Shared<S>>>,
    scheduler: &Rc<dyn FrameScheduler>,
    timestamp: f64,
) {
    {
        let mut s = shared.borrow_mut();
        if !s.running {
            return;
        }
        s.pending = None;
        s.advance(timestamp);
    }
    schedule(shared, scheduler);
}

#[cfg(target_arch = "wasm32")]
fn host_seed() -> u64 {
    js_sys::Date::now() as u64
}

#[cfg(not(target_arch = "wasm32"))]
fn host_seed() -> u64 {
    rand::random()
}
