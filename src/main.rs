//! Gravity Pad entry point
//!
//! On the web this mounts the pad on `#gravity-pad`. Natively there is no
//! window: the pad runs headless on the manual host and logs what happened.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_pad {
    use std::cell::RefCell;

    use gravity_pad::PadSettings;
    use gravity_pad::platform::web::{PadHandle, mount_with};

    const CANVAS_ID: &str = "gravity-pad";

    thread_local! {
        // Keeps the pad alive for the lifetime of the page
        static PAD: RefCell<Option<PadHandle>> = const { RefCell::new(None) };
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        // Fails only if the embedding page already installed a logger
        let _ = console_log::init_with_level(log::Level::Info);

        match mount_with(CANVAS_ID, PadSettings::load()) {
            Ok(handle) => {
                PAD.with(|pad| *pad.borrow_mut() = Some(handle));
                log::info!("Gravity pad running!");
            }
            Err(e) => log::error!("Gravity pad failed to start: {}", e),
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_pad::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let frames = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(600);

    if let Err(e) = headless::run(frames) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::rc::Rc;

    use glam::Vec2;
    use gravity_pad::platform::manual::{ManualScheduler, ManualSignal, RecordingSurface};
    use gravity_pad::platform::{HostSignals, PointerEvent};
    use gravity_pad::sim::SurfaceSize;
    use gravity_pad::{PadDriver, PadSettings, Result};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    /// Run `frames` frames with a pointer sweep, a hidden stretch and a resize
    pub fn run(frames: usize) -> Result<()> {
        let scheduler = ManualScheduler::new();
        let visibility = ManualSignal::<bool>::new();
        let pointer = ManualSignal::<PointerEvent>::new();
        let resize = ManualSignal::<SurfaceSize>::new();

        let mut settings = PadSettings::load();
        if settings.seed.is_none() {
            settings.seed = Some(1);
        }

        let mut driver = PadDriver::start(
            RecordingSurface::new(SurfaceSize::new(400.0, 300.0)),
            Rc::new(scheduler.clone()),
            HostSignals {
                visibility: Box::new(visibility.clone()),
                pointer: Box::new(pointer.clone()),
                resize: Box::new(resize.clone()),
            },
            settings,
        )?;

        let quarter = (frames / 4).max(1);
        for frame in 0..frames {
            match frame / quarter {
                // Pointer sweeps along the floor
                1 => {
                    let t = (frame % quarter) as f32 / quarter as f32;
                    pointer.emit(PointerEvent::Move(Vec2::new(400.0 * t, 280.0)));
                }
                2 if frame % quarter == 0 => {
                    pointer.emit(PointerEvent::Leave);
                    visibility.emit(false);
                }
                3 if frame % quarter == 0 => {
                    visibility.emit(true);
                    resize.emit(SurfaceSize::new(640.0, 360.0));
                }
                _ => {}
            }
            scheduler.run_frame(frame as f64 * FRAME_MS);
            driver.with_surface_mut(RecordingSurface::compact);
        }

        let stats = driver.stats();
        let (count, resting, max_speed) = driver.with_state(|state| {
            let resting = state
                .particles
                .iter()
                .filter(|p| (p.pos.y - (state.surface.height - p.radius)).abs() < 0.5)
                .count();
            let max_speed = state
                .particles
                .iter()
                .map(|p| p.vel.length())
                .fold(0.0f32, f32::max);
            (state.particles.len(), resting, max_speed)
        });
        let clears = driver.with_surface(|surface| surface.clears());

        driver.teardown();

        log::info!(
            "{} frames: {} ticked, {} paused, {} redraws",
            stats.frames,
            stats.ticks,
            stats.paused_frames,
            clears
        );
        println!(
            "{} particles, {} resting on the floor, max speed {:.3} px/tick",
            count, resting, max_speed
        );
        Ok(())
    }
}
