//! Manually driven host
//!
//! Frames run only when [`ManualScheduler::run_frame`] is called and signals
//! fire only on [`ManualSignal::emit`], which makes the driver deterministic.
//! Used by the tests and by the native headless binary.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;

use super::{FrameCallback, FrameHandle, FrameScheduler, Signal, Subscription};
use crate::renderer::{Color, DrawingSurface};
use crate::sim::SurfaceSize;

#[derive(Default)]
struct SchedulerInner {
    pending: Vec<(FrameHandle, FrameCallback)>,
    next_id: u32,
}

/// Frame scheduler stepped by hand
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every callback pending at call time. Callbacks scheduled while
    /// running wait for the next frame. Returns how many ran.
    pub fn run_frame(&self, timestamp: f64) -> usize {
        // Release the borrow before running: callbacks reschedule themselves
        let due = std::mem::take(&mut self.inner.borrow_mut().pending);
        let count = due.len();
        for (_, callback) in due {
            callback(timestamp);
        }
        count
    }

    /// Run `frames` frames spaced `frame_ms` apart, starting at `start_ms`
    pub fn run_frames(&self, frames: usize, start_ms: f64, frame_ms: f64) {
        for i in 0..frames {
            self.run_frame(start_ms + i as f64 * frame_ms);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule_next(&self, callback: FrameCallback) -> FrameHandle {
        let mut inner = self.inner.borrow_mut();
        inner.next_id = inner.next_id.wrapping_add(1);
        let handle = FrameHandle(inner.next_id);
        inner.pending.push((handle, callback));
        handle
    }

    fn cancel(&self, handle: FrameHandle) {
        self.inner.borrow_mut().pending.retain(|(h, _)| *h != handle);
    }
}

type Handlers<T> = Vec<(u32, Box<dyn FnMut(T)>)>;

struct SignalInner<T> {
    handlers: Handlers<T>,
    next_id: u32,
}

/// Signal fired by hand.
///
/// Handlers must not subscribe or unsubscribe from inside `emit`.
pub struct ManualSignal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> Clone for ManualSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for ManualSignal<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                handlers: Vec::new(),
                next_id: 0,
            })),
        }
    }
}

impl<T: Clone> ManualSignal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `value` to every subscriber
    pub fn emit(&self, value: T) {
        let mut inner = self.inner.borrow_mut();
        for (_, handler) in inner.handlers.iter_mut() {
            handler(value.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().handlers.len()
    }
}

impl<T: 'static> Signal<T> for ManualSignal<T> {
    fn subscribe(&self, handler: Box<dyn FnMut(T)>) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.handlers.push((id, handler));
            id
        };

        let weak: Weak<RefCell<SignalInner<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().handlers.retain(|(h, _)| *h != id);
            }
        })
    }
}

/// One recorded surface call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Disc {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Color,
    },
}

/// Surface that records draw calls instead of painting
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: SurfaceSize,
    commands: Vec<DrawCommand>,
    clears: usize,
}

impl RecordingSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            commands: Vec::new(),
            clears: 0,
        }
    }

    /// Every command since creation
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Commands since (and including) the last clear
    pub fn current_frame(&self) -> &[DrawCommand] {
        let start = self
            .commands
            .iter()
            .rposition(|c| *c == DrawCommand::Clear)
            .unwrap_or(0);
        &self.commands[start..]
    }

    /// Number of frames painted so far
    pub fn clears(&self) -> usize {
        self.clears
    }

    /// Forget recorded commands, keeping only the latest frame
    pub fn compact(&mut self) {
        let start = self.commands.len() - self.current_frame().len();
        self.commands.drain(..start);
    }
}

impl DrawingSurface for RecordingSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.commands.push(DrawCommand::Clear);
    }

    fn draw_disc(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Disc {
            center,
            radius,
            color,
        });
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            width,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_scheduler_runs_and_cancels() {
        let scheduler = ManualScheduler::new();
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        scheduler.schedule_next(Box::new(move |_| h.set(h.get() + 1)));
        let h = hits.clone();
        let cancelled = scheduler.schedule_next(Box::new(move |_| h.set(h.get() + 10)));
        assert_eq!(scheduler.pending_count(), 2);

        scheduler.cancel(cancelled);
        scheduler.cancel(cancelled);
        assert_eq!(scheduler.run_frame(16.0), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(scheduler.run_frame(32.0), 0);
    }

    #[test]
    fn test_callback_rescheduling_waits_for_next_frame() {
        let scheduler = ManualScheduler::new();
        let s = scheduler.clone();
        scheduler.schedule_next(Box::new(move |_| {
            s.schedule_next(Box::new(|_| {}));
        }));

        assert_eq!(scheduler.run_frame(0.0), 1);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn test_signal_subscribe_emit_unsubscribe() {
        let signal = ManualSignal::<bool>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        let mut sub = signal.subscribe(Box::new(move |v| s.borrow_mut().push(v)));
        signal.emit(true);
        signal.emit(false);
        assert_eq!(signal.subscriber_count(), 1);

        sub.cancel();
        signal.emit(true);
        assert_eq!(*seen.borrow(), vec![true, false]);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn test_recording_surface_compact() {
        let mut surface = RecordingSurface::new(SurfaceSize::new(10.0, 10.0));
        surface.clear();
        surface.draw_disc(Vec2::ONE, 1.0, Color::BLACK);
        surface.clear();
        surface.draw_disc(Vec2::ONE, 2.0, Color::BLACK);

        surface.compact();
        assert_eq!(surface.commands().len(), 2);
        assert_eq!(surface.clears(), 2);
    }
}
