//! Platform abstraction layer
//!
//! The pad only sees its host through these capabilities:
//! - Frame scheduling (`requestAnimationFrame` on the web)
//! - Visibility, pointer and resize signals
//! - A 2D drawing surface (see [`crate::renderer::DrawingSurface`])
//!
//! Everything runs on one thread; callbacks are `'static` boxed closures and
//! never `Send`.

pub mod manual;
#[cfg(target_arch = "wasm32")]
pub mod web;

use std::fmt;

use glam::Vec2;

use crate::sim::SurfaceSize;

/// Invoked once with the frame timestamp in milliseconds
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Identifies one scheduled frame so it can be cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u32);

/// Host frame clock
pub trait FrameScheduler {
    /// Run `callback` once, on the next frame
    fn schedule_next(&self, callback: FrameCallback) -> FrameHandle;
    /// Drop a pending callback; unknown or already-run handles are ignored
    fn cancel(&self, handle: FrameHandle);
}

/// A stream of host notifications
pub trait Signal<T> {
    fn subscribe(&self, handler: Box<dyn FnMut(T)>) -> Subscription;
}

/// Pointer notifications in surface-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Mouse move or single-point touch move
    Move(Vec2),
    /// Pointer left the surface
    Leave,
}

/// The signals a pad listens to, bundled for [`crate::PadDriver::start`]
pub struct HostSignals {
    /// `true` while the surface is in the viewport
    pub visibility: Box<dyn Signal<bool>>,
    pub pointer: Box<dyn Signal<PointerEvent>>,
    /// New surface size after the host was resized
    pub resize: Box<dyn Signal<SurfaceSize>>,
}

/// Releases a subscription exactly once: on [`Subscription::cancel`] or on drop
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Nothing to release
    pub fn empty() -> Self {
        Self { release: None }
    }

    /// Unsubscribe now; later calls do nothing
    pub fn cancel(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_subscription_releases_once() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let mut sub = Subscription::new(move || c.set(c.get() + 1));
        assert!(sub.is_active());

        sub.cancel();
        sub.cancel();
        drop(sub);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_subscription_releases_on_drop() {
        let count = Rc::new(Cell::new(0));
        {
            let c = count.clone();
            let _sub = Subscription::new(move || c.set(c.get() + 1));
        }
        assert_eq!(count.get(), 1);
        assert!(!Subscription::empty().is_active());
    }
}
