//! Browser host: canvas 2D surface, `requestAnimationFrame`,
//! `IntersectionObserver` visibility, and DOM pointer/resize events.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, Element, EventTarget, HtmlCanvasElement,
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, MouseEvent,
    TouchEvent, Window,
};

use super::{FrameCallback, FrameHandle, FrameScheduler, HostSignals, PointerEvent, Signal, Subscription};
use crate::driver::PadDriver;
use crate::error::{Error, Result};
use crate::renderer::{Color, DrawingSurface};
use crate::settings::PadSettings;
use crate::sim::SurfaceSize;

/// A `<canvas>` painted through its 2D context, one device pixel per CSS pixel
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    size: SurfaceSize,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| host_err(format!("getContext failed: {:?}", e)))?
            .ok_or_else(|| host_err("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| host_err("2d context has an unexpected type"))?;
        let size = SurfaceSize::new(canvas.width() as f32, canvas.height() as f32);
        Ok(Self { canvas, ctx, size })
    }
}

impl DrawingSurface for CanvasSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.canvas.set_width(size.width.max(0.0) as u32);
        self.canvas.set_height(size.height.max(0.0) as u32);
        self.size = size;
    }

    fn clear(&mut self) {
        self.ctx
            .clear_rect(0.0, 0.0, self.size.width as f64, self.size.height as f64);
    }

    fn draw_disc(&mut self, center: Vec2, radius: f32, color: Color) {
        self.ctx.begin_path();
        let _ = self
            .ctx
            .arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU);
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill();
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width as f64);
        self.ctx.stroke();
    }
}

type FrameClosure = Closure<dyn FnMut(f64)>;

#[derive(Default)]
struct FrameSlots {
    /// Requested and not yet run, by rAF id
    live: HashMap<i32, FrameClosure>,
    /// Already run; a closure cannot free itself while it executes
    spent: Vec<FrameClosure>,
}

/// `requestAnimationFrame` / `cancelAnimationFrame`.
///
/// Owns every closure it hands to the browser, so cancelling a frame also
/// drops the callback and whatever state it captured.
pub struct AnimationFrameScheduler {
    window: Window,
    slots: Rc<RefCell<FrameSlots>>,
}

impl AnimationFrameScheduler {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            slots: Rc::new(RefCell::new(FrameSlots::default())),
        }
    }
}

impl FrameScheduler for AnimationFrameScheduler {
    fn schedule_next(&self, callback: FrameCallback) -> FrameHandle {
        let slots = Rc::downgrade(&self.slots);
        let id = Rc::new(Cell::new(0));
        let own_id = Rc::clone(&id);
        let mut callback = Some(callback);

        let closure = FrameClosure::new(move |timestamp: f64| {
            if let Some(slots) = slots.upgrade() {
                let mut slots = slots.borrow_mut();
                // Earlier frames have returned by now
                slots.spent.clear();
                if let Some(this) = slots.live.remove(&own_id.get()) {
                    slots.spent.push(this);
                }
            }
            if let Some(callback) = callback.take() {
                callback(timestamp);
            }
        });

        match self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
        {
            Ok(raw) => {
                id.set(raw);
                self.slots.borrow_mut().live.insert(raw, closure);
                FrameHandle(raw as u32)
            }
            Err(e) => {
                log::error!("requestAnimationFrame failed: {:?}", e);
                FrameHandle(0)
            }
        }
    }

    fn cancel(&self, handle: FrameHandle) {
        let raw = handle.0 as i32;
        let _ = self.window.cancel_animation_frame(raw);
        let cancelled = self.slots.borrow_mut().live.remove(&raw);
        drop(cancelled);
    }
}

/// Reports whether at least `threshold` of `target` is inside the viewport
pub struct IntersectionVisibility {
    target: Element,
    threshold: f64,
}

impl IntersectionVisibility {
    pub fn new(target: Element, threshold: f64) -> Self {
        Self { target, threshold }
    }
}

impl Signal<bool> for IntersectionVisibility {
    fn subscribe(&self, mut handler: Box<dyn FnMut(bool)>) -> Subscription {
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                for entry in entries.iter() {
                    if let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() {
                        handler(entry.is_intersecting());
                    }
                }
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(self.threshold));

        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
            Ok(observer) => {
                observer.observe(&self.target);
                Subscription::new(move || {
                    observer.disconnect();
                    drop(callback);
                })
            }
            Err(e) => {
                log::warn!("IntersectionObserver unavailable ({:?}), pad never pauses", e);
                Subscription::empty()
            }
        }
    }
}

/// Mouse and single-touch movement over the canvas
pub struct CanvasPointer {
    canvas: HtmlCanvasElement,
}

impl CanvasPointer {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }
}

impl Signal<PointerEvent> for CanvasPointer {
    fn subscribe(&self, handler: Box<dyn FnMut(PointerEvent)>) -> Subscription {
        let handler = Rc::new(RefCell::new(handler));
        let target: &EventTarget = self.canvas.as_ref();

        let mouse_move = {
            let handler = handler.clone();
            let canvas = self.canvas.clone();
            listen(target, "mousemove", true, move |event: MouseEvent| {
                let pos = local_point(&canvas, event.client_x(), event.client_y());
                (handler.borrow_mut())(PointerEvent::Move(pos));
            })
        };

        // Not passive: the pad swallows the scroll while a finger drags on it
        let touch_move = {
            let handler = handler.clone();
            let canvas = self.canvas.clone();
            listen(target, "touchmove", false, move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let pos = local_point(&canvas, touch.client_x(), touch.client_y());
                    (handler.borrow_mut())(PointerEvent::Move(pos));
                }
            })
        };

        let mouse_leave = listen(target, "mouseleave", true, move |_: MouseEvent| {
            (handler.borrow_mut())(PointerEvent::Leave);
        });

        let mut listeners = vec![mouse_move, touch_move, mouse_leave];
        Subscription::new(move || {
            for listener in &mut listeners {
                listener.cancel();
            }
        })
    }
}

/// Window resizes, reported as the container's new client size
pub struct WindowResize {
    window: Window,
    container: Element,
}

impl WindowResize {
    pub fn new(window: Window, container: Element) -> Self {
        Self { window, container }
    }
}

impl Signal<SurfaceSize> for WindowResize {
    fn subscribe(&self, mut handler: Box<dyn FnMut(SurfaceSize)>) -> Subscription {
        let container = self.container.clone();
        listen(self.window.as_ref(), "resize", true, move |_: web_sys::Event| {
            handler(client_size(&container));
        })
    }
}

/// Handle returned to JS; `destroy()` stops the pad and removes every listener
#[wasm_bindgen]
pub struct PadHandle {
    driver: Option<PadDriver<CanvasSurface>>,
}

#[wasm_bindgen]
impl PadHandle {
    pub fn destroy(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.teardown();
        }
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.driver.as_ref().is_some_and(|d| d.is_running())
    }
}

/// Start a pad on the canvas with id `canvas_id`, using stored settings
#[wasm_bindgen]
pub fn mount(canvas_id: &str) -> std::result::Result<PadHandle, JsValue> {
    Ok(mount_with(canvas_id, PadSettings::load())?)
}

/// Start a pad on the canvas with id `canvas_id`.
///
/// The canvas is sized to its parent element, which is also what the
/// visibility observer watches.
pub fn mount_with(canvas_id: &str, settings: PadSettings) -> Result<PadHandle> {
    let window = web_sys::window().ok_or_else(|| host_err("no window"))?;
    let document = window.document().ok_or_else(|| host_err("no document"))?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| host_err(format!("no element #{}", canvas_id)))?
        .dyn_into()
        .map_err(|_| host_err(format!("#{} is not a canvas", canvas_id)))?;
    let container: Element = canvas
        .parent_element()
        .unwrap_or_else(|| canvas.clone().into());

    let mut surface = CanvasSurface::new(canvas.clone())?;
    surface.resize(client_size(&container));

    let host = HostSignals {
        visibility: Box::new(IntersectionVisibility::new(
            container.clone(),
            settings.visibility_threshold,
        )),
        pointer: Box::new(CanvasPointer::new(canvas)),
        resize: Box::new(WindowResize::new(window.clone(), container)),
    };
    let scheduler = Rc::new(AnimationFrameScheduler::new(window));
    let driver = PadDriver::start(surface, scheduler, host, settings)?;

    Ok(PadHandle {
        driver: Some(driver),
    })
}

/// Attach `handler` to `event` on `target` until the returned subscription is released
fn listen<E>(
    target: &EventTarget,
    event: &'static str,
    passive: bool,
    mut handler: impl FnMut(E) + 'static,
) -> Subscription
where
    E: JsCast + 'static,
{
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
        if let Ok(event) = event.dyn_into::<E>() {
            handler(event);
        }
    });

    let options = AddEventListenerOptions::new();
    options.set_passive(passive);
    if let Err(e) = target.add_event_listener_with_callback_and_add_event_listener_options(
        event,
        closure.as_ref().unchecked_ref(),
        &options,
    ) {
        log::warn!("Could not listen for {}: {:?}", event, e);
        return Subscription::empty();
    }

    let target = target.clone();
    Subscription::new(move || {
        let _ = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        drop(closure);
    })
}

/// Client coordinates to canvas-local coordinates
fn local_point(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    Vec2::new(
        (client_x as f64 - rect.left()) as f32,
        (client_y as f64 - rect.top()) as f32,
    )
}

fn client_size(element: &Element) -> SurfaceSize {
    SurfaceSize::new(element.client_width() as f32, element.client_height() as f32)
}

fn host_err(msg: impl Into<String>) -> Error {
    Error::Host(msg.into())
}
