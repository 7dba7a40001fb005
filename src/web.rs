//! Browser wiring for the viewer.
//!
//! `Viewer::start` binds the core to a page root: window and element
//! listeners push `ViewerEvent`s onto an unbounded channel, the font and every
//! picked file are loaded on `spawn_local` tasks that report through the same
//! channel, and an eframe `WebRunner` on the canvas drains it each frame.

use crate::alert::AlertSurface;
use crate::app::ViewerApp;
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::fonts;
use crate::lifecycle::{Lifecycle, Subscription};
use crate::loader;
use crate::viewer::{self, ViewerCore, ViewerEvent, Viewport};
use futures_channel::mpsc::{self, UnboundedSender};
use gloo_events::EventListener;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlCanvasElement, HtmlElement, HtmlInputElement, KeyboardEvent, Window};

/// The `.alert` region of the page.
struct DomAlert {
    root: HtmlElement,
    title: Option<Element>,
}

impl DomAlert {
    fn find(page: &Element) -> Option<Self> {
        let root = query(page, ".alert")?.dyn_into::<HtmlElement>().ok()?;
        let title = query(page, ".alert__title");
        Some(Self { root, title })
    }

    fn set_display(&self, value: &str) {
        if let Err(e) = self.root.style().set_property("display", value) {
            log::warn!("could not set alert display: {e:?}");
        }
    }
}

impl AlertSurface for DomAlert {
    fn show(&self, message: &str) {
        if let Some(title) = &self.title {
            title.set_text_content(Some(message));
        }
        self.set_display("flex");
    }

    fn hide(&self) {
        self.set_display("none");
    }
}

/// The eframe runner as the viewer's frame subscription.
struct RunnerFrame(eframe::WebRunner);

impl Subscription for RunnerFrame {
    fn cancel(self: Box<Self>) {
        self.0.destroy();
    }
}

fn query(page: &Element, selector: &str) -> Option<Element> {
    page.query_selector(selector).ok().flatten()
}

fn window_viewport(window: &Window, max_pixel_ratio: f32) -> Viewport {
    let px = |v: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
    };
    Viewport::new(
        px(window.inner_width()),
        px(window.inner_height()),
        window.device_pixel_ratio() as f32,
        max_pixel_ratio,
    )
}

fn send(tx: &UnboundedSender<ViewerEvent>, event: ViewerEvent) {
    if let Err(e) = tx.unbounded_send(event) {
        log::debug!("viewer disposed, dropping {:?}", e.into_inner());
    }
}

/// A running viewer bound to one page.
pub struct Viewer {
    core: Rc<RefCell<ViewerCore>>,
    sender: UnboundedSender<ViewerEvent>,
    lifecycle: Lifecycle,
    disposed: bool,
}

impl Viewer {
    /// Starts the viewer on the `.viewer__canvas` inside `page`.
    pub fn start(page: &Element, config: ViewerConfig) -> Result<Self, ViewerError> {
        let window = web_sys::window().ok_or_else(|| ViewerError::MissingMount("window".into()))?;
        let canvas = query(page, ".viewer__canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or_else(|| ViewerError::MissingMount(".viewer__canvas".into()))?;

        let surface: Box<dyn AlertSurface> = match DomAlert::find(page) {
            Some(alert) => Box::new(alert),
            None => {
                log::warn!("page has no .alert region, messages go to the log only");
                Box::new(crate::alert::NoSurface)
            }
        };

        let viewport = window_viewport(&window, config.max_pixel_ratio);
        let core = Rc::new(RefCell::new(ViewerCore::new(config.clone(), viewport, surface)));
        let (sender, receiver) = mpsc::unbounded();
        let mut lifecycle = Lifecycle::new();

        let tx = sender.clone();
        let on_key = EventListener::new(&window, "keydown", move |event| {
            if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                send(&tx, ViewerEvent::Key(event.key()));
            }
        });
        lifecycle.listen("keydown", Box::new(on_key));

        let tx = sender.clone();
        let win = window.clone();
        let max_pixel_ratio = config.max_pixel_ratio;
        let on_resize = EventListener::new(&window, "resize", move |_| {
            send(&tx, ViewerEvent::Resized(window_viewport(&win, max_pixel_ratio)));
        });
        lifecycle.listen("resize", Box::new(on_resize));

        if let Some(input) = query(page, ".upload__input").and_then(|el| el.dyn_into::<HtmlInputElement>().ok()) {
            let tx = sender.clone();
            let picker = input.clone();
            let on_change = EventListener::new(&input, "change", move |_| {
                let Some(file) = loader::take_selected(&picker) else {
                    return;
                };
                let tx = tx.clone();
                spawn_local(async move {
                    let file_name = file.name();
                    log::debug!("decoding {file_name}");
                    let result = loader::load_file(&file).await;
                    send(&tx, ViewerEvent::ModelDecoded { file_name, result });
                });
            });
            lifecycle.listen("change", Box::new(on_change));
        }

        if let Some(button) = query(page, ".alert__button") {
            let tx = sender.clone();
            let on_click = EventListener::new(&button, "click", move |_| send(&tx, ViewerEvent::DismissAlert));
            lifecycle.listen("click", Box::new(on_click));
        }

        let tx = sender.clone();
        let font_url = config.font_url.clone();
        spawn_local(async move {
            let result = fonts::fetch_font(&font_url).await;
            send(&tx, ViewerEvent::FontLoaded(result));
        });

        let runner = eframe::WebRunner::new();
        lifecycle.set_frame(Box::new(RunnerFrame(runner.clone())));
        let app_core = Rc::clone(&core);
        let options = eframe::WebOptions { depth_buffer: 24, ..Default::default() };
        spawn_local(async move {
            let started = runner
                .start(canvas, options, Box::new(move |cc| Ok(Box::new(ViewerApp::new(cc, app_core, receiver)))))
                .await;
            if let Err(e) = started {
                log::error!("failed to start renderer: {e:?}");
            }
        });

        log::info!("viewer started");
        Ok(Self { core, sender, lifecycle, disposed: false })
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Stops the frame loop, detaches every listener and releases the
    /// scene. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.lifecycle.teardown();
        if !viewer::dispose_shared(&self.core) {
            log::error!("viewer core busy, dispose retried on drop");
            return;
        }
        self.sender.close_channel();
        self.disposed = true;
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.dispose();
    }
}
