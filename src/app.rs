use crate::viewer::{ViewerCore, ViewerEvent};
use eframe::egui;
use futures_channel::mpsc::UnboundedReceiver;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// The render loop. eframe calls `update` once per display frame.
pub struct ViewerApp {
    core: Rc<RefCell<ViewerCore>>,
    events: UnboundedReceiver<ViewerEvent>,
}

impl ViewerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        core: Rc<RefCell<ViewerCore>>,
        events: UnboundedReceiver<ViewerEvent>,
    ) -> Self {
        match cc.gl.as_ref() {
            Some(gl) => {
                if let Err(e) = core.borrow_mut().attach_gpu(Arc::clone(gl)) {
                    log::error!("{e}");
                }
            }
            None => log::error!("eframe started without a glow context"),
        }
        Self { core, events }
    }

    /// Hands every queued event to the core, in arrival order.
    fn drain_events(&mut self) {
        let mut core = self.core.borrow_mut();
        while let Ok(Some(event)) = self.events.try_next() {
            core.handle(event);
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        let mut core = self.core.borrow_mut();
        if core.is_disposed() {
            return;
        }
        core.show_panel(ctx);

        egui::CentralPanel::default().frame(egui::Frame::none()).show(ctx, |ui| {
            let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::drag());

            if response.dragged() {
                let delta = response.drag_delta();
                core.controls_mut().rotate(delta.x, delta.y, rect.height());
            }
            if response.hovered() {
                let scroll = ui.input(|i| i.raw_scroll_delta.y);
                core.controls_mut().dolly(scroll);
            }
            core.tick();

            if let Some((program, frame, draws)) = core.prepare_draws() {
                let callback = egui_glow::CallbackFn::new(move |_info, painter| unsafe {
                    program.paint(painter.gl(), &frame, &draws);
                });
                ui.painter().add(egui::PaintCallback { rect, callback: Arc::new(callback) });
            }
        });

        // damping keeps the camera moving after input stops
        ctx.request_repaint();
    }
}
