//! Viewer core: catalog cursor, scene rebuilds, messages and teardown.
//!
//! The core never touches the DOM. Browser callbacks and async tasks turn
//! into `ViewerEvent`s, and the frame loop hands them to `handle` one by one,
//! so every mutation happens on the frame thread in arrival order.

use crate::alert::{Alert, AlertSurface};
use crate::camera::{OrbitControls, PerspectiveCamera};
use crate::catalog::{Catalog, CatalogEntry, Direction};
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::fonts::Font;
use crate::geometry::Geometry;
use crate::panel::{DebugPanel, PanelTarget};
use crate::renderer::{DrawCall, FrameUniforms, GpuScene, MeshProgram};
use crate::scene::{Environment, Material, MeshNode, Model, Node, Scene, Transform};
use crate::shapes;
use nalgebra::Vector3;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

pub const IMPORT_FAILED_MESSAGE: &str = "Error loading model. Please try a different file.";

pub fn import_succeeded_message(file_name: &str) -> String {
    format!("Your model {file_name} was added. Use the arrows of your keyboard to find your custom model.")
}

#[derive(Debug)]
pub enum ViewerEvent {
    FontLoaded(Result<Font, ViewerError>),
    Key(String),
    Resized(Viewport),
    ModelDecoded { file_name: String, result: Result<Model, ViewerError> },
    DismissAlert,
}

/// Size of the drawing surface in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Viewport {
    /// `device_pixel_ratio` is capped at `max_pixel_ratio`.
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32, max_pixel_ratio: f32) -> Self {
        Self { width, height, pixel_ratio: device_pixel_ratio.clamp(1.0, max_pixel_ratio.max(1.0)) }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 { self.width / self.height } else { 1.0 }
    }

    /// Backing-store size in device pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        ((self.width * self.pixel_ratio).round() as u32, (self.height * self.pixel_ratio).round() as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Added,
    Failed,
    /// The viewer was already disposed.
    Ignored,
}

/// Catalog entry currently built into the scene.
#[derive(Debug, Clone, Copy)]
struct Shown {
    index: usize,
    target: PanelTarget,
}

pub struct ViewerCore {
    config: ViewerConfig,
    catalog: Catalog,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    font: Option<Font>,
    /// Set once the font load has finished, whatever the result.
    font_settled: bool,
    labels: HashMap<String, Arc<Geometry>>,
    shown: Option<Shown>,
    panel: Option<DebugPanel>,
    alert: Alert,
    viewport: Viewport,
    gpu: Option<GpuScene>,
    disposed: bool,
}

impl ViewerCore {
    pub fn new(config: ViewerConfig, viewport: Viewport, surface: Box<dyn AlertSurface>) -> Self {
        Self::with_catalog(config, viewport, surface, shapes::builtin_catalog())
    }

    pub fn with_catalog(
        config: ViewerConfig,
        viewport: Viewport,
        surface: Box<dyn AlertSurface>,
        entries: Vec<CatalogEntry>,
    ) -> Self {
        let camera = PerspectiveCamera::new(&config.camera, viewport.aspect());
        let controls = OrbitControls::new(&config.orbit);

        let mut scene = Scene::new();
        scene.environment = Some(Environment::from(&config.environment));
        scene.add_lights(&config.lights);

        log::info!("viewer ready with {} catalog entries, waiting for font", entries.len());
        Self {
            camera,
            controls,
            catalog: Catalog::new(entries),
            scene,
            font: None,
            font_settled: false,
            labels: HashMap::new(),
            shown: None,
            panel: None,
            alert: Alert::new(surface),
            viewport,
            gpu: None,
            disposed: false,
            config,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn alert(&self) -> &Alert {
        &self.alert
    }

    pub fn panel(&self) -> Option<&DebugPanel> {
        self.panel.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn font(&self) -> Option<&Font> {
        self.font.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Name of the entry currently in the scene, if any.
    pub fn shown_name(&self) -> Option<&str> {
        self.shown.and_then(|s| self.catalog.entries().get(s.index)).map(CatalogEntry::name)
    }

    pub fn handle(&mut self, event: ViewerEvent) {
        if self.disposed {
            log::debug!("viewer disposed, dropping {event:?}");
            return;
        }
        match event {
            ViewerEvent::FontLoaded(result) => self.set_font(result),
            ViewerEvent::Key(key) => {
                self.on_key(&key);
            }
            ViewerEvent::Resized(viewport) => self.resize(viewport),
            ViewerEvent::ModelDecoded { file_name, result } => {
                self.finish_import(&file_name, result);
            }
            ViewerEvent::DismissAlert => self.dismiss(),
        }
    }

    /// Stores the label font and shows the current entry. On failure the
    /// entry is shown without a label.
    pub fn set_font(&mut self, result: Result<Font, ViewerError>) {
        match result {
            Ok(font) => {
                log::info!("label font {} loaded", font.family);
                self.font = Some(font);
            }
            Err(e) => log::error!("{e}; labels disabled"),
        }
        self.font_settled = true;
        self.rebuild_scene();
    }

    /// Returns true if the key was a navigation key.
    pub fn on_key(&mut self, key: &str) -> bool {
        match Direction::from_key(key) {
            Some(direction) => {
                self.navigate(direction);
                true
            }
            None => false,
        }
    }

    pub fn navigate(&mut self, direction: Direction) {
        if self.disposed {
            return;
        }
        self.commit_transform();
        if let Some(name) = self.catalog.step(direction).map(|entry| entry.name().to_owned()) {
            log::debug!("showing {name} ({}/{})", self.catalog.cursor() + 1, self.catalog.len());
        }
        self.rebuild_scene();
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.set_aspect(viewport.aspect());
    }

    /// Completes an upload. The new entry goes to the end of the catalog; the
    /// cursor does not move.
    pub fn finish_import(&mut self, file_name: &str, result: Result<Model, ViewerError>) -> ImportOutcome {
        if self.disposed {
            log::debug!("viewer disposed, ignoring decoded {file_name}");
            return ImportOutcome::Ignored;
        }
        match result {
            Ok(model) => {
                log::info!("imported {file_name}: {} triangles", model.triangle_count());
                self.catalog.push(CatalogEntry::new(file_name, model));
                self.show_message(import_succeeded_message(file_name));
                self.rebuild_scene();
                ImportOutcome::Added
            }
            Err(e) => {
                log::warn!("import of {file_name} failed: {e}");
                self.show_message(IMPORT_FAILED_MESSAGE);
                ImportOutcome::Failed
            }
        }
    }

    pub fn show_message(&mut self, text: impl Into<String>) {
        self.alert.open(text);
    }

    pub fn dismiss(&mut self) {
        self.alert.close();
    }

    /// Clears the scene and builds it again around the current entry.
    fn rebuild_scene(&mut self) {
        self.commit_transform();
        if let Some(panel) = self.panel.as_mut() {
            panel.destroy();
        }
        self.panel = None;
        self.shown = None;

        self.scene.clear();
        self.scene.add_lights(&self.config.lights);
        self.render_current();
    }

    fn render_current(&mut self) {
        if !self.font_settled {
            return;
        }
        let index = self.catalog.cursor();
        let Some(entry) = self.catalog.current() else { return };
        let name = entry.name().to_owned();

        let material = self.scene.add_material(Material::from(&self.config.material));
        let model = self.scene.add(entry.model.to_node(&name, material));

        let label = self.label_geometry(&name).map(|geometry| {
            let mut node = MeshNode::new(geometry, material);
            node.transform = Transform::at(Vector3::new(0.0, self.config.label.offset_y, 0.0));
            self.scene.add(Node::Mesh(node))
        });

        let target = PanelTarget { model, label, material };
        self.panel = Some(DebugPanel::new(name, target));
        self.shown = Some(Shown { index, target });
    }

    fn label_geometry(&mut self, text: &str) -> Option<Arc<Geometry>> {
        let font = self.font.as_ref()?;
        if let Some(cached) = self.labels.get(text) {
            return Some(Arc::clone(cached));
        }
        match font.label_geometry(text, &self.config.label) {
            Ok(geometry) => {
                let geometry = Arc::new(geometry);
                self.labels.insert(text.to_owned(), Arc::clone(&geometry));
                Some(geometry)
            }
            Err(e) => {
                log::warn!("no label for {text}: {e}");
                None
            }
        }
    }

    /// Copies the panel-edited transform back onto the shown catalog entry.
    fn commit_transform(&mut self) {
        let Some(shown) = self.shown else { return };
        let Some(transform) = self.scene.node(shown.target.model).map(Node::transform) else { return };
        if let Some(entry) = self.catalog.entry_mut(shown.index) {
            entry.model.transform = transform;
        }
    }

    /// Draws the debug panel. Call once per frame inside the egui pass.
    pub fn show_panel(&mut self, ctx: &egui::Context) {
        if let Some(panel) = self.panel.as_mut() {
            panel.show(ctx, &mut self.scene);
        }
    }

    /// Advances orbit damping. Returns true if the camera moved.
    pub fn tick(&mut self) -> bool {
        self.controls.update(&mut self.camera)
    }

    pub fn attach_gpu(&mut self, gl: Arc<glow::Context>) -> Result<(), ViewerError> {
        if self.gpu.is_none() && !self.disposed {
            self.gpu = Some(GpuScene::new(gl)?);
        }
        Ok(())
    }

    /// Program, frame uniforms and draw list for this frame, or `None`
    /// without a GPU.
    pub fn prepare_draws(&mut self) -> Option<(Arc<MeshProgram>, FrameUniforms, Vec<DrawCall>)> {
        let gpu = self.gpu.as_mut()?;
        let draws = gpu.prepare(&self.scene);
        Some((gpu.program(), FrameUniforms::new(&self.scene, &self.camera), draws))
    }

    /// Releases everything the viewer owns. Returns false if it was already
    /// disposed.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        if let Some(mut panel) = self.panel.take() {
            panel.destroy();
        }
        self.controls.dispose();

        if let Some(gpu) = self.gpu.as_mut() {
            let mut released = 0;
            self.scene.traverse(|node| {
                if let Node::Mesh(mesh) = node {
                    if gpu.release(mesh.geometry.id()) {
                        released += 1;
                    }
                }
            });
            log::debug!("released {released} scene geometries, {} cached", gpu.cached());
            gpu.destroy();
        }
        self.gpu = None;

        self.scene.clear();
        self.catalog.clear();
        self.labels.clear();
        self.shown = None;
        self.font = None;
        self.disposed = true;
        log::info!("viewer disposed");
        true
    }
}

/// Disposes a core shared with the frame loop. Returns false and leaves the
/// core untouched while it is borrowed elsewhere.
pub fn dispose_shared(core: &RefCell<ViewerCore>) -> bool {
    match core.try_borrow_mut() {
        Ok(mut core) => {
            core.dispose();
            true
        }
        Err(_) => false,
    }
}
