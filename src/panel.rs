use crate::scene::{MaterialId, NodeId, Scene, Transform};
use egui::{self, DragValue};

/// Value range of every position/scale control.
const AXIS_RANGE: std::ops::RangeInclusive<f32> = -100.0..=100.0;

/// Scene handles the panel edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelTarget {
    pub model: NodeId,
    pub label: Option<NodeId>,
    pub material: MaterialId,
}

/// Live-adjustable parameters of the displayed object.
///
/// A panel is bound to one scene build. Rebuilding the scene destroys the
/// old panel and creates a new one for the new nodes.
#[derive(Debug)]
pub struct DebugPanel {
    title: String,
    target: PanelTarget,
    destroyed: bool,
}

impl DebugPanel {
    pub fn new(title: impl Into<String>, target: PanelTarget) -> Self {
        Self { title: title.into(), target, destroyed: false }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn target(&self) -> PanelTarget {
        self.target
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    /// Draws the panel as a floating window. Returns true if anything changed.
    pub fn show(&mut self, ctx: &egui::Context, scene: &mut Scene) -> bool {
        if self.destroyed {
            return false;
        }
        let mut changed = false;
        egui::Window::new(self.title.as_str())
            .id(egui::Id::new("debug_panel"))
            .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
            .resizable(false)
            .show(ctx, |ui| {
                changed = self.ui(ui, scene);
            });
        changed
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, scene: &mut Scene) -> bool {
        let mut changed = false;

        egui::CollapsingHeader::new("Model").default_open(true).show(ui, |ui| {
            if let Some(material) = scene.material_mut(self.target.material) {
                ui.horizontal(|ui| {
                    ui.label("Color");
                    changed |= ui.color_edit_button_rgb(&mut material.color).changed();
                });
            }

            let Some(transform) = scene.node_mut(self.target.model).and_then(|n| n.transform_mut()) else {
                return;
            };
            for field in TransformField::ALL {
                if matches!(field, TransformField::Position(Axis::X) | TransformField::Scale(Axis::X)) {
                    ui.separator();
                }
                changed |= axis_row(ui, field.label(), field.value_mut(transform));
            }
        });

        if let Some(label) = self.target.label.and_then(|id| scene.node_mut(id)) {
            egui::CollapsingHeader::new("Text").default_open(true).show(ui, |ui| {
                let mut visible = label.is_visible();
                if ui.checkbox(&mut visible, "Is visible").changed() {
                    label.set_visible(visible);
                    changed = true;
                }
            });
        }

        changed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One numeric row of the "Model" folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformField {
    Position(Axis),
    Scale(Axis),
}

impl TransformField {
    pub const ALL: [TransformField; 6] = [
        TransformField::Position(Axis::X),
        TransformField::Position(Axis::Y),
        TransformField::Position(Axis::Z),
        TransformField::Scale(Axis::X),
        TransformField::Scale(Axis::Y),
        TransformField::Scale(Axis::Z),
    ];

    pub fn label(self) -> &'static str {
        match self {
            TransformField::Position(Axis::X) => "Axis X",
            TransformField::Position(Axis::Y) => "Axis Y",
            TransformField::Position(Axis::Z) => "Axis Z",
            TransformField::Scale(Axis::X) => "Scale X",
            TransformField::Scale(Axis::Y) => "Scale Y",
            TransformField::Scale(Axis::Z) => "Scale Z",
        }
    }

    pub fn value_mut(self, transform: &mut Transform) -> &mut f32 {
        let (v, axis) = match self {
            TransformField::Position(axis) => (&mut transform.position, axis),
            TransformField::Scale(axis) => (&mut transform.scale, axis),
        };
        match axis {
            Axis::X => &mut v.x,
            Axis::Y => &mut v.y,
            Axis::Z => &mut v.z,
        }
    }
}

fn axis_row(ui: &mut egui::Ui, name: &str, value: &mut f32) -> bool {
    ui.horizontal(|ui| {
        ui.label(name);
        let changed = ui.add(DragValue::new(value).speed(1.0).range(AXIS_RANGE)).changed();
        if changed {
            *value = value.round();
        }
        changed
    })
    .inner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::scene::{Material, Model};

    fn scene_with_target() -> (Scene, PanelTarget) {
        let mut scene = Scene::new();
        let material = scene.add_material(Material { color: [1.0; 3], metalness: 0.5, roughness: 0.5 });
        let tri = || Geometry::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], Vec::new(), vec![0, 1, 2]);
        let model = scene.add(Model::from_geometry(tri()).to_node("m", material));
        let label = scene.add(Model::from_geometry(tri()).to_node("label", material));
        (scene, PanelTarget { model, label: Some(label), material })
    }

    #[test]
    fn renders_headless_without_changes() {
        let (mut scene, target) = scene_with_target();
        let mut panel = DebugPanel::new("BoxGeometry", target);
        let ctx = egui::Context::default();
        let mut changed = true;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            changed = panel.show(ctx, &mut scene);
        });
        assert!(!changed);
    }

    #[test]
    fn destroyed_panel_draws_nothing() {
        let (mut scene, target) = scene_with_target();
        let mut panel = DebugPanel::new("x", target);
        panel.destroy();
        assert!(panel.is_destroyed());
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            assert!(!panel.show(ctx, &mut scene));
        });
    }

    #[test]
    fn panel_without_label_skips_text_folder() {
        let (mut scene, mut target) = scene_with_target();
        target.label = None;
        let mut panel = DebugPanel::new("x", target);
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                assert!(!panel.ui(ui, &mut scene));
            });
        });
        assert_eq!(panel.target().label, None);
    }

    /// Every text drawn in a frame, with the center of its layout box.
    fn texts(output: &egui::FullOutput) -> Vec<(String, egui::Pos2)> {
        fn walk(shape: &egui::Shape, out: &mut Vec<(String, egui::Pos2)>) {
            match shape {
                egui::Shape::Text(t) => out.push((t.galley.job.text.clone(), t.pos + t.galley.rect.center().to_vec2())),
                egui::Shape::Vec(shapes) => shapes.iter().for_each(|s| walk(s, out)),
                _ => {}
            }
        }
        let mut out = Vec::new();
        for clipped in &output.shapes {
            walk(&clipped.shape, &mut out);
        }
        out
    }

    fn frame(
        ctx: &egui::Context,
        events: Vec<egui::Event>,
        panel: &mut DebugPanel,
        scene: &mut Scene,
    ) -> (egui::FullOutput, bool) {
        let input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0))),
            events,
            ..Default::default()
        };
        let mut changed = false;
        let output = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                changed = panel.ui(ui, scene);
            });
        });
        (output, changed)
    }

    #[test]
    fn folders_open_with_every_control() {
        let (mut scene, target) = scene_with_target();
        let mut panel = DebugPanel::new("BoxGeometry", target);
        let ctx = egui::Context::default();
        frame(&ctx, Vec::new(), &mut panel, &mut scene);
        let (output, changed) = frame(&ctx, Vec::new(), &mut panel, &mut scene);
        assert!(!changed);

        let drawn: Vec<String> = texts(&output).into_iter().map(|(text, _)| text).collect();
        for label in ["Model", "Color", "Axis X", "Axis Y", "Axis Z", "Scale X", "Scale Y", "Scale Z", "Text", "Is visible"] {
            assert!(drawn.iter().any(|t| t == label), "{label} not drawn in {drawn:?}");
        }
    }

    #[test]
    fn clicking_is_visible_hides_label() {
        let (mut scene, target) = scene_with_target();
        let mut panel = DebugPanel::new("BoxGeometry", target);
        let ctx = egui::Context::default();
        let (output, _) = frame(&ctx, Vec::new(), &mut panel, &mut scene);
        let (_, pos) = texts(&output).into_iter().find(|(t, _)| t == "Is visible").unwrap();

        let button = |pressed| egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::NONE,
        };
        frame(&ctx, vec![egui::Event::PointerMoved(pos), button(true)], &mut panel, &mut scene);
        let (_, changed) = frame(&ctx, vec![button(false)], &mut panel, &mut scene);

        assert!(changed);
        let label = scene.node(target.label.unwrap()).unwrap();
        assert!(!label.is_visible());
        assert!(scene.node(target.model).unwrap().is_visible());
    }

    #[test]
    fn transform_fields_address_their_axis() {
        let labels: Vec<_> = TransformField::ALL.iter().map(|f| f.label()).collect();
        assert_eq!(labels, ["Axis X", "Axis Y", "Axis Z", "Scale X", "Scale Y", "Scale Z"]);

        let (mut scene, target) = scene_with_target();
        let transform = scene.node_mut(target.model).unwrap().transform_mut().unwrap();
        *TransformField::Position(Axis::Y).value_mut(transform) = 3.0;
        *TransformField::Scale(Axis::Z).value_mut(transform) = 2.0;

        let t = scene.node(target.model).unwrap().transform();
        assert_eq!(t.position.y, 3.0);
        assert_eq!(t.position.x, 0.0);
        assert_eq!(t.scale.z, 2.0);
        assert_eq!(t.scale.y, 1.0);
    }
}
