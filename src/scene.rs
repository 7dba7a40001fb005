//! Scene graph.
//!
//! Only the node kinds the viewer actually needs exist: lights, groups and
//! meshes. Traversal matches on the variant instead of probing types.

use crate::config::{EnvironmentConfig, LightsConfig, MaterialConfig};
use crate::geometry::Geometry;
use nalgebra::{Matrix4, Vector3};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self { position: Vector3::zeros(), scale: Vector3::repeat(1.0) }
    }
}

impl Transform {
    pub fn at(position: Vector3<f32>) -> Self {
        Self { position, ..Self::default() }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.position) * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

/// A displayable object: one or more triangle parts sharing a transform.
#[derive(Debug, Clone)]
pub struct Model {
    parts: Vec<Arc<Geometry>>,
    pub transform: Transform,
}

impl Model {
    pub fn from_geometry(geometry: Geometry) -> Self {
        Self::from_parts(vec![geometry])
    }

    pub fn from_parts(parts: Vec<Geometry>) -> Self {
        Self { parts: parts.into_iter().map(Arc::new).collect(), transform: Transform::default() }
    }

    pub fn parts(&self) -> &[Arc<Geometry>] {
        &self.parts
    }

    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|g| g.triangle_count()).sum()
    }

    /// Scene node for this model: a group with one mesh child per part.
    pub fn to_node(&self, name: &str, material: MaterialId) -> Node {
        Node::Group(Group {
            name: name.to_owned(),
            transform: self.transform,
            visible: true,
            children: self
                .parts
                .iter()
                .map(|g| Node::Mesh(MeshNode::new(Arc::clone(g), material)))
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
}

impl From<&MaterialConfig> for Material {
    fn from(cfg: &MaterialConfig) -> Self {
        Self { color: cfg.color, metalness: cfg.metalness, roughness: cfg.roughness }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: Vector3<f32>,
}

#[derive(Debug, Clone)]
pub struct MeshNode {
    pub geometry: Arc<Geometry>,
    pub material: MaterialId,
    pub transform: Transform,
    pub visible: bool,
}

impl MeshNode {
    pub fn new(geometry: Arc<Geometry>, material: MaterialId) -> Self {
        Self { geometry, material, transform: Transform::default(), visible: true }
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone)]
pub enum Node {
    AmbientLight(AmbientLight),
    PointLight(PointLight),
    Group(Group),
    Mesh(MeshNode),
}

impl Node {
    pub fn transform(&self) -> Transform {
        match self {
            Node::Group(g) => g.transform,
            Node::Mesh(m) => m.transform,
            Node::PointLight(p) => Transform::at(p.position),
            Node::AmbientLight(_) => Transform::default(),
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            Node::Group(g) => g.visible,
            Node::Mesh(m) => m.visible,
            Node::AmbientLight(_) | Node::PointLight(_) => true,
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        match self {
            Node::Group(g) => g.visible = visible,
            Node::Mesh(m) => m.visible = visible,
            Node::AmbientLight(_) | Node::PointLight(_) => {}
        }
    }

    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        match self {
            Node::Group(g) => Some(&mut g.transform),
            Node::Mesh(m) => Some(&mut m.transform),
            Node::AmbientLight(_) | Node::PointLight(_) => None,
        }
    }
}

/// Sky gradient used as background and as the reflection source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub zenith: [f32; 3],
    pub horizon: [f32; 3],
    pub ground: [f32; 3],
}

impl From<&EnvironmentConfig> for Environment {
    fn from(cfg: &EnvironmentConfig) -> Self {
        Self { zenith: cfg.zenith, horizon: cfg.horizon, ground: cfg.ground }
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    materials: Vec<Material>,
    pub environment: Option<Environment>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    /// Adds the ambient and point light described by `cfg`.
    pub fn add_lights(&mut self, cfg: &LightsConfig) {
        self.add(Node::PointLight(PointLight {
            color: cfg.point_color,
            intensity: cfg.point_intensity,
            position: Vector3::from(cfg.point_position),
        }));
        self.add(Node::AmbientLight(AmbientLight { color: cfg.ambient_color, intensity: cfg.ambient_intensity }));
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Removes every node and material. The environment stays.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.materials.clear();
    }

    /// Depth-first walk over every node, visible or not.
    pub fn traverse(&self, mut f: impl FnMut(&Node)) {
        fn walk(node: &Node, f: &mut impl FnMut(&Node)) {
            f(node);
            if let Node::Group(g) = node {
                for child in &g.children {
                    walk(child, f);
                }
            }
        }
        for node in &self.nodes {
            walk(node, &mut f);
        }
    }

    /// Visible meshes with their world matrix. Hidden groups hide their subtree.
    pub fn visible_meshes(&self, mut f: impl FnMut(&MeshNode, Matrix4<f32>)) {
        fn walk(node: &Node, parent: &Matrix4<f32>, f: &mut impl FnMut(&MeshNode, Matrix4<f32>)) {
            if !node.is_visible() {
                return;
            }
            match node {
                Node::Group(g) => {
                    let world = parent * g.transform.matrix();
                    for child in &g.children {
                        walk(child, &world, f);
                    }
                }
                Node::Mesh(m) => f(m, parent * m.transform.matrix()),
                Node::AmbientLight(_) | Node::PointLight(_) => {}
            }
        }
        let identity = Matrix4::identity();
        for node in &self.nodes {
            walk(node, &identity, &mut f);
        }
    }

    pub fn ambient_light(&self) -> Option<&AmbientLight> {
        self.nodes.iter().find_map(|n| match n {
            Node::AmbientLight(a) => Some(a),
            _ => None,
        })
    }

    pub fn point_light(&self) -> Option<&PointLight> {
        self.nodes.iter().find_map(|n| match n {
            Node::PointLight(p) => Some(p),
            _ => None,
        })
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.traverse(|n| {
            if matches!(n, Node::Mesh(_)) {
                count += 1;
            }
        });
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tri() -> Geometry {
        Geometry::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], Vec::new(), vec![0, 1, 2])
    }

    fn white() -> Material {
        Material { color: [1.0; 3], metalness: 0.0, roughness: 1.0 }
    }

    #[test]
    fn model_node_has_one_mesh_per_part() {
        let mut scene = Scene::new();
        let mat = scene.add_material(white());
        let model = Model::from_parts(vec![tri(), tri(), tri()]);
        scene.add(model.to_node("three", mat));
        assert_eq!(scene.mesh_count(), 3);
    }

    #[test]
    fn hidden_group_hides_children() {
        let mut scene = Scene::new();
        let mat = scene.add_material(white());
        let id = scene.add(Model::from_geometry(tri()).to_node("a", mat));
        scene.add(Model::from_geometry(tri()).to_node("b", mat));

        let mut seen = 0;
        scene.visible_meshes(|_, _| seen += 1);
        assert_eq!(seen, 2);

        scene.node_mut(id).unwrap().set_visible(false);
        let mut seen = 0;
        scene.visible_meshes(|_, _| seen += 1);
        assert_eq!(seen, 1);
        assert_eq!(scene.mesh_count(), 2);
    }

    #[test]
    fn world_matrix_composes_group_transform() {
        let mut scene = Scene::new();
        let mat = scene.add_material(white());
        let mut model = Model::from_geometry(tri());
        model.transform.position = Vector3::new(1.0, 2.0, 3.0);
        model.transform.scale = Vector3::new(2.0, 2.0, 2.0);
        scene.add(model.to_node("m", mat));

        scene.visible_meshes(|_, world| {
            let p = world.transform_point(&nalgebra::Point3::new(1.0, 0.0, 0.0));
            assert_relative_eq!(p.x, 3.0);
            assert_relative_eq!(p.y, 2.0);
            assert_relative_eq!(p.z, 3.0);
        });
    }

    #[test]
    fn lights_are_found_and_clear_keeps_environment() {
        let mut scene = Scene::new();
        scene.environment = Some(Environment::from(&EnvironmentConfig::default()));
        scene.add_lights(&LightsConfig::default());
        assert_relative_eq!(scene.ambient_light().unwrap().intensity, 0.5);
        assert_relative_eq!(scene.point_light().unwrap().position.z, 4.0);

        scene.add_material(white());
        scene.clear();
        assert!(scene.is_empty());
        assert!(scene.material(MaterialId(0)).is_none());
        assert!(scene.environment.is_some());
    }
}
