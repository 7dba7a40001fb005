//! CPU-side triangle meshes.
//!
//! Everything the viewer draws ends up here: csgrs primitives, extruded text,
//! glTF primitives and the procedural torus knot. A `Geometry` is immutable
//! once built and shared through `Arc`; its `id` keys the GPU buffer cache.

use csgrs::mesh::Mesh;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use std::f32::consts::TAU;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Geometry {
    id: Uuid,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

/// Axis-aligned bounds of a geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Bounds {
    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

impl Geometry {
    /// Builds a geometry from indexed triangles. Missing or mismatched normals
    /// are recomputed from the faces.
    pub fn new(positions: Vec<[f32; 3]>, normals: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        let normals = if normals.len() == positions.len() {
            normals
        } else {
            vertex_normals(&positions, &indices)
        };
        Self { id: Uuid::new_v4(), positions, normals, indices }
    }

    /// Flattens a csgrs mesh into triangles. Polygons are fanned from their
    /// first vertex; csgrs keeps them convex.
    pub fn from_csg(mesh: &Mesh<()>) -> Self {
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut indices = Vec::new();

        for poly in &mesh.polygons {
            if poly.vertices.len() < 3 {
                continue;
            }
            let base = positions.len() as u32;
            for v in &poly.vertices {
                positions.push([v.pos.x as f32, v.pos.y as f32, v.pos.z as f32]);
                normals.push([v.normal.x as f32, v.normal.y as f32, v.normal.z as f32]);
            }
            for i in 1..(poly.vertices.len() as u32 - 1) {
                indices.extend_from_slice(&[base, base + i, base + i + 1]);
            }
        }

        Self::new(positions, normals, indices)
    }

    /// Concatenates several geometries into one, without any boolean work.
    pub fn merge(parts: &[Geometry]) -> Self {
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut indices = Vec::new();
        for part in parts {
            let base = positions.len() as u32;
            positions.extend_from_slice(&part.positions);
            normals.extend_from_slice(&part.normals);
            indices.extend(part.indices.iter().map(|i| i + base));
        }
        Self::new(positions, normals, indices)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.positions.first()?;
        let mut min = Vector3::from(*first);
        let mut max = min;
        for p in &self.positions[1..] {
            let p = Vector3::from(*p);
            min = min.inf(&p);
            max = max.sup(&p);
        }
        Some(Bounds { min, max })
    }

    /// Moves the bounding-box center to the origin.
    pub fn centered(self) -> Self {
        match self.bounds() {
            Some(b) => self.transformed(&Matrix4::new_translation(&-b.center())),
            None => self,
        }
    }

    /// Applies an affine transform to positions and (inverse-transpose) normals.
    /// The result is a new geometry with a fresh id.
    pub fn transformed(&self, m: &Matrix4<f32>) -> Self {
        let linear: Matrix3<f32> = m.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear.try_inverse().map(|inv| inv.transpose()).unwrap_or(linear);

        let positions = self
            .positions
            .iter()
            .map(|p| {
                let q = m.transform_point(&Point3::from(*p));
                [q.x, q.y, q.z]
            })
            .collect();
        let normals = self
            .normals
            .iter()
            .map(|n| {
                let v = (normal_matrix * Vector3::from(*n)).try_normalize(f32::EPSILON).unwrap_or_else(Vector3::y);
                [v.x, v.y, v.z]
            })
            .collect();

        Self::new(positions, normals, self.indices.clone())
    }

    /// Regular dodecahedron with circumradius `radius`: 12 flat pentagons
    /// over 20 corners.
    pub fn dodecahedron(radius: f32) -> Self {
        let phi = (1.0 + 5f32.sqrt()) / 2.0;
        let inv = 1.0 / phi;
        let signs = [-1.0f32, 1.0];

        // cube corners plus three golden rectangles, circumradius sqrt(3)
        let mut corners: Vec<Vector3<f32>> = Vec::with_capacity(20);
        for x in signs {
            for y in signs {
                for z in signs {
                    corners.push(Vector3::new(x, y, z));
                }
            }
        }
        for a in signs {
            for b in signs {
                corners.push(Vector3::new(0.0, a * inv, b * phi));
                corners.push(Vector3::new(a * inv, b * phi, 0.0));
                corners.push(Vector3::new(b * phi, 0.0, a * inv));
            }
        }

        // Face normals point at the vertices of the dual icosahedron. Only one
        // of the two cyclic families touches exactly five corners.
        let mut axes = Vec::with_capacity(24);
        for a in signs {
            for b in signs {
                axes.extend([
                    Vector3::new(0.0, a, b * phi),
                    Vector3::new(a, b * phi, 0.0),
                    Vector3::new(b * phi, 0.0, a),
                    Vector3::new(a, 0.0, b * phi),
                    Vector3::new(0.0, b * phi, a),
                    Vector3::new(b * phi, a, 0.0),
                ]);
            }
        }

        let scale = radius / 3f32.sqrt();
        let mut positions = Vec::with_capacity(60);
        let mut normals = Vec::with_capacity(60);
        let mut indices = Vec::with_capacity(108);
        for axis in axes {
            let n = axis.normalize();
            let reach = corners.iter().map(|c| c.dot(&n)).fold(f32::MIN, f32::max);
            let mut face: Vec<Vector3<f32>> = corners.iter().copied().filter(|c| reach - c.dot(&n) < 1e-4).collect();
            if face.len() != 5 {
                continue;
            }

            let center = face.iter().sum::<Vector3<f32>>() / 5.0;
            let u = (face[0] - center).normalize();
            let w = n.cross(&u);
            let angle = |c: &Vector3<f32>| {
                let d = c - center;
                d.dot(&w).atan2(d.dot(&u))
            };
            face.sort_by(|a, b| angle(a).total_cmp(&angle(b)));

            let base = positions.len() as u32;
            for c in &face {
                positions.push([c.x * scale, c.y * scale, c.z * scale]);
                normals.push([n.x, n.y, n.z]);
            }
            for i in 1..4 {
                indices.extend_from_slice(&[base, base + i, base + i + 1]);
            }
        }

        Self::new(positions, normals, indices)
    }

    /// Tube swept along a (p, q) torus knot.
    pub fn torus_knot(radius: f32, tube: f32, tubular_segments: u32, radial_segments: u32, p: u32, q: u32) -> Self {
        let curve = |u: f32| {
            let qu_over_p = q as f32 / p as f32 * u;
            let cs = qu_over_p.cos();
            Vector3::new(
                radius * (2.0 + cs) * 0.5 * u.cos(),
                radius * (2.0 + cs) * 0.5 * u.sin(),
                radius * qu_over_p.sin() * 0.5,
            )
        };

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * p as f32 * TAU;
            let p1 = curve(u);
            let p2 = curve(u + 0.01);

            let t = p2 - p1;
            let n = p2 + p1;
            let b = t.cross(&n).normalize();
            let n = b.cross(&t).normalize();

            for j in 0..=radial_segments {
                let v = j as f32 / radial_segments as f32 * TAU;
                let cx = -tube * v.cos();
                let cy = tube * v.sin();
                let vertex = p1 + n * cx + b * cy;
                let normal = (vertex - p1).normalize();
                positions.push([vertex.x, vertex.y, vertex.z]);
                normals.push([normal.x, normal.y, normal.z]);
            }
        }

        let row = radial_segments + 1;
        let mut indices = Vec::with_capacity((tubular_segments * radial_segments * 6) as usize);
        for j in 1..=tubular_segments {
            for i in 1..=radial_segments {
                let a = row * (j - 1) + (i - 1);
                let b = row * j + (i - 1);
                let c = row * j + i;
                let d = row * (j - 1) + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self::new(positions, normals, indices)
    }
}

/// Area-weighted vertex normals for meshes that ship without them.
pub fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vector3::<f32>::zeros(); positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let pa = Vector3::from(positions[a]);
        let face = (Vector3::from(positions[b]) - pa).cross(&(Vector3::from(positions[c]) - pa));
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter()
        .map(|n| {
            let n = n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::y);
            [n.x, n.y, n.z]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> Geometry {
        Geometry::new(
            vec![[1.0, 1.0, 0.0], [3.0, 1.0, 0.0], [3.0, 5.0, 0.0], [1.0, 5.0, 0.0]],
            Vec::new(),
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn missing_normals_are_computed_from_faces() {
        let g = quad();
        assert_eq!(g.normals().len(), 4);
        for n in g.normals() {
            assert_relative_eq!(n[2], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn centered_moves_bounds_to_origin() {
        let g = quad().centered();
        let b = g.bounds().unwrap();
        assert_relative_eq!(b.center().norm(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(b.size().x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(b.size().y, 4.0, epsilon = 1e-6);
    }

    #[test]
    fn transformed_geometry_gets_a_new_id() {
        let g = quad();
        let moved = g.transformed(&Matrix4::new_translation(&Vector3::new(0.0, 0.0, 2.0)));
        assert_ne!(g.id(), moved.id());
        assert_relative_eq!(moved.positions()[0][2], 2.0);
        assert_eq!(moved.indices(), g.indices());
    }

    #[test]
    fn merge_offsets_indices() {
        let merged = Geometry::merge(&[quad(), quad()]);
        assert_eq!(merged.positions().len(), 8);
        assert_eq!(merged.triangle_count(), 4);
        assert_eq!(&merged.indices()[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn torus_knot_has_expected_topology() {
        let g = Geometry::torus_knot(1.0, 0.2, 8, 33, 2, 3);
        assert_eq!(g.positions().len(), 9 * 34);
        assert_eq!(g.indices().len(), 8 * 33 * 6);
        assert!(g.indices().iter().all(|&i| (i as usize) < g.positions().len()));
        for n in g.normals() {
            assert_relative_eq!(Vector3::from(*n).norm(), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn dodecahedron_has_twelve_outward_pentagons() {
        let g = Geometry::dodecahedron(1.0);
        assert_eq!(g.positions().len(), 60);
        assert_eq!(g.triangle_count(), 36);
        for p in g.positions() {
            assert_relative_eq!(Vector3::from(*p).norm(), 1.0, epsilon = 1e-5);
        }
        for tri in g.indices().chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| Vector3::from(g.positions()[tri[k] as usize]));
            let winding = (b - a).cross(&(c - a));
            let n = Vector3::from(g.normals()[tri[0] as usize]);
            assert!(winding.dot(&n) > 0.0);
            assert!(n.dot(&a) > 0.0);
        }
    }

    #[test]
    fn empty_geometry_has_no_bounds() {
        let g = Geometry::new(Vec::new(), Vec::new(), Vec::new());
        assert!(g.is_empty());
        assert!(g.bounds().is_none());
    }
}
