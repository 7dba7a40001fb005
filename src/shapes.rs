//! Parametric shapes that seed the catalog.

use crate::catalog::CatalogEntry;
use crate::geometry::Geometry;
use crate::scene::Model;
use csgrs::{mesh::Mesh, sketch::Sketch};
use nalgebra::{Matrix4, Vector3};
use std::f32::consts::FRAC_PI_2;

/// Thickness given to flat sketches so they render from both sides.
const SHEET: f64 = 0.02;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    Box, Cone, Capsule, Circle, Cylinder, Dodecahedron, Icosahedron, Octahedron,
    Plane, Ring, Sphere, Tetrahedron, Torus, TorusKnot,
}

impl Shape {
    pub const ALL: [Shape; 14] = [
        Shape::Box, Shape::Cone, Shape::Capsule, Shape::Circle, Shape::Cylinder,
        Shape::Dodecahedron, Shape::Icosahedron, Shape::Octahedron, Shape::Plane, Shape::Ring,
        Shape::Sphere, Shape::Tetrahedron, Shape::Torus, Shape::TorusKnot,
    ];

    pub fn name(&self) -> &'static str {
        use Shape::*;
        match self {
            Box => "BoxGeometry", Cone => "ConeGeometry", Capsule => "CapsuleGeometry",
            Circle => "CircleGeometry", Cylinder => "CylinderGeometry",
            Dodecahedron => "DodecahedronGeometry",
            Icosahedron => "IcosahedronGeometry", Octahedron => "OctahedronGeometry",
            Plane => "PlaneGeometry", Ring => "RingGeometry", Sphere => "SphereGeometry",
            Tetrahedron => "TetrahedronGeometry", Torus => "TorusGeometry",
            TorusKnot => "TorusKnotGeometry",
        }
    }

    /// Builds the shape centered on the origin with +Y up.
    pub fn build(&self) -> Geometry {
        use Shape::*;
        let geometry = match self {
            Box => Geometry::from_csg(&Mesh::cube(2.0, None)),
            Cone => z_up(Geometry::from_csg(&Mesh::frustum(2.0, 0.0, 2.0, 16, None))),
            Capsule => {
                // cylinder capped by two spheres, radius 1, straight length 1
                let body = Geometry::from_csg(&Mesh::cylinder(1.0, 1.0, 8, None));
                let cap = Mesh::sphere(1.0, 8, 4, None);
                let bottom = Geometry::from_csg(&cap);
                let top = bottom.transformed(&Matrix4::new_translation(&Vector3::new(0.0, 0.0, 1.0)));
                z_up(Geometry::merge(&[body, bottom, top]))
            }
            Circle => Geometry::from_csg(&Sketch::circle(1.0, 32, None).extrude(SHEET)),
            Cylinder => z_up(Geometry::from_csg(&Mesh::cylinder(2.0, 1.0, 32, None))),
            Dodecahedron => Geometry::dodecahedron(1.0),
            Icosahedron => Geometry::from_csg(&Mesh::icosahedron(1.0, None)),
            Octahedron => Geometry::from_csg(&Mesh::octahedron(1.0, None)),
            Plane => Geometry::from_csg(&Sketch::square(1.0, None).extrude(SHEET)),
            // inner radius 1, outer radius 1.5
            Ring => Geometry::from_csg(&Sketch::ring(2.0, 0.5, 32, None).extrude(SHEET)),
            Sphere => Geometry::from_csg(&Mesh::sphere(1.0, 16, 32, None)),
            // regular tetrahedron with circumradius 1
            Tetrahedron => z_up(Geometry::from_csg(&Mesh::frustum(
                (8.0f64 / 9.0).sqrt(),
                0.0,
                4.0 / 3.0,
                3,
                None,
            ))),
            Torus => Geometry::from_csg(&Mesh::torus(1.0, 0.2, 33, 8, None)),
            TorusKnot => Geometry::torus_knot(1.0, 0.2, 8, 33, 2, 3),
        };
        geometry.centered()
    }
}

/// csgrs extrudes along +Z; the viewer looks down -Z with +Y up.
fn z_up(geometry: Geometry) -> Geometry {
    geometry.transformed(&Matrix4::new_rotation(Vector3::x() * -FRAC_PI_2))
}

/// One catalog entry per built-in shape, in display order.
pub fn builtin_catalog() -> Vec<CatalogEntry> {
    Shape::ALL
        .iter()
        .map(|shape| CatalogEntry::new(shape.name(), Model::from_geometry(shape.build())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn names_are_distinct_and_ordered() {
        let names: Vec<_> = Shape::ALL.iter().map(Shape::name).collect();
        assert_eq!(names.first(), Some(&"BoxGeometry"));
        assert_eq!(names.last(), Some(&"TorusKnotGeometry"));
        let mut dedup = names.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), names.len());
    }

    #[test]
    fn every_shape_builds_centered_triangles() {
        for shape in Shape::ALL {
            let g = shape.build();
            assert!(!g.is_empty(), "{} is empty", shape.name());
            let b = g.bounds().unwrap();
            assert_relative_eq!(b.center().norm(), 0.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn cylinder_stands_upright() {
        let b = Shape::Cylinder.build().bounds().unwrap();
        assert_relative_eq!(b.size().y, 1.0, epsilon = 1e-3);
        assert_relative_eq!(b.size().x, 4.0, epsilon = 1e-3);
    }

    #[test]
    fn catalog_has_one_entry_per_shape() {
        let entries = builtin_catalog();
        assert_eq!(entries.len(), Shape::ALL.len());
        assert_eq!(entries[3].name(), "CircleGeometry");
        assert_eq!(entries[5].name(), "DodecahedronGeometry");
        assert_eq!(entries[6].name(), "IcosahedronGeometry");
    }
}
