//! Static geometry and the layout of the demo scene.

use std::sync::Arc;

use glam::Vec3;

use crate::device::GraphicsDevice;
use crate::mesh::Mesh;
use crate::scene::{Scene, ShaderId, Transform};

/// Four corners of a tetrahedron, as `x, y, z` triples.
#[rustfmt::skip]
pub const TETRAHEDRON_VERTICES: [f32; 12] = [
    -1.0, -1.0, 0.0,
     0.0, -1.0, 1.0,
     1.0, -1.0, 0.0,
     0.0,  1.0, 0.0,
];

/// The four triangular faces of [`TETRAHEDRON_VERTICES`].
#[rustfmt::skip]
pub const TETRAHEDRON_INDICES: [u32; 12] = [
    0, 3, 1,
    1, 3, 2,
    2, 3, 0,
    0, 1, 2,
];

/// Placements of the two demo tetrahedra, in draw order.
pub fn demo_transforms() -> [Transform; 2] {
    [
        Transform::new(Vec3::new(0.0, 0.0, -2.5), Vec3::new(0.4, 0.4, 1.0)),
        Transform::new(Vec3::new(0.0, 1.0, -2.5), Vec3::new(0.4, 0.4, 1.0)),
    ]
}

/// Adds one tetrahedron mesh per demo placement, all drawn with `shader`.
pub fn build_demo_scene<D: GraphicsDevice>(
    gl: &Arc<D>,
    scene: &mut Scene<D>,
    shader: ShaderId,
) -> Result<(), String> {
    for transform in demo_transforms() {
        let mesh = Mesh::with_data(gl, &TETRAHEDRON_VERTICES, &TETRAHEDRON_INDICES)?;
        let mesh = scene.add_mesh(mesh);
        scene.add_object(mesh, shader, transform);
    }
    Ok(())
}
