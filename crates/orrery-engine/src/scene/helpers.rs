use glam::Vec3;

use super::{Color, Geometry, Material, Node, NodeId, Scene};

/// Adds a coordinate-axes visual aid under `parent`: line segments of
/// `size` units along +X (red), +Y (green) and +Z (blue).
///
/// Returns the group node holding the three axis lines.
pub fn add_axes_helper(scene: &mut Scene, parent: NodeId, size: f32) -> NodeId {
    let group = scene.add(parent, Node::group());
    let axes = [
        (Vec3::X, Color::hex(0xff0000)),
        (Vec3::Y, Color::hex(0x00ff00)),
        (Vec3::Z, Color::hex(0x0000ff)),
    ];
    for (axis, color) in axes {
        let geometry = Geometry::polyline(&[Vec3::ZERO, axis * size]);
        scene.add(group, Node::mesh(geometry, Material::unlit(color)));
    }
    group
}
