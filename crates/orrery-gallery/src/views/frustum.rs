//! Camera-frustum inspection.
//!
//! A lit cube observed from far away, plus a second "debug" perspective
//! camera whose view frustum is drawn as a line box. The debug camera's
//! field of view breathes over time and the helper lines are rebuilt from
//! its inverse view-projection each frame.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3, Vec4, Vec4Swizzles};

use orrery_engine::camera::PerspectiveCamera;
use orrery_engine::scene::{Color, Geometry, Light, Material, Node, NodeId};
use orrery_engine::session::{FrameCtx, SceneCtx, Visualization};

/// Frustum corners in clip space; near plane at depth 0, far at 1.
const CORNERS: [[f32; 3]; 8] = [
    [-1.0, -1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
];

/// Near loop, far loop, and the four connecting edges.
const EDGES: [u32; 24] = [
    0, 1, 1, 3, 3, 2, 2, 0, //
    4, 5, 5, 7, 7, 6, 6, 4, //
    0, 4, 1, 5, 2, 6, 3, 7,
];

pub struct Frustum {
    debug_camera: PerspectiveCamera,
    helper: Option<NodeId>,
    time: f32,
}

impl Frustum {
    pub fn new() -> Self {
        let mut debug_camera = PerspectiveCamera::with_params(20.0, 16.0 / 9.0, 100.0, 300.0);
        debug_camera.set_position(Vec3::new(0.0, 0.0, 150.0));
        debug_camera.look_at(Vec3::ZERO);
        Self {
            debug_camera,
            helper: None,
            time: 0.0,
        }
    }

    fn corner_positions(&self) -> Vec<[f32; 3]> {
        let inverse = self.debug_camera.view_projection().inverse();
        CORNERS
            .iter()
            .map(|c| {
                let clip = inverse * Vec4::new(c[0], c[1], c[2], 1.0);
                (clip.xyz() / clip.w).to_array()
            })
            .collect()
    }
}

impl Default for Frustum {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for Frustum {
    fn on_ready(&mut self, ctx: &mut SceneCtx<'_>) -> anyhow::Result<()> {
        ctx.scene.set_background(Some(Color::hex(0x000000)));
        ctx.camera.set_position(Vec3::new(0.0, 1.0, 800.0));
        ctx.camera.look_at(Vec3::ZERO);

        // Turn the whole scene sideways so the frustum is seen from abeam.
        let root = ctx.scene.root();
        ctx.scene.node_mut(root).transform.rotation = Quat::from_rotation_y(-FRAC_PI_2);

        ctx.scene
            .add_to_root(Node::light(Light::ambient(Color::WHITE, 0.5)));
        ctx.scene.add_to_root(Node::mesh(
            Geometry::cuboid(1.0, 1.0, 1.0),
            Material::lambert(Color::hex(0xffa500)),
        ));

        let helper = ctx.scene.add_to_root(Node::mesh(
            Geometry::line_segments(self.corner_positions(), EDGES.to_vec()),
            Material::unlit(Color::WHITE),
        ));
        self.helper = Some(helper);
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
        self.time += ctx.time.dt;
        self.debug_camera
            .set_fov_deg(20.0 + 10.0 * (self.time * 0.5).sin());

        let corners = self.corner_positions();
        let Some(mesh) = self.helper.and_then(|id| ctx.scene.mesh_mut(id)) else {
            return Ok(());
        };
        mesh.geometry.positions = corners;
        mesh.geometry.mark_dirty();
        Ok(())
    }
}
