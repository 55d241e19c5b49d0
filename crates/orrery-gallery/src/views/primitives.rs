//! Row of spinning geometry primitives under two directional lights.

use glam::{Quat, Vec3};

use orrery_engine::scene::{Color, Geometry, Light, Material, Node, NodeId};
use orrery_engine::session::{FrameCtx, SceneCtx, Visualization};

pub struct Primitives {
    spinners: Vec<NodeId>,
    time: f32,
}

impl Primitives {
    pub fn new() -> Self {
        Self {
            spinners: Vec::new(),
            time: 0.0,
        }
    }
}

impl Default for Primitives {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for Primitives {
    fn on_ready(&mut self, ctx: &mut SceneCtx<'_>) -> anyhow::Result<()> {
        ctx.scene.set_background(Some(Color::hex(0x000000)));
        ctx.camera.set_position(Vec3::new(0.0, 8.0, 24.0));
        ctx.camera.look_at(Vec3::ZERO);

        ctx.scene.add_to_root(Node::light(Light::directional_from(
            Vec3::new(0.0, 20.0, 10.0),
            Color::WHITE,
            1.0,
        )));
        ctx.scene.add_to_root(Node::light(Light::directional_from(
            Vec3::new(-10.0, 5.0, -10.0),
            Color::WHITE,
            0.4,
        )));

        let shapes: [(Geometry, u32); 5] = [
            (Geometry::cuboid(4.0, 4.0, 4.0), 0x6688aa),
            (Geometry::sphere(2.5, 24, 16), 0xaa6688),
            (Geometry::cylinder(1.5, 1.5, 4.0, 24), 0x88aa66),
            (Geometry::torus(2.0, 0.7, 16, 32), 0xaa8844),
            (Geometry::plane(4.0, 4.0, 1, 1), 0x44aa88),
        ];
        for (i, (geometry, color)) in shapes.into_iter().enumerate() {
            let x = (i as f32 - 2.0) * 8.0;
            let id = ctx.scene.add_to_root(
                Node::mesh(geometry, Material::lambert(Color::hex(color)))
                    .at(Vec3::new(x, 0.0, 0.0)),
            );
            self.spinners.push(id);
        }
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
        self.time += ctx.time.dt;
        for (i, id) in self.spinners.iter().enumerate() {
            // Stagger the spin phase so the row does not move in lockstep.
            let phase = self.time + i as f32 * 0.4;
            ctx.scene.node_mut(*id).transform.rotation =
                Quat::from_rotation_y(phase) * Quat::from_rotation_x(phase * 0.7);
        }
        Ok(())
    }
}
