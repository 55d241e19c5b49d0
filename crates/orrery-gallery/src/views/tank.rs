//! Animated tank.
//!
//! A hierarchical vehicle (body, six wheels, dome, turret on a pivot)
//! driving a closed spline path with look-ahead heading, while the turret
//! tracks a bobbing target whose color cycles through the hue wheel.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec2, Vec3};

use orrery_engine::scene::{Color, Geometry, Light, Material, Node, NodeId};
use orrery_engine::session::{FrameCtx, SceneCtx, Visualization};

use crate::curve::SplineCurve;

const BODY_WIDTH: f32 = 4.0;
const BODY_HEIGHT: f32 = 1.0;
const BODY_LENGTH: f32 = 8.0;
const WHEEL_RADIUS: f32 = 1.0;
const WHEEL_THICKNESS: f32 = 0.5;
const HULL_COLOR: u32 = 0x6688aa;

pub struct Tank {
    path: SplineCurve,
    tank: Option<NodeId>,
    turret_pivot: Option<NodeId>,
    target_bob: Option<NodeId>,
    target_mesh: Option<NodeId>,
    time: f32,
}

impl Tank {
    pub fn new() -> Self {
        let path = SplineCurve::new(vec![
            Vec2::new(-10.0, 20.0),
            Vec2::new(-5.0, 5.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, -5.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, 10.0),
            Vec2::new(-5.0, 10.0),
            Vec2::new(-10.0, -10.0),
            Vec2::new(-15.0, -8.0),
            Vec2::new(-10.0, 20.0),
        ]);
        Self {
            path,
            tank: None,
            turret_pivot: None,
            target_bob: None,
            target_mesh: None,
            time: 0.0,
        }
    }
}

impl Default for Tank {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for Tank {
    fn on_ready(&mut self, ctx: &mut SceneCtx<'_>) -> anyhow::Result<()> {
        ctx.camera.set_position(Vec3::splat(50.0));
        ctx.scene.set_background(Some(Color::hex(0x000000)));

        ctx.scene.add_to_root(Node::light(Light::directional_from(
            Vec3::new(0.0, 20.0, 0.0),
            Color::WHITE,
            1.0,
        )));
        ctx.scene.add_to_root(Node::light(Light::directional_from(
            Vec3::new(1.0, 2.0, 4.0),
            Color::WHITE,
            1.0,
        )));

        let scene = &mut *ctx.scene;
        let tank = scene.add_to_root(Node::group());
        self.tank = Some(tank);

        let body = scene.add(
            tank,
            Node::mesh(
                Geometry::cuboid(BODY_WIDTH, BODY_HEIGHT, BODY_LENGTH),
                Material::lambert(Color::hex(HULL_COLOR)),
            )
            .at(Vec3::new(0.0, 1.4, 0.0)),
        );

        let wheel_x = BODY_WIDTH / 2.0 + WHEEL_THICKNESS / 2.0;
        let wheel_y = -BODY_HEIGHT / 2.0;
        for z in [BODY_LENGTH / 3.0, 0.0, -BODY_LENGTH / 3.0] {
            for x in [-wheel_x, wheel_x] {
                scene.add(
                    body,
                    Node::mesh(
                        Geometry::cylinder(WHEEL_RADIUS, WHEEL_RADIUS, WHEEL_THICKNESS, 36),
                        Material::lambert(Color::hex(0x888888)),
                    )
                    .at(Vec3::new(x, wheel_y, z))
                    .rotated(Quat::from_rotation_z(FRAC_PI_2)),
                );
            }
        }

        scene.add(
            body,
            Node::mesh(
                Geometry::hemisphere(2.0, 12, 12),
                Material::lambert(Color::hex(HULL_COLOR)),
            )
            .at(Vec3::new(0.0, 0.5, 0.0)),
        );

        let turret_pivot = scene.add(body, Node::group().at(Vec3::new(0.0, 1.5, 0.0)));
        scene.add(
            turret_pivot,
            Node::mesh(
                Geometry::cylinder(0.5, 0.5, 5.0, 32),
                Material::lambert(Color::hex(HULL_COLOR)),
            )
            .at(Vec3::new(0.0, 0.0, 2.5))
            .rotated(Quat::from_rotation_x(FRAC_PI_2)),
        );
        self.turret_pivot = Some(turret_pivot);

        let target_elevation = scene.add_to_root(
            Node::group().at(Vec3::new(0.0, 8.0, BODY_LENGTH * 2.0)),
        );
        let target_bob = scene.add(target_elevation, Node::group());
        let target_mesh = scene.add(
            target_bob,
            Node::mesh(
                Geometry::sphere(0.5, 36, 36),
                Material::lambert(Color::hex(0x00ff00)),
            ),
        );
        self.target_bob = Some(target_bob);
        self.target_mesh = Some(target_mesh);

        // Path line laid flat just above the ground.
        let line: Vec<Vec3> = self
            .path
            .points(50)
            .into_iter()
            .map(|p| Vec3::new(p.x, p.y, 0.0))
            .collect();
        scene.add_to_root(
            Node::mesh(
                Geometry::polyline(&line),
                Material::unlit(Color::hex(0xff0000)),
            )
            .at(Vec3::new(0.0, 0.05, 0.0))
            .rotated(Quat::from_rotation_x(FRAC_PI_2)),
        );

        Ok(())
    }

    fn on_render(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
        self.time += ctx.time.dt;
        let (Some(tank), Some(turret_pivot), Some(target_bob), Some(target_mesh)) =
            (self.tank, self.turret_pivot, self.target_bob, self.target_mesh)
        else {
            return Ok(());
        };
        let scene = &mut *ctx.scene;

        scene.node_mut(target_bob).transform.translation.y = (self.time * 2.0).sin() * 4.0;

        let hue = (self.time * 10.0).fract();
        let flash = Color::from_hsl(hue, 1.0, 0.25);
        if let Some(mesh) = scene.mesh_mut(target_mesh) {
            if let Some(material) = mesh.materials.iter_mut().next() {
                material.color = flash;
                material.emissive = flash;
            }
        }

        let aim = scene.world_position(target_mesh);
        scene.look_at(turret_pivot, aim);

        let tank_time = self.time * 0.05;
        let here = self.path.point_at(tank_time.fract());
        let ahead = self.path.point_at((tank_time + 0.01).fract());
        scene.node_mut(tank).transform.translation = Vec3::new(here.x, 0.0, here.y);
        scene.look_at(tank, Vec3::new(ahead.x, 0.0, ahead.y));
        Ok(())
    }
}
