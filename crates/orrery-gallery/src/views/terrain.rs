//! Procedural terrain.
//!
//! A 100x100-segment plane displaced by seeded value noise, drawn as a
//! wireframe and re-flowed every frame with a travelling sine wave. The
//! geometry is mutated in place and marked dirty so the surface re-uploads
//! it.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use orrery_engine::scene::{Color, Geometry, Material, Node, NodeId};
use orrery_engine::session::{FrameCtx, SceneCtx, Visualization};

const SIZE: f32 = 3000.0;
const SEGMENTS: u32 = 100;
const NOISE_SCALE: f32 = 300.0;
const HEIGHT: f32 = 50.0;

pub struct Terrain {
    noise: ValueNoise,
    mesh: Option<NodeId>,
    time: f32,
}

impl Terrain {
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            noise: ValueNoise::new(seed),
            mesh: None,
            time: 0.0,
        }
    }

    fn height_at(&self, x: f32, y: f32) -> f32 {
        self.noise.fbm(x / NOISE_SCALE, y / NOISE_SCALE) * HEIGHT
    }
}

impl Default for Terrain {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for Terrain {
    fn on_ready(&mut self, ctx: &mut SceneCtx<'_>) -> anyhow::Result<()> {
        ctx.scene.set_background(Some(Color::hex(0x000000)));
        ctx.camera.set_position(Vec3::splat(100.0));
        ctx.camera.look_at(Vec3::ZERO);

        let mut geometry = Geometry::plane(SIZE, SIZE, SEGMENTS, SEGMENTS);
        for p in &mut geometry.positions {
            p[2] = self.height_at(p[0], p[1]);
        }

        // Plane is built in the XY plane; lay it flat.
        let id = ctx.scene.add_to_root(
            Node::mesh(geometry, Material::wireframe(Color::hex(0x0085fe)))
                .rotated(Quat::from_rotation_x(-FRAC_PI_2)),
        );
        self.mesh = Some(id);
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
        self.time += ctx.time.dt;
        let Some(mesh) = self.mesh.and_then(|id| ctx.scene.mesh_mut(id)) else {
            return Ok(());
        };
        let base = self.time * 2.0;
        for p in &mut mesh.geometry.positions {
            let ripple = (base + p[0] * 0.05).sin() * 10.0;
            p[2] = self.noise.fbm(p[0] / NOISE_SCALE, p[1] / NOISE_SCALE) * HEIGHT + ripple;
        }
        mesh.geometry.mark_dirty();
        Ok(())
    }
}

/// Lattice value noise with a shuffled permutation table.
struct ValueNoise {
    perm: [u8; 512],
}

impl ValueNoise {
    fn new(seed: u64) -> Self {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut rng);

        let mut perm = [0u8; 512];
        for i in 0..512 {
            perm[i] = table[i & 255];
        }
        Self { perm }
    }

    /// Lattice value in [-1, 1].
    fn lattice(&self, x: i32, y: i32) -> f32 {
        let h = self.perm[(self.perm[(x & 255) as usize] as usize) + (y & 255) as usize];
        h as f32 / 127.5 - 1.0
    }

    /// Smoothly interpolated noise in [-1, 1].
    fn sample(&self, x: f32, y: f32) -> f32 {
        let xi = x.floor() as i32;
        let yi = y.floor() as i32;
        let tx = smoothstep(x - xi as f32);
        let ty = smoothstep(y - yi as f32);

        let a = self.lattice(xi, yi);
        let b = self.lattice(xi + 1, yi);
        let c = self.lattice(xi, yi + 1);
        let d = self.lattice(xi + 1, yi + 1);

        let top = a + (b - a) * tx;
        let bottom = c + (d - c) * tx;
        top + (bottom - top) * ty
    }

    /// Two-octave fractal sum, normalized back to [-1, 1].
    fn fbm(&self, x: f32, y: f32) -> f32 {
        (self.sample(x, y) + 0.5 * self.sample(x * 2.0, y * 2.0)) / 1.5
    }
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}
