//! Line-material study.
//!
//! The edges of a large cube drawn as a dashed orange line list. Dashing is
//! baked into the geometry: each edge is chopped into alternating on/off
//! runs of fixed length, so the stock line pipeline renders it unchanged.

use glam::Vec3;

use orrery_engine::scene::{Color, Geometry, Material, Node};
use orrery_engine::session::{FrameCtx, SceneCtx, Visualization};

const CUBE_SIZE: f32 = 100.0;
const DASH_SIZE: f32 = 10.0;
const GAP_SIZE: f32 = 10.0;

/// Corner pairs forming the 12 edges of a cube.
const EDGE_CORNERS: [(usize, usize); 12] = [
    (0, 1),
    (1, 3),
    (3, 2),
    (2, 0),
    (4, 5),
    (5, 7),
    (7, 6),
    (6, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

fn cube_corners(size: f32) -> [Vec3; 8] {
    let h = size / 2.0;
    [
        Vec3::new(-h, -h, -h),
        Vec3::new(h, -h, -h),
        Vec3::new(-h, h, -h),
        Vec3::new(h, h, -h),
        Vec3::new(-h, -h, h),
        Vec3::new(h, -h, h),
        Vec3::new(-h, h, h),
        Vec3::new(h, h, h),
    ]
}

/// Cube edges split into dash runs of `dash` length separated by `gap`.
fn dashed_cube_edges(size: f32, dash: f32, gap: f32) -> Geometry {
    let corners = cube_corners(size);
    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for (a, b) in EDGE_CORNERS {
        let start = corners[a];
        let dir = (corners[b] - start).normalize();
        let len = (corners[b] - start).length();
        let mut s = 0.0;
        while s < len {
            let e = (s + dash).min(len);
            let base = positions.len() as u32;
            positions.push((start + dir * s).to_array());
            positions.push((start + dir * e).to_array());
            indices.extend_from_slice(&[base, base + 1]);
            s += dash + gap;
        }
    }
    Geometry::line_segments(positions, indices)
}

pub struct MaterialStudy;

impl MaterialStudy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MaterialStudy {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for MaterialStudy {
    fn on_ready(&mut self, ctx: &mut SceneCtx<'_>) -> anyhow::Result<()> {
        ctx.scene.set_background(Some(Color::hex(0x000000)));
        ctx.camera.set_position(Vec3::new(100.0, 100.0, 100.0));
        ctx.camera.look_at(Vec3::ZERO);

        ctx.scene.add_to_root(Node::mesh(
            dashed_cube_edges(CUBE_SIZE, DASH_SIZE, GAP_SIZE),
            Material::unlit(Color::hex(0xffa500)),
        ));
        Ok(())
    }

    fn on_render(&mut self, _ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_runs_cover_every_edge() {
        // 100-long edges with 10/10 dashing carry five dashes each.
        let g = dashed_cube_edges(100.0, 10.0, 10.0);
        assert_eq!(g.positions.len(), 12 * 5 * 2);
        assert_eq!(g.indices.len(), g.positions.len());
        for pair in g.positions.chunks_exact(2) {
            let a = Vec3::from_array(pair[0]);
            let b = Vec3::from_array(pair[1]);
            assert!((a.distance(b) - 10.0).abs() < 1e-4);
        }
    }

    #[test]
    fn dash_endpoints_stay_on_the_cube() {
        let g = dashed_cube_edges(100.0, 10.0, 10.0);
        for p in &g.positions {
            let on_face = p.iter().filter(|c| (c.abs() - 50.0).abs() < 1e-4).count();
            // Every edge point sits on two faces of the cube.
            assert!(on_face >= 2, "point {p:?} is off the cube edges");
        }
    }

    #[test]
    fn short_final_dash_is_clamped_to_the_edge() {
        // 90-long edges with 20/20 dashing end on a 10-long remainder dash.
        let g = dashed_cube_edges(90.0, 20.0, 20.0);
        let mut short = 0;
        for pair in g.positions.chunks_exact(2) {
            let a = Vec3::from_array(pair[0]);
            let b = Vec3::from_array(pair[1]);
            let len = a.distance(b);
            if (len - 10.0).abs() < 1e-4 {
                // The remainder dash terminates exactly on a cube corner.
                assert!(pair[1].iter().all(|c| (c.abs() - 45.0).abs() < 1e-4));
                short += 1;
            } else {
                assert!((len - 20.0).abs() < 1e-4);
            }
        }
        assert_eq!(short, 12);
    }
}
