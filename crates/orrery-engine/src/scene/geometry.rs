use std::f32::consts::{PI, TAU};
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a geometry buffer, used by renderers to key GPU caches.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GeometryId(u64);

/// Primitive topology of a geometry's index list.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Topology {
    Triangles,
    Lines,
}

/// CPU-side geometry buffer.
///
/// GPU copies are cached by the drawing surface keyed on [`GeometryId`];
/// mutating vertex data must be followed by [`Geometry::mark_dirty`] so the
/// next draw re-uploads it. Release is explicit via [`Geometry::dispose`].
#[derive(Debug, Clone)]
pub struct Geometry {
    id: GeometryId,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub topology: Topology,
    dirty: bool,
    disposed: bool,
}

impl Geometry {
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        indices: Vec<u32>,
        topology: Topology,
    ) -> Self {
        debug_assert!(normals.is_empty() || normals.len() == positions.len());
        Self {
            id: GeometryId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            positions,
            normals,
            indices,
            topology,
            dirty: false,
            disposed: false,
        }
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Flags vertex data for re-upload on the next draw.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Releases the geometry buffer. Idempotent; disposed geometry is
    /// skipped by renderers.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.positions = Vec::new();
        self.normals = Vec::new();
        self.indices = Vec::new();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // ── generators ────────────────────────────────────────────────────────

    /// Axis-aligned box centered at the origin.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (x, y, z) = (width / 2.0, height / 2.0, depth / 2.0);
        // One quad per face so normals stay flat.
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([1.0, 0.0, 0.0], [[x, -y, -z], [x, y, -z], [x, y, z], [x, -y, z]]),
            ([-1.0, 0.0, 0.0], [[-x, -y, z], [-x, y, z], [-x, y, -z], [-x, -y, -z]]),
            ([0.0, 1.0, 0.0], [[-x, y, -z], [-x, y, z], [x, y, z], [x, y, -z]]),
            ([0.0, -1.0, 0.0], [[-x, -y, z], [-x, -y, -z], [x, -y, -z], [x, -y, z]]),
            ([0.0, 0.0, 1.0], [[-x, -y, z], [x, -y, z], [x, y, z], [-x, y, z]]),
            ([0.0, 0.0, -1.0], [[x, -y, -z], [-x, -y, -z], [-x, y, -z], [x, y, -z]]),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners) in faces {
            let base = positions.len() as u32;
            positions.extend_from_slice(&corners);
            normals.extend(std::iter::repeat_n(normal, 4));
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(positions, normals, indices, Topology::Triangles)
    }

    /// UV sphere centered at the origin.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self::sphere_section(radius, width_segments, height_segments, 0.0, PI)
    }

    /// Upper half of a UV sphere (flat rim on the XZ plane).
    pub fn hemisphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self::sphere_section(radius, width_segments, height_segments, 0.0, PI / 2.0)
    }

    fn sphere_section(
        radius: f32,
        width_segments: u32,
        height_segments: u32,
        theta_start: f32,
        theta_length: f32,
    ) -> Self {
        let ws = width_segments.max(3);
        let hs = height_segments.max(2);

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        for ih in 0..=hs {
            let theta = theta_start + theta_length * ih as f32 / hs as f32;
            for iw in 0..=ws {
                let phi = TAU * iw as f32 / ws as f32;
                let n = Vec3::new(
                    theta.sin() * phi.cos(),
                    theta.cos(),
                    theta.sin() * phi.sin(),
                );
                positions.push((n * radius).to_array());
                normals.push(n.to_array());
            }
        }

        let stride = ws + 1;
        let mut indices = Vec::new();
        for ih in 0..hs {
            for iw in 0..ws {
                let a = ih * stride + iw;
                let b = a + stride;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        Self::new(positions, normals, indices, Topology::Triangles)
    }

    /// Capped cylinder (or cone frustum) along the Y axis, centered at the
    /// origin.
    pub fn cylinder(
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
    ) -> Self {
        let segments = radial_segments.max(3);
        let half = height / 2.0;
        let slope = (radius_bottom - radius_top) / height;

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut indices = Vec::new();

        // Side rings: top then bottom, sharing angular samples.
        for (y, radius) in [(half, radius_top), (-half, radius_bottom)] {
            for i in 0..=segments {
                let phi = TAU * i as f32 / segments as f32;
                positions.push([radius * phi.cos(), y, radius * phi.sin()]);
                normals.push(Vec3::new(phi.cos(), slope, phi.sin()).normalize().to_array());
            }
        }
        let stride = segments + 1;
        for i in 0..segments {
            let a = i;
            let b = i + stride;
            indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }

        // Caps as triangle fans around a center vertex.
        for (y, radius, normal_y) in [(half, radius_top, 1.0), (-half, radius_bottom, -1.0)] {
            if radius <= 0.0 {
                continue;
            }
            let center = positions.len() as u32;
            positions.push([0.0, y, 0.0]);
            normals.push([0.0, normal_y, 0.0]);
            for i in 0..=segments {
                let phi = TAU * i as f32 / segments as f32;
                positions.push([radius * phi.cos(), y, radius * phi.sin()]);
                normals.push([0.0, normal_y, 0.0]);
            }
            for i in 0..segments {
                let a = center + 1 + i;
                if normal_y > 0.0 {
                    indices.extend_from_slice(&[center, a + 1, a]);
                } else {
                    indices.extend_from_slice(&[center, a, a + 1]);
                }
            }
        }
        Self::new(positions, normals, indices, Topology::Triangles)
    }

    /// Subdivided rectangle in the XY plane facing +Z, centered at the
    /// origin.
    pub fn plane(width: f32, height: f32, segments_x: u32, segments_y: u32) -> Self {
        let sx = segments_x.max(1);
        let sy = segments_y.max(1);

        let mut positions = Vec::with_capacity(((sx + 1) * (sy + 1)) as usize);
        let mut normals = Vec::with_capacity(positions.capacity());
        for iy in 0..=sy {
            let y = height * (iy as f32 / sy as f32 - 0.5);
            for ix in 0..=sx {
                let x = width * (ix as f32 / sx as f32 - 0.5);
                positions.push([x, y, 0.0]);
                normals.push([0.0, 0.0, 1.0]);
            }
        }

        let stride = sx + 1;
        let mut indices = Vec::with_capacity((sx * sy * 6) as usize);
        for iy in 0..sy {
            for ix in 0..sx {
                let a = iy * stride + ix;
                let b = a + stride;
                indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        Self::new(positions, normals, indices, Topology::Triangles)
    }

    /// Torus in the XY plane, centered at the origin.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let rs = radial_segments.max(3);
        let ts = tubular_segments.max(3);

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        for j in 0..=rs {
            let v = TAU * j as f32 / rs as f32;
            for i in 0..=ts {
                let u = TAU * i as f32 / ts as f32;
                let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
                let point = Vec3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                positions.push(point.to_array());
                normals.push((point - center).normalize().to_array());
            }
        }

        let stride = ts + 1;
        let mut indices = Vec::new();
        for j in 0..rs {
            for i in 0..ts {
                let a = j * stride + i;
                let b = a + stride;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        Self::new(positions, normals, indices, Topology::Triangles)
    }

    /// Connected line strip through `points`.
    pub fn polyline(points: &[Vec3]) -> Self {
        let positions: Vec<[f32; 3]> = points.iter().map(|p| p.to_array()).collect();
        let mut indices = Vec::new();
        for i in 1..positions.len() as u32 {
            indices.extend_from_slice(&[i - 1, i]);
        }
        Self::new(positions, Vec::new(), indices, Topology::Lines)
    }

    /// Arbitrary line segments from explicit endpoint pairs in `indices`.
    pub fn line_segments(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        debug_assert!(indices.len() % 2 == 0);
        Self::new(positions, Vec::new(), indices, Topology::Lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_has_flat_faces() {
        let g = Geometry::cuboid(2.0, 4.0, 6.0);
        assert_eq!(g.positions.len(), 24);
        assert_eq!(g.indices.len(), 36);
        assert_eq!(g.normals.len(), 24);
    }

    #[test]
    fn sphere_normals_are_unit_length() {
        let g = Geometry::sphere(3.0, 12, 8);
        for n in &g.normals {
            let len = Vec3::from_array(*n).length();
            assert!((len - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn plane_grid_counts() {
        let g = Geometry::plane(10.0, 10.0, 4, 3);
        assert_eq!(g.positions.len(), 5 * 4);
        assert_eq!(g.indices.len(), 4 * 3 * 6);
    }

    #[test]
    fn polyline_links_consecutive_points() {
        let g = Geometry::polyline(&[Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(g.topology, Topology::Lines);
        assert_eq!(g.indices, vec![0, 1, 1, 2]);
    }

    #[test]
    fn dispose_releases_buffers() {
        let mut g = Geometry::cuboid(1.0, 1.0, 1.0);
        g.dispose();
        assert!(g.is_disposed());
        assert!(g.positions.is_empty());
        assert!(g.indices.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(
            Geometry::cuboid(1.0, 1.0, 1.0).id(),
            Geometry::cuboid(1.0, 1.0, 1.0).id()
        );
    }
}
