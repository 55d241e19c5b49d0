//! Loaded OBJ model.
//!
//! Minimal Wavefront OBJ support: `v`, `vn`, `f` (including `v//n` and
//! negative indices) and `usemtl` grouping. Faces are fan-triangulated and
//! expanded to flat vertex streams; flat normals are computed when the file
//! carries none. Material names map onto a small built-in color palette.

use std::path::PathBuf;

use anyhow::{Context, bail};
use glam::{Quat, Vec3};

use orrery_engine::scene::{Color, Geometry, Light, Material, Node, NodeId};
use orrery_engine::session::{FrameCtx, SceneCtx, Visualization};

use crate::assets;

const PALETTE: [(&str, u32); 4] = [
    ("trunk", 0x8b5a2b),
    ("leaves", 0x2e8b57),
    ("stone", 0x9a9a9a),
    ("water", 0x3070c0),
];
const FALLBACK_COLOR: u32 = 0xcccccc;

pub struct Model {
    path: PathBuf,
    root: Option<NodeId>,
    time: f32,
}

impl Model {
    pub fn new() -> Self {
        Self::from_path(assets::asset_path("tree.obj"))
    }

    pub fn from_path(path: PathBuf) -> Self {
        Self {
            path,
            root: None,
            time: 0.0,
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for Model {
    fn on_ready(&mut self, ctx: &mut SceneCtx<'_>) -> anyhow::Result<()> {
        ctx.scene.set_background(Some(Color::hex(0x202028)));
        ctx.camera.set_position(Vec3::new(5.0, 5.0, 8.0));
        ctx.camera.look_at(Vec3::new(0.0, 2.0, 0.0));

        ctx.scene.add_to_root(Node::light(Light::directional_from(
            Vec3::new(5.0, 10.0, 7.0),
            Color::WHITE,
            0.9,
        )));
        ctx.scene
            .add_to_root(Node::light(Light::ambient(Color::WHITE, 0.35)));

        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read model {}", self.path.display()))?;
        let groups = parse_obj(&text)
            .with_context(|| format!("failed to parse model {}", self.path.display()))?;

        let root = ctx.scene.add_to_root(Node::group());
        for group in groups {
            let color = material_color(group.material.as_deref());
            ctx.scene.add(
                root,
                Node::mesh(group.into_geometry(), Material::lambert(color)),
            );
        }
        self.root = Some(root);
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
        self.time += ctx.time.dt;
        if let Some(root) = self.root {
            ctx.scene.node_mut(root).transform.rotation =
                Quat::from_rotation_y(self.time * 0.3);
        }
        Ok(())
    }
}

fn material_color(name: Option<&str>) -> Color {
    let hex = name
        .and_then(|n| PALETTE.iter().find(|(key, _)| *key == n))
        .map(|(_, hex)| *hex)
        .unwrap_or(FALLBACK_COLOR);
    Color::hex(hex)
}

/// One `usemtl` run of faces, expanded to flat (non-indexed) streams.
struct ObjGroup {
    material: Option<String>,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
}

impl ObjGroup {
    fn new(material: Option<String>) -> Self {
        Self {
            material,
            positions: Vec::new(),
            normals: Vec::new(),
        }
    }

    fn into_geometry(self) -> Geometry {
        let indices = (0..self.positions.len() as u32).collect();
        Geometry::new(
            self.positions,
            self.normals,
            indices,
            orrery_engine::scene::Topology::Triangles,
        )
    }
}

fn parse_obj(text: &str) -> anyhow::Result<Vec<ObjGroup>> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut groups: Vec<ObjGroup> = Vec::new();

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => positions.push(parse_vec3(&mut fields, line_no)?),
            Some("vn") => normals.push(parse_vec3(&mut fields, line_no)?),
            Some("usemtl") => {
                let name = fields.next().map(str::to_owned);
                groups.push(ObjGroup::new(name));
            }
            Some("f") => {
                let corners: Vec<(usize, Option<usize>)> = fields
                    .map(|field| parse_face_corner(field, positions.len(), normals.len(), line_no))
                    .collect::<anyhow::Result<_>>()?;
                if corners.len() < 3 {
                    bail!("line {}: face with fewer than 3 vertices", line_no + 1);
                }
                if groups.is_empty() {
                    groups.push(ObjGroup::new(None));
                }
                let group = groups.last_mut().expect("group pushed above");
                for i in 1..corners.len() - 1 {
                    let tri = [corners[0], corners[i], corners[i + 1]];
                    let flat = face_normal(&positions, tri[0].0, tri[1].0, tri[2].0);
                    for (pi, ni) in tri {
                        group.positions.push(positions[pi].to_array());
                        let normal = ni.map(|n| normals[n]).unwrap_or(flat);
                        group.normals.push(normal.to_array());
                    }
                }
            }
            // Comments, object/group names, smoothing and material libs are
            // irrelevant to this renderer.
            _ => {}
        }
    }
    Ok(groups.into_iter().filter(|g| !g.positions.is_empty()).collect())
}

fn parse_vec3(
    fields: &mut std::str::SplitWhitespace<'_>,
    line_no: usize,
) -> anyhow::Result<Vec3> {
    let mut out = [0.0f32; 3];
    for v in &mut out {
        let field = fields
            .next()
            .with_context(|| format!("line {}: expected 3 components", line_no + 1))?;
        *v = field
            .parse()
            .with_context(|| format!("line {}: bad number {field:?}", line_no + 1))?;
    }
    Ok(Vec3::from_array(out))
}

/// Parses `v`, `v/t`, `v//n` or `v/t/n`, returning zero-based position and
/// normal indices. Negative indices count back from the current list end.
fn parse_face_corner(
    field: &str,
    position_count: usize,
    normal_count: usize,
    line_no: usize,
) -> anyhow::Result<(usize, Option<usize>)> {
    let mut parts = field.split('/');
    let position = resolve_index(parts.next().unwrap_or(""), position_count, line_no)?;
    let _texcoord = parts.next();
    let normal = match parts.next() {
        Some(raw) if !raw.is_empty() => Some(resolve_index(raw, normal_count, line_no)?),
        _ => None,
    };
    Ok((position, normal))
}

fn resolve_index(raw: &str, count: usize, line_no: usize) -> anyhow::Result<usize> {
    let value: i64 = raw
        .parse()
        .with_context(|| format!("line {}: bad index {raw:?}", line_no + 1))?;
    let resolved = if value < 0 {
        count as i64 + value
    } else {
        value - 1
    };
    if resolved < 0 || resolved >= count as i64 {
        bail!("line {}: index {value} out of range (have {count})", line_no + 1);
    }
    Ok(resolved as usize)
}

fn face_normal(positions: &[Vec3], a: usize, b: usize, c: usize) -> Vec3 {
    (positions[b] - positions[a])
        .cross(positions[c] - positions[a])
        .normalize_or(Vec3::Y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# a single flat quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
usemtl trunk
f 1 2 3 4
";

    #[test]
    fn quad_is_fan_triangulated_with_flat_normals() {
        let groups = parse_obj(QUAD).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].material.as_deref(), Some("trunk"));
        assert_eq!(groups[0].positions.len(), 6);
        for n in &groups[0].normals {
            assert_eq!(*n, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn explicit_normals_and_negative_indices_resolve() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
f -3//1 -2//1 -1//1
";
        let groups = parse_obj(src).unwrap();
        assert_eq!(groups[0].positions.len(), 3);
        assert_eq!(groups[0].normals[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        assert!(parse_obj("v 0 0 0\nf 1 2 3\n").is_err());
    }

    #[test]
    fn usemtl_starts_a_new_group() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
usemtl trunk
f 1 2 3
usemtl leaves
f 1 2 3
";
        let groups = parse_obj(src).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].material.as_deref(), Some("leaves"));
    }

    #[test]
    fn bundled_tree_parses() {
        let text = std::fs::read_to_string(assets::asset_path("tree.obj")).unwrap();
        let groups = parse_obj(&text).unwrap();
        assert!(groups.len() >= 2);
        assert!(groups.iter().all(|g| g.positions.len() % 3 == 0));
    }
}
