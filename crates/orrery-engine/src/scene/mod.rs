//! Scene graph.
//!
//! Responsibilities:
//! - own all renderable content of one session in a single arena-backed tree
//! - provide world-transform queries and depth-first traversal
//! - make GPU-backed resource release an explicit, deterministic walk
//!   (geometry buffers and materials have no automatic reclamation)

mod color;
mod geometry;
mod helpers;
mod material;

pub use color::Color;
pub use geometry::{Geometry, GeometryId, Topology};
pub use helpers::add_axes_helper;
pub use material::{Material, Materials, Shading};

use glam::{Mat3, Mat4, Quat, Vec3};

/// Node handle into a [`Scene`]'s arena.
///
/// Handles stay valid for the scene's whole lifetime; nodes are never
/// removed individually, only released wholesale at teardown.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NodeId(usize);

/// Local translation/rotation/scale.
#[derive(Debug, Copy, Clone)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Drawable mesh: one geometry plus one material or an ordered list.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Geometry,
    pub materials: Materials,
}

/// Scene light.
#[derive(Debug, Copy, Clone)]
pub enum Light {
    Directional {
        /// Direction the light travels, world space.
        direction: Vec3,
        color: Color,
        intensity: f32,
    },
    Ambient {
        color: Color,
        intensity: f32,
    },
}

impl Light {
    /// Directional light shining from `position` toward the origin.
    pub fn directional_from(position: Vec3, color: Color, intensity: f32) -> Self {
        Light::Directional {
            direction: (-position).normalize_or(Vec3::NEG_Y),
            color,
            intensity,
        }
    }

    pub fn ambient(color: Color, intensity: f32) -> Self {
        Light::Ambient { color, intensity }
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Mesh(Mesh),
    Light(Light),
}

/// One node of the scene tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub transform: Transform,
    pub kind: NodeKind,
    pub visible: bool,
}

impl Node {
    pub fn group() -> Self {
        Self {
            transform: Transform::IDENTITY,
            kind: NodeKind::Group,
            visible: true,
        }
    }

    pub fn mesh(geometry: Geometry, materials: impl Into<Materials>) -> Self {
        Self {
            transform: Transform::IDENTITY,
            kind: NodeKind::Mesh(Mesh {
                geometry,
                materials: materials.into(),
            }),
            visible: true,
        }
    }

    pub fn light(light: Light) -> Self {
        Self {
            transform: Transform::IDENTITY,
            kind: NodeKind::Light(light),
            visible: true,
        }
    }

    pub fn at(mut self, translation: Vec3) -> Self {
        self.transform.translation = translation;
        self
    }

    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }
}

struct Slot {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    node: Node,
}

/// Root ownership tree of all renderable content in a session.
pub struct Scene {
    background: Option<Color>,
    slots: Vec<Slot>,
    root: NodeId,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            background: None,
            slots: vec![Slot {
                parent: None,
                children: Vec::new(),
                node: Node::group(),
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }

    pub fn set_background(&mut self, color: Option<Color>) {
        self.background = color;
    }

    /// Adds `node` as the last child of `parent` and returns its handle.
    pub fn add(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            parent: Some(parent),
            children: Vec::new(),
            node,
        });
        self.slots[parent.0].children.push(id);
        id
    }

    /// Adds `node` directly under the root.
    pub fn add_to_root(&mut self, node: Node) -> NodeId {
        self.add(self.root, node)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.slots[id.0].node
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.slots[id.0].node
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id.0].children
    }

    /// The mesh payload of `id`, if it is a mesh node.
    pub fn mesh(&self, id: NodeId) -> Option<&Mesh> {
        match &self.slots[id.0].node.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self, id: NodeId) -> Option<&mut Mesh> {
        match &mut self.slots[id.0].node.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// World-space transform of `id` (product of the ancestor chain).
    pub fn world_transform(&self, id: NodeId) -> Mat4 {
        let slot = &self.slots[id.0];
        let local = slot.node.transform.matrix();
        match slot.parent {
            Some(parent) => self.world_transform(parent) * local,
            None => local,
        }
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.world_transform(id).w_axis.truncate()
    }

    /// Rotates `id` so its local +Z axis points at `target` (world space),
    /// keeping +Y as the up reference.
    pub fn look_at(&mut self, id: NodeId, target: Vec3) {
        let position = self.world_position(id);
        let forward = target - position;
        if forward.length_squared() < 1e-10 {
            return;
        }
        let forward = forward.normalize();
        let reference = if forward.y.abs() > 0.999 { Vec3::X } else { Vec3::Y };
        let right = reference.cross(forward).normalize();
        let up = forward.cross(right);
        let world_rotation = Quat::from_mat3(&Mat3::from_cols(right, up, forward));

        let parent_rotation = match self.slots[id.0].parent {
            Some(parent) => {
                let (_, rotation, _) =
                    self.world_transform(parent).to_scale_rotation_translation();
                rotation
            }
            None => Quat::IDENTITY,
        };
        self.node_mut(id).transform.rotation = parent_rotation.inverse() * world_rotation;
    }

    /// Depth-first traversal from the root, parents before children.
    pub fn traverse(&self, mut visit: impl FnMut(NodeId, &Node)) {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            visit(id, self.node(id));
            stack.extend(self.children(id).iter().rev());
        }
    }

    /// Releases every geometry buffer and every material in the tree,
    /// depth-first. Node handles stay valid; disposed content is skipped by
    /// renderers.
    pub fn dispose_content(&mut self) {
        for slot in &mut self.slots {
            if let NodeKind::Mesh(mesh) = &mut slot.node.kind {
                mesh.geometry.dispose();
                mesh.materials.dispose_all();
            }
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_transform_chains_parents() {
        let mut scene = Scene::new();
        let parent = scene.add_to_root(Node::group().at(Vec3::new(1.0, 0.0, 0.0)));
        let child = scene.add(parent, Node::group().at(Vec3::new(0.0, 2.0, 0.0)));
        assert!(scene
            .world_position(child)
            .abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn look_at_points_z_axis_at_target() {
        let mut scene = Scene::new();
        let node = scene.add_to_root(Node::group().at(Vec3::ZERO));
        scene.look_at(node, Vec3::new(0.0, 0.0, 10.0));
        let forward = scene.node(node).transform.rotation * Vec3::Z;
        assert!(forward.abs_diff_eq(Vec3::Z, 1e-5));

        scene.look_at(node, Vec3::new(10.0, 0.0, 0.0));
        let forward = scene.node(node).transform.rotation * Vec3::Z;
        assert!(forward.abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn look_at_compensates_for_parent_rotation() {
        let mut scene = Scene::new();
        let parent = scene.add_to_root(
            Node::group().rotated(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
        );
        let child = scene.add(parent, Node::group());
        scene.look_at(child, Vec3::new(0.0, 0.0, 5.0));

        let (_, world_rotation, _) =
            scene.world_transform(child).to_scale_rotation_translation();
        assert!((world_rotation * Vec3::Z).abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn dispose_content_releases_all_materials() {
        let mut scene = Scene::new();
        let single = scene.add_to_root(Node::mesh(
            Geometry::cuboid(1.0, 1.0, 1.0),
            Material::unlit(Color::WHITE),
        ));
        let multi = scene.add_to_root(Node::mesh(
            Geometry::sphere(1.0, 8, 6),
            vec![
                Material::lambert(Color::WHITE),
                Material::lambert(Color::BLACK),
                Material::unlit(Color::hex(0x00ff00)),
            ],
        ));

        scene.dispose_content();

        let mesh = scene.mesh(single).unwrap();
        assert!(mesh.geometry.is_disposed());
        assert!(mesh.materials.iter().all(Material::is_disposed));

        let mesh = scene.mesh(multi).unwrap();
        assert!(mesh.geometry.is_disposed());
        assert_eq!(mesh.materials.iter().count(), 3);
        assert!(mesh.materials.iter().all(Material::is_disposed));
    }

    #[test]
    fn traverse_visits_parents_first() {
        let mut scene = Scene::new();
        let a = scene.add_to_root(Node::group());
        let b = scene.add(a, Node::group());
        let mut order = Vec::new();
        scene.traverse(|id, _| order.push(id));
        let pos = |id| order.iter().position(|v| *v == id).unwrap();
        assert!(pos(scene.root()) < pos(a));
        assert!(pos(a) < pos(b));
    }
}
