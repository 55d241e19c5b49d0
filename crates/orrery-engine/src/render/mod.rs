//! Mesh renderer.
//!
//! Flattens the scene tree into an ordered draw list, uploads geometry
//! buffers keyed by [`GeometryId`] (re-uploading when marked dirty) and
//! records a single color+depth render pass. Per-draw data lives in one
//! uniform buffer addressed with dynamic offsets.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::camera::PerspectiveCamera;
use crate::device::{DEPTH_FORMAT, Gpu, GpuFrame};
use crate::scene::{Color, Geometry, GeometryId, Light, NodeKind, Scene, Shading, Topology};

const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// Dynamic-offset stride for per-draw uniforms. Matches the default
/// `min_uniform_buffer_offset_alignment`.
const DRAW_STRIDE: u64 = 256;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct MeshVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3  // normal
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct FrameUniform {
    view_proj: [[f32; 4]; 4],
    /// Accumulated ambient light, rgb premultiplied by intensity.
    ambient: [f32; 4],
    light_dir: [[f32; 4]; 4],
    light_color: [[f32; 4]; 4],
    /// x = active directional light count.
    counts: [u32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DrawUniform {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    emissive: [f32; 4],
    /// x = 1 for diffuse-lit shading, 0 for unlit.
    flags: [u32; 4],
}

/// Which pipeline and index list a draw uses.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum DrawKind {
    Triangles,
    Lines,
    /// Triangle geometry drawn as its edge lines.
    Wireframe,
}

#[derive(Debug)]
struct DrawCall {
    geometry: GeometryId,
    kind: DrawKind,
    uniform: DrawUniform,
}

struct GpuGeometry {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    /// Edge-line index buffer, built on first wireframe use.
    wireframe: Option<(wgpu::Buffer, u32)>,
}

/// Scene renderer. All GPU state is created lazily on first use and keyed
/// on the surface format, so the same renderer survives a format change.
#[derive(Default)]
pub struct MeshRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    tri_pipeline: Option<wgpu::RenderPipeline>,
    line_pipeline: Option<wgpu::RenderPipeline>,

    frame_bgl: Option<wgpu::BindGroupLayout>,
    draw_bgl: Option<wgpu::BindGroupLayout>,
    frame_ubo: Option<wgpu::Buffer>,
    frame_bind: Option<wgpu::BindGroup>,
    draw_ubo: Option<wgpu::Buffer>,
    draw_bind: Option<wgpu::BindGroup>,
    draw_capacity: usize,

    geometry: HashMap<GeometryId, GpuGeometry>,
}

impl MeshRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `scene` from `camera` into the frame's color view, clearing
    /// color (scene background, black if unset) and depth first.
    pub fn render(
        &mut self,
        gpu: &Gpu,
        frame: &mut GpuFrame,
        scene: &mut Scene,
        camera: &PerspectiveCamera,
    ) {
        self.ensure_pipelines(gpu);
        self.ensure_frame_bindings(gpu);

        let (frame_uniform, draws) = flatten_scene(scene, camera);
        self.upload_geometry(gpu, scene, &draws);
        self.ensure_draw_capacity(gpu, draws.len().max(1));

        if let Some(ubo) = self.frame_ubo.as_ref() {
            gpu.queue().write_buffer(ubo, 0, bytemuck::bytes_of(&frame_uniform));
        }
        if let Some(ubo) = self.draw_ubo.as_ref() {
            let mut bytes = vec![0u8; draws.len() * DRAW_STRIDE as usize];
            for (i, call) in draws.iter().enumerate() {
                let at = i * DRAW_STRIDE as usize;
                bytes[at..at + std::mem::size_of::<DrawUniform>()]
                    .copy_from_slice(bytemuck::bytes_of(&call.uniform));
            }
            if !bytes.is_empty() {
                gpu.queue().write_buffer(ubo, 0, &bytes);
            }
        }

        let clear = scene
            .background()
            .map(clear_color)
            .unwrap_or(wgpu::Color::BLACK);

        // All mutations are done; only immutable borrows below.
        let (Some(tri_pipeline), Some(line_pipeline)) =
            (self.tri_pipeline.as_ref(), self.line_pipeline.as_ref())
        else {
            return;
        };
        let (Some(frame_bind), Some(draw_bind)) =
            (self.frame_bind.as_ref(), self.draw_bind.as_ref())
        else {
            return;
        };

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("orrery mesh pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: gpu.depth_view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_bind_group(0, frame_bind, &[]);
        let mut current: Option<DrawKind> = None;
        for (i, call) in draws.iter().enumerate() {
            let Some(geometry) = self.geometry.get(&call.geometry) else {
                continue;
            };
            let (index_buffer, index_count) = match call.kind {
                DrawKind::Wireframe => match geometry.wireframe.as_ref() {
                    Some((buffer, count)) => (buffer, *count),
                    None => continue,
                },
                _ => (&geometry.indices, geometry.index_count),
            };
            if index_count == 0 {
                continue;
            }

            if current != Some(call.kind) {
                match call.kind {
                    DrawKind::Triangles => rpass.set_pipeline(tri_pipeline),
                    DrawKind::Lines | DrawKind::Wireframe => rpass.set_pipeline(line_pipeline),
                }
                current = Some(call.kind);
            }
            let offset = (i as u64 * DRAW_STRIDE) as u32;
            rpass.set_bind_group(1, draw_bind, &[offset]);
            rpass.set_vertex_buffer(0, geometry.vertices.slice(..));
            rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..index_count, 0, 0..1);
        }
    }

    /// Drops every GPU resource. The renderer rebuilds lazily if used again.
    pub fn release(&mut self) {
        *self = Self::default();
    }

    fn ensure_pipelines(&mut self, gpu: &Gpu) {
        let format = gpu.surface_format();
        if self.pipeline_format == Some(format) && self.tri_pipeline.is_some() {
            return;
        }
        let device = gpu.device();

        let shader_src = include_str!("shaders/mesh.wgsl");
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("orrery mesh shader"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let frame_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("orrery frame bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(
                        std::num::NonZeroU64::new(std::mem::size_of::<FrameUniform>() as u64)
                            .unwrap(),
                    ),
                },
                count: None,
            }],
        });
        let draw_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("orrery draw bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(
                        std::num::NonZeroU64::new(std::mem::size_of::<DrawUniform>() as u64)
                            .unwrap(),
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("orrery mesh pipeline layout"),
            bind_group_layouts: &[&frame_bgl, &draw_bgl],
            // Newer wgpu uses immediate constants; keep disabled for now.
            immediate_size: 0,
        });

        let make_pipeline = |label: &str, topology: wgpu::PrimitiveTopology| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[MeshVertex::layout()],
                },

                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // Double-sided, matching the forgiving default of the
                    // scene's material model.
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),

                multiview_mask: None,
                cache: None,
            })
        };

        self.tri_pipeline = Some(make_pipeline(
            "orrery tri pipeline",
            wgpu::PrimitiveTopology::TriangleList,
        ));
        self.line_pipeline = Some(make_pipeline(
            "orrery line pipeline",
            wgpu::PrimitiveTopology::LineList,
        ));
        self.pipeline_format = Some(format);
        self.frame_bgl = Some(frame_bgl);
        self.draw_bgl = Some(draw_bgl);

        self.frame_bind = None;
        self.frame_ubo = None;
        self.draw_bind = None;
        self.draw_ubo = None;
        self.draw_capacity = 0;
    }

    fn ensure_frame_bindings(&mut self, gpu: &Gpu) {
        if self.frame_bind.is_some() && self.frame_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.frame_bgl.as_ref() else { return };

        let frame_ubo = gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("orrery frame ubo"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind = gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("orrery frame bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_ubo.as_entire_binding(),
            }],
        });
        self.frame_ubo = Some(frame_ubo);
        self.frame_bind = Some(frame_bind);
    }

    fn ensure_draw_capacity(&mut self, gpu: &Gpu, required: usize) {
        if required <= self.draw_capacity && self.draw_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.draw_bgl.as_ref() else { return };

        let new_cap = required.next_power_of_two().max(64);
        let draw_ubo = gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("orrery draw ubo"),
            size: new_cap as u64 * DRAW_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let draw_bind = gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("orrery draw bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &draw_ubo,
                    offset: 0,
                    size: std::num::NonZeroU64::new(std::mem::size_of::<DrawUniform>() as u64),
                }),
            }],
        });
        self.draw_ubo = Some(draw_ubo);
        self.draw_bind = Some(draw_bind);
        self.draw_capacity = new_cap;
    }

    /// Creates or refreshes GPU buffers for every geometry in the draw list.
    fn upload_geometry(&mut self, gpu: &Gpu, scene: &mut Scene, draws: &[DrawCall]) {
        let mut mesh_ids = Vec::new();
        scene.traverse(|id, node| {
            if matches!(node.kind, NodeKind::Mesh(_)) {
                mesh_ids.push(id);
            }
        });
        let needs_wireframe: Vec<GeometryId> = draws
            .iter()
            .filter(|call| call.kind == DrawKind::Wireframe)
            .map(|call| call.geometry)
            .collect();

        for id in mesh_ids {
            let Some(mesh) = scene.mesh_mut(id) else { continue };
            let geometry = &mut mesh.geometry;
            if geometry.is_disposed() {
                self.geometry.remove(&geometry.id());
                continue;
            }
            let cached = self.geometry.contains_key(&geometry.id());
            if !cached || geometry.is_dirty() {
                let vertices = interleave(geometry);
                let device = gpu.device();
                let entry = GpuGeometry {
                    vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("orrery mesh vbo"),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    indices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("orrery mesh ibo"),
                        contents: bytemuck::cast_slice(&geometry.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: geometry.indices.len() as u32,
                    wireframe: None,
                };
                self.geometry.insert(geometry.id(), entry);
                geometry.clear_dirty();
            }
            if needs_wireframe.contains(&geometry.id()) {
                let entry = self
                    .geometry
                    .get_mut(&geometry.id())
                    .expect("geometry uploaded above");
                if entry.wireframe.is_none() {
                    let edges = wireframe_indices(&geometry.indices);
                    entry.wireframe = Some((
                        gpu.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("orrery wireframe ibo"),
                            contents: bytemuck::cast_slice(&edges),
                            usage: wgpu::BufferUsages::INDEX,
                        }),
                        edges.len() as u32,
                    ));
                }
            }
        }
    }
}

/// Walks the tree once, producing the frame uniform (camera + lights) and
/// an ordered draw list. Invisible subtrees and disposed content are
/// skipped.
fn flatten_scene(scene: &Scene, camera: &PerspectiveCamera) -> (FrameUniform, Vec<DrawCall>) {
    let mut uniform = FrameUniform {
        view_proj: camera.view_projection().to_cols_array_2d(),
        ambient: [0.0; 4],
        light_dir: [[0.0; 4]; 4],
        light_color: [[0.0; 4]; 4],
        counts: [0; 4],
    };
    let mut draws = Vec::new();

    let mut stack = vec![(scene.root(), Mat4::IDENTITY)];
    while let Some((id, parent)) = stack.pop() {
        let node = scene.node(id);
        if !node.visible {
            continue;
        }
        let world = parent * node.transform.matrix();
        match &node.kind {
            NodeKind::Group => {}
            NodeKind::Light(Light::Ambient { color, intensity }) => {
                uniform.ambient[0] += color.r * intensity;
                uniform.ambient[1] += color.g * intensity;
                uniform.ambient[2] += color.b * intensity;
            }
            NodeKind::Light(Light::Directional {
                direction,
                color,
                intensity,
            }) => {
                let slot = uniform.counts[0] as usize;
                if slot < MAX_DIRECTIONAL_LIGHTS {
                    let dir = direction.normalize_or(glam::Vec3::NEG_Y);
                    uniform.light_dir[slot] = [dir.x, dir.y, dir.z, 0.0];
                    uniform.light_color[slot] = [
                        color.r * intensity,
                        color.g * intensity,
                        color.b * intensity,
                        0.0,
                    ];
                    uniform.counts[0] += 1;
                }
            }
            NodeKind::Mesh(mesh) => {
                let Some(material) = mesh.materials.primary() else {
                    continue;
                };
                if material.is_disposed()
                    || mesh.geometry.is_disposed()
                    || mesh.geometry.indices.is_empty()
                {
                    continue;
                }
                let kind = match (mesh.geometry.topology, material.wireframe) {
                    (Topology::Lines, _) => DrawKind::Lines,
                    (Topology::Triangles, true) => DrawKind::Wireframe,
                    (Topology::Triangles, false) => DrawKind::Triangles,
                };
                draws.push(DrawCall {
                    geometry: mesh.geometry.id(),
                    kind,
                    uniform: DrawUniform {
                        model: world.to_cols_array_2d(),
                        color: material.color.to_array(),
                        emissive: material.emissive.to_array(),
                        flags: [u32::from(material.shading == Shading::Lambert), 0, 0, 0],
                    },
                });
            }
        }
        stack.extend(scene.children(id).iter().rev().map(|c| (*c, world)));
    }
    (uniform, draws)
}

/// Interleaved vertex stream; missing normals fall back to +Z.
fn interleave(geometry: &Geometry) -> Vec<MeshVertex> {
    geometry
        .positions
        .iter()
        .enumerate()
        .map(|(i, position)| MeshVertex {
            position: *position,
            normal: geometry.normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]),
        })
        .collect()
}

/// Converts a triangle index list into line-list edge indices.
fn wireframe_indices(indices: &[u32]) -> Vec<u32> {
    let mut edges = Vec::with_capacity(indices.len() * 2);
    for tri in indices.chunks_exact(3) {
        edges.extend_from_slice(&[tri[0], tri[1], tri[1], tri[2], tri[2], tri[0]]);
    }
    edges
}

fn clear_color(color: Color) -> wgpu::Color {
    wgpu::Color {
        r: color.r as f64,
        g: color.g as f64,
        b: color.b as f64,
        a: color.a as f64,
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::scene::{Material, Node};

    #[test]
    fn wireframe_edges_cover_every_triangle_side() {
        let edges = wireframe_indices(&[0, 1, 2, 2, 1, 3]);
        assert_eq!(edges, vec![0, 1, 1, 2, 2, 0, 2, 1, 1, 3, 3, 2]);
    }

    #[test]
    fn interleave_falls_back_when_normals_missing() {
        let line = Geometry::polyline(&[Vec3::ZERO, Vec3::X]);
        let vertices = interleave(&line);
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn flatten_skips_invisible_subtrees_and_disposed_meshes() {
        let mut scene = Scene::new();
        let camera = PerspectiveCamera::new(1.0);

        let hidden = scene.add_to_root(Node::group());
        scene.node_mut(hidden).visible = false;
        scene.add(
            hidden,
            Node::mesh(Geometry::cuboid(1.0, 1.0, 1.0), Material::unlit(Color::WHITE)),
        );
        let disposed = scene.add_to_root(Node::mesh(
            Geometry::cuboid(1.0, 1.0, 1.0),
            Material::unlit(Color::WHITE),
        ));
        scene.mesh_mut(disposed).unwrap().geometry.dispose();
        scene.add_to_root(Node::mesh(
            Geometry::sphere(1.0, 8, 6),
            Material::lambert(Color::WHITE),
        ));

        let (_, draws) = flatten_scene(&scene, &camera);
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].kind, DrawKind::Triangles);
        assert_eq!(draws[0].uniform.flags[0], 1);
    }

    #[test]
    fn flatten_accumulates_lights_into_frame_uniform() {
        let mut scene = Scene::new();
        let camera = PerspectiveCamera::new(1.0);
        scene.add_to_root(Node::light(Light::ambient(Color::WHITE, 0.5)));
        scene.add_to_root(Node::light(Light::directional_from(
            Vec3::new(0.0, 10.0, 0.0),
            Color::WHITE,
            1.0,
        )));

        let (uniform, _) = flatten_scene(&scene, &camera);
        assert!((uniform.ambient[0] - 0.5).abs() < 1e-6);
        assert_eq!(uniform.counts[0], 1);
        assert!((uniform.light_dir[0][1] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn flatten_applies_parent_transforms() {
        let mut scene = Scene::new();
        let camera = PerspectiveCamera::new(1.0);
        let group = scene.add_to_root(Node::group().at(Vec3::new(3.0, 0.0, 0.0)));
        scene.add(
            group,
            Node::mesh(Geometry::cuboid(1.0, 1.0, 1.0), Material::unlit(Color::WHITE))
                .at(Vec3::new(0.0, 2.0, 0.0)),
        );

        let (_, draws) = flatten_scene(&scene, &camera);
        let model = Mat4::from_cols_array_2d(&draws[0].uniform.model);
        assert!(model
            .w_axis
            .truncate()
            .abs_diff_eq(Vec3::new(3.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn line_topology_and_wireframe_pick_the_line_pipeline() {
        let mut scene = Scene::new();
        let camera = PerspectiveCamera::new(1.0);
        scene.add_to_root(Node::mesh(
            Geometry::polyline(&[Vec3::ZERO, Vec3::X]),
            Material::unlit(Color::WHITE),
        ));
        scene.add_to_root(Node::mesh(
            Geometry::cuboid(1.0, 1.0, 1.0),
            Material::wireframe(Color::WHITE),
        ));

        let (_, draws) = flatten_scene(&scene, &camera);
        let kinds: Vec<DrawKind> = draws.iter().map(|d| d.kind).collect();
        assert!(kinds.contains(&DrawKind::Lines));
        assert!(kinds.contains(&DrawKind::Wireframe));
    }
}
