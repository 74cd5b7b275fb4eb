//! GPU-resident model records.
//!
//! A [`Model`] is the uploaded form of a [`MeshData`]: one vertex buffer per
//! attribute (position, normal, uv, color at shader locations 0–3), an
//! optional index buffer, an owned [`Transform`], and the texture slot
//! bindings the render protocol resolves at draw time. Models are created
//! through [`ResourceManager::create_model`](crate::ResourceManager::create_model)
//! and retained for the session.

use wgpu::util::DeviceExt;

use crate::gpu::GpuContext;
use crate::mesh::{DrawMode, MeshData};
use crate::texture::TextureRole;
use crate::transform::Transform;
use crate::uniforms::ModelBlock;

/// One attribute per buffer, at the fixed shader locations.
pub const VERTEX_LAYOUTS: [wgpu::VertexBufferLayout<'static>; 4] = [
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    },
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        }],
    },
    wgpu::VertexBufferLayout {
        array_stride: 8,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x2,
        }],
    },
    wgpu::VertexBufferLayout {
        array_stride: 16,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 3,
            format: wgpu::VertexFormat::Float32x4,
        }],
    },
];

/// Number of texture slots a model carries, one per [`TextureRole`].
pub const TEXTURE_SLOTS: usize = 7;

/// A mesh uploaded to the GPU, with its spatial state and texture bindings.
pub struct Model {
    /// Unique key in the resource manager's registry.
    pub name: String,
    /// Small integer identity used by the picking pass; never zero.
    pub id: u32,
    pub draw_mode: DrawMode,
    pub transform: Transform,
    /// Texture registry names by role slot; `None` slots are skipped at
    /// draw time.
    pub textures: [Option<String>; TEXTURE_SLOTS],

    pub(crate) position_buffer: wgpu::Buffer,
    pub(crate) normal_buffer: wgpu::Buffer,
    pub(crate) uv_buffer: wgpu::Buffer,
    pub(crate) color_buffer: wgpu::Buffer,
    pub(crate) index_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    index_count: u32,

    /// Per-model uniform storage; written by the render protocol right
    /// before this model's draw.
    pub(crate) uniform_buffer: wgpu::Buffer,
    /// Built lazily by the pipeline that first draws this model.
    pub(crate) bind_group: Option<wgpu::BindGroup>,
}

impl Model {
    /// Upload a mesh and build the model record. Attribute arrays the mesh
    /// left empty are zero-filled first.
    pub(crate) fn new(gpu: &GpuContext, mut mesh: MeshData, id: u32) -> Self {
        log::info!("Creating model {} (id {id})...", mesh.name);
        mesh.fill_missing_attributes();

        let vertex_buffer = |label: &str, data: &[f32]| {
            gpu.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} {label} Buffer", mesh.name)),
                    contents: bytemuck::cast_slice(data),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        };

        let index_buffer = (!mesh.indices.is_empty()).then(|| {
            gpu.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Index Buffer", mesh.name)),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
        });

        let uniform_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} Uniform Buffer", mesh.name)),
            size: std::mem::size_of::<ModelBlock>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            position_buffer: vertex_buffer("Position", &mesh.positions),
            normal_buffer: vertex_buffer("Normal", &mesh.normals),
            uv_buffer: vertex_buffer("UV", &mesh.uvs),
            color_buffer: vertex_buffer("Color", &mesh.colors),
            index_count: if index_buffer.is_some() {
                mesh.indices.len() as u32
            } else {
                0
            },
            index_buffer,
            vertex_count: mesh.vertex_count(),
            name: mesh.name,
            id,
            draw_mode: mesh.draw_mode,
            transform: Transform::new(),
            textures: Default::default(),
            uniform_buffer,
            bind_group: None,
        }
    }

    /// Bind a texture registry name to a role slot. Pass `None` to clear.
    pub fn set_texture(&mut self, role: TextureRole, name: Option<impl Into<String>>) {
        self.textures[role.slot()] = name.map(Into::into);
    }

    /// Whether any texture slot is bound; drives the shader's choice
    /// between sampled color and vertex color.
    pub fn has_texture(&self) -> bool {
        self.textures.iter().any(Option::is_some)
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Nonzero only when the mesh supplied indices.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}
