//! Pipelines and the per-draw render protocol.
//!
//! A [`Shader`] wraps the WGSL module for one flavor and the render
//! pipelines derived from it (one per primitive topology, plus a
//! dual-target picking set for the default flavor). The camera and light
//! blocks live in a [`FrameUniforms`] shared by every shader — one GPU
//! buffer each, bound at group 0 of every pipeline, so a scene mixing
//! flavors uploads camera state exactly once per frame. The per-frame
//! protocol is split in two:
//!
//! 1. [`FrameUniforms::prepare_frame`] stages and flushes the shared camera
//!    and light blocks once per frame.
//! 2. [`Shader::render_model`] stages the model block, resolves texture
//!    bindings, flushes, and issues the draw — uniform writes always land
//!    before the draw that consumes them, and texture bindings are
//!    established before the draw references them.
//!
//! Flavors are a tagged variant dispatched here, not a class hierarchy:
//! `Default` binds a 2D diffuse texture, `Cubemap` binds two cube textures
//! and relies on the elapsed-time uniform for its day/night cross-fade.

use std::collections::{HashMap, HashSet};

use crate::camera::Camera;
use crate::error::Error;
use crate::gpu::GpuContext;
use crate::light::Light;
use crate::mesh::DrawMode;
use crate::model::{Model, VERTEX_LAYOUTS};
use crate::resources::MAX_PICKABLE_ID;
use crate::texture::{Texture, TextureRegistry, TextureRole};
use crate::uniforms::{BlockLayout, UniformManager};

/// Depth format shared by the main pass, framebuffers and the picker.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;
/// Format of the picker's two color attachments.
pub const PICKER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Which render protocol variant a shader implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderFlavor {
    /// Phong-lit geometry with an optional 2D diffuse texture.
    Default,
    /// Skybox sampling two cube maps with a time-based cross-fade.
    Cubemap,
}

struct PipelineSet {
    triangles: wgpu::RenderPipeline,
    lines: wgpu::RenderPipeline,
    points: wgpu::RenderPipeline,
}

impl PipelineSet {
    fn for_mode(&self, mode: DrawMode) -> &wgpu::RenderPipeline {
        match mode {
            DrawMode::Triangles => &self.triangles,
            DrawMode::Lines => &self.lines,
            DrawMode::Points => &self.points,
        }
    }
}

/// Camera and light state shared by every pipeline: one GPU block each,
/// staged and flushed once per frame, bound at group 0 of every shader.
pub struct FrameUniforms {
    pub(crate) layout: wgpu::BindGroupLayout,
    pub(crate) bind_group: wgpu::BindGroup,

    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    camera: UniformManager,
    light: UniformManager,
}

impl FrameUniforms {
    pub fn new(gpu: &GpuContext) -> Self {
        let layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Frame Bind Group Layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                    uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
                ],
            });

        let camera = UniformManager::new(BlockLayout::camera());
        let light = UniformManager::new(BlockLayout::light());

        let uniform_buffer = |name: &str, size: usize| {
            gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(name),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let camera_buffer = uniform_buffer("Camera Block", camera.staged().len());
        let light_buffer = uniform_buffer("Light Block", light.staged().len());

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            layout,
            bind_group,
            camera_buffer,
            light_buffer,
            camera,
            light,
        }
    }

    /// Stage and flush the shared camera and light blocks for this frame.
    /// `time` is elapsed seconds; the cubemap cross-fade reads it.
    pub fn prepare_frame(
        &mut self,
        gpu: &GpuContext,
        camera: Option<&Camera>,
        light: Option<&Light>,
        time: f32,
    ) {
        if let Some(camera) = camera {
            self.camera
                .enqueue_mat4("u_ProjectionMatrix", camera.projection);
            self.camera.enqueue_mat4("u_ViewMatrix", camera.view());
            self.camera.enqueue_vec3("u_CameraPosition", camera.position());
        }
        self.camera.enqueue_f32("u_Time", time);
        self.camera.flush(&gpu.queue, &self.camera_buffer);

        if let Some(light) = light {
            let p = light.transform.position;
            let c = light.color;
            self.light.enqueue(
                "u_LightPosition",
                bytemuck::cast_slice(&[p.x, p.y, p.z, light.ambient_strength]),
            );
            self.light.enqueue(
                "u_LightColor",
                bytemuck::cast_slice(&[c.x, c.y, c.z, light.diffuse_strength]),
            );
            self.light.enqueue(
                "u_LightStrengths",
                bytemuck::cast_slice(&[
                    light.specular_strength,
                    light.specular_shininess,
                    0.0,
                    0.0,
                ]),
            );
            self.light.flush(&gpu.queue, &self.light_buffer);
        }
    }
}

/// Compiled pipelines plus the uniform plumbing for one shader flavor.
pub struct Shader {
    pub flavor: ShaderFlavor,

    main: PipelineSet,
    /// Dual-target variant writing the model id; `Default` flavor only.
    picker: Option<PipelineSet>,

    model_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,

    model_uniforms: UniformManager,

    /// Bind groups cached per texture-name key.
    texture_bind_groups: HashMap<String, wgpu::BindGroup>,
    /// Fallback for unbound or unresolvable texture slots.
    fallback_texture: Texture,
    fallback_cube: Texture,
    missing_warned: HashSet<String>,
}

impl Shader {
    /// Compile the flavor's WGSL module and build its pipelines against the
    /// shared frame block's layout.
    ///
    /// Compilation runs inside a validation error scope so a malformed
    /// module fails here with the compiler diagnostic instead of poisoning
    /// the device later.
    pub fn new(gpu: &GpuContext, flavor: ShaderFlavor, frame: &FrameUniforms) -> Result<Self, Error> {
        let (label, source) = match flavor {
            ShaderFlavor::Default => ("scene", include_str!("shaders/scene.wgsl")),
            ShaderFlavor::Cubemap => ("cubemap", include_str!("shaders/cubemap.wgsl")),
        };
        log::info!("Compiling {label} shader...");

        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        if let Some(error) = pollster::block_on(gpu.device.pop_error_scope()) {
            return Err(Error::ShaderCompile {
                label: label.to_string(),
                message: error.to_string(),
            });
        }

        let model_layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Model Bind Group Layout"),
                entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
            });

        let texture_layout = match flavor {
            ShaderFlavor::Default => {
                gpu.device
                    .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        label: Some("Texture Bind Group Layout"),
                        entries: &[
                            sampler_entry(0),
                            texture_entry(1, wgpu::TextureViewDimension::D2),
                        ],
                    })
            }
            ShaderFlavor::Cubemap => {
                gpu.device
                    .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        label: Some("Cubemap Bind Group Layout"),
                        entries: &[
                            sampler_entry(0),
                            texture_entry(1, wgpu::TextureViewDimension::Cube),
                            texture_entry(2, wgpu::TextureViewDimension::Cube),
                        ],
                    })
            }
        };

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{label} Pipeline Layout")),
                bind_group_layouts: &[&frame.layout, &model_layout, &texture_layout],
                push_constant_ranges: &[],
            });

        let surface_targets = [Some(wgpu::ColorTargetState {
            format: gpu.config.format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];
        let main = build_pipeline_set(
            gpu,
            label,
            &module,
            &pipeline_layout,
            "fs_main",
            &surface_targets,
        );

        let picker = (flavor == ShaderFlavor::Default).then(|| {
            let picker_targets = [
                Some(wgpu::ColorTargetState {
                    format: PICKER_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                }),
                Some(wgpu::ColorTargetState {
                    format: PICKER_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                }),
            ];
            build_pipeline_set(
                gpu,
                &format!("{label} picker"),
                &module,
                &pipeline_layout,
                "fs_picker",
                &picker_targets,
            )
        });

        let fallback_texture =
            Texture::from_rgba(gpu, &[255, 255, 255, 255], 1, 1, "Fallback Texture", false);
        let fallback_cube = fallback_cube(gpu);

        Ok(Self {
            flavor,
            main,
            picker,
            model_layout,
            texture_layout,
            model_uniforms: UniformManager::new(BlockLayout::model()),
            texture_bind_groups: HashMap::new(),
            fallback_texture,
            fallback_cube,
            missing_warned: HashSet::new(),
        })
    }

    /// Stage the model block, bind the pipeline and resources, and draw.
    ///
    /// With `picking` set, the dual-target pipeline variant writes the
    /// model's normalized id to the second color attachment; the caller is
    /// responsible for recording into a pass with matching attachments.
    pub fn render_model(
        &mut self,
        gpu: &GpuContext,
        pass: &mut wgpu::RenderPass<'_>,
        frame: &FrameUniforms,
        model: &mut Model,
        textures: &TextureRegistry,
        picking: bool,
    ) {
        self.model_uniforms
            .enqueue_mat4("u_ModelMatrix", model.transform.model);
        self.model_uniforms
            .enqueue_mat3("u_NormalMatrix", model.transform.normal);
        self.model_uniforms
            .enqueue_u32("u_HasTexture", model.has_texture() as u32);
        self.model_uniforms
            .enqueue_f32("u_ModelId", encode_model_id(model.id));
        self.model_uniforms.flush(&gpu.queue, &model.uniform_buffer);

        let texture_key = match self.flavor {
            ShaderFlavor::Default => self.texture_bind_group_2d(gpu, model, textures),
            ShaderFlavor::Cubemap => self.texture_bind_group_cube(gpu, model, textures),
        };

        let model_bind_group = model.bind_group.get_or_insert_with(|| {
            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{} Bind Group", model.name)),
                layout: &self.model_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: model.uniform_buffer.as_entire_binding(),
                }],
            })
        });

        let pipelines = if picking {
            self.picker.as_ref().unwrap_or(&self.main)
        } else {
            &self.main
        };

        pass.set_pipeline(pipelines.for_mode(model.draw_mode));
        pass.set_bind_group(0, &frame.bind_group, &[]);
        pass.set_bind_group(1, &*model_bind_group, &[]);
        pass.set_bind_group(2, &self.texture_bind_groups[&texture_key], &[]);

        pass.set_vertex_buffer(0, model.position_buffer.slice(..));
        pass.set_vertex_buffer(1, model.normal_buffer.slice(..));
        pass.set_vertex_buffer(2, model.uv_buffer.slice(..));
        pass.set_vertex_buffer(3, model.color_buffer.slice(..));

        match &model.index_buffer {
            Some(indices) => {
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..model.index_count(), 0, 0..1);
            }
            None => pass.draw(0..model.vertex_count(), 0..1),
        }
    }

    /// Resolve the model's diffuse slot to a cached bind group key,
    /// building the group on first use. Unresolvable names warn once and
    /// fall back to the 1×1 white texture.
    fn texture_bind_group_2d(
        &mut self,
        gpu: &GpuContext,
        model: &Model,
        textures: &TextureRegistry,
    ) -> String {
        let name = model.textures[TextureRole::Diffuse.slot()].clone();
        let key = name.clone().unwrap_or_else(|| "<none>".to_string());
        if self.texture_bind_groups.contains_key(&key) {
            return key;
        }

        let texture = match &name {
            Some(n) => match textures.texture(n) {
                Some(t) if !t.cube => t,
                _ => {
                    self.warn_missing(n);
                    &self.fallback_texture
                }
            },
            None => &self.fallback_texture,
        };

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Texture Bind Group {key}")),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
            ],
        });
        self.texture_bind_groups.insert(key.clone(), bind_group);
        key
    }

    /// Cube flavor binds both cube map slots; a missing slot falls back to
    /// the black cube.
    fn texture_bind_group_cube(
        &mut self,
        gpu: &GpuContext,
        model: &Model,
        textures: &TextureRegistry,
    ) -> String {
        let names = [
            model.textures[TextureRole::Cubemap0.slot()].clone(),
            model.textures[TextureRole::Cubemap1.slot()].clone(),
        ];
        let key = format!(
            "cube:{}|{}",
            names[0].as_deref().unwrap_or("<none>"),
            names[1].as_deref().unwrap_or("<none>")
        );
        if self.texture_bind_groups.contains_key(&key) {
            return key;
        }

        // Warn about unresolvable names before resolving views, so the
        // fallback borrow below does not overlap the mutable warn state.
        for name in names.iter().flatten() {
            let found = textures.texture(name).map(|t| t.cube).unwrap_or(false);
            if !found {
                self.warn_missing(name);
            }
        }

        let view_of = |name: &Option<String>| -> &wgpu::TextureView {
            name.as_ref()
                .and_then(|n| textures.texture(n))
                .filter(|t| t.cube)
                .map(|t| &t.view)
                .unwrap_or(&self.fallback_cube.view)
        };

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Texture Bind Group {key}")),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(&self.fallback_cube.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view_of(&names[0])),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(view_of(&names[1])),
                },
            ],
        });
        self.texture_bind_groups.insert(key.clone(), bind_group);
        key
    }

    fn warn_missing(&mut self, name: &str) {
        if self.missing_warned.insert(name.to_string()) {
            log::warn!("Texture {name} is not registered; using fallback.");
        }
    }
}

/// Normalized picker-channel encoding for a model id. Ids beyond the 8-bit
/// attachment range saturate; the resource manager warns when it assigns
/// one.
fn encode_model_id(id: u32) -> f32 {
    id.min(MAX_PICKABLE_ID) as f32 / MAX_PICKABLE_ID as f32
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn texture_entry(
    binding: u32,
    dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn build_pipeline_set(
    gpu: &GpuContext,
    label: &str,
    module: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &str,
    targets: &[Option<wgpu::ColorTargetState>],
) -> PipelineSet {
    let build = |topology: wgpu::PrimitiveTopology, suffix: &str| {
        gpu.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("{label} {suffix} Pipeline")),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &VERTEX_LAYOUTS,
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some(fragment_entry),
                    compilation_options: Default::default(),
                    targets,
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
    };

    PipelineSet {
        triangles: build(wgpu::PrimitiveTopology::TriangleList, "Triangle"),
        lines: build(wgpu::PrimitiveTopology::LineList, "Line"),
        points: build(wgpu::PrimitiveTopology::PointList, "Point"),
    }
}

/// 1×1 black cube map used when a cube slot is unbound.
fn fallback_cube(gpu: &GpuContext) -> Texture {
    use wgpu::util::DeviceExt;

    let texture = gpu.device.create_texture_with_data(
        &gpu.queue,
        &wgpu::TextureDescriptor {
            label: Some("Fallback Cube"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &[0u8; 24],
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    });
    let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Fallback Cube Sampler"),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    Texture {
        texture,
        view,
        sampler,
        width: 1,
        height: 1,
        cube: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_ids_survive_the_unorm_round_trip() {
        // The picker reads the id back as round(encoded * 255).
        for id in [1u32, 7, 128, 255] {
            let decoded = (encode_model_id(id) * 255.0).round() as u32;
            assert_eq!(decoded, id);
        }
    }

    #[test]
    fn out_of_range_model_ids_saturate() {
        assert_eq!(encode_model_id(256), 1.0);
        assert_eq!(encode_model_id(10_000), 1.0);
    }
}
