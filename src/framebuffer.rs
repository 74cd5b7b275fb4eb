//! Off-screen render targets: color/depth attachment management, the draw
//! bracket, resolve/blit paths, pixel read-back, and the picking target.
//!
//! A [`FrameBufferObject`] moves from unconfigured (just allocated) to
//! configured (attachments added) and is then usable for draw and copy
//! operations; [`FrameBufferObject::dispose`] is terminal. The draw bracket
//! owns all attachment state: it builds the full attachment list, clears,
//! runs the caller's closure against the pass, and ends the pass on every
//! exit path — callers never touch attachment state directly, so it can
//! never leak into a later draw.
//!
//! [`PickerTarget`] is the two-attachment specialization for mouse picking:
//! attachment 0 carries the visual color, attachment 1 the encoded model
//! id. Pointer coordinates are converted to physical pixels with the device
//! pixel ratio only — framebuffer coordinates and the copy origin share the
//! pointer's top-left convention, so no axis ever flips.

use glam::Vec2;

use crate::error::Error;
use crate::gpu::GpuContext;
use crate::resources::ResourceManager;
use crate::shader::{DEPTH_FORMAT, PICKER_FORMAT};

struct ColorBuffer {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// An off-screen framebuffer with ordered color attachments and an optional
/// depth attachment.
pub struct FrameBufferObject {
    label: String,
    width: u32,
    height: u32,
    /// Declared at construction; attachments inherit it.
    sample_count: u32,
    color: Vec<ColorBuffer>,
    depth: Option<(wgpu::Texture, wgpu::TextureView)>,
}

impl FrameBufferObject {
    /// Allocate an unconfigured framebuffer. `sample_count` > 1 makes every
    /// later attachment multisampled (and therefore non-sampleable — resolve
    /// into a single-sample target before reading).
    pub fn new(
        label: impl Into<String>,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::ZeroSizedSurface { width, height });
        }
        Ok(Self {
            label: label.into(),
            width,
            height,
            sample_count,
            color: Vec::new(),
            depth: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn color_attachment_count(&self) -> usize {
        self.color.len()
    }

    /// Add `count` sequential color attachments in the picker-compatible
    /// linear RGBA8 format.
    pub fn add_color_buffers(&mut self, gpu: &GpuContext, count: usize) {
        for _ in 0..count {
            self.add_color_buffer_with_format(gpu, PICKER_FORMAT);
        }
    }

    /// Add one color attachment with an explicit format.
    pub fn add_color_buffer_with_format(&mut self, gpu: &GpuContext, format: wgpu::TextureFormat) {
        let index = self.color.len();
        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if self.sample_count == 1 {
            // Single-sample attachments stay sampleable and readable.
            usage |= wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_SRC;
        }

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{} Color {index}", self.label)),
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: self.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.color.push(ColorBuffer { texture, view });
    }

    /// Add a depth attachment. Idempotent — a second call is a no-op.
    pub fn add_depth_buffer(&mut self, gpu: &GpuContext) {
        if self.depth.is_some() {
            return;
        }
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{} Depth", self.label)),
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: self.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth = Some((texture, view));
    }

    /// The view of one color attachment, for sampling or blitting.
    pub fn color_view(&self, index: usize) -> Result<&wgpu::TextureView, Error> {
        self.color
            .get(index)
            .map(|c| &c.view)
            .ok_or_else(|| Error::MissingAttachment {
                label: self.label.clone(),
                index,
            })
    }

    /// The draw bracket: begin a pass over every configured attachment,
    /// clear them, run `f` against the pass, and end the pass when `f`
    /// returns. Ending on scope exit is what restores attachment state on
    /// every path.
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        clear: wgpu::Color,
        f: impl FnOnce(&mut wgpu::RenderPass<'_>),
    ) {
        self.draw_with_clears(encoder, &[clear], f);
    }

    /// Like [`FrameBufferObject::draw`], but with a clear color per
    /// attachment. Attachments beyond the slice reuse its last entry.
    pub fn draw_with_clears(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        clears: &[wgpu::Color],
        f: impl FnOnce(&mut wgpu::RenderPass<'_>),
    ) {
        if self.color.is_empty() || clears.is_empty() {
            log::warn!("Framebuffer {} drawn before configuration.", self.label);
            return;
        }

        let attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = self
            .color
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let clear = clears.get(i).or(clears.last()).copied().unwrap_or_default();
                Some(wgpu::RenderPassColorAttachment {
                    view: &c.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })
            })
            .collect();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&format!("{} Pass", self.label)),
            color_attachments: &attachments,
            depth_stencil_attachment: self.depth.as_ref().map(|(_, view)| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        f(&mut pass);
    }

    /// Resolve one multisampled attachment into a single-sample target
    /// view. This is the multisample analogue of a blit: a pass that loads
    /// the attachment and resolves on end, without issuing any draws.
    pub fn resolve_to(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        index: usize,
        target: &wgpu::TextureView,
    ) -> Result<(), Error> {
        let source = self.color_view(index)?;
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&format!("{} Resolve", self.label)),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: source,
                depth_slice: None,
                resolve_target: Some(target),
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        Ok(())
    }

    /// Copy one single-sample attachment into the matching attachment of
    /// another framebuffer. Dimensions must match.
    pub fn copy_to(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        index: usize,
        target: &FrameBufferObject,
        target_index: usize,
    ) -> Result<(), Error> {
        self.color_view(index)?;
        target.color_view(target_index)?;

        encoder.copy_texture_to_texture(
            self.color[index].texture.as_image_copy(),
            target.color[target_index].texture.as_image_copy(),
            wgpu::Extent3d {
                width: self.width.min(target.width),
                height: self.height.min(target.height),
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    /// Synchronously read back one RGBA8 pixel from a color attachment.
    ///
    /// This blocks on the GPU and lives off the hot path — the picker calls
    /// it on pointer-down events only.
    pub fn read_pixel(
        &self,
        gpu: &GpuContext,
        x: u32,
        y: u32,
        index: usize,
    ) -> Result<[u8; 4], Error> {
        let _ = self.color_view(index)?;
        if x >= self.width || y >= self.height {
            return Err(Error::ReadBack(format!(
                "pixel ({x}, {y}) outside {}x{}",
                self.width, self.height
            )));
        }

        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} Read-back", self.label)),
            size: 4,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Read-back Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.color[index].texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: None,
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        gpu.queue.submit(Some(encoder.finish()));

        let slice = buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        gpu.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| Error::ReadBack(e.to_string()))?;
        receiver
            .recv()
            .map_err(|e| Error::ReadBack(e.to_string()))?
            .map_err(|e| Error::ReadBack(e.to_string()))?;

        let mut pixel = [0u8; 4];
        pixel.copy_from_slice(&slice.get_mapped_range()[..4]);
        buffer.unmap();
        Ok(pixel)
    }

    /// Release every GPU handle. Terminal.
    pub fn dispose(self) {
        for c in &self.color {
            c.texture.destroy();
        }
        if let Some((texture, _)) = &self.depth {
            texture.destroy();
        }
    }
}

/// Fullscreen-triangle blit pipeline, used to present a sampleable
/// framebuffer attachment onto the surface (the "copy to the default
/// framebuffer" path).
pub struct Blitter {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl Blitter {
    pub fn new(gpu: &GpuContext) -> Self {
        let module = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("blit"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
            });

        let layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Blit Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                ],
            });
        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Blit Pipeline Layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Blit Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline,
            layout,
            sampler,
        }
    }

    /// Draw `source` over the whole of `target`.
    pub fn blit(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        source: &wgpu::TextureView,
        target: &wgpu::TextureView,
    ) {
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blit Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Blit Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

/// Result of a successful pick: the decoded id and the model's name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pick {
    pub id: u32,
    pub name: String,
}

/// Two-attachment framebuffer for mouse picking: attachment 0 is the visual
/// color, attachment 1 the encoded model id.
pub struct PickerTarget {
    fbo: FrameBufferObject,
}

impl PickerTarget {
    pub fn new(gpu: &GpuContext) -> Result<Self, Error> {
        let mut fbo = FrameBufferObject::new("Picker", gpu.width(), gpu.height(), 1)?;
        fbo.add_color_buffers(gpu, 2);
        fbo.add_depth_buffer(gpu);
        Ok(Self { fbo })
    }

    /// Rebuild the attachments at the surface's current size.
    pub fn resize(&mut self, gpu: &GpuContext) -> Result<(), Error> {
        *self = Self::new(gpu)?;
        Ok(())
    }

    /// The visual attachment, for blitting to the screen.
    pub fn color_view(&self) -> Result<&wgpu::TextureView, Error> {
        self.fbo.color_view(0)
    }

    /// Draw bracket over both attachments. The id attachment always clears
    /// to zero, which decodes as "no model", regardless of the visual clear
    /// color.
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        clear: wgpu::Color,
        f: impl FnOnce(&mut wgpu::RenderPass<'_>),
    ) {
        self.fbo
            .draw_with_clears(encoder, &[clear, wgpu::Color::TRANSPARENT], f);
    }

    /// Decode the model under a pointer position (logical coordinates).
    ///
    /// Converts to physical pixels with the device pixel ratio, reads
    /// attachment 1 and decodes the red channel as the model id. Returns
    /// `Ok(None)` for the background or a pointer outside the surface.
    pub fn pick(
        &self,
        gpu: &GpuContext,
        resources: &ResourceManager,
        pointer: Vec2,
    ) -> Result<Option<Pick>, Error> {
        let Some((x, y)) =
            pointer_to_pixel(pointer, gpu.scale_factor, self.fbo.width, self.fbo.height)
        else {
            return Ok(None);
        };

        let pixel = self.fbo.read_pixel(gpu, x, y, 1)?;
        let id = pixel[0] as u32;
        if id == 0 {
            return Ok(None);
        }

        match resources.model_by_id(id) {
            Some(model) => {
                log::info!("Picked model {} (id {id}).", model.name);
                Ok(Some(Pick {
                    id,
                    name: model.name.clone(),
                }))
            }
            None => {
                log::warn!("Pick decoded unknown model id {id}.");
                Ok(None)
            }
        }
    }
}

/// Convert a logical pointer position into physical pixel coordinates.
/// Pointer and framebuffer share a top-left origin, so only the device
/// pixel ratio applies. Returns `None` when the pointer is outside the
/// surface.
fn pointer_to_pixel(
    pointer: Vec2,
    scale_factor: f64,
    width: u32,
    height: u32,
) -> Option<(u32, u32)> {
    let x = (pointer.x as f64 * scale_factor).floor();
    let y = (pointer.y as f64 * scale_factor).floor();
    if x < 0.0 || y < 0.0 || x >= width as f64 || y >= height as f64 {
        return None;
    }
    Some((x as u32, y as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_conversion_scales_without_flipping() {
        // 400x300 logical at 2x scale = 800x600 physical. Both spaces are
        // top-left origin, so the row index carries straight through.
        let pixel = pointer_to_pixel(Vec2::new(10.0, 20.0), 2.0, 800, 600);
        assert_eq!(pixel, Some((20, 40)));
    }

    #[test]
    fn pointer_conversion_rejects_out_of_bounds() {
        assert_eq!(pointer_to_pixel(Vec2::new(-1.0, 0.0), 1.0, 800, 600), None);
        assert_eq!(
            pointer_to_pixel(Vec2::new(400.0, 0.0), 2.0, 800, 600),
            None
        );
        assert_eq!(
            pointer_to_pixel(Vec2::new(0.0, 300.0), 2.0, 800, 600),
            None
        );
    }

    #[test]
    fn pointer_conversion_keeps_corners_inside() {
        assert_eq!(pointer_to_pixel(Vec2::ZERO, 1.0, 800, 600), Some((0, 0)));
        assert_eq!(
            pointer_to_pixel(Vec2::new(799.0, 599.0), 1.0, 800, 600),
            Some((799, 599))
        );
    }
}
