//! Windowed application harness.
//!
//! [`run`] wires the pieces together: window, [`GpuContext`], registries,
//! input tracking and the [`RenderLoop`]. The caller's setup closure builds
//! the scene (all asset loading happens here, before the loop starts) and
//! returns the per-frame render callback; the callback receives a [`Frame`]
//! with the command encoder, the surface and depth views, and the
//! frame-timing state, and records its own passes.

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::gpu::GpuContext;
use crate::input::Input;
use crate::render_loop::RenderLoop;
use crate::resources::ResourceManager;
use crate::shader::DEPTH_FORMAT;
use crate::texture::TextureRegistry;

/// Configuration for the app window.
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Glint".to_string(),
            width: 800,
            height: 600,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Context provided during app setup.
pub struct SetupContext<'a> {
    pub gpu: &'a mut GpuContext,
    pub resources: &'a mut ResourceManager,
    pub textures: &'a mut TextureRegistry,
}

/// Context provided each frame for rendering.
pub struct Frame<'a> {
    pub gpu: &'a GpuContext,
    pub resources: &'a mut ResourceManager,
    pub textures: &'a mut TextureRegistry,
    pub input: &'a Input,
    /// Encoder the frame's passes record into; submitted after the
    /// callback returns.
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// This frame's surface view.
    pub view: &'a wgpu::TextureView,
    /// Depth view matching the surface size.
    pub depth_view: &'a wgpu::TextureView,
    /// Animation speed factor normalized to a 60 Hz reference frame.
    pub speed_factor: f32,
    /// Total elapsed seconds.
    pub time: f32,
    /// Smoothed frame rate.
    pub fps: f32,
}

/// Begin the main scene pass over a color view and depth view, clearing
/// both. The pass ends when the returned value drops.
pub fn scene_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    color: &wgpu::TextureView,
    depth: &wgpu::TextureView,
    clear: wgpu::Color,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Scene Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Scene Depth"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Run an application with the default window configuration.
pub fn run<S, F>(setup: S)
where
    S: FnOnce(&mut SetupContext) -> F + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    run_with_config(AppConfig::default(), setup);
}

/// Run an application with a custom window configuration.
///
/// ```ignore
/// glint::run_with_config(AppConfig::new().title("Orbit").size(1280, 720), |ctx| {
///     ctx.resources.create_model(ctx.gpu, MeshData::cube("cube", 1.0, false));
///     move |frame| {
///         // record passes against frame.encoder
///     }
/// });
/// ```
pub fn run_with_config<S, F>(config: AppConfig, setup: S)
where
    S: FnOnce(&mut SetupContext) -> F + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    let event_loop = EventLoop::new().expect("failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::Pending {
        config,
        setup: Some(Box::new(move |ctx: &mut SetupContext| {
            Box::new(setup(ctx)) as Box<dyn FnMut(&mut Frame)>
        })),
    };

    event_loop.run_app(&mut app).expect("event loop failed");
}

type SetupFn = Box<dyn FnOnce(&mut SetupContext) -> Box<dyn FnMut(&mut Frame)>>;

enum App {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        resources: ResourceManager,
        textures: TextureRegistry,
        input: Input,
        render_loop: RenderLoop,
        depth_view: wgpu::TextureView,
        frame_fn: Box<dyn FnMut(&mut Frame)>,
        start_time: Instant,
    },
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let App::Pending { config, setup } = self else {
            return;
        };

        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("failed to create window"),
        );

        let mut gpu = match GpuContext::new(window.clone()) {
            Ok(gpu) => gpu,
            Err(e) => {
                log::error!("GPU setup failed: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut resources = ResourceManager::new();
        let mut textures = TextureRegistry::new();

        let setup_fn = setup.take().expect("setup already consumed");
        let frame_fn = {
            let mut ctx = SetupContext {
                gpu: &mut gpu,
                resources: &mut resources,
                textures: &mut textures,
            };
            setup_fn(&mut ctx)
        };

        let mut render_loop = RenderLoop::new();
        render_loop.start();

        let depth_view = create_depth_view(&gpu);

        *self = App::Running {
            window,
            gpu,
            resources,
            textures,
            input: Input::new(),
            render_loop,
            depth_view,
            frame_fn,
            start_time: Instant::now(),
        };
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let App::Running {
            window,
            gpu,
            resources,
            textures,
            input,
            render_loop,
            depth_view,
            frame_fn,
            start_time,
        } = self
        else {
            return;
        };

        input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                render_loop.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
                *depth_view = create_depth_view(gpu);
            }
            WindowEvent::RedrawRequested => {
                let time = start_time.elapsed().as_secs_f64();

                let fps = render_loop.fps();
                render_loop.tick(time, |speed_factor| {
                    // Video sources are the one mid-frame upload.
                    textures.update_video_textures(gpu);

                    let output = match gpu.surface.get_current_texture() {
                        Ok(output) => output,
                        Err(e) => {
                            log::warn!("Surface frame unavailable: {e}");
                            return;
                        }
                    };
                    let view = output
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());

                    let mut encoder =
                        gpu.device
                            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                                label: Some("Frame Encoder"),
                            });

                    let mut frame = Frame {
                        gpu,
                        resources,
                        textures,
                        input,
                        encoder: &mut encoder,
                        view: &view,
                        depth_view,
                        speed_factor,
                        time: time as f32,
                        fps,
                    };
                    frame_fn(&mut frame);

                    gpu.queue.submit(std::iter::once(encoder.finish()));
                    output.present();
                });

                input.begin_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}
