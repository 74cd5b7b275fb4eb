//! Core GPU context and device management.
//!
//! [`GpuContext`] owns the wgpu surface, device, queue and surface
//! configuration, plus the window scale factor and clear color every pass
//! reads. It is created once at startup and passed by reference to every
//! component that touches the GPU — there is no global context.
//!
//! Construction is fallible: each acquisition step (surface, adapter,
//! device) maps its failure to a distinct [`Error`] variant so setup aborts
//! with a descriptive message instead of a panic.

use std::sync::Arc;

use winit::window::Window;

use crate::error::Error;

/// Core GPU context holding wgpu resources.
///
/// Fields are public for direct wgpu access where a component needs it.
pub struct GpuContext {
    /// The surface for presenting rendered frames to the window.
    pub surface: wgpu::Surface<'static>,
    /// The logical GPU device for creating resources and pipelines.
    pub device: wgpu::Device,
    /// The command queue for submitting work to the GPU.
    pub queue: wgpu::Queue,
    /// Current surface configuration (format, size, present mode).
    pub config: wgpu::SurfaceConfiguration,
    /// Device pixel ratio of the window the surface is bound to.
    pub scale_factor: f64,
    /// Clear color applied by the main pass and framebuffer brackets.
    pub clear_color: wgpu::Color,
}

impl GpuContext {
    /// Create a GPU context bound to a winit window.
    ///
    /// Performs the full wgpu initialization chain: instance → surface →
    /// adapter → device/queue → sRGB surface configuration. The surface is
    /// sized in physical pixels (the window's inner size, which already
    /// accounts for the scale factor).
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let scale_factor = window.scale_factor();
        log::info!(
            "Acquiring GPU context ({}x{} physical, scale {scale_factor})...",
            size.width,
            size.height
        );

        if size.width == 0 || size.height == 0 {
            return Err(Error::ZeroSizedSurface {
                width: size.width,
                height: size.height,
            });
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| Error::SurfaceCreation(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| Error::AdapterRequest(e.to_string()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Glint Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))
        .map_err(|e| Error::DeviceRequest(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            scale_factor,
            clear_color: wgpu::Color {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                a: 1.0,
            },
        })
    }

    /// Resize the surface to new physical dimensions.
    ///
    /// Ignores zero-sized dimensions to avoid wgpu validation errors during
    /// window minimize.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Set the clear color used by the main pass and framebuffer brackets.
    pub fn set_clear_color(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.clear_color = wgpu::Color { r, g, b, a };
    }

    /// Returns the current surface width in physical pixels.
    pub fn width(&self) -> u32 {
        self.config.width
    }

    /// Returns the current surface height in physical pixels.
    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Returns the current aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    /// Surface width in logical units (physical / scale factor). Pointer
    /// coordinates arrive in this space.
    pub fn logical_width(&self) -> f32 {
        self.config.width as f32 / self.scale_factor as f32
    }

    /// Surface height in logical units.
    pub fn logical_height(&self) -> f32 {
        self.config.height as f32 / self.scale_factor as f32
    }
}
