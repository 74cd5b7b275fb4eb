//! # Glint
//!
//! **A small immediate-mode 3D renderer with no scene graph.**
//!
//! Declare geometry, compile a shader flavor, position a camera and a
//! light, and drive everything from a per-frame callback. Resource lifetime
//! is explicit: named registries own the models and textures, a shader owns
//! its pipelines and uniform plumbing, and off-screen framebuffers (for
//! picking and post-processing) bracket their own attachment state.
//!
//! ## Quick start
//!
//! ```no_run
//! use glint::*;
//!
//! fn main() {
//!     run(|ctx| {
//!         ctx.resources
//!             .create_model(ctx.gpu, MeshData::cube("cube", 1.0, false));
//!         let mut uniforms = FrameUniforms::new(ctx.gpu);
//!         let mut shader = Shader::new(ctx.gpu, ShaderFlavor::Default, &uniforms).unwrap();
//!         let mut camera = Camera::orbit(ctx.gpu.aspect());
//!         camera.transform.pan_xyz(0.0, 0.0, 4.0);
//!         let light = Light::new("sun").position(Vec3::new(2.0, 2.0, 2.0));
//!
//!         move |frame| {
//!             uniforms.prepare_frame(frame.gpu, Some(&camera), Some(&light), frame.time);
//!             let mut pass = scene_pass(
//!                 frame.encoder,
//!                 frame.view,
//!                 frame.depth_view,
//!                 frame.gpu.clear_color,
//!             );
//!             if let Some(cube) = frame.resources.model_mut("cube") {
//!                 cube.transform.apply(
//!                     &TransformUpdate::new().rotation(Vec3::new(0.0, frame.speed_factor, 0.0)),
//!                 );
//!                 shader.render_model(frame.gpu, &mut pass, &uniforms, cube, frame.textures, false);
//!             }
//!         }
//!     });
//! }
//! ```

mod app;
mod camera;
mod controller;
mod error;
mod framebuffer;
mod gpu;
mod input;
mod light;
mod mesh;
mod model;
mod render_loop;
mod resources;
mod shader;
mod texture;
mod transform;
mod uniforms;

pub use app::{AppConfig, Frame, SetupContext, run, run_with_config, scene_pass};
pub use camera::{Camera, CameraMode, CameraTransform};
pub use controller::CameraController;
pub use error::Error;
pub use framebuffer::{Blitter, FrameBufferObject, Pick, PickerTarget};
pub use gpu::GpuContext;
pub use input::Input;
pub use light::{Light, RotatingLight};
pub use mesh::{DrawMode, MeshData};
pub use model::{Model, TEXTURE_SLOTS, VERTEX_LAYOUTS};
pub use render_loop::RenderLoop;
pub use resources::ResourceManager;
pub use shader::{DEPTH_FORMAT, FrameUniforms, PICKER_FORMAT, Shader, ShaderFlavor};
pub use texture::{CUBE_FACE_ORDER, Texture, TextureRegistry, TextureRole, VideoSource};
pub use transform::{Transform, TransformUpdate};
pub use uniforms::{BlockLayout, CameraBlock, LightBlock, Lookup, ModelBlock, UniformManager};

// Re-export glam math types for convenience
pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
