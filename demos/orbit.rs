//! Orbit camera demo: a rotating cube over a grid, lit by a light circling
//! the scene.
//!
//! Controls:
//! - Drag: pan the camera
//! - Shift-drag or middle-drag: rotate the orbit
//! - Wheel: zoom

use glint::{
    AppConfig, Camera, CameraController, FrameUniforms, Light, MeshData, RotatingLight, Shader,
    ShaderFlavor, TransformUpdate, Vec2, Vec3, run_with_config, scene_pass,
};

fn main() {
    env_logger::init();

    run_with_config(AppConfig::new().title("Orbit").size(1280, 720), |ctx| {
        // Setup: geometry, shader, camera, light.
        ctx.gpu.set_clear_color(0.05, 0.05, 0.08, 1.0);
        ctx.resources
            .create_model(ctx.gpu, MeshData::grid("grid"));
        ctx.resources
            .create_model(ctx.gpu, MeshData::cube("cube", 0.6, false));

        let mut uniforms = FrameUniforms::new(ctx.gpu);
        let mut shader =
            Shader::new(ctx.gpu, ShaderFlavor::Default, &uniforms).expect("shader setup");

        let mut camera = Camera::orbit(ctx.gpu.aspect());
        camera
            .transform
            .apply(&TransformUpdate::new().rotation(Vec3::new(-25.0, 40.0, 0.0)));
        camera.transform.pan_xyz(0.0, 0.0, 3.0);

        let mut controller = CameraController::new(
            ctx.gpu.logical_width(),
            ctx.gpu.logical_height(),
            Vec2::ZERO,
        )
        .expect("controller setup");

        let mut sun = RotatingLight::new(Light::new("sun")).radius(2.0);
        sun.light
            .register_debug_pixel(ctx.gpu, ctx.resources);

        // Frame loop
        move |frame| {
            controller.resize(frame.gpu.logical_width(), frame.gpu.logical_height());
            camera.set_aspect(frame.gpu.aspect());
            controller.update(&mut camera, frame.input);

            sun.animate(frame.speed_factor);
            sun.light.sync_debug_pixel(frame.resources);

            if let Some(cube) = frame.resources.model_mut("cube") {
                cube.transform.apply(
                    &TransformUpdate::new()
                        .rotation(Vec3::new(0.0, 0.8 * frame.speed_factor, 0.0)),
                );
            }
            if let Some(grid) = frame.resources.model_mut("grid") {
                grid.transform.apply(
                    &TransformUpdate::new()
                        .position(Vec3::new(0.0, -0.6, 0.0))
                        .rotation(Vec3::new(-90.0, 0.0, 0.0))
                        .absolute(),
                );
            }

            uniforms.prepare_frame(frame.gpu, Some(&camera), Some(&sun.light), frame.time);

            let mut pass = scene_pass(
                frame.encoder,
                frame.view,
                frame.depth_view,
                frame.gpu.clear_color,
            );
            let pixel_name = sun.light.debug_pixel_name();
            for name in ["grid", "cube", pixel_name.as_str()] {
                if let Some(model) = frame.resources.model_mut(name) {
                    shader.render_model(frame.gpu, &mut pass, &uniforms, model, frame.textures, false);
                }
            }
        }
    });
}
