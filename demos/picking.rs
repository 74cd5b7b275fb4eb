//! Mouse picking demo: three quads rendered into a two-attachment picker
//! framebuffer. Click a quad to decode its model id from the second
//! attachment and print its name.

use glint::{
    AppConfig, Blitter, Camera, FrameUniforms, Light, MeshData, MouseButton, PickerTarget, Shader,
    ShaderFlavor, TransformUpdate, Vec3, run_with_config,
};

fn main() {
    env_logger::init();

    run_with_config(AppConfig::new().title("Picking").size(1024, 768), |ctx| {
        ctx.gpu.set_clear_color(0.1, 0.1, 0.12, 1.0);

        for (i, name) in ["left", "center", "right"].iter().enumerate() {
            let model = ctx
                .resources
                .create_model(ctx.gpu, MeshData::quad(*name, 0.4));
            model.transform.apply(
                &TransformUpdate::new()
                    .position(Vec3::new(i as f32 - 1.0, 0.0, 0.0))
                    .absolute(),
            );
        }

        let mut uniforms = FrameUniforms::new(ctx.gpu);
        let mut shader =
            Shader::new(ctx.gpu, ShaderFlavor::Default, &uniforms).expect("shader setup");
        let blitter = Blitter::new(ctx.gpu);
        let mut picker = PickerTarget::new(ctx.gpu).expect("picker setup");
        let mut picker_size = (ctx.gpu.width(), ctx.gpu.height());

        let mut camera = Camera::free(ctx.gpu.aspect());
        camera.transform.pan_xyz(0.0, 0.0, 3.0);
        let light = Light::new("lamp").position(Vec3::new(0.0, 1.0, 3.0));

        move |frame| {
            camera.set_aspect(frame.gpu.aspect());

            let size = (frame.gpu.width(), frame.gpu.height());
            if size != picker_size {
                picker.resize(frame.gpu).expect("picker resize");
                picker_size = size;
            }

            uniforms.prepare_frame(frame.gpu, Some(&camera), Some(&light), frame.time);

            // Draw the scene into the picker target: attachment 0 is the
            // image, attachment 1 the model ids.
            picker.draw(frame.encoder, frame.gpu.clear_color, |pass| {
                for name in ["left", "center", "right"] {
                    if let Some(model) = frame.resources.model_mut(name) {
                        shader.render_model(frame.gpu, pass, &uniforms, model, frame.textures, true);
                    }
                }
            });

            // Present the visual attachment.
            if let Ok(view) = picker.color_view() {
                blitter.blit(frame.gpu, frame.encoder, view, frame.view);
            }

            if frame.input.mouse_pressed(MouseButton::Left) {
                match picker.pick(frame.gpu, frame.resources, frame.input.mouse_position()) {
                    Ok(Some(pick)) => println!("You clicked {} (id {})", pick.name, pick.id),
                    Ok(None) => println!("Nothing there."),
                    Err(e) => eprintln!("Pick failed: {e}"),
                }
            }
        }
    });
}
