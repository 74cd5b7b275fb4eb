//! Pointer-driven camera controller.
//!
//! Translates the generic pointer signal tracked by [`Input`] into camera
//! transform updates. Two implicit states: idle and dragging. A press on the
//! left or middle button enters dragging and records the initial and
//! previous pointer position (adjusted for the surface offset); release
//! returns to idle. While dragging with the rotate modifier held (shift, or
//! the middle button that started the drag), movement maps to rotation —
//! vertical delta to pitch, horizontal delta to yaw, both inverted and
//! scaled by per-axis rates normalized to the surface size. Without the
//! modifier, movement maps to panning. Wheel input, clamped to one step per
//! event, maps to a zoom pan along local Z.
//!
//! Malformed or unconsumed events are ignored silently; the only failure
//! mode is construction against a surface that cannot report its size.

use glam::Vec2;
use winit::event::MouseButton;

use crate::camera::Camera;
use crate::error::Error;
use crate::input::Input;
use crate::transform::TransformUpdate;

/// Default rotation rate in degrees per full surface sweep.
const ROTATE_RATE: f32 = 300.0;
/// Default pan rate in world units per full surface sweep.
const PAN_RATE: f32 = 5.0;
/// Default zoom rate in world units per full surface height of wheel steps.
const ZOOM_RATE: f32 = 200.0;

/// Maps pointer input to camera rotation, panning and zoom.
pub struct CameraController {
    pub rotate_rate: f32,
    pub pan_rate: f32,
    pub zoom_rate: f32,

    surface_size: Vec2,
    offset: Vec2,

    dragging: bool,
    rotate_held: bool,
    initial_position: Vec2,
    previous_position: Vec2,
}

impl CameraController {
    /// Bind the controller to a drawable surface of the given logical size.
    ///
    /// Fails when the surface reports a zero-sized bounding geometry, since
    /// every rate is normalized by it.
    pub fn new(surface_width: f32, surface_height: f32, offset: Vec2) -> Result<Self, Error> {
        log::info!("Binding camera controller to pointer events...");

        if surface_width <= 0.0 || surface_height <= 0.0 {
            return Err(Error::ZeroSizedSurface {
                width: surface_width as u32,
                height: surface_height as u32,
            });
        }

        Ok(Self {
            rotate_rate: ROTATE_RATE,
            pan_rate: PAN_RATE,
            zoom_rate: ZOOM_RATE,
            surface_size: Vec2::new(surface_width, surface_height),
            offset,
            dragging: false,
            rotate_held: false,
            initial_position: Vec2::ZERO,
            previous_position: Vec2::ZERO,
        })
    }

    /// Track a surface resize so the effective rates stay normalized.
    pub fn resize(&mut self, surface_width: f32, surface_height: f32) {
        if surface_width > 0.0 && surface_height > 0.0 {
            self.surface_size = Vec2::new(surface_width, surface_height);
        }
    }

    /// The pointer position recorded when the current drag started.
    pub fn initial_position(&self) -> Vec2 {
        self.initial_position
    }

    /// Whether a drag is in progress.
    pub fn dragging(&self) -> bool {
        self.dragging
    }

    /// Consume this frame's pointer state and update the camera transform.
    pub fn update(&mut self, camera: &mut Camera, input: &Input) {
        if input.mouse_pressed(MouseButton::Left) || input.mouse_pressed(MouseButton::Middle) {
            let position = input.mouse_position() - self.offset;
            self.initial_position = position;
            self.previous_position = position;
            self.dragging = true;
            self.rotate_held = input.mouse_pressed(MouseButton::Middle);
        }

        if input.mouse_released(MouseButton::Left) || input.mouse_released(MouseButton::Middle) {
            self.dragging = false;
            self.rotate_held = false;
        }

        if self.dragging {
            let position = input.mouse_position() - self.offset;
            let delta = position - self.previous_position;

            if delta != Vec2::ZERO {
                if input.shift_down() || self.rotate_held {
                    let rate = Vec2::new(
                        self.rotate_rate / self.surface_size.x,
                        self.rotate_rate / self.surface_size.y,
                    );
                    camera.transform.apply(&TransformUpdate::new().rotation(glam::Vec3::new(
                        -delta.y * rate.y,
                        -delta.x * rate.x,
                        0.0,
                    )));
                } else {
                    let rate = Vec2::new(
                        self.pan_rate / self.surface_size.x,
                        self.pan_rate / self.surface_size.y,
                    );
                    camera
                        .transform
                        .pan_xyz(-delta.x * rate.x, delta.y * rate.y, 0.0);
                }
            }

            self.previous_position = position;
        }

        // Already clamped to one step per event by the input tracker.
        let scroll = input.scroll_delta().y;
        if scroll != 0.0 {
            let zoom = scroll * (self.zoom_rate / self.surface_size.y);
            camera.transform.pan_xyz(0.0, 0.0, zoom);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraMode;

    #[test]
    fn construction_requires_nonzero_surface() {
        assert!(CameraController::new(0.0, 600.0, Vec2::ZERO).is_err());
        assert!(CameraController::new(800.0, 600.0, Vec2::ZERO).is_ok());
    }

    #[test]
    fn drag_state_follows_press_and_release() {
        let mut controller = CameraController::new(800.0, 600.0, Vec2::ZERO).unwrap();
        let mut camera = Camera::new(1.0, 45.0, 0.1, 100.0, CameraMode::Orbit);
        let mut input = Input::new();

        input.move_to(100.0, 100.0);
        input.press(MouseButton::Left);
        controller.update(&mut camera, &input);
        assert!(controller.dragging());
        assert_eq!(controller.initial_position(), Vec2::new(100.0, 100.0));

        input.begin_frame();
        input.release(MouseButton::Left);
        controller.update(&mut camera, &input);
        assert!(!controller.dragging());
    }

    #[test]
    fn drag_without_modifier_pans() {
        let mut controller = CameraController::new(800.0, 600.0, Vec2::ZERO).unwrap();
        let mut camera = Camera::new(1.0, 45.0, 0.1, 100.0, CameraMode::Free);
        let mut input = Input::new();

        input.press(MouseButton::Left);
        controller.update(&mut camera, &input);

        input.begin_frame();
        input.move_to(0.0, 60.0);
        controller.update(&mut camera, &input);

        // A downward drag pans up; no rotation happens.
        assert_eq!(camera.transform.transform.rotation, glam::Vec3::ZERO);
        assert!(camera.transform.transform.position.y > 0.0);
    }

    #[test]
    fn middle_button_drag_rotates() {
        let mut controller = CameraController::new(800.0, 600.0, Vec2::ZERO).unwrap();
        let mut camera = Camera::new(1.0, 45.0, 0.1, 100.0, CameraMode::Orbit);
        let mut input = Input::new();

        input.press(MouseButton::Middle);
        controller.update(&mut camera, &input);

        input.begin_frame();
        input.move_to(80.0, 0.0);
        controller.update(&mut camera, &input);

        // A rightward drag yaws negative.
        assert!(camera.transform.transform.rotation.y < 0.0);
        assert_eq!(camera.transform.transform.position, glam::Vec3::ZERO);
    }

    #[test]
    fn shift_drag_rotates_instead_of_panning() {
        let mut controller = CameraController::new(800.0, 600.0, Vec2::ZERO).unwrap();
        let mut camera = Camera::new(1.0, 45.0, 0.1, 100.0, CameraMode::Orbit);
        let mut input = Input::new();

        input.press(MouseButton::Left);
        input.set_shift(true);
        controller.update(&mut camera, &input);

        input.begin_frame();
        input.move_to(0.0, 30.0);
        controller.update(&mut camera, &input);

        // A downward drag pitches negative.
        assert!(camera.transform.transform.rotation.x < 0.0);
        assert_eq!(camera.transform.transform.position, glam::Vec3::ZERO);
    }

    #[test]
    fn wheel_zoom_is_clamped_per_event() {
        let mut controller = CameraController::new(800.0, 600.0, Vec2::ZERO).unwrap();
        let mut camera = Camera::new(1.0, 45.0, 0.1, 100.0, CameraMode::Orbit);
        let mut input = Input::new();

        input.wheel(40.0);
        controller.update(&mut camera, &input);

        // 40 wheel lines in one event clamp to a single step.
        let expected = ZOOM_RATE / 600.0;
        assert!((camera.transform.transform.position.z - expected).abs() < 1e-5);
    }

    #[test]
    fn stacked_wheel_events_each_zoom_a_step() {
        let mut controller = CameraController::new(800.0, 600.0, Vec2::ZERO).unwrap();
        let mut camera = Camera::new(1.0, 45.0, 0.1, 100.0, CameraMode::Orbit);
        let mut input = Input::new();

        // Two events land in the same frame; the clamp is per event, so
        // both steps apply.
        input.wheel(3.0);
        input.wheel(3.0);
        controller.update(&mut camera, &input);

        let expected = 2.0 * ZOOM_RATE / 600.0;
        assert!((camera.transform.transform.position.z - expected).abs() < 1e-5);
    }
}
