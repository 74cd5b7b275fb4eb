//! Camera state: projection, mode-dependent matrix composition, view matrix.
//!
//! A [`Camera`] owns a [`CameraTransform`], a transform specialization whose
//! matrix composition depends on the camera mode fixed at construction:
//!
//! - **Orbit**: rotate, then translate. Panning along Z changes the orbit
//!   distance directly; the camera circles whatever sits at the origin of
//!   its rotation.
//! - **Free**: translate, then rotate. All three pan axes move along the
//!   camera's own local axes.
//!
//! The order is load-bearing — it is what makes "pan" mean local-axis motion
//! in free mode and distance change in orbit mode.
//!
//! The view matrix is always the exact inverse of the transform's model
//! matrix. The projection matrix is built once from field of view, aspect
//! ratio and the near/far planes; it is not rebuilt automatically on resize,
//! callers reconstruct it via [`Camera::set_aspect`].

use glam::{Mat4, Vec3};

use crate::transform::{Transform, TransformUpdate};

/// How the camera composes its matrices and interprets panning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    /// Rotate-then-translate; Z pan changes orbit distance.
    Orbit,
    /// Translate-then-rotate; all pan axes follow the local basis.
    Free,
}

/// Transform specialization with mode-dependent composition and a derived
/// view matrix.
#[derive(Clone, Debug)]
pub struct CameraTransform {
    pub mode: CameraMode,
    pub transform: Transform,
    /// Inverse of `transform.model`, kept in sync on every update.
    pub view: Mat4,
}

impl CameraTransform {
    pub fn new(mode: CameraMode) -> Self {
        let mut camera = Self {
            mode,
            transform: Transform::new(),
            view: Mat4::IDENTITY,
        };
        camera.update_matrix();
        camera
    }

    /// Apply an update and recompute the model, orientation and view.
    pub fn apply(&mut self, update: &TransformUpdate) -> &mut Self {
        self.transform.merge_components(update);
        self.update_matrix();
        self
    }

    /// Pan relative to the camera.
    ///
    /// Orbit mode suppresses panning along the local right/forward axes:
    /// only the vertical component of the local up axis and a direct Z
    /// distance change apply. Free mode projects all three deltas onto the
    /// current right/up/forward vectors and sums them.
    pub fn pan_xyz(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        let t = &self.transform;

        let delta = match self.mode {
            CameraMode::Orbit => Vec3::new(0.0, t.up.y * y, z),
            CameraMode::Free => {
                t.right.truncate() * x + t.up.truncate() * y + t.forward.truncate() * z
            }
        };

        self.apply(&TransformUpdate::new().position(delta))
    }

    /// Recompute the model matrix with the mode's composition order, then
    /// orientation and view.
    fn update_matrix(&mut self) {
        let t = &mut self.transform;
        let rx = Mat4::from_rotation_x(t.rotation.x.to_radians());
        let ry = Mat4::from_rotation_y(t.rotation.y.to_radians());
        let translate = Mat4::from_translation(t.position);

        // Order important.
        t.model = match self.mode {
            CameraMode::Orbit => ry * rx * translate,
            CameraMode::Free => translate * ry * rx,
        };

        t.calculate_orientation();
        self.view = t.model.inverse();
    }
}

/// Projection matrix plus the mode-specialized transform.
#[derive(Clone, Debug)]
pub struct Camera {
    pub projection: Mat4,
    pub mode: CameraMode,
    pub transform: CameraTransform,

    fov_degrees: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// Build a camera with a perspective projection for the given aspect
    /// ratio. Field of view is in degrees.
    pub fn new(aspect: f32, fov_degrees: f32, near: f32, far: f32, mode: CameraMode) -> Self {
        log::info!("Creating {mode:?} camera (fov {fov_degrees}, aspect {aspect:.3})...");

        Self {
            projection: Mat4::perspective_rh(fov_degrees.to_radians(), aspect, near, far),
            mode,
            transform: CameraTransform::new(mode),
            fov_degrees,
            near,
            far,
        }
    }

    /// Orbit camera with the conventional 45 degree field of view.
    pub fn orbit(aspect: f32) -> Self {
        Self::new(aspect, 45.0, 0.1, 100.0, CameraMode::Orbit)
    }

    /// Free-fly camera with the conventional 45 degree field of view.
    pub fn free(aspect: f32) -> Self {
        Self::new(aspect, 45.0, 0.1, 100.0, CameraMode::Free)
    }

    /// Rebuild the projection for a new viewport aspect ratio. Not called
    /// automatically on resize.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.projection =
            Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far);
    }

    /// The current view matrix (inverse of the transform's model matrix).
    pub fn view(&self) -> Mat4 {
        self.transform.view
    }

    /// Camera position in world space, needed for specular lighting.
    pub fn position(&self) -> Vec3 {
        self.transform.transform.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4Swizzles;

    fn assert_near_identity(m: Mat4) {
        for (value, expected) in m.to_cols_array().iter().zip(Mat4::IDENTITY.to_cols_array()) {
            assert!((value - expected).abs() < 1e-4, "not identity:\n{m}");
        }
    }

    #[test]
    fn view_is_inverse_of_model() {
        for mode in [CameraMode::Orbit, CameraMode::Free] {
            let mut camera = CameraTransform::new(mode);
            camera.apply(
                &TransformUpdate::new()
                    .position(glam::Vec3::new(1.0, -2.0, 7.5))
                    .rotation(glam::Vec3::new(30.0, -60.0, 0.0)),
            );

            assert_near_identity(camera.view * camera.transform.model);
        }
    }

    #[test]
    fn orbit_pan_changes_only_z_distance() {
        let mut camera = CameraTransform::new(CameraMode::Orbit);
        camera.apply(&TransformUpdate::new().rotation(glam::Vec3::new(0.0, 45.0, 0.0)));

        camera.pan_xyz(3.0, 0.0, 2.0);

        assert_eq!(camera.transform.position.x, 0.0);
        assert_eq!(camera.transform.position.y, 0.0);
        assert_eq!(camera.transform.position.z, 2.0);
    }

    #[test]
    fn free_pan_follows_local_axes() {
        let mut camera = CameraTransform::new(CameraMode::Free);
        camera.apply(&TransformUpdate::new().rotation(glam::Vec3::new(0.0, 90.0, 0.0)));

        // Local +X now points along world -Z, so an X pan moves in -Z.
        let right = camera.transform.right.xyz();
        camera.pan_xyz(1.0, 0.0, 0.0);

        let position = camera.transform.position;
        assert!((position - right).length() < 1e-5);
        assert!(position.x.abs() < 1e-5);
        assert!((position.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn orbit_and_free_compose_in_different_orders() {
        let update = TransformUpdate::new()
            .position(glam::Vec3::new(0.0, 0.0, 5.0))
            .rotation(glam::Vec3::new(0.0, 90.0, 0.0));

        let mut orbit = CameraTransform::new(CameraMode::Orbit);
        orbit.apply(&update);
        let mut free = CameraTransform::new(CameraMode::Free);
        free.apply(&update);

        // Orbit rotates first, so the translation lands on a rotated axis;
        // free translates first and stays on the world Z axis.
        let orbit_origin = orbit.transform.model * glam::Vec4::W;
        let free_origin = free.transform.model * glam::Vec4::W;

        assert!((orbit_origin.x - 5.0).abs() < 1e-4);
        assert!(orbit_origin.z.abs() < 1e-4);
        assert!((free_origin.z - 5.0).abs() < 1e-4);
    }

    #[test]
    fn projection_rebuild_is_explicit() {
        let mut camera = Camera::orbit(1.0);
        let before = camera.projection;

        camera.set_aspect(2.0);
        assert_ne!(before, camera.projection);
    }
}
