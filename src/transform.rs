//! Spatial state for models, cameras and lights.
//!
//! A [`Transform`] stores position, scale and Euler rotation (degrees) and
//! keeps three pieces of derived state permanently in sync with them: the
//! model matrix, the normal matrix (inverse-transpose of the model matrix's
//! upper 3×3, so non-uniform scaling does not skew lighting normals), and
//! the orientation basis (the world unit axes carried through the model
//! matrix, giving the object's current right/up/forward directions).
//!
//! Updates go through [`Transform::apply`] with a [`TransformUpdate`], which
//! can be incremental (add a delta to the current component) or absolute
//! (replace the component). Every apply recomputes all derived state
//! synchronously, so reads never observe a stale matrix.

use glam::{Mat3, Mat4, Vec3, Vec4};

/// A partial update to a transform.
///
/// Components left as `None` are untouched. `incremental` (the default)
/// adds each supplied component to the current value; an absolute update
/// replaces it.
///
/// ```
/// use glint::{Transform, TransformUpdate, Vec3};
///
/// let mut t = Transform::new();
/// t.apply(&TransformUpdate::new().position(Vec3::new(1.0, 0.0, 0.0)));
/// t.apply(&TransformUpdate::new().position(Vec3::new(1.0, 0.0, 0.0)));
/// assert_eq!(t.position.x, 2.0);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct TransformUpdate {
    pub position: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub incremental: bool,
}

impl Default for TransformUpdate {
    fn default() -> Self {
        Self {
            position: None,
            scale: None,
            rotation: None,
            incremental: true,
        }
    }
}

impl TransformUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Rotation in Euler degrees around X, Y and Z.
    pub fn rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Replace components instead of adding to them.
    pub fn absolute(mut self) -> Self {
        self.incremental = false;
        self
    }
}

/// Position, scale and rotation plus derived matrices and orientation basis.
#[derive(Clone, Debug)]
pub struct Transform {
    /// World-space position.
    pub position: Vec3,
    /// Per-axis scale factors.
    pub scale: Vec3,
    /// Euler rotation in degrees around X, Y and Z.
    pub rotation: Vec3,

    /// Derived model matrix, always consistent with the fields above.
    pub model: Mat4,
    /// Inverse-transpose of the model matrix's upper 3×3.
    pub normal: Mat3,

    /// Current local +X axis in world space.
    pub right: Vec4,
    /// Current local +Y axis in world space.
    pub up: Vec4,
    /// Current local +Z axis in world space.
    pub forward: Vec4,
}

impl Default for Transform {
    fn default() -> Self {
        let mut transform = Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            model: Mat4::IDENTITY,
            normal: Mat3::IDENTITY,
            right: Vec4::X,
            up: Vec4::Y,
            forward: Vec4::Z,
        };
        transform.update_matrix();
        transform
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an update and recompute all derived state.
    pub fn apply(&mut self, update: &TransformUpdate) -> &mut Self {
        self.merge_components(update);
        self.update_matrix();
        self
    }

    /// Fold the update into the raw components without recomputing derived
    /// state. Camera transforms use this and then run their own matrix
    /// composition.
    pub(crate) fn merge_components(&mut self, update: &TransformUpdate) {
        if let Some(position) = update.position {
            self.position = if update.incremental {
                self.position + position
            } else {
                position
            };
        }
        if let Some(scale) = update.scale {
            self.scale = if update.incremental {
                self.scale + scale
            } else {
                scale
            };
        }
        if let Some(rotation) = update.rotation {
            self.rotation = if update.incremental {
                self.rotation + rotation
            } else {
                rotation
            };
        }
    }

    /// Recompute the model matrix, normal matrix and orientation basis.
    ///
    /// The composition order is fixed: translate, rotate X, rotate Y,
    /// rotate Z, scale. Rotation is therefore about the object's own
    /// post-translation axes, and scale never distorts the rotation axes.
    pub fn update_matrix(&mut self) -> Mat4 {
        self.model = Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_scale(self.scale);

        self.calculate_normal();
        self.calculate_orientation();

        self.model
    }

    pub(crate) fn calculate_normal(&mut self) -> Mat3 {
        self.normal = Mat3::from_mat4(self.model).inverse().transpose();
        self.normal
    }

    pub(crate) fn calculate_orientation(&mut self) {
        self.right = self.model * Vec4::X;
        self.up = self.model * Vec4::Y;
        self.forward = self.model * Vec4::Z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat4_eq(a: Mat4, b: Mat4) {
        for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array().iter()) {
            assert!((x - y).abs() < 1e-5, "matrices differ:\n{a}\n{b}");
        }
    }

    #[test]
    fn model_matrix_matches_fixed_composition() {
        let mut t = Transform::new();
        t.apply(
            &TransformUpdate::new()
                .position(Vec3::new(1.0, 2.0, 3.0))
                .rotation(Vec3::new(90.0, 0.0, 0.0))
                .scale(Vec3::new(1.0, 0.0, 0.0)),
        );

        let expected = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
            * Mat4::from_rotation_x(90f32.to_radians())
            * Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));

        assert_mat4_eq(t.model, expected);
    }

    #[test]
    fn incremental_updates_accumulate() {
        let mut t = Transform::new();
        let step = TransformUpdate::new().position(Vec3::new(1.0, 0.0, 0.0));

        t.apply(&step);
        t.apply(&step);
        assert_eq!(t.position, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn absolute_updates_replace() {
        let mut t = Transform::new();
        let step = TransformUpdate::new()
            .position(Vec3::new(1.0, 0.0, 0.0))
            .absolute();

        t.apply(&step);
        t.apply(&step);
        assert_eq!(t.position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn unsupplied_components_are_untouched() {
        let mut t = Transform::new();
        t.apply(&TransformUpdate::new().rotation(Vec3::new(0.0, 45.0, 0.0)));

        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.rotation, Vec3::new(0.0, 45.0, 0.0));
    }

    #[test]
    fn normal_matrix_is_inverse_transpose() {
        let mut t = Transform::new();
        t.apply(
            &TransformUpdate::new()
                .rotation(Vec3::new(0.0, 30.0, 0.0))
                .scale(Vec3::new(1.0, 1.0, 0.0)),
        );

        let expected = Mat3::from_mat4(t.model).inverse().transpose();
        for (x, y) in t
            .normal
            .to_cols_array()
            .iter()
            .zip(expected.to_cols_array().iter())
        {
            assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn orientation_follows_rotation() {
        let mut t = Transform::new();
        t.apply(&TransformUpdate::new().rotation(Vec3::new(0.0, 90.0, 0.0)));

        // After a 90 degree yaw the local +X axis points along world -Z.
        assert!(t.right.x.abs() < 1e-5);
        assert!((t.right.z + 1.0).abs() < 1e-5);
    }
}
