//! Positional light parameters and the rotating light animation.
//!
//! A [`Light`] carries a color, Phong strength scalars and an owned
//! [`Transform`] for its position. [`RotatingLight`] wraps a light with an
//! orbit animation advanced each frame by the render loop's speed factor.

use glam::Vec3;

use crate::gpu::GpuContext;
use crate::mesh::{DrawMode, MeshData};
use crate::resources::ResourceManager;
use crate::transform::{Transform, TransformUpdate};

/// Linearly remap `x` from `[x_min, x_max]` to `[out_min, out_max]`.
pub(crate) fn map_range(x: f32, x_min: f32, x_max: f32, out_min: f32, out_max: f32) -> f32 {
    ((x - x_min) / (x_max - x_min)) * (out_max - out_min) + out_min
}

/// A positional light with Phong strength parameters.
#[derive(Clone, Debug)]
pub struct Light {
    pub name: String,
    /// Normalized RGB color.
    pub color: Vec3,
    /// Ambient term strength in [0, 1].
    pub ambient_strength: f32,
    /// Diffuse term strength in [0, 1].
    pub diffuse_strength: f32,
    /// Specular term strength in [0, 1].
    pub specular_strength: f32,
    /// Specular shininess exponent, >= 1.
    pub specular_shininess: f32,
    /// Position lives here; animations and callers mutate it.
    pub transform: Transform,
}

impl Light {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Vec3::ONE,
            ambient_strength: 0.15,
            diffuse_strength: 0.7,
            specular_strength: 0.15,
            specular_shininess: 128.0,
            transform: Transform::new(),
        }
    }

    pub fn color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn strengths(mut self, ambient: f32, diffuse: f32, specular: f32) -> Self {
        self.ambient_strength = ambient;
        self.diffuse_strength = diffuse;
        self.specular_strength = specular;
        self
    }

    pub fn shininess(mut self, shininess: f32) -> Self {
        self.specular_shininess = shininess;
        self
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.transform
            .apply(&TransformUpdate::new().position(position).absolute());
        self
    }

    /// Name of the debug point model registered by
    /// [`Light::register_debug_pixel`].
    pub fn debug_pixel_name(&self) -> String {
        format!("{}-debug-pixel", self.name)
    }

    /// Register a single red point model at the light's position so the
    /// light can be seen while tuning a scene.
    pub fn register_debug_pixel(&self, gpu: &GpuContext, resources: &mut ResourceManager) {
        let position = self.transform.position;
        let mesh = MeshData {
            name: self.debug_pixel_name(),
            draw_mode: DrawMode::Points,
            positions: vec![position.x, position.y, position.z],
            normals: vec![0.0, 0.0, 0.0],
            uvs: vec![0.0, 0.0],
            colors: vec![1.0, 0.0, 0.0, 1.0],
            indices: vec![],
        };
        resources.create_model(gpu, mesh);
        self.sync_debug_pixel(resources);
    }

    /// Copy the light's transform onto its debug point model, keeping the
    /// visualization bound to the same position.
    pub fn sync_debug_pixel(&self, resources: &mut ResourceManager) {
        if let Some(model) = resources.model_mut(&self.debug_pixel_name()) {
            model.transform = self.transform.clone();
        }
    }
}

/// A light that orbits the origin, rising and falling on a sine curve.
#[derive(Clone, Debug)]
pub struct RotatingLight {
    pub light: Light,

    /// Orbit radius in world units.
    pub radius: f32,
    /// Current angle around the orbit, radians.
    pub current_angle: f32,
    /// Phase of the vertical sine curve, radians.
    pub current_height: f32,
    /// Angle advance per unit speed factor.
    pub rotate_speed: f32,
    /// Height phase advance per unit speed factor.
    pub vertical_speed: f32,
}

impl RotatingLight {
    pub fn new(light: Light) -> Self {
        Self {
            light,
            radius: 1.5,
            current_angle: 0.0,
            current_height: 0.0,
            rotate_speed: 0.05,
            vertical_speed: 0.05,
        }
    }

    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn speeds(mut self, rotate: f32, vertical: f32) -> Self {
        self.rotate_speed = rotate;
        self.vertical_speed = vertical;
        self
    }

    pub fn initial_angle(mut self, angle: f32) -> Self {
        self.current_angle = angle;
        self
    }

    pub fn initial_height(mut self, height: f32) -> Self {
        self.current_height = height;
        self
    }

    /// Advance the orbit by the frame's speed factor and write the new
    /// position into the light's transform (absolute, not incremental).
    pub fn animate(&mut self, speed_factor: f32) {
        self.current_angle += self.rotate_speed * speed_factor;
        self.current_height += self.vertical_speed * speed_factor;

        let x = self.radius * self.current_angle.cos();
        let z = self.radius * self.current_angle.sin();
        let y = map_range(self.current_height.sin(), -1.0, 1.0, 0.0, 2.0);

        self.light.transform.apply(
            &TransformUpdate::new()
                .position(Vec3::new(x, y, z))
                .absolute(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_convention() {
        let light = Light::new("light");
        assert_eq!(light.color, Vec3::ONE);
        assert_eq!(light.ambient_strength, 0.15);
        assert_eq!(light.diffuse_strength, 0.7);
        assert_eq!(light.specular_strength, 0.15);
        assert_eq!(light.specular_shininess, 128.0);
    }

    #[test]
    fn animate_places_light_on_orbit() {
        let mut rotating = RotatingLight::new(Light::new("sun")).radius(2.0);
        rotating.animate(0.0);

        // Angle 0: x = radius, z = 0, height maps sin(0) to mid-range 1.
        let position = rotating.light.transform.position;
        assert!((position.x - 2.0).abs() < 1e-5);
        assert!((position.y - 1.0).abs() < 1e-5);
        assert!(position.z.abs() < 1e-5);
    }

    #[test]
    fn animate_scales_with_speed_factor() {
        let mut slow = RotatingLight::new(Light::new("a"));
        let mut fast = RotatingLight::new(Light::new("b"));

        slow.animate(1.0);
        slow.animate(1.0);
        fast.animate(2.0);

        assert!((slow.current_angle - fast.current_angle).abs() < 1e-6);
        assert!((slow.current_height - fast.current_height).abs() < 1e-6);
    }

    #[test]
    fn height_stays_in_mapped_band() {
        let mut rotating = RotatingLight::new(Light::new("sun"));
        for _ in 0..500 {
            rotating.animate(1.7);
            let y = rotating.light.transform.position.y;
            assert!((0.0..=2.0).contains(&y));
        }
    }
}
