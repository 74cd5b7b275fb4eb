//! Uniform block layouts and the staged-write manager.
//!
//! GPU-side uniform data travels in three POD blocks: [`CameraBlock`]
//! (shared by every pipeline at bind group 0), [`LightBlock`] (alongside it)
//! and [`ModelBlock`] (per model at bind group 1). A [`UniformManager`]
//! fronts one block: writes are enqueued by field name, resolved against the
//! declared [`BlockLayout`] through a three-state lookup cache, staged into
//! a CPU copy of the block, and flushed to the GPU buffer in a single write
//! immediately before the draw that consumes them.
//!
//! A name that does not resolve logs exactly one warning and is skipped on
//! every later write — a stripped or misspelled uniform degrades the frame,
//! it never aborts it.

use std::collections::HashMap;

use glam::{Mat3, Mat4, Vec3};

/// Camera data shared across all pipelines, bind group 0 binding 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraBlock {
    pub projection: [f32; 16],
    pub view: [f32; 16],
    /// Camera world position, needed for specular lighting. Fourth
    /// component pads to vec4.
    pub position: [f32; 4],
    /// Elapsed time in seconds; the cubemap cross-fade reads it.
    pub time: f32,
    pub _pad: [f32; 3],
}

/// Light parameters, bind group 0 binding 1.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightBlock {
    pub position: [f32; 3],
    pub ambient_strength: f32,
    pub color: [f32; 3],
    pub diffuse_strength: f32,
    pub specular_strength: f32,
    pub specular_shininess: f32,
    pub _pad: [f32; 2],
}

/// Per-model data, bind group 1 binding 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelBlock {
    pub model: [f32; 16],
    /// Normal matrix, column-padded to three vec4 columns plus one spare.
    pub normal: [f32; 16],
    /// Nonzero when the model has any texture slot bound.
    pub has_texture: u32,
    /// Model id normalized to [0, 1] for the picking attachment.
    pub model_id: f32,
    pub _pad: [f32; 2],
}

/// Declared field layout of one uniform block: sequential named fields with
/// explicit byte sizes.
pub struct BlockLayout {
    name: &'static str,
    fields: HashMap<&'static str, (usize, usize)>,
    size: usize,
}

impl BlockLayout {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: HashMap::new(),
            size: 0,
        }
    }

    /// Append a field of `size` bytes at the current end of the block.
    pub fn field(mut self, field: &'static str, size: usize) -> Self {
        self.fields.insert(field, (self.size, size));
        self.size += size;
        self
    }

    /// The camera block as the shaders declare it.
    pub fn camera() -> Self {
        Self::new("Camera")
            .field("u_ProjectionMatrix", 64)
            .field("u_ViewMatrix", 64)
            .field("u_CameraPosition", 16)
            .field("u_Time", 16)
    }

    /// The light block as the shaders declare it.
    pub fn light() -> Self {
        Self::new("Light")
            .field("u_LightPosition", 16)
            .field("u_LightColor", 16)
            .field("u_LightStrengths", 16)
    }

    /// The per-model block as the shaders declare it.
    pub fn model() -> Self {
        Self::new("Model")
            .field("u_ModelMatrix", 64)
            .field("u_NormalMatrix", 64)
            .field("u_HasTexture", 4)
            .field("u_ModelId", 4)
            .field("u_ModelPad", 8)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn find(&self, field: &str) -> Option<(usize, usize)> {
        self.fields.get(field).copied()
    }
}

/// Resolution state of one uniform name, cached per manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    NotYetChecked,
    Found { offset: usize, size: usize },
    NotFound,
}

/// Staged writes against one uniform block.
pub struct UniformManager {
    layout: BlockLayout,
    staging: Vec<u8>,
    cache: HashMap<String, Lookup>,
    dirty: bool,
}

impl UniformManager {
    pub fn new(layout: BlockLayout) -> Self {
        let staging = vec![0u8; layout.size()];
        Self {
            layout,
            staging,
            cache: HashMap::new(),
            dirty: false,
        }
    }

    /// Resolution state for a name, for callers that want to introspect.
    pub fn lookup(&self, field: &str) -> Lookup {
        self.cache
            .get(field)
            .copied()
            .unwrap_or(Lookup::NotYetChecked)
    }

    /// Stage raw bytes into the named field. Unknown names warn once and
    /// are skipped forever after.
    pub fn enqueue(&mut self, field: &str, bytes: &[u8]) {
        let state = match self.lookup(field) {
            Lookup::NotYetChecked => {
                let state = match self.layout.find(field) {
                    Some((offset, size)) => Lookup::Found { offset, size },
                    None => {
                        log::warn!(
                            "Uniform {field} not found in block {}; further writes ignored.",
                            self.layout.name
                        );
                        Lookup::NotFound
                    }
                };
                self.cache.insert(field.to_string(), state);
                state
            }
            state => state,
        };

        if let Lookup::Found { offset, size } = state {
            let len = bytes.len().min(size);
            self.staging[offset..offset + len].copy_from_slice(&bytes[..len]);
            self.dirty = true;
        }
    }

    pub fn enqueue_mat4(&mut self, field: &str, matrix: Mat4) {
        self.enqueue(field, bytemuck::cast_slice(&matrix.to_cols_array()));
    }

    /// Mat3 fields travel as three vec4 columns per std140-style alignment.
    pub fn enqueue_mat3(&mut self, field: &str, matrix: Mat3) {
        let mut padded = [0.0f32; 12];
        for (i, column) in matrix.to_cols_array_2d().iter().enumerate() {
            padded[i * 4..i * 4 + 3].copy_from_slice(column);
        }
        self.enqueue(field, bytemuck::cast_slice(&padded));
    }

    pub fn enqueue_vec3(&mut self, field: &str, value: Vec3) {
        self.enqueue(field, bytemuck::cast_slice(&[value.x, value.y, value.z, 0.0]));
    }

    pub fn enqueue_f32(&mut self, field: &str, value: f32) {
        self.enqueue(field, bytemuck::cast_slice(&[value]));
    }

    pub fn enqueue_u32(&mut self, field: &str, value: u32) {
        self.enqueue(field, bytemuck::cast_slice(&[value]));
    }

    /// The current staged block contents.
    pub fn staged(&self) -> &[u8] {
        &self.staging
    }

    /// Push the staged block to the GPU buffer in one write. A no-op when
    /// nothing changed since the last flush.
    pub fn flush(&mut self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        if self.dirty {
            queue.write_buffer(buffer, 0, &self.staging);
            self.dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_stage_at_sequential_offsets() {
        let layout = BlockLayout::new("Test")
            .field("a", 16)
            .field("b", 4)
            .field("c", 4);
        assert_eq!(layout.size(), 24);
        assert_eq!(layout.find("b"), Some((16, 4)));
        assert_eq!(layout.find("c"), Some((20, 4)));
    }

    #[test]
    fn enqueue_writes_into_the_staged_block() {
        let mut uniforms =
            UniformManager::new(BlockLayout::new("Test").field("a", 4).field("b", 4));
        uniforms.enqueue_f32("b", 1.0);

        let staged: &[f32] = bytemuck::cast_slice(uniforms.staged());
        assert_eq!(staged, &[0.0, 1.0]);
    }

    #[test]
    fn unknown_names_are_cached_as_not_found() {
        let mut uniforms = UniformManager::new(BlockLayout::camera());
        assert_eq!(uniforms.lookup("u_Bogus"), Lookup::NotYetChecked);

        // Warns on the first write, silently skipped on every later one.
        uniforms.enqueue_f32("u_Bogus", 1.0);
        assert_eq!(uniforms.lookup("u_Bogus"), Lookup::NotFound);
        uniforms.enqueue_f32("u_Bogus", 2.0);
        assert_eq!(uniforms.lookup("u_Bogus"), Lookup::NotFound);
    }

    #[test]
    fn known_names_resolve_once_and_stay_found() {
        let mut uniforms = UniformManager::new(BlockLayout::camera());
        uniforms.enqueue_mat4("u_ViewMatrix", Mat4::IDENTITY);

        assert_eq!(
            uniforms.lookup("u_ViewMatrix"),
            Lookup::Found { offset: 64, size: 64 }
        );
    }

    #[test]
    fn mat3_fields_are_column_padded() {
        let mut uniforms =
            UniformManager::new(BlockLayout::new("Test").field("n", 48));
        uniforms.enqueue_mat3("n", Mat3::IDENTITY);

        let staged: &[f32] = bytemuck::cast_slice(uniforms.staged());
        assert_eq!(staged[0], 1.0);
        assert_eq!(staged[3], 0.0);
        assert_eq!(staged[5], 1.0);
        assert_eq!(staged[10], 1.0);
    }

    #[test]
    fn declared_layouts_match_their_pod_blocks() {
        assert_eq!(
            BlockLayout::camera().size(),
            std::mem::size_of::<CameraBlock>()
        );
        assert_eq!(
            BlockLayout::light().size(),
            std::mem::size_of::<LightBlock>()
        );
        assert_eq!(
            BlockLayout::model().size(),
            std::mem::size_of::<ModelBlock>()
        );
    }
}
