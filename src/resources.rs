//! Owned registries for session-lifetime GPU resources.
//!
//! The [`ResourceManager`] holds the name→model map and hands out stable
//! small-integer ids for picking. It is a plain value passed by reference —
//! components never reach for a global. Texture-shaped resources live in
//! the sibling [`TextureRegistry`](crate::TextureRegistry).

use std::collections::HashMap;

use crate::gpu::GpuContext;
use crate::mesh::MeshData;
use crate::model::Model;

/// Largest id the picking attachment can encode in its 8-bit channel.
pub(crate) const MAX_PICKABLE_ID: u32 = u8::MAX as u32;

/// Name-keyed model registry with id assignment.
pub struct ResourceManager {
    models: HashMap<String, Model>,
    next_model_id: u32,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceManager {
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
            // Id 0 is reserved: the picking pass reads it as "no model".
            next_model_id: 1,
        }
    }

    /// Upload a mesh and register the model under its name. Re-registering
    /// a name replaces the previous model (and retires its id).
    pub fn create_model(&mut self, gpu: &GpuContext, mesh: MeshData) -> &mut Model {
        let id = self.next_model_id;
        self.next_model_id += 1;
        if id > MAX_PICKABLE_ID {
            log::warn!(
                "Model {} id {id} exceeds the picking range (max {MAX_PICKABLE_ID}); \
                 picks on it will misreport.",
                mesh.name
            );
        }

        let name = mesh.name.clone();
        let model = Model::new(gpu, mesh, id);
        self.models.insert(name.clone(), model);
        self.models.get_mut(&name).unwrap()
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    pub fn model_mut(&mut self, name: &str) -> Option<&mut Model> {
        self.models.get_mut(name)
    }

    /// Reverse lookup by picking id.
    pub fn model_by_id(&self, id: u32) -> Option<&Model> {
        self.models.values().find(|m| m.id == id)
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    pub fn models_mut(&mut self) -> impl Iterator<Item = &mut Model> {
        self.models.values_mut()
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }
}
