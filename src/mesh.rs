//! CPU-side mesh data: the JSON loader and the primitive generators.
//!
//! A [`MeshData`] is plain vertex data waiting to be uploaded. Attribute
//! arrays the caller leaves empty are zero-filled to the vertex count at
//! upload time, so generators only produce what they care about (the grid
//! produces positions and colors, nothing else).

use serde_json::Value;

use crate::error::Error;

/// Primitive topology for a model's draw call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawMode {
    Triangles,
    Lines,
    Points,
}

/// Vertex data for one model, ready for buffer upload.
///
/// `positions` is required and defines the vertex count (`len / 3`). The
/// other attribute arrays may be left empty; they are padded with zeros when
/// the model is created.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub name: String,
    pub draw_mode: DrawMode,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    pub colors: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / 3) as u32
    }

    /// Zero-fill any attribute array the producer left empty, sized to the
    /// vertex count. Called once before upload.
    pub(crate) fn fill_missing_attributes(&mut self) {
        let vertices = self.positions.len() / 3;
        if self.normals.is_empty() {
            self.normals = vec![0.0; vertices * 3];
        }
        if self.uvs.is_empty() {
            self.uvs = vec![0.0; vertices * 2];
        }
        if self.colors.is_empty() {
            self.colors = vec![0.0; vertices * 4];
        }
    }

    /// Parse a mesh from the JSON interchange format.
    ///
    /// Required arrays: `position`, `normal`, `uv`, `index`. `color` is
    /// optional and defaults to zeros sized to the vertex count. Every
    /// missing or malformed attribute is collected so the error reports the
    /// full diagnostic in one pass.
    pub fn from_json(name: impl Into<String>, source: &str) -> Result<Self, Error> {
        let name = name.into();
        log::info!("Parsing mesh JSON for {name}...");

        let document: Value = serde_json::from_str(source).map_err(|e| Error::MeshValidation {
            name: name.clone(),
            message: format!("Document is not valid JSON: {e}."),
        })?;

        let mut problems: Vec<String> = Vec::new();
        for attribute in ["position", "normal", "color", "uv", "index"] {
            match document.get(attribute) {
                None | Some(Value::Null) => {
                    if attribute != "color" {
                        problems.push(format!("Missing required attribute {attribute}."));
                    }
                }
                Some(value) if !value.is_array() => {
                    problems.push(format!("Attribute {attribute} is not an array."));
                }
                Some(_) => {}
            }
        }

        if !problems.is_empty() {
            return Err(Error::MeshValidation {
                name,
                message: problems.join("\n"),
            });
        }

        let floats = |key: &str| -> Vec<f32> {
            document[key]
                .as_array()
                .map(|a| a.iter().filter_map(Value::as_f64).map(|v| v as f32).collect())
                .unwrap_or_default()
        };

        let positions = floats("position");
        let colors = match document.get("color") {
            Some(Value::Array(_)) => floats("color"),
            _ => vec![0.0; (positions.len() / 3) * 4],
        };
        let indices = document["index"]
            .as_array()
            .map(|a| a.iter().filter_map(Value::as_u64).map(|v| v as u32).collect())
            .unwrap_or_default();

        Ok(Self {
            name,
            draw_mode: DrawMode::Triangles,
            normals: floats("normal"),
            uvs: floats("uv"),
            positions,
            colors,
            indices,
        })
    }

    /// A flat line grid in the XY plane, colored so line direction is
    /// visible: horizontal lines run red to cyan, vertical lines cyan to
    /// red.
    pub fn grid(name: impl Into<String>) -> Self {
        Self::grid_with(name, 12, 12, 0.1)
    }

    pub fn grid_with(
        name: impl Into<String>,
        horizontal_count: u32,
        vertical_count: u32,
        padding: f32,
    ) -> Self {
        let mut positions = Vec::new();
        let mut colors = Vec::new();

        let extent = 1.0 - padding;
        let step = |count: u32, i: u32| (2.0 * extent / (count - 1) as f32) * i as f32 - extent;

        for i in 0..horizontal_count {
            let y = step(horizontal_count, i);
            positions.extend_from_slice(&[-extent, y, 0.0, extent, y, 0.0]);
            colors.extend_from_slice(&[1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0]);
        }
        for i in 0..vertical_count {
            let x = step(vertical_count, i);
            positions.extend_from_slice(&[x, -extent, 0.0, x, extent, 0.0]);
            colors.extend_from_slice(&[0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0]);
        }

        Self {
            name: name.into(),
            draw_mode: DrawMode::Lines,
            positions,
            normals: vec![],
            uvs: vec![],
            colors,
            indices: vec![],
        }
    }

    /// A quad in the XY plane with per-corner debug colors and a full UV
    /// sweep. `size` is the half-extent.
    pub fn quad(name: impl Into<String>, size: f32) -> Self {
        Self {
            name: name.into(),
            draw_mode: DrawMode::Triangles,
            positions: vec![
                -size, size, 0.0, // top left
                -size, -size, 0.0, // bottom left
                size, -size, 0.0, // bottom right
                size, size, 0.0, // top right
            ],
            normals: vec![
                0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0,
            ],
            colors: vec![
                1.0, 0.0, 0.0, 1.0, // red
                0.0, 1.0, 0.0, 1.0, // green
                0.0, 0.0, 1.0, 1.0, // blue
                1.0, 1.0, 1.0, 0.0, // white
            ],
            uvs: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// A cube assembled from six quads. `size` is the full edge length.
    /// `inside_out` mirrors the faces so they look toward the center,
    /// which is what a skybox wants.
    pub fn cube(name: impl Into<String>, size: f32, inside_out: bool) -> Self {
        let name = name.into();
        log::info!("Preparing {name} mesh data...");

        let half = size / 2.0;
        let mut sides: Vec<MeshData> = (0..6)
            .map(|i| Self::quad(format!("{name}_side-{i}"), half))
            .collect();

        if inside_out {
            orient_faces_inward(&mut sides, half);
        } else {
            orient_faces_outward(&mut sides, half);
        }

        let side_vertices = sides[0].vertex_count();
        let mut cube = Self {
            name,
            draw_mode: DrawMode::Triangles,
            positions: vec![],
            normals: vec![],
            uvs: vec![],
            colors: vec![],
            indices: vec![],
        };
        for (i, side) in sides.iter().enumerate() {
            cube.positions.extend_from_slice(&side.positions);
            cube.normals.extend_from_slice(&side.normals);
            cube.uvs.extend_from_slice(&side.uvs);
            cube.colors.extend_from_slice(&side.colors);
            cube.indices
                .extend(side.indices.iter().map(|v| v + i as u32 * side_vertices));
        }
        cube
    }
}

/// Rearrange six XY-plane quads into the outward-facing sides of a cube:
/// front, bottom, left, right, top, back.
fn orient_faces_outward(sides: &mut [MeshData], half: f32) {
    for i in (0..sides[0].positions.len()).step_by(3) {
        let (x, y, z) = (i, i + 1, i + 2);

        sides[0].positions[z] += half;

        sides[1].positions[z] = sides[1].positions[y];
        sides[1].positions[y] = -half;
        set_normal(&mut sides[1], i, 0.0, -1.0, 0.0);

        sides[2].positions[z] = sides[2].positions[x];
        sides[2].positions[x] = -half;
        set_normal(&mut sides[2], i, -1.0, 0.0, 0.0);

        sides[3].positions[z] = -sides[3].positions[x];
        sides[3].positions[x] = half;
        set_normal(&mut sides[3], i, 1.0, 0.0, 0.0);

        sides[4].positions[z] = -sides[4].positions[y];
        sides[4].positions[y] = half;
        set_normal(&mut sides[4], i, 0.0, 1.0, 0.0);

        sides[5].positions[x] *= -1.0;
        sides[5].positions[z] -= half;
        set_normal(&mut sides[5], i, 0.0, 0.0, -1.0);
    }
}

/// Same as [`orient_faces_outward`] but mirrored so every face looks toward
/// the cube's center.
fn orient_faces_inward(sides: &mut [MeshData], half: f32) {
    for i in (0..sides[0].positions.len()).step_by(3) {
        let (x, y, z) = (i, i + 1, i + 2);

        sides[0].positions[z] -= half;

        sides[1].positions[z] = sides[1].positions[y];
        sides[1].positions[y] = half;
        set_normal(&mut sides[1], i, 0.0, -1.0, 0.0);

        sides[2].positions[z] = sides[2].positions[x];
        sides[2].positions[x] = half;
        set_normal(&mut sides[2], i, -1.0, 0.0, 0.0);

        sides[3].positions[z] = -sides[3].positions[x];
        sides[3].positions[x] = -half;
        set_normal(&mut sides[3], i, 1.0, 0.0, 0.0);

        sides[4].positions[z] = -sides[4].positions[y];
        sides[4].positions[y] = -half;
        set_normal(&mut sides[4], i, 0.0, 1.0, 0.0);

        sides[5].positions[x] *= -1.0;
        sides[5].positions[z] += half;
        set_normal(&mut sides[5], i, 0.0, 0.0, -1.0);
    }
}

fn set_normal(side: &mut MeshData, base: usize, x: f32, y: f32, z: f32) {
    side.normals[base] = x;
    side.normals[base + 1] = y;
    side.normals[base + 2] = z;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_missing_position_reports_it() {
        let err = MeshData::from_json("m", r#"{"normal": [], "uv": [], "index": []}"#)
            .expect_err("position is required");
        assert!(err.to_string().contains("position"));
    }

    #[test]
    fn json_errors_aggregate_every_problem() {
        let err = MeshData::from_json("m", r#"{"position": 5}"#).expect_err("malformed");
        let message = err.to_string();
        assert!(message.contains("position is not an array"));
        assert!(message.contains("Missing required attribute normal."));
        assert!(message.contains("Missing required attribute uv."));
        assert!(message.contains("Missing required attribute index."));
    }

    #[test]
    fn json_color_defaults_to_zeros() {
        let source = r#"{
            "position": [0, 0, 0, 1, 0, 0, 0, 1, 0],
            "normal": [0, 0, 1, 0, 0, 1, 0, 0, 1],
            "uv": [0, 0, 1, 0, 0, 1],
            "index": [0, 1, 2]
        }"#;

        let mesh = MeshData::from_json("m", source).unwrap();
        assert_eq!(mesh.colors.len(), 4 * (mesh.positions.len() / 3));
        assert!(mesh.colors.iter().all(|&c| c == 0.0));
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn grid_is_line_pairs() {
        let grid = MeshData::grid("grid");
        // 12 horizontal + 12 vertical lines, two vertices each.
        assert_eq!(grid.draw_mode, DrawMode::Lines);
        assert_eq!(grid.vertex_count(), 48);
        assert_eq!(grid.colors.len() as u32, grid.vertex_count() * 4);
    }

    #[test]
    fn grid_respects_padding() {
        let grid = MeshData::grid_with("grid", 12, 12, 0.1);
        let max = grid
            .positions
            .iter()
            .fold(0.0f32, |acc, &v| acc.max(v.abs()));
        assert!((max - 0.9).abs() < 1e-5);
    }

    #[test]
    fn cube_concatenates_six_quads() {
        let cube = MeshData::cube("cube", 1.0, false);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.indices.len(), 36);
        // Index ranges must not cross between faces.
        for (face, chunk) in cube.indices.chunks(6).enumerate() {
            for &index in chunk {
                assert!(index >= face as u32 * 4 && index < (face as u32 + 1) * 4);
            }
        }
    }

    #[test]
    fn cube_faces_sit_on_the_half_extent() {
        let cube = MeshData::cube("cube", 2.0, false);
        let max = cube
            .positions
            .iter()
            .fold(0.0f32, |acc, &v| acc.max(v.abs()));
        assert!((max - 1.0).abs() < 1e-5);
    }

    #[test]
    fn inside_out_cube_flips_facing() {
        let outward = MeshData::cube("a", 1.0, false);
        let inward = MeshData::cube("b", 1.0, true);

        // Front face moves from +Z to -Z while keeping its +Z normal.
        assert!((outward.positions[2] - 0.5).abs() < 1e-5);
        assert!((inward.positions[2] + 0.5).abs() < 1e-5);
        assert_eq!(outward.normals[2], inward.normals[2]);
    }

    #[test]
    fn missing_attributes_fill_to_vertex_count() {
        let mut grid = MeshData::grid("grid");
        grid.fill_missing_attributes();
        let vertices = grid.vertex_count() as usize;
        assert_eq!(grid.normals.len(), vertices * 3);
        assert_eq!(grid.uvs.len(), vertices * 2);
        assert_eq!(grid.colors.len(), vertices * 4);
    }
}
