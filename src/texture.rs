//! Texture roles, the GPU texture wrapper, and the named registry.
//!
//! Texture slots follow a fixed role convention shared between the loader
//! and every shader's sampler naming: Diffuse=0, Bump=1, Displacement=2,
//! Specularity=3, Roughness=4, Cubemap0=5, Cubemap1=6. A shader that
//! samples a role declares `u_<Role>_Texture`.
//!
//! The [`TextureRegistry`] owns every named texture and the live video
//! sources. Video frames are re-uploaded *in place* each frame, so every
//! holder of the texture name observes the new content without re-fetching.

use std::collections::HashMap;
use std::path::Path;

use wgpu::util::DeviceExt;

use crate::error::Error;
use crate::gpu::GpuContext;

/// Semantic role of a texture slot, mapped to a fixed slot index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureRole {
    Diffuse,
    Bump,
    Displacement,
    Specularity,
    Roughness,
    Cubemap0,
    Cubemap1,
}

impl TextureRole {
    pub fn slot(self) -> usize {
        match self {
            Self::Diffuse => 0,
            Self::Bump => 1,
            Self::Displacement => 2,
            Self::Specularity => 3,
            Self::Roughness => 4,
            Self::Cubemap0 => 5,
            Self::Cubemap1 => 6,
        }
    }

    /// Sampler uniform name a shader uses for this role.
    pub fn sampler_name(self) -> &'static str {
        match self {
            Self::Diffuse => "u_Diffuse_Texture",
            Self::Bump => "u_Bump_Texture",
            Self::Displacement => "u_Displacement_Texture",
            Self::Specularity => "u_Specularity_Texture",
            Self::Roughness => "u_Roughness_Texture",
            Self::Cubemap0 => "u_Cubemap0_Texture",
            Self::Cubemap1 => "u_Cubemap1_Texture",
        }
    }
}

/// Cube map face suffixes in upload order. The order maps directly onto the
/// GPU's +X, -X, +Y, -Y, +Z, -Z layer sequence.
pub const CUBE_FACE_ORDER: [&str; 6] = ["ft", "bk", "up", "dn", "rt", "lf"];

/// A GPU texture plus the view and sampler the bind groups need.
#[derive(Debug)]
pub struct Texture {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    /// True for cube maps; they bind to the cube view dimension.
    pub cube: bool,
}

impl Texture {
    /// Create a 2D texture from decoded RGBA pixels. `flip_y` mirrors the
    /// rows for sources whose origin convention is bottom-left.
    pub fn from_rgba(
        gpu: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        label: &str,
        flip_y: bool,
    ) -> Self {
        let flipped;
        let data = if flip_y {
            flipped = flip_rows(data, width, height);
            &flipped[..]
        } else {
            data
        };

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = linear_sampler(gpu, label);

        Self {
            texture,
            view,
            sampler,
            width,
            height,
            cube: false,
        }
    }

    /// Decode and upload an image from encoded bytes.
    pub fn from_bytes(gpu: &GpuContext, bytes: &[u8], label: &str) -> Result<Self, Error> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(gpu, &img, width, height, label, false))
    }

    /// Decode and upload an image file.
    pub fn from_file(gpu: &GpuContext, path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(
            gpu,
            &img,
            width,
            height,
            &path.display().to_string(),
            false,
        ))
    }

    /// Allocate an empty texture the caller will fill later (video frames,
    /// post-process inputs).
    pub fn empty(gpu: &GpuContext, width: u32, height: u32, label: &str) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = linear_sampler(gpu, label);

        Self {
            texture,
            view,
            sampler,
            width,
            height,
            cube: false,
        }
    }

    /// Build a cube map from six face files in [`CUBE_FACE_ORDER`].
    ///
    /// A face that fails to decode (or does not match the first face's
    /// dimensions) degrades to a warning and a black layer instead of
    /// failing the whole cube map.
    pub fn cube_from_files(
        gpu: &GpuContext,
        paths: &[impl AsRef<Path>; 6],
        label: &str,
    ) -> Self {
        log::info!("Loading cube map {label}...");

        let mut faces: Vec<Option<image::RgbaImage>> = Vec::with_capacity(6);
        for path in paths {
            match image::open(path.as_ref()) {
                Ok(img) => faces.push(Some(img.to_rgba8())),
                Err(e) => {
                    log::warn!(
                        "Failed to load cube map face {}: {e}",
                        path.as_ref().display()
                    );
                    faces.push(None);
                }
            }
        }

        let (width, height) = faces
            .iter()
            .flatten()
            .next()
            .map(|f| f.dimensions())
            .unwrap_or((1, 1));

        let face_bytes = (width * height * 4) as usize;
        let mut data = Vec::with_capacity(face_bytes * 6);
        for (i, face) in faces.iter().enumerate() {
            match face {
                Some(img) if img.dimensions() == (width, height) => {
                    data.extend_from_slice(img);
                }
                Some(_) => {
                    log::warn!(
                        "Cube map face {} of {label} has mismatched dimensions; using black.",
                        CUBE_FACE_ORDER[i]
                    );
                    data.resize(data.len() + face_bytes, 0);
                }
                None => data.resize(data.len() + face_bytes, 0),
            }
        }

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = linear_sampler(gpu, label);

        Self {
            texture,
            view,
            sampler,
            width,
            height,
            cube: true,
        }
    }

    /// Overwrite the texture contents with a new RGBA frame of the same
    /// dimensions. The texture object itself is untouched, so existing
    /// bind groups keep working.
    pub fn write_frame(&self, gpu: &GpuContext, data: &[u8]) {
        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * 4),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

fn linear_sampler(gpu: &GpuContext, label: &str) -> wgpu::Sampler {
    gpu.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(&format!("{label} Sampler")),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Mirror RGBA rows top-to-bottom.
fn flip_rows(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let row = (width * 4) as usize;
    let mut flipped = Vec::with_capacity(data.len());
    for y in (0..height as usize).rev() {
        flipped.extend_from_slice(&data[y * row..(y + 1) * row]);
    }
    flipped
}

/// A live source of decoded video frames, polled once per frame.
///
/// `current_frame` returns the newest decoded RGBA frame, or `None` when no
/// new frame is ready (paused, buffering, or not yet started). Frame size
/// must match `dimensions` for the lifetime of the source.
pub trait VideoSource {
    fn dimensions(&self) -> (u32, u32);
    fn current_frame(&mut self) -> Option<&[u8]>;
}

/// Name-keyed registry of textures, cube maps and video sources.
#[derive(Default)]
pub struct TextureRegistry {
    textures: HashMap<String, Texture>,
    videos: Vec<(String, Box<dyn VideoSource>)>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture under a name. Replacing an existing name drops
    /// the old texture.
    pub fn register(&mut self, name: impl Into<String>, texture: Texture) {
        self.textures.insert(name.into(), texture);
    }

    /// Decode an image file and register it.
    pub fn load_file(
        &mut self,
        gpu: &GpuContext,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<(), Error> {
        let texture = Texture::from_file(gpu, path)?;
        self.register(name, texture);
        Ok(())
    }

    /// Load a cube map from six face files in [`CUBE_FACE_ORDER`].
    pub fn load_cube_map(
        &mut self,
        gpu: &GpuContext,
        name: impl Into<String>,
        paths: &[impl AsRef<Path>; 6],
    ) {
        let name = name.into();
        let texture = Texture::cube_from_files(gpu, paths, &name);
        self.register(name, texture);
    }

    /// Register a video source. Allocates an empty texture of the source's
    /// dimensions; frames land in it via [`Self::update_video_textures`].
    pub fn register_video(
        &mut self,
        gpu: &GpuContext,
        name: impl Into<String>,
        source: Box<dyn VideoSource>,
    ) {
        let name = name.into();
        let (width, height) = source.dimensions();
        self.register(name.clone(), Texture::empty(gpu, width, height, &name));
        self.videos.push((name, source));
    }

    /// Upload the newest frame of every playing video source in place.
    /// Called once per frame from the render callback; sources with no new
    /// frame are skipped.
    pub fn update_video_textures(&mut self, gpu: &GpuContext) {
        for (name, source) in &mut self.videos {
            if let Some(frame) = source.current_frame()
                && let Some(texture) = self.textures.get(name.as_str())
            {
                texture.write_frame(gpu, frame);
            }
        }
    }

    pub fn texture(&self, name: &str) -> Option<&Texture> {
        self.textures.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_to_fixed_slots() {
        assert_eq!(TextureRole::Diffuse.slot(), 0);
        assert_eq!(TextureRole::Roughness.slot(), 4);
        assert_eq!(TextureRole::Cubemap1.slot(), 6);
    }

    #[test]
    fn sampler_names_follow_the_convention() {
        assert_eq!(TextureRole::Diffuse.sampler_name(), "u_Diffuse_Texture");
        assert_eq!(TextureRole::Cubemap0.sampler_name(), "u_Cubemap0_Texture");
    }

    #[test]
    fn flip_rows_mirrors_vertically() {
        // 1x2 texture: red over green.
        let data = [255, 0, 0, 255, 0, 255, 0, 255];
        let flipped = flip_rows(&data, 1, 2);
        assert_eq!(&flipped[..4], &[0, 255, 0, 255]);
        assert_eq!(&flipped[4..], &[255, 0, 0, 255]);
    }
}
