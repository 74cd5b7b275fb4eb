//! Crate-wide error type.
//!
//! Fatal construction failures (missing surface, failed context acquisition,
//! failed shader compilation, malformed mesh JSON) surface as variants of
//! [`Error`] and abort setup. Soft runtime conditions never produce an
//! `Error` — they are logged and the operation degrades gracefully.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The rendering surface could not be created for the window.
    #[error("failed to create rendering surface: {0}")]
    SurfaceCreation(String),

    /// No suitable GPU adapter was found.
    #[error("no suitable GPU adapter found: {0}")]
    AdapterRequest(String),

    /// The logical device could not be created on the chosen adapter.
    #[error("failed to create GPU device: {0}")]
    DeviceRequest(String),

    /// The drawable surface reported a zero-sized bounding geometry.
    #[error("drawable surface reports zero size ({width}x{height})")]
    ZeroSizedSurface { width: u32, height: u32 },

    /// A shader module failed validation; the message carries the compiler
    /// diagnostic text.
    #[error("error compiling {label} shader:\n{message}")]
    ShaderCompile { label: String, message: String },

    /// A mesh JSON document was malformed. All missing/invalid attributes
    /// are collected into one combined message.
    #[error("error in mesh JSON for {name}:\n{message}")]
    MeshValidation { name: String, message: String },

    /// A framebuffer operation referenced a color attachment that was never
    /// configured.
    #[error("framebuffer {label} has no color attachment {index}")]
    MissingAttachment { label: String, index: usize },

    /// An image could not be decoded.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// A synchronous GPU pixel read-back failed.
    #[error("failed to read back pixel data: {0}")]
    ReadBack(String),
}
