// error.rs — 错误类型

use std::path::PathBuf;

/// Errors raised by the sphere generator and the tangent-space builder.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MeshError {
    /// Resolution too small to close the surface.
    #[error("sphere resolution {resolution} is below the minimum of {min}")]
    InvalidResolution { resolution: u32, min: u32 },

    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index}, mesh has {len} points")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        len: usize,
    },

    /// Points and UVs must be parallel arrays.
    #[error("mesh has {points} points but {uvs} uv coordinates")]
    LengthMismatch { points: usize, uvs: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to open texture {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode texture {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter found")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// Start-up failures of the application shell.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Renderer(#[from] RendererError),
}
