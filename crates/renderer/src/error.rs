//! Renderer error taxonomy.

use asset::ParseError;
use thiserror::Error;

use crate::uniform::UniformError;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Mesh import failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Mesh has no faces to draw")]
    EmptyMesh,

    #[error("Shader '{label}' failed to compile: {message}")]
    ShaderCompile { label: String, message: String },

    #[error("GPU resource '{label}' could not be created: {message}")]
    GpuResource { label: String, message: String },

    #[error(transparent)]
    Uniform(#[from] UniformError),

    #[error("No texture bound to unit {0}")]
    MissingTexture(u32),

    #[error("Texture uniform '{0}' has no unit assigned")]
    UnassignedTexture(&'static str),

    #[error(transparent)]
    Surface(#[from] wgpu::SurfaceError),
}

impl RenderError {
    pub(crate) fn gpu(label: impl Into<String>, message: impl ToString) -> Self {
        RenderError::GpuResource {
            label: label.into(),
            message: message.to_string(),
        }
    }
}

pub type RenderResult<T> = Result<T, RenderError>;
