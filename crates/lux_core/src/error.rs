//! Scene configuration errors.
//!
//! Everything here is detected once, while a scene is being initialized.
//! Rendering itself never fails: numerical degeneracies simply produce
//! "no intersection".

use thiserror::Error;

use crate::image::ImageError;

/// Errors that abort scene setup before any pixel is produced.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Duplicate texture id {0}")]
    DuplicateTexture(u32),

    #[error("Duplicate material id {0}")]
    DuplicateMaterial(u32),

    #[error("Duplicate primitive id {0}")]
    DuplicatePrimitive(u32),

    #[error("Material {material} references missing texture {texture}")]
    MissingTexture { material: u32, texture: u32 },

    #[error("Primitive {primitive} references missing material {material}")]
    MissingMaterial { primitive: u32, material: u32 },

    #[error("Primitive {owner} references missing primitive {primitive}")]
    MissingPrimitive { owner: u32, primitive: u32 },

    #[error("CSG primitive {csg} child {child} cannot report entry and exit crossings")]
    UnsupportedCsgChild { csg: u32, child: u32 },

    #[error("Primitive {0} is part of a reference cycle")]
    CyclicReference(u32),

    #[error("Unknown {kind}: '{value}'")]
    UnknownPolicy { kind: &'static str, value: String },

    #[error(transparent)]
    Image(#[from] ImageError),
}

pub type SceneResult<T> = Result<T, SceneError>;

impl SceneError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        SceneError::UnknownPolicy {
            kind,
            value: value.to_string(),
        }
    }
}
