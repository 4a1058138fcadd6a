//! Mesh import errors.

use std::fmt;

use thiserror::Error;

/// Which attribute table a face sub-index points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    Position,
    Texcoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Attribute::Position => "position",
            Attribute::Texcoord => "texcoord",
            Attribute::Normal => "normal",
        })
    }
}

/// Fatal error while turning mesh text into buffers.
///
/// Line numbers are 1-based, face and corner numbers 0-based.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Malformed number '{token}' on line {line}")]
    MalformedNumber { line: usize, token: String },

    #[error("'{record}' record on line {line} needs {expected} components, found {found}")]
    MissingComponent {
        line: usize,
        record: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid face index '{token}' on line {line} (indices are 1-based and absolute)")]
    InvalidIndex { line: usize, token: String },

    #[error("Face on line {line} has no vertex references")]
    EmptyFace { line: usize },

    #[error("Face {face} corner {corner}: {attribute} index {index} out of bounds (len={len})")]
    IndexOutOfRange {
        face: usize,
        corner: usize,
        attribute: Attribute,
        index: usize,
        len: usize,
    },

    #[error("Face {face} corner {corner} has no normal")]
    MissingNormal { face: usize, corner: usize },

    #[error("Face {face} corner {corner} has no texcoord but the mesh is textured")]
    MixedTexcoords { face: usize, corner: usize },

    #[error("Too many vertices for a u32 index buffer (>{})", u32::MAX)]
    TooManyVertices,
}
