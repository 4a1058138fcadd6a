//! Asset parsers: Wavefront-style mesh text into GPU-ready interleaved data.
//! Parsing and assembly are pure CPU work with no GPU dependency.

pub mod assemble;
pub mod error;
pub mod mesh;
pub mod obj;

pub use assemble::assemble;
pub use error::{Attribute, ParseError};
pub use mesh::{Face, FaceVertex, InterleavedMesh, VertexLayout};
pub use obj::{ObjData, parse};
