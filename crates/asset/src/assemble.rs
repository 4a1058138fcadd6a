//! Interleaves attribute tables into one vertex record per face corner.
//!
//! Every corner becomes a fresh vertex; nothing is welded, so the index
//! buffer is always `0..corner_count`.

use crate::error::{Attribute, ParseError};
use crate::mesh::{Face, InterleavedMesh, VertexLayout};
use crate::obj::ObjData;

/// Build an interleaved vertex buffer and matching index buffer.
///
/// The layout is fixed up front: textured if any corner carries a texcoord.
/// A textured mesh with an untextured corner is rejected.
pub fn assemble(
    positions: &[[f32; 3]],
    texcoords: &[[f32; 2]],
    normals: &[[f32; 3]],
    faces: &[Face],
) -> Result<InterleavedMesh, ParseError> {
    let textured = faces
        .iter()
        .flat_map(Face::corners)
        .any(|c| c.texcoord.is_some());
    let layout = if textured {
        VertexLayout::PositionTexcoordNormal
    } else {
        VertexLayout::PositionNormal
    };

    let corners: usize = faces.iter().map(Face::len).sum();
    if u32::try_from(corners).is_err() {
        return Err(ParseError::TooManyVertices);
    }

    let mut vertices = Vec::with_capacity(corners * layout.stride());
    let mut indices = Vec::with_capacity(corners);
    let mut next: u32 = 0;
    let mut warned_polygon = false;

    for (face_idx, face) in faces.iter().enumerate() {
        if face.len() != 3 && !warned_polygon {
            log::warn!(
                "Face {} has {} corners; faces are emitted without triangulation",
                face_idx,
                face.len()
            );
            warned_polygon = true;
        }

        for (corner, fv) in face.corners().iter().enumerate() {
            let out_of_range = |attribute, index, len| ParseError::IndexOutOfRange {
                face: face_idx,
                corner,
                attribute,
                index,
                len,
            };

            let position = positions
                .get(fv.position)
                .ok_or_else(|| out_of_range(Attribute::Position, fv.position, positions.len()))?;
            vertices.extend_from_slice(position);

            if textured {
                let vt = fv.texcoord.ok_or(ParseError::MixedTexcoords {
                    face: face_idx,
                    corner,
                })?;
                let uv = texcoords
                    .get(vt)
                    .ok_or_else(|| out_of_range(Attribute::Texcoord, vt, texcoords.len()))?;
                vertices.extend_from_slice(uv);
            }

            let vn = fv.normal.ok_or(ParseError::MissingNormal {
                face: face_idx,
                corner,
            })?;
            let normal = normals
                .get(vn)
                .ok_or_else(|| out_of_range(Attribute::Normal, vn, normals.len()))?;
            vertices.extend_from_slice(normal);

            indices.push(next);
            next += 1;
        }
    }

    log::debug!(
        "Assembled {} vertices ({:?}), {} indices",
        next,
        layout,
        indices.len()
    );

    Ok(InterleavedMesh::new(layout, vertices, indices))
}

impl ObjData {
    /// Convenience wrapper over [`assemble`].
    pub fn assemble(&self) -> Result<InterleavedMesh, ParseError> {
        assemble(&self.positions, &self.texcoords, &self.normals, &self.faces)
    }
}
