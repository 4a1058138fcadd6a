//! CPU-side mesh representation shared by the parser and the assembler.

/// One face corner: 0-based indices into the attribute tables.
/// Texcoord and normal may be absent in the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceVertex {
    pub position: usize,
    pub texcoord: Option<usize>,
    pub normal: Option<usize>,
}

impl FaceVertex {
    pub fn new(position: usize, texcoord: Option<usize>, normal: Option<usize>) -> Self {
        Self {
            position,
            texcoord,
            normal,
        }
    }
}

/// Polygon as declared, corners in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Face(pub Vec<FaceVertex>);

impl Face {
    pub fn corners(&self) -> &[FaceVertex] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fixed record shape of an interleaved vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexLayout {
    /// `[px, py, pz, nx, ny, nz]`
    PositionNormal,
    /// `[px, py, pz, u, v, nx, ny, nz]`
    PositionTexcoordNormal,
}

impl VertexLayout {
    /// Floats per vertex record.
    pub const fn stride(self) -> usize {
        match self {
            VertexLayout::PositionNormal => 6,
            VertexLayout::PositionTexcoordNormal => 8,
        }
    }

    pub const fn position_offset(self) -> usize {
        0
    }

    pub const fn texcoord_offset(self) -> Option<usize> {
        match self {
            VertexLayout::PositionNormal => None,
            VertexLayout::PositionTexcoordNormal => Some(3),
        }
    }

    pub const fn normal_offset(self) -> usize {
        match self {
            VertexLayout::PositionNormal => 3,
            VertexLayout::PositionTexcoordNormal => 5,
        }
    }
}

/// Flat vertex records plus one index per emitted corner.
#[derive(Clone, Debug, PartialEq)]
pub struct InterleavedMesh {
    pub layout: VertexLayout,
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl InterleavedMesh {
    pub fn new(layout: VertexLayout, vertices: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            layout,
            vertices,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.layout.stride()
    }

    /// Slice of the `i`-th vertex record.
    pub fn vertex(&self, i: usize) -> Option<&[f32]> {
        let stride = self.layout.stride();
        self.vertices.get(i * stride..(i + 1) * stride)
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_offsets_fit_inside_stride() {
        for layout in [
            VertexLayout::PositionNormal,
            VertexLayout::PositionTexcoordNormal,
        ] {
            assert!(layout.normal_offset() + 3 == layout.stride());
            if let Some(uv) = layout.texcoord_offset() {
                assert_eq!(uv, layout.position_offset() + 3);
            }
        }
    }

    #[test]
    fn vertex_slices_by_stride() {
        let mesh = InterleavedMesh::new(
            VertexLayout::PositionNormal,
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0],
            vec![0, 1],
        );
        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.vertex(1), Some(&[6.0, 7.0, 8.0, 9.0, 10.0, 11.0][..]));
        assert_eq!(mesh.vertex(2), None);
    }
}
