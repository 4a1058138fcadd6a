//! Full-screen quad that blits a texture unit onto the current target.

use crate::context::RenderContext;
use crate::element::{Element, Geometry, ProgramDesc, Renderable, VertexAttr};
use crate::error::RenderResult;
use crate::uniform::{UniformDecl, UniformKind, UniformValue};

/// NDC corners: bottom-left, bottom-right, top-left, top-right.
pub const QUAD_POSITIONS: [f32; 8] = [
    -1.0, -1.0, //
    1.0, -1.0, //
    -1.0, 1.0, //
    1.0, 1.0,
];

/// Two triangles over the four corners.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 1, 3, 2];

/// Texture unit the quad reads from.
pub const BLIT_TEXTURE_UNIT: i32 = 0;

const QUAD_SHADER: &str = include_str!("shaders/quad.wgsl");
const QUAD_UNIFORMS: &[UniformDecl] = &[UniformDecl::new("tex", UniformKind::Texture)];

pub fn quad_geometry() -> Geometry {
    Geometry::new(
        QUAD_POSITIONS.to_vec(),
        QUAD_INDICES.to_vec(),
        2,
        vec![VertexAttr::new(0, 2, 0)],
    )
}

pub struct Quad {
    element: Element,
}

impl Quad {
    /// Draws into `ctx.present_target`.
    pub fn new(ctx: &RenderContext) -> RenderResult<Self> {
        let mut element = Element::new(
            ctx,
            &ProgramDesc {
                label: "Fullscreen quad",
                source: QUAD_SHADER,
                uniforms: QUAD_UNIFORMS,
                target: ctx.present_target,
            },
            quad_geometry(),
        )?;
        element.set_uniform("tex", UniformValue::Int(BLIT_TEXTURE_UNIT))?;
        Ok(Self { element })
    }
}

impl Renderable for Quad {
    fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniform::UniformBlock;

    #[test]
    fn geometry_is_fixed() {
        let g = quad_geometry();
        assert_eq!(g.vertices, vec![-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0]);
        assert_eq!(g.indices, vec![0, 1, 2, 1, 3, 2]);
        assert_eq!(g.stride, 2);
        assert_eq!(g, quad_geometry());
    }

    #[test]
    fn indices_stay_within_corners() {
        let corners = (QUAD_POSITIONS.len() / 2) as u32;
        assert!(QUAD_INDICES.iter().all(|&i| i < corners));
    }

    #[test]
    fn tex_uniform_takes_blit_unit() {
        let mut block = UniformBlock::new(QUAD_UNIFORMS);
        block.set("tex", UniformValue::Int(BLIT_TEXTURE_UNIT)).unwrap();
        assert_eq!(block.texture_unit("tex"), Some(0));
        assert_eq!(block.size(), 0);
    }

    #[test]
    fn shader_validates() {
        let module = naga::front::wgsl::parse_str(QUAD_SHADER).expect("parse quad.wgsl");
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .expect("validate quad.wgsl");
    }
}
