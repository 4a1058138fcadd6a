//! Imported mesh drawable: parsed + assembled at construction, swung about X
//! every frame.

use corelib::transform::Transform;
use glam::{Mat4, Vec3};

use crate::context::RenderContext;
use crate::element::{Element, Geometry, ProgramDesc, Renderable};
use crate::error::{RenderError, RenderResult};
use crate::uniform::{UniformDecl, UniformKind};

/// Resting position of the mesh in world space.
pub const MESH_OFFSET: Vec3 = Vec3::new(0.0, 1.5, 0.0);
/// Peak swing angle about X.
pub const SWING_AMPLITUDE_DEG: f32 = 22.5;
/// Angular frequency of the swing, rad/s.
pub const SWING_RATE: f32 = 2.5;

const OBJ_SHADER: &str = include_str!("shaders/obj.wgsl");
const OBJ_UNIFORMS: &[UniformDecl] = &[UniformDecl::new("world", UniformKind::Mat4)];

/// `translate(0, 1.5, 0) * rotate_x(22.5° · sin(2.5 · t))`, `t` in seconds.
pub fn world_transform(time: f32) -> Mat4 {
    let angle = SWING_AMPLITUDE_DEG * (time * SWING_RATE).sin();
    Transform::from_translation(MESH_OFFSET)
        .with_rotation_x_deg(angle)
        .matrix()
}

/// Parse and assemble mesh text. Touches no GPU state.
pub fn mesh_geometry(text: &str) -> RenderResult<Geometry> {
    let mesh = asset::parse(text).and_then(|data| data.assemble())?;
    if mesh.is_empty() {
        return Err(RenderError::EmptyMesh);
    }
    Ok(Geometry::from_mesh(mesh))
}

pub struct ObjMesh {
    element: Element,
}

impl ObjMesh {
    /// Draws into `ctx.scene_target`. Fails before any GPU work if the text
    /// does not import.
    pub fn new(ctx: &RenderContext, text: &str) -> RenderResult<Self> {
        let geometry = mesh_geometry(text)?;
        let element = Element::new(
            ctx,
            &ProgramDesc {
                label: "Imported mesh",
                source: OBJ_SHADER,
                uniforms: OBJ_UNIFORMS,
                target: ctx.scene_target,
            },
            geometry,
        )?;
        Ok(Self { element })
    }
}

impl Renderable for ObjMesh {
    fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }

    fn update(&mut self, time: f32) -> RenderResult<()> {
        self.element
            .set_uniform("world", world_transform(time).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniform::{UniformBlock, UniformValue};
    use asset::{Attribute, ParseError};
    use std::f32::consts::PI;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvn 0 0 1\nvn 0 0 1\nf 1//1 2//2 3//3\n";

    #[test]
    fn world_at_zero_is_pure_translation() {
        let m = world_transform(0.0);
        assert!(m.abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, 1.5, 0.0)), 1e-6));
    }

    #[test]
    fn world_at_peak_rotates_full_amplitude() {
        let peak = PI / (2.0 * SWING_RATE);
        let expected = Mat4::from_translation(MESH_OFFSET)
            * Mat4::from_rotation_x(22.5f32.to_radians());
        assert!(world_transform(peak).abs_diff_eq(expected, 1e-5));

        let trough = 3.0 * PI / (2.0 * SWING_RATE);
        let expected = Mat4::from_translation(MESH_OFFSET)
            * Mat4::from_rotation_x((-22.5f32).to_radians());
        assert!(world_transform(trough).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn world_is_deterministic_in_time() {
        assert_eq!(world_transform(1.234), world_transform(1.234));
    }

    #[test]
    fn world_fits_the_uniform_block() {
        let mut block = UniformBlock::new(OBJ_UNIFORMS);
        block
            .set("world", UniformValue::Mat4(world_transform(0.5)))
            .unwrap();
        assert_eq!(block.size(), 64);
    }

    #[test]
    fn triangle_geometry() {
        let g = mesh_geometry(TRIANGLE).unwrap();
        assert_eq!(g.indices, vec![0, 1, 2]);
        assert_eq!(g.vertices.len(), 3 * 6);
        assert_eq!(g.stride, 6);
    }

    #[test]
    fn bad_index_fails_before_gpu() {
        let err = mesh_geometry("v 0 0 0\nvn 0 0 1\nf 1//1 5//1 1//1").unwrap_err();
        assert!(matches!(
            err,
            RenderError::Parse(ParseError::IndexOutOfRange {
                attribute: Attribute::Position,
                index: 4,
                ..
            })
        ));
    }

    #[test]
    fn malformed_number_surfaces_as_parse_error() {
        let err = mesh_geometry("v 1.0 abc 2.0").unwrap_err();
        assert!(matches!(
            err,
            RenderError::Parse(ParseError::MalformedNumber { line: 1, .. })
        ));
    }

    #[test]
    fn faceless_text_is_rejected() {
        assert!(matches!(
            mesh_geometry("# nothing\nv 0 0 0\n").unwrap_err(),
            RenderError::EmptyMesh
        ));
    }

    #[test]
    fn shader_validates() {
        let module = naga::front::wgsl::parse_str(OBJ_SHADER).expect("parse obj.wgsl");
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .expect("validate obj.wgsl");
    }
}
