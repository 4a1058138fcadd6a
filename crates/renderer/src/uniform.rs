//! Named, typed shader uniforms packed into one WGSL uniform struct.
//!
//! Slots are laid out in declaration order following WGSL uniform address
//! space rules (`vec3`/`mat4` align to 16, struct size rounds up to 16).
//! Texture slots hold a texture-unit index and take no bytes in the block.

use glam::{Mat4, Vec3};
use thiserror::Error;

/// Type of a declared uniform slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Int,
    Vec3,
    Mat4,
    /// 2D texture bound by texture-unit index.
    Texture,
}

impl UniformKind {
    /// (size, align) in bytes inside the uniform struct.
    const fn size_align(self) -> Option<(usize, usize)> {
        match self {
            UniformKind::Float | UniformKind::Int => Some((4, 4)),
            UniformKind::Vec3 => Some((12, 16)),
            UniformKind::Mat4 => Some((64, 16)),
            UniformKind::Texture => None,
        }
    }
}

/// Value written to a uniform slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec3(Vec3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Int(_) => "int",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Mat4(_) => "mat4",
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

/// Declaration of one uniform slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: &'static str,
    pub kind: UniformKind,
}

impl UniformDecl {
    pub const fn new(name: &'static str, kind: UniformKind) -> Self {
        Self { name, kind }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum UniformError {
    #[error("Unknown uniform '{0}'")]
    Unknown(String),
    #[error("Uniform '{name}' is {expected:?}, got {found}")]
    TypeMismatch {
        name: String,
        expected: UniformKind,
        found: &'static str,
    },
    #[error("Texture unit for '{name}' must be non-negative, got {unit}")]
    NegativeTextureUnit { name: String, unit: i32 },
}

#[derive(Clone, Debug)]
struct Slot {
    decl: UniformDecl,
    offset: Option<usize>,
    texture_unit: Option<u32>,
}

/// CPU mirror of a program's uniform struct plus its texture-unit table.
#[derive(Clone, Debug)]
pub struct UniformBlock {
    slots: Vec<Slot>,
    bytes: Vec<u8>,
    dirty: bool,
}

impl UniformBlock {
    pub fn new(decls: &[UniformDecl]) -> Self {
        let mut cursor = 0usize;
        let mut slots = Vec::with_capacity(decls.len());
        for decl in decls {
            let offset = decl.kind.size_align().map(|(size, align)| {
                let at = cursor.next_multiple_of(align);
                cursor = at + size;
                at
            });
            slots.push(Slot {
                decl: *decl,
                offset,
                texture_unit: None,
            });
        }
        let size = cursor.next_multiple_of(16);

        Self {
            slots,
            bytes: vec![0; size],
            dirty: true,
        }
    }

    /// Size of the packed uniform struct in bytes (0 if only textures).
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.slot(name).and_then(|s| s.offset)
    }

    /// Names of texture slots in declaration order.
    pub fn texture_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots
            .iter()
            .filter(|s| s.decl.kind == UniformKind::Texture)
            .map(|s| s.decl.name)
    }

    /// Unit bound to a texture slot, if one was set.
    pub fn texture_unit(&self, name: &str) -> Option<u32> {
        self.slot(name).and_then(|s| s.texture_unit)
    }

    /// Returns whether bytes changed since the last call, clearing the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.decl.name == name)
            .ok_or_else(|| UniformError::Unknown(name.to_owned()))?;

        let kind = slot.decl.kind;
        let mismatch = || UniformError::TypeMismatch {
            name: name.to_owned(),
            expected: kind,
            found: value.kind_name(),
        };

        match (kind, value) {
            (UniformKind::Texture, UniformValue::Int(unit)) => {
                let unit = u32::try_from(unit).map_err(|_| UniformError::NegativeTextureUnit {
                    name: name.to_owned(),
                    unit,
                })?;
                slot.texture_unit = Some(unit);
                return Ok(());
            }
            (UniformKind::Float, UniformValue::Float(_))
            | (UniformKind::Int, UniformValue::Int(_))
            | (UniformKind::Vec3, UniformValue::Vec3(_))
            | (UniformKind::Mat4, UniformValue::Mat4(_)) => {}
            _ => return Err(mismatch()),
        }

        let Some(offset) = slot.offset else {
            return Err(mismatch());
        };
        let dst = &mut self.bytes[offset..];
        match value {
            UniformValue::Float(v) => dst[..4].copy_from_slice(bytemuck::bytes_of(&v)),
            UniformValue::Int(v) => dst[..4].copy_from_slice(bytemuck::bytes_of(&v)),
            UniformValue::Vec3(v) => {
                dst[..12].copy_from_slice(bytemuck::cast_slice(&v.to_array()))
            }
            UniformValue::Mat4(m) => {
                dst[..64].copy_from_slice(bytemuck::cast_slice(&m.to_cols_array()))
            }
        }
        self.dirty = true;
        Ok(())
    }

    fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.decl.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn packs_with_wgsl_alignment() {
        let block = UniformBlock::new(&[
            UniformDecl::new("strength", UniformKind::Float),
            UniformDecl::new("tint", UniformKind::Vec3),
            UniformDecl::new("count", UniformKind::Int),
            UniformDecl::new("world", UniformKind::Mat4),
            UniformDecl::new("tex", UniformKind::Texture),
        ]);
        assert_eq!(block.offset_of("strength"), Some(0));
        assert_eq!(block.offset_of("tint"), Some(16));
        // int packs into the vec3's trailing 4 bytes
        assert_eq!(block.offset_of("count"), Some(28));
        assert_eq!(block.offset_of("world"), Some(32));
        assert_eq!(block.offset_of("tex"), None);
        assert_eq!(block.size(), 96);
    }

    #[test]
    fn texture_only_block_is_empty() {
        let block = UniformBlock::new(&[UniformDecl::new("tex", UniformKind::Texture)]);
        assert_eq!(block.size(), 0);
        assert_eq!(block.texture_names().collect::<Vec<_>>(), vec!["tex"]);
    }

    #[test]
    fn mat4_is_written_column_major() {
        let mut block = UniformBlock::new(&[UniformDecl::new("world", UniformKind::Mat4)]);
        let m = Mat4::from_translation(Vec3::new(0.0, 1.5, 0.0));
        block.set("world", m.into()).unwrap();
        let f = floats(block.bytes());
        assert_eq!(f.len(), 16);
        assert_eq!(&f[12..16], &[0.0, 1.5, 0.0, 1.0]);
    }

    #[test]
    fn dirty_flag_tracks_writes() {
        let mut block = UniformBlock::new(&[UniformDecl::new("alpha", UniformKind::Float)]);
        assert!(block.take_dirty());
        assert!(!block.take_dirty());
        block.set("alpha", 0.5f32.into()).unwrap();
        assert!(block.take_dirty());
        assert_eq!(floats(block.bytes())[0], 0.5);
    }

    #[test]
    fn texture_slots_take_units() {
        let mut block = UniformBlock::new(&[UniformDecl::new("tex", UniformKind::Texture)]);
        assert_eq!(block.texture_unit("tex"), None);
        block.set("tex", UniformValue::Int(0)).unwrap();
        assert_eq!(block.texture_unit("tex"), Some(0));
        assert_eq!(
            block.set("tex", UniformValue::Int(-1)).unwrap_err(),
            UniformError::NegativeTextureUnit {
                name: "tex".into(),
                unit: -1
            }
        );
    }

    #[test]
    fn rejects_unknown_names_and_wrong_types() {
        let mut block = UniformBlock::new(&[UniformDecl::new("world", UniformKind::Mat4)]);
        assert_eq!(
            block.set("view", Mat4::IDENTITY.into()).unwrap_err(),
            UniformError::Unknown("view".into())
        );
        assert_eq!(
            block.set("world", 1.0f32.into()).unwrap_err(),
            UniformError::TypeMismatch {
                name: "world".into(),
                expected: UniformKind::Mat4,
                found: "float"
            }
        );
    }
}
