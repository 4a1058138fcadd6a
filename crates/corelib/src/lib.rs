//! Core types: math re-exports, Transform, Camera, time sources.

pub use glam::{EulerRot, Mat4, Quat, Vec3, vec3};

pub mod camera;
pub mod clock;
pub mod transform;
