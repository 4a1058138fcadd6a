//! Renderer handle shared by every element: device/queue, target formats,
//! the camera uniform and the texture-unit table.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use corelib::camera::Camera;
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    Buffer, BufferBindingType, BufferUsages, Device, Queue, ShaderStages, TextureFormat,
    TextureView, util::DeviceExt,
};

/// Formats of the attachments an element draws into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetDesc {
    pub color: TextureFormat,
    pub depth: Option<TextureFormat>,
}

/// Camera UBO: `camera { view, projection }` at group 0 (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view: camera.view().to_cols_array_2d(),
            projection: camera.proj().to_cols_array_2d(),
        }
    }
}

pub struct RenderContext {
    pub device: Device,
    pub queue: Queue,
    /// Offscreen scene pass (color + depth).
    pub scene_target: TargetDesc,
    /// Swapchain composition pass.
    pub present_target: TargetDesc,

    camera_bgl: BindGroupLayout,
    camera_bg: BindGroup,
    camera_buf: Buffer,

    texture_units: Vec<Option<TextureView>>,
}

impl RenderContext {
    pub fn new(
        device: Device,
        queue: Queue,
        scene_target: TargetDesc,
        present_target: TargetDesc,
    ) -> Self {
        let camera_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Camera BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(
                        std::mem::size_of::<CameraUniform>() as u64
                    ),
                },
                count: None,
            }],
        });

        let camera_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera UBO"),
            contents: bytemuck::bytes_of(&CameraUniform::from_camera(&Camera::default())),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let camera_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera BG"),
            layout: &camera_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buf.as_entire_binding(),
            }],
        });

        Self {
            device,
            queue,
            scene_target,
            present_target,
            camera_bgl,
            camera_bg,
            camera_buf,
            texture_units: Vec::new(),
        }
    }

    pub fn write_camera(&self, camera: &Camera) {
        let cam = CameraUniform::from_camera(camera);
        self.queue
            .write_buffer(&self.camera_buf, 0, bytemuck::bytes_of(&cam));
    }

    pub fn camera_layout(&self) -> &BindGroupLayout {
        &self.camera_bgl
    }

    pub fn camera_bind_group(&self) -> &BindGroup {
        &self.camera_bg
    }

    /// Put a texture view into `unit`, replacing what was there.
    pub fn bind_texture(&mut self, unit: u32, view: TextureView) {
        let idx = unit as usize;
        if idx >= self.texture_units.len() {
            self.texture_units.resize_with(idx + 1, || None);
        }
        self.texture_units[idx] = Some(view);
    }

    pub fn texture(&self, unit: u32) -> Option<&TextureView> {
        self.texture_units.get(unit as usize)?.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn camera_uniform_is_two_mat4() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 128);
    }

    #[test]
    fn camera_uniform_copies_matrices() {
        let cam = Camera::default();
        let u = CameraUniform::from_camera(&cam);
        assert_eq!(Mat4::from_cols_array_2d(&u.view), cam.view());
        assert_eq!(Mat4::from_cols_array_2d(&u.projection), cam.proj());
    }
}
