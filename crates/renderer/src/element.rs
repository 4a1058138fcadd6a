//! Base drawable: one shader program, one vertex buffer, one index buffer.
//!
//! Concrete renderables own an [`Element`] and only supply the per-frame
//! uniform hook through [`Renderable::update`].

use asset::InterleavedMesh;
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    DepthBiasState, DepthStencilState, Device, FragmentState, PipelineLayoutDescriptor,
    RenderPass, RenderPipeline, RenderPipelineDescriptor, ShaderModule, ShaderModuleDescriptor,
    ShaderSource, ShaderStages, TextureSampleType, TextureViewDimension, VertexAttribute,
    VertexBufferLayout, VertexFormat, VertexState, VertexStepMode, util::DeviceExt,
};

use crate::context::{RenderContext, TargetDesc};
use crate::error::{RenderError, RenderResult};
use crate::uniform::{UniformBlock, UniformDecl, UniformValue};

/// Float attribute inside an interleaved record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttr {
    pub location: u32,
    /// 2, 3 or 4 floats.
    pub components: u32,
    /// Offset in floats from the record start.
    pub offset: u32,
}

impl VertexAttr {
    pub const fn new(location: u32, components: u32, offset: u32) -> Self {
        Self {
            location,
            components,
            offset,
        }
    }

    fn format(&self) -> VertexFormat {
        match self.components {
            1 => VertexFormat::Float32,
            2 => VertexFormat::Float32x2,
            3 => VertexFormat::Float32x3,
            _ => VertexFormat::Float32x4,
        }
    }
}

/// CPU geometry handed to an element: interleaved floats plus `u32` indices.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    /// Floats per vertex record.
    pub stride: u32,
    pub attributes: Vec<VertexAttr>,
}

impl Geometry {
    pub fn new(vertices: Vec<f32>, indices: Vec<u32>, stride: u32, attributes: Vec<VertexAttr>) -> Self {
        Self {
            vertices,
            indices,
            stride,
            attributes,
        }
    }

    /// Shader locations: 0 position, 1 normal, 2 texcoord (textured meshes only).
    pub fn from_mesh(mesh: InterleavedMesh) -> Self {
        let layout = mesh.layout;
        let mut attributes = vec![
            VertexAttr::new(0, 3, layout.position_offset() as u32),
            VertexAttr::new(1, 3, layout.normal_offset() as u32),
        ];
        if let Some(uv) = layout.texcoord_offset() {
            attributes.push(VertexAttr::new(2, 2, uv as u32));
        }
        Self::new(
            mesh.vertices,
            mesh.indices,
            layout.stride() as u32,
            attributes,
        )
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn stride_bytes(&self) -> u64 {
        u64::from(self.stride) * std::mem::size_of::<f32>() as u64
    }

    fn wgpu_attributes(&self) -> Vec<VertexAttribute> {
        self.attributes
            .iter()
            .map(|a| VertexAttribute {
                format: a.format(),
                offset: u64::from(a.offset) * std::mem::size_of::<f32>() as u64,
                shader_location: a.location,
            })
            .collect()
    }
}

/// Shader program description. `source` is WGSL with `vs_main`/`fs_main`.
///
/// Bind groups: 0 = camera (from the context), 1 = element locals
/// (binding 0 uniform struct, bindings 1.. the texture uniforms in order).
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub source: &'a str,
    pub uniforms: &'a [UniformDecl],
    pub target: TargetDesc,
}

struct GpuGeometry {
    vertex_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,
}

pub struct Element {
    label: String,
    pipeline: RenderPipeline,
    locals_bgl: BindGroupLayout,
    locals_buf: Buffer,
    uniforms: UniformBlock,
    geometry: Geometry,
    gpu: Option<GpuGeometry>,
}

impl Element {
    pub fn new(ctx: &RenderContext, desc: &ProgramDesc<'_>, geometry: Geometry) -> RenderResult<Self> {
        let device = &ctx.device;
        let uniforms = UniformBlock::new(desc.uniforms);

        let shader = compile_shader(device, desc.label, desc.source)?;

        let mut entries = vec![BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        entries.extend(
            uniforms
                .texture_names()
                .enumerate()
                .map(|(i, _)| BindGroupLayoutEntry {
                    binding: 1 + i as u32,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                }),
        );
        let locals_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some(&format!("{} locals BGL", desc.label)),
            entries: &entries,
        });

        let locals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} locals UBO", desc.label)),
            size: uniforms.size().max(16) as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(&format!("{} pipeline layout", desc.label)),
            bind_group_layouts: &[ctx.camera_layout(), &locals_bgl],
            push_constant_ranges: &[],
        });

        let attributes = geometry.wgpu_attributes();
        let vertex_layout = VertexBufferLayout {
            array_stride: geometry.stride_bytes(),
            step_mode: VertexStepMode::Vertex,
            attributes: &attributes,
        };

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: desc.target.color,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: desc.target.depth.map(|format| DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::gpu(desc.label, err));
        }

        log::info!(
            "Element '{}' ready: {} floats/vertex, {} indices",
            desc.label,
            geometry.stride,
            geometry.indices.len()
        );

        Ok(Self {
            label: desc.label.to_owned(),
            pipeline,
            locals_bgl,
            locals_buf,
            uniforms,
            geometry,
            gpu: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> RenderResult<()> {
        self.uniforms.set(name, value)?;
        Ok(())
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Create the GPU vertex/index buffers. Runs once; later calls are no-ops.
    pub fn upload_geometry(&mut self, device: &Device) {
        if self.gpu.is_some() || self.geometry.indices.is_empty() {
            return;
        }
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} VB", self.label)),
            contents: bytemuck::cast_slice(&self.geometry.vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} IB", self.label)),
            contents: bytemuck::cast_slice(&self.geometry.indices),
            usage: BufferUsages::INDEX,
        });
        log::debug!(
            "Uploaded '{}': {} bytes vertex data, {} indices",
            self.label,
            self.geometry.vertices.len() * std::mem::size_of::<f32>(),
            self.geometry.indices.len()
        );
        self.gpu = Some(GpuGeometry {
            vertex_buf,
            index_buf,
            index_count: self.geometry.index_count(),
        });
    }

    /// Flush uniforms, then record one indexed draw into `pass`.
    pub fn draw(&mut self, ctx: &RenderContext, pass: &mut RenderPass<'_>) -> RenderResult<()> {
        self.upload_geometry(&ctx.device);

        if self.uniforms.take_dirty() && self.uniforms.size() > 0 {
            ctx.queue
                .write_buffer(&self.locals_buf, 0, self.uniforms.bytes());
        }
        let locals_bg = self.locals_bind_group(ctx)?;

        let Some(gpu) = self.gpu.as_ref() else {
            return Ok(());
        };

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, ctx.camera_bind_group(), &[]);
        pass.set_bind_group(1, &locals_bg, &[]);
        pass.set_vertex_buffer(0, gpu.vertex_buf.slice(..));
        pass.set_index_buffer(gpu.index_buf.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..gpu.index_count, 0, 0..1);
        Ok(())
    }

    /// Texture units are resolved per draw so rebinding a unit (e.g. on resize)
    /// is picked up on the next frame.
    fn locals_bind_group(&self, ctx: &RenderContext) -> RenderResult<BindGroup> {
        let mut views = Vec::new();
        for name in self.uniforms.texture_names() {
            let unit = self
                .uniforms
                .texture_unit(name)
                .ok_or(RenderError::UnassignedTexture(name))?;
            let view = ctx.texture(unit).ok_or(RenderError::MissingTexture(unit))?;
            views.push(view);
        }

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: self.locals_buf.as_entire_binding(),
        }];
        entries.extend(views.into_iter().enumerate().map(|(i, view)| {
            wgpu::BindGroupEntry {
                binding: 1 + i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            }
        }));

        Ok(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&self.label),
            layout: &self.locals_bgl,
            entries: &entries,
        }))
    }
}

/// Per-frame drawable built on an [`Element`].
pub trait Renderable {
    fn element_mut(&mut self) -> &mut Element;

    /// Uniform hook; runs before the draw call each frame.
    fn update(&mut self, _time: f32) -> RenderResult<()> {
        Ok(())
    }

    fn render(
        &mut self,
        ctx: &RenderContext,
        pass: &mut RenderPass<'_>,
        time: f32,
    ) -> RenderResult<()> {
        self.update(time)?;
        self.element_mut().draw(ctx, pass)
    }
}

/// Create a shader module, turning WGSL validation failures into errors.
pub fn compile_shader(device: &Device, label: &str, source: &str) -> RenderResult<ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(label),
        source: ShaderSource::Wgsl(source.into()),
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::ShaderCompile {
            label: label.to_owned(),
            message: err.to_string(),
        });
    }
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::VertexLayout;

    #[test]
    fn untextured_mesh_maps_position_and_normal() {
        let mesh = InterleavedMesh::new(VertexLayout::PositionNormal, vec![0.0; 18], vec![0, 1, 2]);
        let g = Geometry::from_mesh(mesh);
        assert_eq!(g.stride, 6);
        assert_eq!(g.stride_bytes(), 24);
        assert_eq!(
            g.attributes,
            vec![VertexAttr::new(0, 3, 0), VertexAttr::new(1, 3, 3)]
        );
        assert_eq!(g.index_count(), 3);
    }

    #[test]
    fn textured_mesh_skips_uv_for_normal() {
        let mesh = InterleavedMesh::new(
            VertexLayout::PositionTexcoordNormal,
            vec![0.0; 24],
            vec![0, 1, 2],
        );
        let g = Geometry::from_mesh(mesh);
        assert_eq!(g.stride, 8);
        let attrs = g.wgpu_attributes();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[1].offset, 20);
        assert_eq!(attrs[1].shader_location, 1);
        assert_eq!(attrs[2].format, VertexFormat::Float32x2);
        assert_eq!(attrs[2].offset, 12);
    }
}
