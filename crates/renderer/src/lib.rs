//! Renderer: wgpu init, renderable elements (imported mesh + full-screen quad).
//! wgpu = 26.x, winit = 0.30.x
//!
//! Frame layout: the scene renders into an offscreen target bound to texture
//! unit 0, then the quad composites that unit onto the swapchain.

pub mod context;
pub mod element;
pub mod error;
pub mod obj_mesh;
pub mod quad;
pub mod uniform;

use std::sync::Arc;

use corelib::camera::Camera;
use wgpu::{
    CommandEncoderDescriptor, Device, DeviceDescriptor, Extent3d, Features, Instance,
    InstanceDescriptor, Limits, LoadOp, Operations, PowerPreference, PresentMode,
    RenderPassColorAttachment, RenderPassDescriptor, StoreOp, Surface, SurfaceConfiguration,
    SurfaceError, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor,
};
use winit::{dpi::PhysicalSize, window::Window};

pub use context::{RenderContext, TargetDesc};
pub use element::{Element, Geometry, ProgramDesc, Renderable, VertexAttr};
pub use error::{RenderError, RenderResult};
pub use obj_mesh::ObjMesh;
pub use quad::Quad;
pub use uniform::{UniformDecl, UniformKind, UniformValue};

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Unit the offscreen scene color target is bound to.
pub const SCENE_TEXTURE_UNIT: u32 = quad::BLIT_TEXTURE_UNIT as u32;

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    ctx: RenderContext,
    camera: Camera,

    // Scene pass depth (scene color lives in ctx texture units)
    depth_view: TextureView,

    scene: Vec<Box<dyn Renderable>>,
    compositor: Quad,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window>, with `mesh_text` as the scene.
    pub async fn new(
        window: Arc<Window>,
        backends: wgpu::Backends,
        mesh_text: &str,
    ) -> RenderResult<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .map_err(|e| RenderError::gpu("surface", e))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::gpu("adapter", e))?;
        let info = adapter.get_info();
        log::info!("Adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Lumen3D Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| RenderError::gpu("device", e))?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| RenderError::gpu("surface", "no supported surface formats"))?;
        log::info!("Surface format: {:?}", surface_format);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        // Scene target shares the surface format so the blit is an exact copy.
        let mut ctx = RenderContext::new(
            device,
            queue,
            TargetDesc {
                color: surface_format,
                depth: Some(DEPTH_FORMAT),
            },
            TargetDesc {
                color: surface_format,
                depth: None,
            },
        );
        let depth_view = create_depth_view(&ctx.device, &surface_config);
        let scene_view = create_scene_view(&ctx.device, &surface_config);
        ctx.bind_texture(SCENE_TEXTURE_UNIT, scene_view);

        let camera = Camera::default().with_aspect(width as f32 / height as f32);
        ctx.write_camera(&camera);

        let mesh = ObjMesh::new(&ctx, mesh_text)?;
        let compositor = Quad::new(&ctx)?;
        log::info!("Scene ready: 1 mesh, {}x{}", width, height);

        Ok(Self {
            surface,
            surface_config,
            ctx,
            camera,
            depth_view,
            scene: vec![Box::new(mesh)],
            compositor,
            width,
            height,
        })
    }

    /// Resize: reconfigure surface, recreate depth and scene targets.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.ctx.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.ctx.device, &self.surface_config);
        let scene_view = create_scene_view(&self.ctx.device, &self.surface_config);
        self.ctx.bind_texture(SCENE_TEXTURE_UNIT, scene_view);
        self.camera = self
            .camera
            .with_aspect(self.width as f32 / self.height as f32);
        log::debug!("Render targets resized to {}x{}", self.width, self.height);
    }

    /// Render one frame at `time` seconds: scene pass, then composite.
    pub fn render(&mut self, time: f32) -> RenderResult<()> {
        self.ctx.write_camera(&self.camera);

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let scene_view = self
                .ctx
                .texture(SCENE_TEXTURE_UNIT)
                .ok_or(RenderError::MissingTexture(SCENE_TEXTURE_UNIT))?;
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("ScenePass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: scene_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color {
                            r: 0.05,
                            g: 0.05,
                            b: 0.08,
                            a: 1.0,
                        }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for renderable in &mut self.scene {
                renderable.render(&self.ctx, &mut rpass, time)?;
            }
        }

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("CompositePass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color::BLACK),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.compositor.render(&self.ctx, &mut rpass, time)?;
        }

        self.ctx.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &RenderError) -> bool {
        matches!(
            err,
            RenderError::Surface(SurfaceError::Lost | SurfaceError::Outdated)
        )
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    create_target_view(device, sc, "DepthTex", DEPTH_FORMAT, TextureUsages::RENDER_ATTACHMENT)
}

/// Offscreen color target the scene draws into and the quad reads back.
fn create_scene_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    create_target_view(
        device,
        sc,
        "SceneColorTex",
        sc.format,
        TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
    )
}

fn create_target_view(
    device: &Device,
    sc: &SurfaceConfiguration,
    label: &str,
    format: TextureFormat,
    usage: TextureUsages,
) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some(label),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}
