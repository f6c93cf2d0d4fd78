//! Presents a CPU-painted [`PixelBuffer`] through wgpu
//!
//! The frame is uploaded into an RGBA8 texture and drawn with a single
//! full-screen triangle, letterboxed to keep the frame's aspect ratio on
//! any surface size.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::buffer::PixelBuffer;

/// Clip-space scale of the presented quad (matches WGSL)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameView {
    pub scale: [f32; 2],
    pub _padding: [f32; 2],
}

impl FrameView {
    /// Largest centred rectangle of the frame's aspect that fits the surface
    pub fn letterbox(frame: (u32, u32), surface: (u32, u32)) -> Self {
        let frame_aspect = frame.0.max(1) as f32 / frame.1.max(1) as f32;
        let surface_aspect = surface.0.max(1) as f32 / surface.1.max(1) as f32;
        let scale = if surface_aspect > frame_aspect {
            [frame_aspect / surface_aspect, 1.0]
        } else {
            [1.0, surface_aspect / frame_aspect]
        };
        Self {
            scale,
            _padding: [0.0; 2],
        }
    }
}

pub struct FrameRenderer {
    render_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    view_buffer: wgpu::Buffer,
    texture_format: wgpu::TextureFormat,
    frame_size: (u32, u32),
    surface_size: (u32, u32),
}

impl FrameRenderer {
    pub fn new(device: &wgpu::Device, surface_config: &wgpu::SurfaceConfiguration, width: u32, height: u32) -> Self {
        let surface_format = surface_config.format;
        let surface_size = (surface_config.width, surface_config.height);
        // Bytes are display values; let the sRGB surface round-trip them unchanged
        let texture_format = if surface_format.is_srgb() {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Present Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/present.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[
                // Frame texture - Binding 0
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Sampler - Binding 1
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Letterbox scale (Uniform) - Binding 2
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Frame Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Present Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Present Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vertex"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fragment"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let view_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame View Buffer"),
            contents: bytemuck::cast_slice(&[FrameView::letterbox((width, height), surface_size)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let texture = Self::create_texture(device, texture_format, width, height);
        let bind_group = Self::create_bind_group(device, &bind_group_layout, &texture, &sampler, &view_buffer);

        log::info!("✓ Frame renderer ready ({width}x{height}, {texture_format:?})");

        Self {
            render_pipeline,
            bind_group_layout,
            sampler,
            texture,
            bind_group,
            view_buffer,
            texture_format,
            frame_size: (width, height),
            surface_size,
        }
    }

    fn create_texture(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        texture: &wgpu::Texture,
        sampler: &wgpu::Sampler,
        view_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: view_buffer.as_entire_binding(),
                },
            ],
        })
    }

    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }

    fn write_view(&self, queue: &wgpu::Queue) {
        let view = FrameView::letterbox(self.frame_size, self.surface_size);
        queue.write_buffer(&self.view_buffer, 0, bytemuck::cast_slice(&[view]));
    }

    /// Follow a surface reconfiguration
    pub fn resize(&mut self, queue: &wgpu::Queue, new_config: &wgpu::SurfaceConfiguration) {
        self.surface_size = (new_config.width, new_config.height);
        self.write_view(queue);
    }

    /// Reallocate the frame texture when the painted resolution changes
    pub fn resize_frame(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) {
        if self.frame_size == (width, height) {
            return;
        }
        log::debug!("Frame texture resized to {width}x{height}");
        self.texture = Self::create_texture(device, self.texture_format, width, height);
        self.bind_group = Self::create_bind_group(
            device,
            &self.bind_group_layout,
            &self.texture,
            &self.sampler,
            &self.view_buffer,
        );
        self.frame_size = (width, height);
        self.write_view(queue);
    }

    /// Copy the painted frame into the texture
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, frame: &PixelBuffer) {
        self.resize_frame(device, queue, frame.width(), frame.height());
        if frame.width() == 0 || frame.height() == 0 {
            return;
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.to_rgba8(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * frame.width()),
                rows_per_image: Some(frame.height()),
            },
            wgpu::Extent3d {
                width: frame.width(),
                height: frame.height(),
                depth_or_array_layers: 1,
            },
        );
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Present Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}
