use crate::blocks::BlockInstance;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Clear color, also what distant geometry fades into.
pub const SKY: [f32; 3] = [0.52, 0.7, 0.86];

const FOG_FAR: f32 = 60.0;
const SHADOW_RADIUS: f32 = 0.6;
const GROUND_HALF_EXTENT: f32 = 60.0;
// Placeholder avatars are a dozen blocks; glTF rigs can carry a few hundred nodes.
const MAX_BLOCKS: usize = 1_024;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
    avatar: [f32; 4],
    sky: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct CubeVertex {
    corner: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct BlockRaw {
    model: [[f32; 4]; 4],
    albedo: [f32; 4],
    role: u32,
    _pad: [u32; 3],
}

impl From<&BlockInstance> for BlockRaw {
    fn from(b: &BlockInstance) -> Self {
        Self {
            model: b.model.to_cols_array_2d(),
            albedo: b.color(),
            role: b.role as u32,
            _pad: [0; 3],
        }
    }
}

/// Everything one frame of the avatar view needs.
#[derive(Debug, Clone, Copy)]
pub struct RenderFrame<'a> {
    pub view_proj: Mat4,
    pub eye: Vec3,
    /// Avatar position; its shadow is drawn under it.
    pub avatar: Vec3,
    /// Seconds since the scene started (drives the loading pulse).
    pub time: f32,
    pub blocks: &'a [BlockInstance],
    /// Off while the scene runs degraded.
    pub draw_ground: bool,
    /// Fraction of the surface resolution to render at, upscaled on present.
    pub render_scale: f32,
}

/// Size of the scene target for a surface of `width` x `height` at `scale`.
/// The scale is clamped to `[0.1, 1]` and neither side drops below 1 px.
pub fn scaled_extent(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let scale = if scale.is_finite() {
        scale.clamp(0.1, 1.0)
    } else {
        1.0
    };
    let side = |px: u32| ((px as f32 * scale).round() as u32).max(1);
    (side(width), side(height))
}

/// Unit cube centered on the origin, four vertices per face.
fn cube_mesh() -> (Vec<CubeVertex>, Vec<u16>) {
    // (normal, u, v) with u x v == normal, so each face winds counter-clockwise
    // seen from outside.
    const FACES: [[Vec3; 3]; 6] = [
        [Vec3::Z, Vec3::X, Vec3::Y],
        [Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y],
        [Vec3::X, Vec3::NEG_Z, Vec3::Y],
        [Vec3::NEG_X, Vec3::Z, Vec3::Y],
        [Vec3::Y, Vec3::X, Vec3::NEG_Z],
        [Vec3::NEG_Y, Vec3::X, Vec3::Z],
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for [normal, u, v] in FACES {
        let base = vertices.len() as u16;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            vertices.push(CubeVertex {
                corner: (0.5 * (normal + u * su + v * sv)).to_array(),
                normal: normal.to_array(),
            });
        }
        indices.extend([0, 1, 2, 2, 3, 0].map(|i| base + i));
    }
    (vertices, indices)
}

/// Two triangles covering the ground plane, facing +Y.
fn ground_quad(half: f32) -> [[f32; 3]; 6] {
    [
        [-half, 0.0, -half],
        [-half, 0.0, half],
        [half, 0.0, half],
        [half, 0.0, half],
        [half, 0.0, -half],
        [-half, 0.0, -half],
    ]
}

/// Offscreen color and depth the scene is drawn into before upscaling.
struct SceneTarget {
    extent: (u32, u32),
    color: wgpu::TextureView,
    depth: wgpu::TextureView,
    upscale_bind_group: wgpu::BindGroup,
}

impl SceneTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        extent: (u32, u32),
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
    ) -> Self {
        let texture = |label, format, usage| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width: extent.0,
                        height: extent.1,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage,
                    view_formats: &[],
                })
                .create_view(&Default::default())
        };
        let color = texture(
            "scene_color",
            format,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let depth = texture(
            "scene_depth",
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let upscale_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("upscale_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        Self {
            extent,
            color,
            depth,
            upscale_bind_group,
        }
    }
}

/// wgpu renderer for the avatar view: ground, instanced avatar blocks, and an
/// upscale pass so degraded frames can render at reduced resolution.
pub struct WgpuRenderer {
    block_pipeline: wgpu::RenderPipeline,
    ground_pipeline: wgpu::RenderPipeline,
    upscale_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    upscale_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    cube_vertices: wgpu::Buffer,
    cube_indices: wgpu::Buffer,
    cube_index_count: u32,
    ground_vertices: wgpu::Buffer,
    block_buffer: wgpu::Buffer,
    surface_format: wgpu::TextureFormat,
    surface_size: (u32, u32),
    target: SceneTarget,
}

/// Pipeline drawing into the scene target (depth tested, opaque).
#[allow(clippy::too_many_arguments)]
fn scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    label: &str,
    source: String,
    entries: (&str, &str),
    buffers: &[wgpu::VertexBufferLayout<'_>],
    cull_mode: Option<wgpu::Face>,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some(entries.0),
            compilation_options: Default::default(),
            buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some(entries.1),
            compilation_options: Default::default(),
            targets: &[Some(format.into())],
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });
        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });

        let block_pipeline = scene_pipeline(
            device,
            &scene_layout,
            surface_format,
            "block_pipeline",
            shaders::block_shader(),
            ("vs_block", "fs_block"),
            &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<CubeVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<BlockRaw>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        2 => Float32x4,
                        3 => Float32x4,
                        4 => Float32x4,
                        5 => Float32x4,
                        6 => Float32x4,
                        7 => Uint32,
                    ],
                },
            ],
            Some(wgpu::Face::Back),
        );
        let ground_pipeline = scene_pipeline(
            device,
            &scene_layout,
            surface_format,
            "ground_pipeline",
            shaders::ground_shader(),
            ("vs_ground", "fs_ground"),
            &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3],
            }],
            None,
        );

        let upscale_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("upscale_layout"),
            entries: &[
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
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let upscale_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("upscale_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::UPSCALE_SHADER.into()),
        });
        let upscale_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("upscale_pipeline"),
            layout: Some(&device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("upscale_pipeline_layout"),
                bind_group_layouts: &[&upscale_layout],
                push_constant_ranges: &[],
            })),
            vertex: wgpu::VertexState {
                module: &upscale_module,
                entry_point: Some("vs_upscale"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &upscale_module,
                entry_point: Some("fs_upscale"),
                compilation_options: Default::default(),
                targets: &[Some(surface_format.into())],
            }),
            primitive: Default::default(),
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("upscale_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let (cube, cube_index_list) = cube_mesh();
        let cube_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_vertices"),
            contents: bytemuck::cast_slice(&cube),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_indices"),
            contents: bytemuck::cast_slice(&cube_index_list),
            usage: wgpu::BufferUsages::INDEX,
        });
        let ground_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ground_vertices"),
            contents: bytemuck::cast_slice(&ground_quad(GROUND_HALF_EXTENT)),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let block_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("block_instances"),
            size: (MAX_BLOCKS * std::mem::size_of::<BlockRaw>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let surface_size = (width.max(1), height.max(1));
        let target = SceneTarget::new(device, surface_format, surface_size, &upscale_layout, &sampler);

        tracing::debug!(?surface_format, width, height, "avatar renderer created");
        Self {
            block_pipeline,
            ground_pipeline,
            upscale_pipeline,
            frame_buffer,
            frame_bind_group,
            upscale_layout,
            sampler,
            cube_vertices,
            cube_indices,
            cube_index_count: cube_index_list.len() as u32,
            ground_vertices,
            block_buffer,
            surface_format,
            surface_size,
            target,
        }
    }

    /// Track the surface size; the scene target follows on the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_size = (width.max(1), height.max(1));
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Current scene target size in pixels.
    pub fn scene_extent(&self) -> (u32, u32) {
        self.target.extent
    }

    /// Draw `frame` into the scene target, then upscale it onto `surface`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface: &wgpu::TextureView,
        frame: &RenderFrame<'_>,
    ) {
        let (w, h) = self.surface_size;
        let extent = scaled_extent(w, h, frame.render_scale);
        if extent != self.target.extent {
            tracing::debug!(?extent, scale = frame.render_scale, "resizing scene target");
            self.target = SceneTarget::new(
                device,
                self.surface_format,
                extent,
                &self.upscale_layout,
                &self.sampler,
            );
        }

        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms {
                view_proj: frame.view_proj.to_cols_array_2d(),
                eye: frame.eye.extend(FOG_FAR).to_array(),
                avatar: [frame.avatar.x, frame.avatar.z, SHADOW_RADIUS, frame.time],
                sky: [SKY[0], SKY[1], SKY[2], 1.0],
            }),
        );

        if frame.blocks.len() > MAX_BLOCKS {
            tracing::warn!(
                blocks = frame.blocks.len(),
                max = MAX_BLOCKS,
                "avatar exceeds block buffer, truncating"
            );
        }
        let raw: Vec<BlockRaw> = frame
            .blocks
            .iter()
            .take(MAX_BLOCKS)
            .map(BlockRaw::from)
            .collect();
        if !raw.is_empty() {
            queue.write_buffer(&self.block_buffer, 0, bytemuck::cast_slice(&raw));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("avatar_encoder"),
        });
        {
            let [r, g, b] = SKY.map(f64::from);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.frame_bind_group, &[]);

            if frame.draw_ground {
                pass.set_pipeline(&self.ground_pipeline);
                pass.set_vertex_buffer(0, self.ground_vertices.slice(..));
                pass.draw(0..6, 0..1);
            }
            if !raw.is_empty() {
                pass.set_pipeline(&self.block_pipeline);
                pass.set_vertex_buffer(0, self.cube_vertices.slice(..));
                pass.set_vertex_buffer(1, self.block_buffer.slice(..));
                pass.set_index_buffer(self.cube_indices.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..self.cube_index_count, 0, 0..raw.len() as u32);
            }
        }
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("upscale_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: surface,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
            pass.set_pipeline(&self.upscale_pipeline);
            pass.set_bind_group(0, &self.target.upscale_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_faces_wind_outward() {
        let (verts, indices) = cube_mesh();
        assert_eq!(verts.len(), 24);
        assert_eq!(indices.len(), 36);
        for tri in indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| Vec3::from(verts[tri[k] as usize].corner));
            let normal = Vec3::from(verts[tri[0] as usize].normal);
            let face = (b - a).cross(c - a);
            assert!(face.dot(normal) > 0.0);
            // Corners sit on the face they belong to.
            assert!((a.dot(normal) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn cube_spans_unit_extent() {
        let (verts, _) = cube_mesh();
        for v in &verts {
            assert!(v.corner.iter().all(|c| c.abs() == 0.5));
        }
    }

    #[test]
    fn ground_faces_up() {
        let quad = ground_quad(10.0);
        for tri in quad.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| Vec3::from(tri[k]));
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn degraded_scale_halves_each_side() {
        assert_eq!(scaled_extent(1280, 720, 1.0), (1280, 720));
        assert_eq!(scaled_extent(1280, 720, 0.5), (640, 360));
        assert_eq!(scaled_extent(3, 1, 0.5), (2, 1));
    }

    #[test]
    fn scale_is_clamped() {
        assert_eq!(scaled_extent(100, 100, 2.0), (100, 100));
        assert_eq!(scaled_extent(100, 100, 0.0), (10, 10));
        assert_eq!(scaled_extent(100, 100, f32::NAN), (100, 100));
        assert_eq!(scaled_extent(0, 0, 1.0), (1, 1));
    }

    #[test]
    fn block_layout_matches_shader_attributes() {
        // Four model columns and the albedo, then the role word (+ padding).
        assert_eq!(std::mem::size_of::<BlockRaw>(), 96);
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 112);
    }
}
