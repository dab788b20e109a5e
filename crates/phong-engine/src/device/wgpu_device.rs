use std::collections::HashMap;
use std::num::NonZeroU64;
use std::ops::Range;
use std::sync::Arc;

use winit::window::Window;

use crate::error::{DeviceError, InitError, ReleaseError};
use crate::mesh::{AttributeFormat, Vertex, VertexLayout};
use crate::shader::{ProgramInterface, StageMask, UniformSlot};
use crate::state::{BlendMode, ClearColor, CullMode, DepthCompare, RenderState, Winding};

use super::raster::{BufferId, ProgramId, RasterDevice};
use super::{Gpu, GpuInit};

struct DeviceBuffer {
    /// `None` once released.
    buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    layout: VertexLayout,
}

struct DeviceProgram {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
    layout: wgpu::PipelineLayout,
    bind_groups: Vec<wgpu::BindGroup>,
    uniform_buffers: Vec<wgpu::Buffer>,
    /// Pipeline baked for the state it was built with.
    pipeline: Option<(RenderState, wgpu::RenderPipeline)>,
}

struct DrawRecord {
    program: ProgramId,
    buffer: BufferId,
    vertices: Range<u32>,
}

/// Commands accumulated between two presents.
#[derive(Default)]
struct FrameRecording {
    clear: Option<ClearColor>,
    draws: Vec<DrawRecord>,
}

/// [`RasterDevice`] backed by wgpu and presenting to a winit window.
///
/// Immediate-mode calls are recorded and encoded as a single render pass at
/// `present`. Global state is baked into each program's pipeline; pipelines
/// are rebuilt lazily when the applied state changes.
pub struct WgpuDevice {
    window: Arc<Window>,
    gpu: Gpu,

    state: RenderState,
    buffers: HashMap<BufferId, DeviceBuffer>,
    programs: HashMap<ProgramId, DeviceProgram>,
    next_id: u32,

    bound_program: Option<ProgramId>,
    bound_buffer: Option<BufferId>,
    frame: FrameRecording,
}

impl WgpuDevice {
    pub fn new(window: Arc<Window>, init: GpuInit) -> Result<Self, InitError> {
        let size = window.inner_size();
        let gpu = pollster::block_on(Gpu::new(window.clone(), init)).map_err(InitError::Gpu)?;

        log::info!(
            "device ready: {}x{} {:?}",
            size.width,
            size.height,
            gpu.surface_format()
        );

        Ok(Self {
            window,
            gpu,
            state: RenderState::for_extent(size.width, size.height),
            buffers: HashMap::new(),
            programs: HashMap::new(),
            next_id: 1,
            bound_program: None,
            bound_buffer: None,
            frame: FrameRecording::default(),
        })
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn ensure_pipeline(&mut self, program: ProgramId, layout: VertexLayout) -> Result<(), DeviceError> {
        let state = self.state;
        let color_format = self.gpu.surface_format();
        let depth_format = self.gpu.depth_format();
        let device = self.gpu.device();

        let entry = self
            .programs
            .get_mut(&program)
            .ok_or(DeviceError::UnknownProgram(program.0))?;

        if matches!(&entry.pipeline, Some((built_for, _)) if *built_for == state) {
            return Ok(());
        }

        let attributes: Vec<wgpu::VertexAttribute> = layout
            .attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: vertex_format(a.format),
                offset: a.offset,
                shader_location: a.location,
            })
            .collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("phong pipeline"),
            layout: Some(&entry.layout),

            vertex: wgpu::VertexState {
                module: &entry.vertex,
                entry_point: Some(&entry.vertex_entry),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: layout.stride,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },

            fragment: Some(wgpu::FragmentState {
                module: &entry.fragment,
                entry_point: Some(&entry.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: state.blend.map(blend_state),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: front_face(state.front_face),
                cull_mode: cull_mode(state.cull),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(depth_stencil(&state, depth_format)),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("built pipeline for program #{} ({:?})", program.0, state.cull);
        entry.pipeline = Some((state, pipeline));
        Ok(())
    }
}

impl RasterDevice for WgpuDevice {
    fn apply_state(&mut self, state: &RenderState) {
        if self.state == *state {
            return;
        }
        self.state = *state;
        // Pipelines are rebuilt against the new state on their next draw.
        for program in self.programs.values_mut() {
            program.pipeline = None;
        }
    }

    fn create_vertex_buffer(
        &mut self,
        vertices: &[Vertex],
        layout: VertexLayout,
    ) -> Result<BufferId, DeviceError> {
        use wgpu::util::DeviceExt;

        if vertices.is_empty() {
            return Err(DeviceError::EmptyUpload);
        }

        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("phong vertex buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let id = BufferId(self.next_id());
        self.buffers.insert(
            id,
            DeviceBuffer {
                buffer: Some(buffer),
                vertex_count: vertices.len() as u32,
                layout,
            },
        );
        Ok(id)
    }

    fn release_vertex_buffer(&mut self, buffer: BufferId) -> Result<(), DeviceError> {
        let entry = self
            .buffers
            .get_mut(&buffer)
            .ok_or(DeviceError::UnknownBuffer(buffer.0))?;
        let Some(raw) = entry.buffer.take() else {
            return Err(ReleaseError::AlreadyReleased("vertex buffer").into());
        };
        raw.destroy();
        if self.bound_buffer == Some(buffer) {
            self.bound_buffer = None;
        }
        Ok(())
    }

    fn create_program(&mut self, program: &ProgramInterface) -> Result<ProgramId, DeviceError> {
        let device = self.gpu.device();

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("phong vertex stage"),
            source: wgpu::ShaderSource::Wgsl(program.vertex().source().into()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("phong fragment stage"),
            source: wgpu::ShaderSource::Wgsl(program.fragment().source().into()),
        });

        let uniforms = program.uniforms();
        let group_count = uniforms.iter().map(|u| u.group + 1).max().unwrap_or(0);

        let uniform_buffers: Vec<wgpu::Buffer> = uniforms
            .iter()
            .map(|u| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(u.name.as_str()),
                    size: u64::from(u.size).max(16).next_multiple_of(16),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        let mut group_layouts = Vec::with_capacity(group_count as usize);
        let mut bind_groups = Vec::with_capacity(group_count as usize);
        for group in 0..group_count {
            let members: Vec<usize> = (0..uniforms.len())
                .filter(|&i| uniforms[i].group == group)
                .collect();

            let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = members
                .iter()
                .map(|&i| wgpu::BindGroupLayoutEntry {
                    binding: uniforms[i].binding,
                    visibility: visibility(uniforms[i].stages),
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(u64::from(uniforms[i].size)),
                    },
                    count: None,
                })
                .collect();

            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("phong uniform bgl"),
                entries: &layout_entries,
            });

            let entries: Vec<wgpu::BindGroupEntry> = members
                .iter()
                .map(|&i| wgpu::BindGroupEntry {
                    binding: uniforms[i].binding,
                    resource: uniform_buffers[i].as_entire_binding(),
                })
                .collect();

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("phong uniform bind group"),
                layout: &layout,
                entries: &entries,
            });

            group_layouts.push(layout);
            bind_groups.push(bind_group);
        }

        let layout_refs: Vec<&wgpu::BindGroupLayout> = group_layouts.iter().collect();
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("phong pipeline layout"),
            bind_group_layouts: &layout_refs,
            immediate_size: 0,
        });

        let id = ProgramId(self.next_id());
        self.programs.insert(
            id,
            DeviceProgram {
                vertex,
                fragment,
                vertex_entry: program.vertex().entry_point().to_string(),
                fragment_entry: program.fragment().entry_point().to_string(),
                layout,
                bind_groups,
                uniform_buffers,
                pipeline: None,
            },
        );
        Ok(id)
    }

    fn write_uniform(
        &mut self,
        program: ProgramId,
        slot: UniformSlot,
        bytes: &[u8],
    ) -> Result<(), DeviceError> {
        let entry = self
            .programs
            .get(&program)
            .ok_or(DeviceError::UnknownProgram(program.0))?;
        let buffer = entry
            .uniform_buffers
            .get(slot.index() as usize)
            .ok_or(DeviceError::UnknownSlot {
                program: program.0,
                slot: slot.index(),
            })?;
        self.gpu.queue().write_buffer(buffer, 0, bytes);
        Ok(())
    }

    fn use_program(&mut self, program: ProgramId) -> Result<(), DeviceError> {
        if !self.programs.contains_key(&program) {
            return Err(DeviceError::UnknownProgram(program.0));
        }
        self.bound_program = Some(program);
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId) -> Result<(), DeviceError> {
        match self.buffers.get(&buffer) {
            Some(b) if b.buffer.is_some() => {
                self.bound_buffer = Some(buffer);
                Ok(())
            }
            _ => Err(DeviceError::UnknownBuffer(buffer.0)),
        }
    }

    fn clear(&mut self, color: ClearColor) {
        self.frame.clear = Some(color);
    }

    fn draw(&mut self, vertices: Range<u32>) -> Result<(), DeviceError> {
        let program = self.bound_program.ok_or(DeviceError::NoProgramBound)?;
        let buffer = self.bound_buffer.ok_or(DeviceError::NoBufferBound)?;

        let (len, layout) = match self.buffers.get(&buffer) {
            Some(b) if b.buffer.is_some() => (b.vertex_count, b.layout),
            _ => return Err(DeviceError::UnknownBuffer(buffer.0)),
        };
        if vertices.start > vertices.end || vertices.end > len {
            return Err(DeviceError::DrawOutOfRange {
                buffer: buffer.0,
                first: vertices.start,
                end: vertices.end,
                len,
            });
        }

        self.ensure_pipeline(program, layout)?;
        self.frame.draws.push(DrawRecord {
            program,
            buffer,
            vertices,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        let recording = std::mem::take(&mut self.frame);

        let Some(mut frame) = self.gpu.acquire()? else {
            return Ok(());
        };

        let (color_load, depth_load) = match recording.clear {
            Some(c) => (
                wgpu::LoadOp::Clear(wgpu::Color {
                    r: c.r as f64,
                    g: c.g as f64,
                    b: c.b as f64,
                    a: c.a as f64,
                }),
                wgpu::LoadOp::Clear(1.0),
            ),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        // Render pass borrows frame.encoder; dropped before submit() takes frame.
        {
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("phong main pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.gpu.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let size = self.gpu.size();
            if let Some((x, y, w, h)) = clamp_viewport(&self.state, size.width, size.height) {
                rpass.set_viewport(x, y, w, h, 0.0, 1.0);
            }

            for draw in &recording.draws {
                let Some(program) = self.programs.get(&draw.program) else { continue };
                let Some((_, pipeline)) = program.pipeline.as_ref() else { continue };
                let Some(buffer) = self.buffers.get(&draw.buffer).and_then(|b| b.buffer.as_ref())
                else {
                    continue;
                };

                rpass.set_pipeline(pipeline);
                for (index, group) in program.bind_groups.iter().enumerate() {
                    rpass.set_bind_group(index as u32, group, &[]);
                }
                rpass.set_vertex_buffer(0, buffer.slice(..));
                rpass.draw(draw.vertices.clone(), 0..1);
            }
        }

        self.window.pre_present_notify();
        self.gpu.submit(frame);
        log::trace!("presented {} draws", recording.draws.len());
        Ok(())
    }
}

fn vertex_format(format: AttributeFormat) -> wgpu::VertexFormat {
    match format {
        AttributeFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        AttributeFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
    }
}

fn visibility(stages: StageMask) -> wgpu::ShaderStages {
    let mut out = wgpu::ShaderStages::NONE;
    if stages.vertex {
        out |= wgpu::ShaderStages::VERTEX;
    }
    if stages.fragment {
        out |= wgpu::ShaderStages::FRAGMENT;
    }
    out
}

fn cull_mode(cull: CullMode) -> Option<wgpu::Face> {
    match cull {
        CullMode::None => None,
        CullMode::Front => Some(wgpu::Face::Front),
        CullMode::Back => Some(wgpu::Face::Back),
    }
}

fn front_face(winding: Winding) -> wgpu::FrontFace {
    match winding {
        Winding::Cw => wgpu::FrontFace::Cw,
        Winding::Ccw => wgpu::FrontFace::Ccw,
    }
}

fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    match mode {
        BlendMode::SourceOver => {
            let component = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            };
            wgpu::BlendState {
                color: component,
                alpha: component,
            }
        }
    }
}

/// The depth attachment is always bound, so "no depth test" still needs a
/// depth state: it always passes and never writes.
fn depth_stencil(state: &RenderState, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
    let (depth_write_enabled, depth_compare) = match state.depth {
        Some(test) => (
            test.write,
            match test.compare {
                DepthCompare::Less => wgpu::CompareFunction::Less,
                DepthCompare::LessEqual => wgpu::CompareFunction::LessEqual,
                DepthCompare::Always => wgpu::CompareFunction::Always,
            },
        ),
        None => (false, wgpu::CompareFunction::Always),
    };

    wgpu::DepthStencilState {
        format,
        depth_write_enabled,
        depth_compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Viewport rectangle clipped to the render target; `None` if nothing is visible.
fn clamp_viewport(state: &RenderState, width: u32, height: u32) -> Option<(f32, f32, f32, f32)> {
    let vp = state.viewport;
    if vp.x >= width || vp.y >= height {
        return None;
    }
    let w = vp.width.min(width - vp.x);
    let h = vp.height.min(height - vp.y);
    if w == 0 || h == 0 {
        return None;
    }
    Some((vp.x as f32, vp.y as f32, w as f32, h as f32))
}
