//! GPU ping-pong simulation.
//!
//! Owns the pipelines, the per-particle attribute buffers and both state
//! targets. Nothing here knows about windows: the render pass draws into
//! whatever view the caller provides.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::capture_errors;
use super::pipeline::{Pipelines, ShaderSet};
use super::targets::{StateFormat, StateTarget};
use crate::config::SimConfig;
use crate::error::{GpuError, PipelineError};
use crate::ping_pong::PingPong;
use crate::spawn::ParticleAttributes;
use crate::state::{StateSize, StateTexture};

/// Vertices per drawn point (two triangles).
const QUAD_VERTICES: u32 = 6;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct Params {
    state_size: [f32; 2],
    viewport_size: [f32; 2],
    point_size: f32,
    _padding: [f32; 3],
    point_color: [f32; 4],
}

/// Particle simulation resident on the GPU.
pub struct GpuSimulation {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipelines: Pipelines,
    params: Params,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    position_buffer: wgpu::Buffer,
    axis_buffer: wgpu::Buffer,
    speed_buffer: wgpu::Buffer,
    state: PingPong<StateTarget>,
    size: StateSize,
    state_format: StateFormat,
    num_particles: u32,
}

impl GpuSimulation {
    /// Build pipelines and allocate both state targets.
    ///
    /// `surface_format` is the format of views later passed to
    /// [`encode_render`](Self::encode_render); `viewport` their size in pixels.
    /// `shaders` are validated before any device object is created.
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        attributes: &ParticleAttributes,
        size: StateSize,
        state_format: StateFormat,
        surface_format: wgpu::TextureFormat,
        viewport: (u32, u32),
        config: &SimConfig,
        shaders: &ShaderSet,
    ) -> Result<Self, PipelineError> {
        let pipelines = Pipelines::new(&device, state_format, surface_format, shaders).await?;

        let params = Params {
            state_size: [size.width() as f32, size.height() as f32],
            viewport_size: [viewport.0.max(1) as f32, viewport.1.max(1) as f32],
            point_size: config.point_size,
            _padding: [0.0; 3],
            point_color: config.point_color,
        };

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Params Buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Params Bind Group"),
            layout: &pipelines.params_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Position Buffer"),
            contents: bytemuck::cast_slice(attributes.positions()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let axis_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Axis Buffer"),
            contents: bytemuck::cast_slice(attributes.axes()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let speed_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Speed Buffer"),
            contents: bytemuck::cast_slice(attributes.speeds()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let layout = &pipelines.state_layout;
        let state = PingPong::new(
            StateTarget::new(&device, size, state_format, layout, "State Texture 0"),
            StateTarget::new(&device, size, state_format, layout, "State Texture 1"),
        );

        log::info!(
            "allocated {}x{} {:?} state textures for {} particles",
            size.width(),
            size.height(),
            state_format.texture_format(),
            attributes.len()
        );

        Ok(Self {
            device,
            queue,
            pipelines,
            params,
            params_buffer,
            params_bind_group,
            position_buffer,
            axis_buffer,
            speed_buffer,
            state,
            size,
            state_format,
            num_particles: attributes.len() as u32,
        })
    }

    /// The device the simulation lives on.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The queue commands are submitted to.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// State texture dimensions.
    pub fn size(&self) -> StateSize {
        self.size
    }

    /// Texel format of both state textures.
    pub fn state_format(&self) -> StateFormat {
        self.state_format
    }

    /// Index of the state slot read by the next update.
    pub fn current_index(&self) -> usize {
        self.state.current_index()
    }

    /// Set the size of the render target, which scales point quads.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.params.viewport_size = [width.max(1) as f32, height.max(1) as f32];
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&self.params));
    }

    /// Record the init pass: clear the current slot and write every key.
    pub fn encode_seed(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut pass = begin_state_pass(encoder, self.state.current().view(), "Init Pass");
        pass.set_pipeline(&self.pipelines.init);
        pass.set_bind_group(0, &self.params_bind_group, &[]);
        pass.set_vertex_buffer(0, self.position_buffer.slice(..));
        pass.draw(0..self.num_particles, 0..1);
    }

    /// Record the update pass: read the current slot, write the next slot.
    pub fn encode_update(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut pass = begin_state_pass(encoder, self.state.next().view(), "Update Pass");
        pass.set_pipeline(&self.pipelines.update);
        pass.set_bind_group(0, &self.params_bind_group, &[]);
        pass.set_bind_group(1, self.state.current().bind_group(), &[]);
        pass.set_vertex_buffer(0, self.position_buffer.slice(..));
        pass.set_vertex_buffer(1, self.axis_buffer.slice(..));
        pass.set_vertex_buffer(2, self.speed_buffer.slice(..));
        pass.draw(0..self.num_particles, 0..1);
    }

    /// Record the render pass: draw points from the next slot into `view`.
    pub fn encode_render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        clear_color: wgpu::Color,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipelines.render);
        pass.set_bind_group(0, &self.params_bind_group, &[]);
        pass.set_bind_group(1, self.state.next().bind_group(), &[]);
        pass.set_vertex_buffer(0, self.position_buffer.slice(..));
        pass.draw(0..QUAD_VERTICES, 0..self.num_particles);
    }

    /// Run the init pass.
    pub fn seed(&self) -> Result<(), GpuError> {
        self.submit("Init Encoder", |encoder| self.encode_seed(encoder))
    }

    /// Run the update pass.
    pub fn update(&self) -> Result<(), GpuError> {
        self.submit("Update Encoder", |encoder| self.encode_update(encoder))
    }

    /// Make the slot just written current.
    pub fn swap(&mut self) {
        self.state.swap();
    }

    /// Copy the current slot back to the CPU.
    pub fn read_current(&self) -> Result<StateTexture, GpuError> {
        self.state.current().read(&self.device, &self.queue, self.size)
    }

    /// Copy the next slot back to the CPU.
    pub fn read_next(&self) -> Result<StateTexture, GpuError> {
        self.state.next().read(&self.device, &self.queue, self.size)
    }

    fn submit(
        &self,
        label: &'static str,
        record: impl FnOnce(&mut wgpu::CommandEncoder),
    ) -> Result<(), GpuError> {
        capture_errors(&self.device, label, || {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
            record(&mut encoder);
            self.queue.submit(std::iter::once(encoder.finish()));
        })
    }
}

fn begin_state_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    label: &str,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            depth_slice: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_layout_matches_wgsl() {
        // vec2, vec2, f32 + 3 pad, vec4 at offset 32
        assert_eq!(std::mem::size_of::<Params>(), 48);
        assert_eq!(std::mem::offset_of!(Params, point_color), 32);
    }
}
