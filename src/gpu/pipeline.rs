//! Shader validation and pipeline construction.
//!
//! WGSL is validated with naga before anything reaches the device, so a
//! broken shader is reported with its diagnostic and never becomes a
//! pipeline. Device-side failures are caught with a validation error scope.

use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::targets::StateFormat;
use crate::error::{PipelineError, PipelineKind};

const COMMON_SOURCE: &str = include_str!("shaders/common.wgsl");
const INIT_SOURCE: &str = include_str!("shaders/init.wgsl");
const UPDATE_SOURCE: &str = include_str!("shaders/update.wgsl");
const RENDER_SOURCE: &str = include_str!("shaders/render.wgsl");

/// WGSL sources of the three pipelines.
///
/// Each source is a complete module. The defaults share the `Params`
/// uniform and texel addressing helpers.
#[derive(Debug, Clone)]
pub struct ShaderSet {
    /// Seeds the first state texture.
    pub init: String,
    /// Advances particles into the next state texture.
    pub update: String,
    /// Draws particles.
    pub render: String,
}

impl Default for ShaderSet {
    fn default() -> Self {
        Self {
            init: format!("{COMMON_SOURCE}\n{INIT_SOURCE}"),
            update: format!("{COMMON_SOURCE}\n{UPDATE_SOURCE}"),
            render: format!("{COMMON_SOURCE}\n{RENDER_SOURCE}"),
        }
    }
}

impl ShaderSet {
    /// Source for one pipeline.
    pub fn source(&self, kind: PipelineKind) -> &str {
        match kind {
            PipelineKind::Init => &self.init,
            PipelineKind::Update => &self.update,
            PipelineKind::Render => &self.render,
        }
    }

    /// Validate all three sources, stopping at the first failure.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for kind in [PipelineKind::Init, PipelineKind::Update, PipelineKind::Render] {
            validate_wgsl(kind, self.source(kind))?;
        }
        Ok(())
    }
}

/// Parse and validate a WGSL module.
pub fn validate_wgsl(pipeline: PipelineKind, source: &str) -> Result<naga::Module, PipelineError> {
    let module = wgsl::parse_str(source).map_err(|err| PipelineError::Compile {
        pipeline,
        log: err.emit_to_string(source),
    })?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    validator
        .validate(&module)
        .map_err(|err| PipelineError::Compile {
            pipeline,
            log: format!("{}", err),
        })?;

    Ok(module)
}

/// The three simulation pipelines and the layouts they share.
pub struct Pipelines {
    /// Group 0: the `Params` uniform.
    pub params_layout: wgpu::BindGroupLayout,
    /// Group 1: the state texture being read.
    pub state_layout: wgpu::BindGroupLayout,
    /// Writes every key into a state texture.
    pub init: wgpu::RenderPipeline,
    /// Reads one state texture and writes the other.
    pub update: wgpu::RenderPipeline,
    /// Draws points from a state texture onto the surface.
    pub render: wgpu::RenderPipeline,
}

fn vec3_attribute(location: u32) -> [wgpu::VertexAttribute; 1] {
    [wgpu::VertexAttribute {
        offset: 0,
        shader_location: location,
        format: wgpu::VertexFormat::Float32x3,
    }]
}

impl Pipelines {
    /// Validate `shaders` and build all three pipelines.
    ///
    /// `state_format` is the format of both state textures and
    /// `surface_format` the format of the render pipeline's target.
    pub async fn new(
        device: &wgpu::Device,
        state_format: StateFormat,
        surface_format: wgpu::TextureFormat,
        shaders: &ShaderSet,
    ) -> Result<Self, PipelineError> {
        shaders.validate()?;

        let params_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Params Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let state_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("State Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let seed_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Init Pipeline Layout"),
            bind_group_layouts: &[&params_layout],
            push_constant_ranges: &[],
        });
        let sampled_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sampled State Pipeline Layout"),
            bind_group_layouts: &[&params_layout, &state_layout],
            push_constant_ranges: &[],
        });

        let key_attribute = vec3_attribute(0);
        let axis_attribute = vec3_attribute(1);
        let speed_attribute = [wgpu::VertexAttribute {
            offset: 0,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32,
        }];

        let key_buffer = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &key_attribute,
        };
        let axis_buffer = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &axis_attribute,
        };
        let speed_buffer = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<f32>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &speed_attribute,
        };
        let instance_key_buffer = wgpu::VertexBufferLayout {
            step_mode: wgpu::VertexStepMode::Instance,
            ..key_buffer.clone()
        };

        let init = build_pipeline(
            device,
            PipelineStage {
                kind: PipelineKind::Init,
                source: &shaders.init,
                layout: &seed_layout,
                buffers: &[key_buffer.clone()],
                topology: wgpu::PrimitiveTopology::PointList,
                target: state_format.texture_format(),
            },
        )
        .await?;

        let update = build_pipeline(
            device,
            PipelineStage {
                kind: PipelineKind::Update,
                source: &shaders.update,
                layout: &sampled_layout,
                buffers: &[key_buffer, axis_buffer, speed_buffer],
                topology: wgpu::PrimitiveTopology::PointList,
                target: state_format.texture_format(),
            },
        )
        .await?;

        let render = build_pipeline(
            device,
            PipelineStage {
                kind: PipelineKind::Render,
                source: &shaders.render,
                layout: &sampled_layout,
                buffers: &[instance_key_buffer],
                topology: wgpu::PrimitiveTopology::TriangleList,
                target: surface_format,
            },
        )
        .await?;

        log::info!("built init, update and render pipelines");

        Ok(Self {
            params_layout,
            state_layout,
            init,
            update,
            render,
        })
    }
}

struct PipelineStage<'a> {
    kind: PipelineKind,
    source: &'a str,
    layout: &'a wgpu::PipelineLayout,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    target: wgpu::TextureFormat,
}

async fn build_pipeline(
    device: &wgpu::Device,
    stage: PipelineStage<'_>,
) -> Result<wgpu::RenderPipeline, PipelineError> {
    let label = format!("{} pipeline", stage.kind);

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&label),
        source: wgpu::ShaderSource::Wgsl(stage.source.into()),
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(stage.layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: stage.buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: stage.target,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: stage.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    if let Some(err) = device.pop_error_scope().await {
        return Err(PipelineError::Link {
            pipeline: stage.kind,
            log: err.to_string(),
        });
    }

    log::debug!("{} ready", label);
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_shaders_validate() {
        ShaderSet::default().validate().unwrap();
    }

    #[test]
    fn test_syntax_error_reports_compile_failure() {
        let shaders = ShaderSet {
            update: ShaderSet::default().update.replace("fn vs_main(", "fn vs_main(("),
            ..ShaderSet::default()
        };
        match shaders.validate() {
            Err(PipelineError::Compile { pipeline, log }) => {
                assert_eq!(pipeline, PipelineKind::Update);
                assert!(!log.is_empty());
            }
            other => panic!("expected compile error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_type_error_reports_compile_failure() {
        let source = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
        let err = validate_wgsl(PipelineKind::Render, source).unwrap_err();
        assert_eq!(err.pipeline(), PipelineKind::Render);
        assert!(matches!(err, PipelineError::Compile { .. }));
    }

    #[test]
    fn test_sources_share_addressing() {
        let shaders = ShaderSet::default();
        for kind in [PipelineKind::Init, PipelineKind::Update, PipelineKind::Render] {
            assert!(shaders.source(kind).contains("fn state_texel"));
        }
    }
}
