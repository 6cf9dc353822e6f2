//! Off-screen state targets and their readback.

use std::sync::mpsc;

use half::f16;

use crate::error::GpuError;
use crate::state::{StateSize, StateTexture};
use crate::Vec4;

/// Texel format of both state textures.
///
/// Full precision is used whenever the adapter can render to it. Adapters
/// that only render to half floats get [`StateFormat::Half`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFormat {
    /// `Rgba32Float`.
    Full,
    /// `Rgba16Float`.
    Half,
}

impl StateFormat {
    /// Pick the most precise format the adapter can render into.
    pub fn for_adapter(adapter: &wgpu::Adapter) -> Self {
        let full = adapter.get_texture_format_features(wgpu::TextureFormat::Rgba32Float);
        if full
            .allowed_usages
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
        {
            StateFormat::Full
        } else {
            log::warn!("Rgba32Float is not renderable on this adapter, using Rgba16Float state");
            StateFormat::Half
        }
    }

    /// The wgpu texture format.
    pub fn texture_format(self) -> wgpu::TextureFormat {
        match self {
            StateFormat::Full => wgpu::TextureFormat::Rgba32Float,
            StateFormat::Half => wgpu::TextureFormat::Rgba16Float,
        }
    }

    /// Size of one RGBA texel in bytes.
    pub fn bytes_per_texel(self) -> u32 {
        match self {
            StateFormat::Full => 16,
            StateFormat::Half => 8,
        }
    }

    /// Row pitch of a readback buffer, padded to the copy alignment.
    pub fn padded_bytes_per_row(self, width: u32) -> u32 {
        let unpadded = width * self.bytes_per_texel();
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        unpadded.div_ceil(align) * align
    }

    /// Decode one unpadded row of texels.
    fn decode_row(self, row: &[u8], out: &mut Vec<Vec4>) {
        match self {
            StateFormat::Full => {
                let row: &[f32] = bytemuck::cast_slice(row);
                out.extend(row.chunks_exact(4).map(Vec4::from_slice));
            }
            StateFormat::Half => {
                let row: &[f16] = bytemuck::cast_slice(row);
                out.extend(row.chunks_exact(4).map(|t| {
                    Vec4::new(t[0].to_f32(), t[1].to_f32(), t[2].to_f32(), t[3].to_f32())
                }));
            }
        }
    }
}

/// A state texture plus the views needed to write and read it.
///
/// The texture is the target's only color attachment.
pub struct StateTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
    format: StateFormat,
}

impl StateTarget {
    /// Allocate a cleared target of the given size.
    pub fn new(
        device: &wgpu::Device,
        size: StateSize,
        format: StateFormat,
        layout: &wgpu::BindGroupLayout,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: format.texture_format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        });

        Self {
            texture,
            view,
            bind_group,
            format,
        }
    }

    /// View used as a color attachment when this target is written.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Bind group used when this target is read.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Copy the texture back to the CPU.
    ///
    /// Blocks until the copy finishes.
    pub fn read(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: StateSize,
    ) -> Result<StateTexture, GpuError> {
        let unpadded_row = size.width() * self.format.bytes_per_texel();
        let padded_row = self.format.padded_bytes_per_row(size.width());
        let buffer_size = padded_row as u64 * size.height() as u64;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("State Readback Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("State Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(size.height()),
                },
            },
            extent(size),
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;
        rx.recv()
            .map_err(|_| GpuError::BufferMapping("map callback dropped".into()))?
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

        let texels = {
            let data = slice.get_mapped_range();
            let mut texels = Vec::with_capacity(size.texel_count());
            for row in data.chunks_exact(padded_row as usize) {
                self.format
                    .decode_row(&row[..unpadded_row as usize], &mut texels);
            }
            texels
        };
        staging.unmap();

        Ok(StateTexture::from_texels(size, texels))
    }
}

fn extent(size: StateSize) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width(),
        height: size.height(),
        depth_or_array_layers: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_bytes_per_row() {
        let full = StateFormat::Full;
        assert_eq!(full.padded_bytes_per_row(1), 256);
        assert_eq!(full.padded_bytes_per_row(16), 256);
        assert_eq!(full.padded_bytes_per_row(17), 512);
        assert_eq!(full.padded_bytes_per_row(600), 9728);

        let half = StateFormat::Half;
        assert_eq!(half.padded_bytes_per_row(32), 256);
        assert_eq!(half.padded_bytes_per_row(33), 512);
        assert_eq!(half.padded_bytes_per_row(600), 4864);
    }

    #[test]
    fn test_formats() {
        assert_eq!(StateFormat::Full.texture_format(), wgpu::TextureFormat::Rgba32Float);
        assert_eq!(StateFormat::Half.texture_format(), wgpu::TextureFormat::Rgba16Float);
        for format in [StateFormat::Full, StateFormat::Half] {
            let expected = format.texture_format().block_copy_size(None);
            assert_eq!(Some(format.bytes_per_texel()), expected);
        }
    }

    #[test]
    fn test_decode_half_row() {
        let texels: Vec<f16> = [0.5f32, -0.25, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]
            .iter()
            .map(|&v| f16::from_f32(v))
            .collect();
        let mut out = Vec::new();
        StateFormat::Half.decode_row(bytemuck::cast_slice(&texels), &mut out);
        assert_eq!(out, vec![Vec4::new(0.5, -0.25, 1.0, 1.0), Vec4::ZERO]);
    }

    #[test]
    fn test_decode_full_row() {
        let texels = [0.1f32, 0.2, 0.3, 1.0];
        let mut out = Vec::new();
        StateFormat::Full.decode_row(bytemuck::cast_slice(&texels), &mut out);
        assert_eq!(out, vec![Vec4::new(0.1, 0.2, 0.3, 1.0)]);
    }
}
