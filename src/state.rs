//! State textures: particle positions stored as texels.
//!
//! A state texture is a `W×H` grid of RGBA floats used as an addressable
//! array. Particle `i` lives at [`texel_address`] of its fixed key
//! `position[i]`; RGB holds its current position, A is 1 for written texels
//! and 0 for texels no particle maps to.
//!
//! The same addressing is mirrored by `state_texel` in the WGSL shaders.

use crate::error::ConfigError;
use crate::{Vec3, Vec4};
use glam::UVec2;

/// Dimensions of a state texture in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateSize {
    width: u32,
    height: u32,
}

impl StateSize {
    /// Create a size, rejecting empty textures.
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::StateSize { width, height });
        }
        Ok(Self { width, height })
    }

    /// Width in texels. Never zero.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels. Never zero.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of texels.
    #[inline]
    pub fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Row-major index of a texel.
    #[inline]
    pub fn index(&self, texel: UVec2) -> usize {
        texel.y as usize * self.width as usize + texel.x as usize
    }
}

/// Texel holding the state of the particle with key `key`.
///
/// Maps `key.xy` from `[-1, 1]` to `[0, 1]`, scales by the texture size and
/// clamps onto the texture, so `x = 1` lands in the last column.
#[inline]
pub fn texel_address(key: Vec3, size: StateSize) -> UVec2 {
    let uv = (key.truncate() + 1.0) * 0.5;
    let scaled = (uv * glam::Vec2::new(size.width() as f32, size.height() as f32)).floor();
    let max = glam::Vec2::new((size.width() - 1) as f32, (size.height() - 1) as f32);
    scaled.clamp(glam::Vec2::ZERO, max).as_uvec2()
}

/// CPU-side state texture.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTexture {
    size: StateSize,
    texels: Vec<Vec4>,
}

impl StateTexture {
    /// A cleared texture of the given size.
    pub fn new(size: StateSize) -> Self {
        Self {
            size,
            texels: vec![Vec4::ZERO; size.texel_count()],
        }
    }

    /// Build a texture from row-major texels.
    ///
    /// # Panics
    ///
    /// Panics if `texels.len()` does not match `size`.
    pub fn from_texels(size: StateSize, texels: Vec<Vec4>) -> Self {
        assert_eq!(texels.len(), size.texel_count(), "texel data size mismatch");
        Self { size, texels }
    }

    /// Texture dimensions.
    pub fn size(&self) -> StateSize {
        self.size
    }

    /// Reset every texel to zero.
    pub fn clear(&mut self) {
        self.texels.fill(Vec4::ZERO);
    }

    /// Raw texel at `texel`.
    #[inline]
    pub fn load(&self, texel: UVec2) -> Vec4 {
        self.texels[self.size.index(texel)]
    }

    /// Stored position at `texel`.
    #[inline]
    pub fn position(&self, texel: UVec2) -> Vec3 {
        self.load(texel).truncate()
    }

    /// Store a position at `texel`, marking it written.
    #[inline]
    pub fn store(&mut self, texel: UVec2, position: Vec3) {
        let index = self.size.index(texel);
        self.texels[index] = position.extend(1.0);
    }

    /// Row-major texels.
    pub fn texels(&self) -> &[Vec4] {
        &self.texels
    }

    /// Number of texels some particle wrote to.
    pub fn written_count(&self) -> usize {
        self.texels.iter().filter(|t| t.w != 0.0).count()
    }
}
