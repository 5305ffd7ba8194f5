//! Texture parameters and the per-texture sampler state pushed to the
//! device whenever the texture is bound through a shader constant.

use cgmath::Vector2;

use crate::render::errors::{Error, Result};

impl_handle!(TextureHandle);

/// The parameters of a texture object. The pixel payload itself is decoded
/// and uploaded by layers above this one; the substrate only cares about
/// identity, format and sampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureParams {
    /// Sets the format of the texel data.
    pub format: TextureFormat,
    /// Sets the dimensions of the texture.
    pub dimensions: Vector2<u32>,
    /// Should a complete mipmap chain be allocated for this texture.
    pub mipmap: bool,
    /// The sampler state used whenever a shader samples this texture.
    pub sampler: SamplerParams,
}

impl Default for TextureParams {
    fn default() -> Self {
        TextureParams {
            format: TextureFormat::U8U8U8U8,
            dimensions: Vector2::new(0, 0),
            mipmap: false,
            sampler: SamplerParams::default(),
        }
    }
}

impl TextureParams {
    pub fn validate(&self) -> Result<()> {
        if self.dimensions.x == 0 || self.dimensions.y == 0 {
            return Err(Error::TextureInvalid(format!(
                "Zero-sized dimensions ({}x{}).",
                self.dimensions.x, self.dimensions.y
            )));
        }

        if self.sampler.anisotropy == 0 {
            return Err(Error::TextureInvalid(
                "Anisotropy of 0; the minimum meaningful value is 1.".into(),
            ));
        }

        Ok(())
    }
}

/// The complete sampler state of a texture slot: filtering, per-axis
/// addressing, anisotropy, mip LOD bias, sRGB conversion and the border
/// color used by `TextureWrap::Border`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerParams {
    pub filter: TextureFilter,
    pub wrap_u: TextureWrap,
    pub wrap_v: TextureWrap,
    pub wrap_w: TextureWrap,
    pub anisotropy: u8,
    pub mip_lod_bias: f32,
    pub srgb: bool,
    pub border_color: [f32; 4],
}

impl Default for SamplerParams {
    fn default() -> Self {
        SamplerParams {
            filter: TextureFilter::Linear,
            wrap_u: TextureWrap::Clamp,
            wrap_v: TextureWrap::Clamp,
            wrap_w: TextureWrap::Clamp,
            anisotropy: 1,
            mip_lod_bias: 0.0,
            srgb: false,
            border_color: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Specifies how the texture is sampled whenever a pixel is shaded.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum TextureFilter {
    /// The texel nearest (in Manhattan distance) to the sample point.
    Nearest,
    /// The weighted average of the four closest texels.
    Linear,
    /// Anisotropic filtering; the sample count is `SamplerParams::anisotropy`.
    Anisotropic,
}

/// Sets the addressing mode of one texture axis.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum TextureWrap {
    /// Samples at coord x + 1 map to coord x.
    Repeat,
    /// Samples at coord x + 1 map to coord 1 - x.
    Mirror,
    /// Samples at coord x + 1 map to coord 1.
    Clamp,
    /// Samples outside [0, 1] map to `SamplerParams::border_color`.
    Border,
}

/// List of the possible texel formats.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum TextureFormat {
    U8,
    U8U8,
    U8U8U8U8,
    F16F16F16F16,
    F32F32F32F32,
}
