//! Render target parameters: up to [`MAX_COLOR_ATTACHMENTS`] color
//! attachments plus an optional depth-stencil attachment, substitutable
//! for the device back buffer.
//!
//! [`MAX_COLOR_ATTACHMENTS`]: ../../constant.MAX_COLOR_ATTACHMENTS.html

use cgmath::Vector2;
use smallvec::SmallVec;

use crate::render::device::DeviceCaps;
use crate::render::errors::{Error, Result};
use crate::render::MAX_COLOR_ATTACHMENTS;

impl_handle!(TargetHandle);

/// Renderable color attachment formats.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum ColorFormat {
    Rgba8,
    Rgba16f,
    Rgba32f,
    R32f,
}

/// Depth-stencil attachment formats.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum DepthFormat {
    Depth16,
    Depth24,
    Depth24Stencil8,
    Depth32,
}

/// Format of one device surface. A render target owns one surface per
/// declared attachment.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum SurfaceFormat {
    Color(ColorFormat),
    Depth(DepthFormat),
}

/// The parameters of a render target object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetParams {
    /// The declared color attachments, bound to device slots 0..n in
    /// order. May be empty for a depth-only target.
    pub colors: SmallVec<[ColorFormat; MAX_COLOR_ATTACHMENTS]>,
    /// The optional depth-stencil attachment.
    pub depth: Option<DepthFormat>,
    /// Dimensions shared by every attachment.
    pub dimensions: Vector2<u32>,
}

impl Default for TargetParams {
    fn default() -> Self {
        TargetParams {
            colors: SmallVec::new(),
            depth: None,
            dimensions: Vector2::new(0, 0),
        }
    }
}

impl TargetParams {
    /// Validates the declared attachments against the device limit. This
    /// runs at construction time, before a pool slot is taken, so an
    /// over-declared target never becomes addressable.
    pub fn validate(&self, caps: &DeviceCaps) -> Result<()> {
        if self.colors.len() > caps.max_color_attachments {
            return Err(Error::TooManyColorAttachments(
                self.colors.len(),
                caps.max_color_attachments,
            ));
        }

        if self.colors.is_empty() && self.depth.is_none() {
            return Err(Error::TargetInvalid(
                "At least one attachment is required.".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use smallvec::smallvec;

    fn caps() -> DeviceCaps {
        DeviceCaps {
            max_color_attachments: 2,
            max_anisotropy: 16,
        }
    }

    #[test]
    fn validate_against_caps() {
        let mut params = TargetParams {
            colors: smallvec![ColorFormat::Rgba8, ColorFormat::Rgba16f],
            depth: Some(DepthFormat::Depth24Stencil8),
            dimensions: Vector2::new(256, 256),
        };
        assert!(params.validate(&caps()).is_ok());

        params.colors.push(ColorFormat::R32f);
        match params.validate(&caps()) {
            Err(Error::TooManyColorAttachments(3, 2)) => {}
            v => panic!("unexpected {:?}", v.map(|_| ())),
        }
    }

    #[test]
    fn attachmentless_target_is_rejected() {
        let params = TargetParams::default();
        assert!(params.validate(&caps()).is_err());
    }
}
