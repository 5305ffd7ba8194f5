//! Parameter types of the pooled resources: textures, render targets and
//! shaders with their named constants.

pub mod shader;
pub mod target;
pub mod texture;

pub mod prelude {
    pub use super::shader::{
        ConstantKind, ConstantVariable, ShaderConstant, ShaderHandle, ShaderParams,
    };
    pub use super::target::{
        ColorFormat, DepthFormat, SurfaceFormat, TargetHandle, TargetParams,
    };
    pub use super::texture::{
        SamplerParams, TextureFilter, TextureFormat, TextureHandle, TextureParams, TextureWrap,
    };
}
