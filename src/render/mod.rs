//! The render substrate: the device facade, pooled resources, the render
//! target redirection stack and the shader constant binder.

pub mod assets;
pub mod binder;
pub mod device;
pub mod errors;
pub mod headless;
pub mod service;
pub mod target_stack;

/// Maximum number of simultaneous color attachments a render target may
/// declare. Device caps may be lower, never higher.
pub const MAX_COLOR_ATTACHMENTS: usize = 4;

pub mod prelude {
    pub use super::assets::prelude::*;
    pub use super::binder::{BindingShape, ConstantBinding};
    pub use super::device::{
        BoundSurfaces, CompiledProgram, Device, DeviceCaps, ProgramId, ReflectedInput,
        ShaderStage, SurfaceId, TextureId,
    };
    pub use super::errors::{Error, Result};
    pub use super::headless::{DeviceCall, HeadlessDevice};
    pub use super::service::{
        RenderSystem, RenderSystemShared, ShaderResource, TargetResource, TargetScope,
        TextureResource,
    };
    pub use super::target_stack::{PopAction, TargetStack};
    pub use super::MAX_COLOR_ATTACHMENTS;
}
