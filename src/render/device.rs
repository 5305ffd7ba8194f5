//! The facade between the substrate and whatever graphics backend sits
//! underneath it.
//!
//! The [`Device`] trait covers exactly the three things the substrate
//! cannot provide itself: object creation/teardown, surface and register
//! binding primitives, and compiler-produced shader reflection. Everything
//! above this trait is backend-agnostic.
//!
//! [`Device`]: trait.Device.html

use cgmath::Vector2;

use crate::render::assets::shader::{ConstantKind, ShaderParams};
use crate::render::assets::target::SurfaceFormat;
use crate::render::assets::texture::{SamplerParams, TextureParams};
use crate::render::errors::Result;
use crate::render::MAX_COLOR_ATTACHMENTS;

/// Backend name of a texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Backend name of a renderable surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

/// Backend name of a compiled program pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// The shader stage a register write or sampler bind addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

/// Static limits queried from the device once, at system bring-up.
#[derive(Debug, Clone, Copy)]
pub struct DeviceCaps {
    /// Simultaneous color attachments per render target. Never exceeds
    /// [`MAX_COLOR_ATTACHMENTS`](../constant.MAX_COLOR_ATTACHMENTS.html).
    pub max_color_attachments: usize,
    /// Maximum anisotropic sample count.
    pub max_anisotropy: u8,
}

/// One named input of a compiled program, as enumerated by the backend's
/// reflection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedInput {
    pub name: String,
    pub kind: ConstantKind,
    /// Rows of the input type, 1 for scalars and vectors, 2-4 for matrices.
    pub rows: u8,
    /// Components per row, 1-4.
    pub cols: u8,
    /// 1 for non-array inputs.
    pub array_len: usize,
    /// First register of the input within its bank, or the texture slot for
    /// samplers.
    pub register: u32,
    /// Consecutive registers occupied by the whole input.
    pub register_count: u32,
}

/// The result of compiling a vertex/pixel program pair: the program name
/// plus one reflection table per stage.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub id: ProgramId,
    pub vertex_inputs: Vec<ReflectedInput>,
    pub pixel_inputs: Vec<ReflectedInput>,
}

/// Snapshot of the device's output-merger bindings, captured before the
/// first render-target redirection and restored after the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundSurfaces {
    pub colors: [Option<SurfaceId>; MAX_COLOR_ATTACHMENTS],
    pub depth: Option<SurfaceId>,
}

/// Object creation, binding and reflection primitives consumed by the
/// substrate. Implementations are issued calls serially from the render
/// thread during binding and stack operations; creation calls may arrive
/// from loader threads, always under a resource's init guard.
pub trait Device {
    fn caps(&self) -> DeviceCaps;

    fn create_texture(&mut self, params: &TextureParams) -> Result<TextureId>;
    fn delete_texture(&mut self, id: TextureId);

    fn create_surface(&mut self, format: SurfaceFormat, dimensions: Vector2<u32>)
        -> Result<SurfaceId>;
    fn delete_surface(&mut self, id: SurfaceId);

    fn compile(&mut self, params: &ShaderParams) -> Result<CompiledProgram>;
    fn delete_program(&mut self, id: ProgramId);

    /// Binds `surface` to color slot `slot`, or clears the slot on `None`.
    fn bind_color_surface(&mut self, slot: usize, surface: Option<SurfaceId>);
    /// Binds the depth-stencil surface, or clears the binding on `None`.
    fn bind_depth_surface(&mut self, surface: Option<SurfaceId>);
    /// Queries the currently bound output surfaces.
    fn bound_surfaces(&self) -> BoundSurfaces;

    /// Writes `values.len()` consecutive 4-component registers of the bool
    /// bank, starting at `register`.
    fn set_bool_registers(&mut self, stage: ShaderStage, register: u32, values: &[[bool; 4]]);
    /// Writes into the int register bank; see `set_bool_registers`.
    fn set_int_registers(&mut self, stage: ShaderStage, register: u32, values: &[[i32; 4]]);
    /// Writes into the float register bank; see `set_bool_registers`.
    fn set_float_registers(&mut self, stage: ShaderStage, register: u32, values: &[[f32; 4]]);

    /// Binds `texture` with `sampler` state to texture slot `slot`.
    fn bind_sampler(&mut self, stage: ShaderStage, slot: u32, texture: TextureId, sampler: SamplerParams);
    /// Clears texture slot `slot`.
    fn unbind_sampler(&mut self, stage: ShaderStage, slot: u32);
}
