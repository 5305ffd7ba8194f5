//! A headless [`Device`](device/trait.Device.html) that records every call
//! instead of talking to a backend. Used by tests and by tooling that runs
//! the substrate without a window.

use cgmath::Vector2;

use crate::render::assets::shader::{ConstantKind, ShaderParams};
use crate::render::assets::target::SurfaceFormat;
use crate::render::assets::texture::{SamplerParams, TextureParams};
use crate::render::device::{
    BoundSurfaces, CompiledProgram, Device, DeviceCaps, ProgramId, ReflectedInput, ShaderStage,
    SurfaceId, TextureId,
};
use crate::render::errors::{Error, Result};
use crate::render::MAX_COLOR_ATTACHMENTS;
use crate::utils::prelude::FastHashMap;

/// The color surface bound by the headless back buffer at startup.
pub const BACKBUFFER_COLOR: SurfaceId = SurfaceId(0);
/// The depth surface bound by the headless back buffer at startup.
pub const BACKBUFFER_DEPTH: SurfaceId = SurfaceId(1);

/// One recorded device call, in issue order.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateTexture(TextureId),
    DeleteTexture(TextureId),
    CreateSurface(SurfaceId, SurfaceFormat),
    DeleteSurface(SurfaceId),
    Compile(ProgramId),
    DeleteProgram(ProgramId),
    BindColorSurface(usize, Option<SurfaceId>),
    BindDepthSurface(Option<SurfaceId>),
    SetBoolRegisters(ShaderStage, u32, Vec<[bool; 4]>),
    SetIntRegisters(ShaderStage, u32, Vec<[i32; 4]>),
    SetFloatRegisters(ShaderStage, u32, Vec<[f32; 4]>),
    BindSampler(ShaderStage, u32, TextureId, SamplerParams),
    UnbindSampler(ShaderStage, u32),
}

/// Records calls, hands out monotonically increasing ids and simulates the
/// bound-surface state, so the back-buffer capture/restore protocol is
/// observable from the call log.
pub struct HeadlessDevice {
    caps: DeviceCaps,
    next_id: u32,
    bound: BoundSurfaces,
    reflections: FastHashMap<String, (Vec<ReflectedInput>, Vec<ReflectedInput>)>,
    calls: Vec<DeviceCall>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        HeadlessDevice::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        let mut bound = BoundSurfaces::default();
        bound.colors[0] = Some(BACKBUFFER_COLOR);
        bound.depth = Some(BACKBUFFER_DEPTH);

        HeadlessDevice {
            caps: DeviceCaps {
                max_color_attachments: MAX_COLOR_ATTACHMENTS,
                max_anisotropy: 16,
            },
            next_id: 2,
            bound,
            reflections: FastHashMap::default(),
            calls: Vec::new(),
        }
    }

    /// Declares the reflection tables [`compile`](#method.compile) returns
    /// for a shader whose vertex source equals `vs`.
    pub fn set_reflection<T>(
        &mut self,
        vs: T,
        vertex_inputs: Vec<ReflectedInput>,
        pixel_inputs: Vec<ReflectedInput>,
    ) where
        T: Into<String>,
    {
        self.reflections
            .insert(vs.into(), (vertex_inputs, pixel_inputs));
    }

    /// The recorded calls, in issue order.
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn fresh_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Device for HeadlessDevice {
    fn caps(&self) -> DeviceCaps {
        self.caps
    }

    fn create_texture(&mut self, params: &TextureParams) -> Result<TextureId> {
        params.validate()?;
        let id = TextureId(self.fresh_id());
        self.calls.push(DeviceCall::CreateTexture(id));
        Ok(id)
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.calls.push(DeviceCall::DeleteTexture(id));
    }

    fn create_surface(
        &mut self,
        format: SurfaceFormat,
        dimensions: Vector2<u32>,
    ) -> Result<SurfaceId> {
        if dimensions.x == 0 || dimensions.y == 0 {
            return Err(Error::Device("Zero-sized surface.".into()));
        }

        let id = SurfaceId(self.fresh_id());
        self.calls.push(DeviceCall::CreateSurface(id, format));
        Ok(id)
    }

    fn delete_surface(&mut self, id: SurfaceId) {
        self.calls.push(DeviceCall::DeleteSurface(id));
    }

    fn compile(&mut self, params: &ShaderParams) -> Result<CompiledProgram> {
        let (vertex_inputs, pixel_inputs) = self
            .reflections
            .get(&params.vs)
            .cloned()
            .unwrap_or_default();

        let id = ProgramId(self.fresh_id());
        self.calls.push(DeviceCall::Compile(id));

        Ok(CompiledProgram {
            id,
            vertex_inputs,
            pixel_inputs,
        })
    }

    fn delete_program(&mut self, id: ProgramId) {
        self.calls.push(DeviceCall::DeleteProgram(id));
    }

    fn bind_color_surface(&mut self, slot: usize, surface: Option<SurfaceId>) {
        if slot < MAX_COLOR_ATTACHMENTS {
            self.bound.colors[slot] = surface;
        }
        self.calls.push(DeviceCall::BindColorSurface(slot, surface));
    }

    fn bind_depth_surface(&mut self, surface: Option<SurfaceId>) {
        self.bound.depth = surface;
        self.calls.push(DeviceCall::BindDepthSurface(surface));
    }

    fn bound_surfaces(&self) -> BoundSurfaces {
        self.bound
    }

    fn set_bool_registers(&mut self, stage: ShaderStage, register: u32, values: &[[bool; 4]]) {
        self.calls
            .push(DeviceCall::SetBoolRegisters(stage, register, values.to_vec()));
    }

    fn set_int_registers(&mut self, stage: ShaderStage, register: u32, values: &[[i32; 4]]) {
        self.calls
            .push(DeviceCall::SetIntRegisters(stage, register, values.to_vec()));
    }

    fn set_float_registers(&mut self, stage: ShaderStage, register: u32, values: &[[f32; 4]]) {
        self.calls
            .push(DeviceCall::SetFloatRegisters(stage, register, values.to_vec()));
    }

    fn bind_sampler(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        texture: TextureId,
        sampler: SamplerParams,
    ) {
        self.calls
            .push(DeviceCall::BindSampler(stage, slot, texture, sampler));
    }

    fn unbind_sampler(&mut self, stage: ShaderStage, slot: u32) {
        self.calls.push(DeviceCall::UnbindSampler(stage, slot));
    }
}

/// Convenience constructor for reflection tables in tests and tools.
pub fn reflected_input<T>(
    name: T,
    kind: ConstantKind,
    rows: u8,
    cols: u8,
    array_len: usize,
    register: u32,
) -> ReflectedInput
where
    T: Into<String>,
{
    ReflectedInput {
        name: name.into(),
        kind,
        rows,
        cols,
        array_len,
        register,
        register_count: rows as u32 * array_len as u32,
    }
}
