//! The render system: pools of lazily initialized resources, name lookups
//! from the registry, the target stack and the per-draw binding entry
//! points, wired to one [`Device`](device/trait.Device.html).
//!
//! Ownership is split the way the loading model needs it: the
//! [`RenderSystemShared`] half holds the pools behind read-write locks and
//! may be cloned into loader threads; the [`RenderSystem`] half owns the
//! device and everything that issues device calls, and stays on the render
//! thread.
//!
//! [`RenderSystemShared`]: struct.RenderSystemShared.html
//! [`RenderSystem`]: struct.RenderSystem.html

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use smallvec::SmallVec;

use crate::res::lifecycle::{ResourceKind, ResourceState};
use crate::res::registry::{Registry, ResourceDecl};
use crate::utils::prelude::{FastHashMap, HashValue, ObjectPool};

use super::assets::shader::{ShaderHandle, ShaderParams};
use super::assets::target::{SurfaceFormat, TargetHandle, TargetParams};
use super::assets::texture::{TextureHandle, TextureParams};
use super::binder::{self, Bindings};
use super::device::{Device, DeviceCaps, ProgramId, ShaderStage, SurfaceId, TextureId};
use super::errors::{Error, Result};
use super::target_stack::{PopAction, TargetStack};
use super::MAX_COLOR_ATTACHMENTS;

/// A pooled texture. Device-side state appears on first
/// [`RenderSystem::init_texture`](struct.RenderSystem.html#method.init_texture).
pub struct TextureResource {
    state: ResourceState,
    params: TextureParams,
    id: Mutex<Option<TextureId>>,
}

impl TextureResource {
    fn new(label: String, params: TextureParams) -> Self {
        TextureResource {
            state: ResourceState::new(ResourceKind::Texture, label),
            params,
            id: Mutex::new(None),
        }
    }

    #[inline]
    pub fn state(&self) -> &ResourceState {
        &self.state
    }

    #[inline]
    pub fn params(&self) -> &TextureParams {
        &self.params
    }

    /// The device id, while initialized.
    pub fn id(&self) -> Option<TextureId> {
        *self.id.lock().unwrap()
    }
}

/// A pooled shader. Compilation and constant matching happen on first
/// init; the binding list is immutable until the next free/init cycle.
pub struct ShaderResource {
    state: ResourceState,
    params: ShaderParams,
    program: Mutex<Option<ProgramId>>,
    bindings: Mutex<Bindings>,
}

impl ShaderResource {
    fn new(label: String, params: ShaderParams) -> Self {
        ShaderResource {
            state: ResourceState::new(ResourceKind::Shader, label),
            params,
            program: Mutex::new(None),
            bindings: Mutex::new(Bindings::new()),
        }
    }

    #[inline]
    pub fn state(&self) -> &ResourceState {
        &self.state
    }

    #[inline]
    pub fn params(&self) -> &ShaderParams {
        &self.params
    }

    pub fn program(&self) -> Option<ProgramId> {
        *self.program.lock().unwrap()
    }

    /// Number of constants matched at the last compilation.
    pub fn bindings_len(&self) -> usize {
        self.bindings.lock().unwrap().len()
    }
}

struct TargetSurfaces {
    colors: SmallVec<[SurfaceId; MAX_COLOR_ATTACHMENTS]>,
    depth: Option<SurfaceId>,
}

/// A pooled render target; owns one device surface per declared
/// attachment once initialized.
pub struct TargetResource {
    state: ResourceState,
    params: TargetParams,
    surfaces: Mutex<Option<TargetSurfaces>>,
}

impl TargetResource {
    fn new(label: String, params: TargetParams) -> Self {
        TargetResource {
            state: ResourceState::new(ResourceKind::Target, label),
            params,
            surfaces: Mutex::new(None),
        }
    }

    #[inline]
    pub fn state(&self) -> &ResourceState {
        &self.state
    }

    #[inline]
    pub fn params(&self) -> &TargetParams {
        &self.params
    }
}

/// The thread-shareable half of the render system: pools, registry and
/// name lookups. Creation here is cheap and device-free; everything
/// device-facing lives on [`RenderSystem`](struct.RenderSystem.html).
pub struct RenderSystemShared {
    registry: Arc<Registry>,
    caps: DeviceCaps,
    textures: RwLock<ObjectPool<TextureHandle, Arc<TextureResource>>>,
    shaders: RwLock<ObjectPool<ShaderHandle, Arc<ShaderResource>>>,
    targets: RwLock<ObjectPool<TargetHandle, Arc<TargetResource>>>,
    texture_names: FastHashMap<HashValue<str>, TextureHandle>,
    shader_names: FastHashMap<HashValue<str>, ShaderHandle>,
    target_names: FastHashMap<HashValue<str>, TargetHandle>,
}

impl RenderSystemShared {
    #[inline]
    pub fn caps(&self) -> DeviceCaps {
        self.caps
    }

    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Creates an uninitialized texture entry.
    pub fn create_texture<T>(&self, label: T, params: TextureParams) -> Result<TextureHandle>
    where
        T: Into<String>,
    {
        params.validate()?;
        let resource = Arc::new(TextureResource::new(label.into(), params));
        Ok(self.textures.write().unwrap().create(resource))
    }

    /// Creates an uninitialized shader entry.
    pub fn create_shader<T>(&self, label: T, params: ShaderParams) -> Result<ShaderHandle>
    where
        T: Into<String>,
    {
        params.validate()?;
        let resource = Arc::new(ShaderResource::new(label.into(), params));
        Ok(self.shaders.write().unwrap().create(resource))
    }

    /// Creates an uninitialized render target entry. The declared color
    /// attachments are validated against the device limit here, so an
    /// over-declared target never becomes addressable.
    pub fn create_target<T>(&self, label: T, params: TargetParams) -> Result<TargetHandle>
    where
        T: Into<String>,
    {
        params.validate(&self.caps)?;
        let resource = Arc::new(TargetResource::new(label.into(), params));
        Ok(self.targets.write().unwrap().create(resource))
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<Arc<TextureResource>> {
        self.textures.read().unwrap().get(handle).cloned()
    }

    pub fn shader(&self, handle: ShaderHandle) -> Option<Arc<ShaderResource>> {
        self.shaders.read().unwrap().get(handle).cloned()
    }

    pub fn target(&self, handle: TargetHandle) -> Option<Arc<TargetResource>> {
        self.targets.read().unwrap().get(handle).cloned()
    }

    /// Looks up the handle of a registry-declared texture.
    pub fn texture_handle<T>(&self, name: T) -> Option<TextureHandle>
    where
        T: Into<HashValue<str>>,
    {
        self.texture_names.get(&name.into()).cloned()
    }

    /// Looks up the handle of a registry-declared shader.
    pub fn shader_handle<T>(&self, name: T) -> Option<ShaderHandle>
    where
        T: Into<HashValue<str>>,
    {
        self.shader_names.get(&name.into()).cloned()
    }

    /// Looks up the handle of a registry-declared render target.
    pub fn target_handle<T>(&self, name: T) -> Option<TargetHandle>
    where
        T: Into<HashValue<str>>,
    {
        self.target_names.get(&name.into()).cloned()
    }
}

/// The render-thread half: owns the device, drives initialization and
/// teardown, dispatches constant bindings and runs the target stack.
pub struct RenderSystem<D: Device> {
    device: D,
    shared: Arc<RenderSystemShared>,
    stack: TargetStack,
}

impl<D: Device> RenderSystem<D> {
    /// Brings the system up against `device`: queries its caps, then
    /// populates the pools with an uninitialized entry for every
    /// declaration in `registry`.
    pub fn new(device: D, registry: Arc<Registry>) -> Result<Self> {
        let mut caps = device.caps();
        caps.max_color_attachments = caps.max_color_attachments.min(MAX_COLOR_ATTACHMENTS);

        let mut textures = ObjectPool::new();
        let mut shaders = ObjectPool::new();
        let mut targets = ObjectPool::new();
        let mut texture_names = FastHashMap::default();
        let mut shader_names = FastHashMap::default();
        let mut target_names = FastHashMap::default();

        for (name, decl) in registry.decls() {
            let hash = HashValue::from(name);

            match *decl {
                ResourceDecl::Texture(ref params) => {
                    params.validate()?;
                    let resource = Arc::new(TextureResource::new(name.clone(), params.clone()));
                    texture_names.insert(hash, textures.create(resource));
                }
                ResourceDecl::Shader(ref params) => {
                    params.validate()?;
                    let resource = Arc::new(ShaderResource::new(name.clone(), params.clone()));
                    shader_names.insert(hash, shaders.create(resource));
                }
                ResourceDecl::Target(ref params) => {
                    params.validate(&caps)?;
                    let resource = Arc::new(TargetResource::new(name.clone(), params.clone()));
                    target_names.insert(hash, targets.create(resource));
                }
            }
        }

        info!(
            "render system up: {} color attachments, {}x anisotropy, {} constants, {} declarations",
            caps.max_color_attachments,
            caps.max_anisotropy,
            registry.constants_len(),
            registry.decls().len()
        );

        let shared = Arc::new(RenderSystemShared {
            registry,
            caps,
            textures: RwLock::new(textures),
            shaders: RwLock::new(shaders),
            targets: RwLock::new(targets),
            texture_names,
            shader_names,
            target_names,
        });

        Ok(RenderSystem {
            device,
            stack: TargetStack::new(caps.max_color_attachments),
            shared,
        })
    }

    #[inline]
    pub fn shared(&self) -> &Arc<RenderSystemShared> {
        &self.shared
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Creates the device-side texture object. `Ok(false)` means another
    /// thread is initializing it or it already is initialized.
    pub fn init_texture(&mut self, handle: TextureHandle) -> Result<bool> {
        let texture = self
            .shared
            .texture(handle)
            .ok_or_else(|| Error::HandleInvalid(format!("{}", handle)))?;

        let device = &mut self.device;
        texture.state.try_init(|| {
            let id = device.create_texture(&texture.params)?;
            *texture.id.lock().unwrap() = Some(id);
            Ok(())
        })
    }

    /// Frees the device-side texture object and recycles the pool slot.
    /// A stale handle is ignored.
    pub fn delete_texture(&mut self, handle: TextureHandle) {
        let freed = self.shared.textures.write().unwrap().free(handle);

        if let Some(texture) = freed {
            let device = &mut self.device;
            texture.state.free(|| {
                if let Some(id) = texture.id.lock().unwrap().take() {
                    device.delete_texture(id);
                }
            });
        }
    }

    /// Compiles the shader's program pair and matches its reflection tables
    /// against the registered constants. `Ok(false)` as in
    /// [`init_texture`](#method.init_texture).
    pub fn init_shader(&mut self, handle: ShaderHandle) -> Result<bool> {
        let shader = self
            .shared
            .shader(handle)
            .ok_or_else(|| Error::HandleInvalid(format!("{}", handle)))?;

        let registry = Arc::clone(&self.shared.registry);
        let device = &mut self.device;

        shader.state.try_init(|| {
            let compiled = device.compile(&shader.params)?;

            let mut bindings =
                binder::build(&registry, ShaderStage::Vertex, &compiled.vertex_inputs);
            bindings.extend(binder::build(
                &registry,
                ShaderStage::Pixel,
                &compiled.pixel_inputs,
            ));

            *shader.program.lock().unwrap() = Some(compiled.id);
            *shader.bindings.lock().unwrap() = bindings;
            Ok(())
        })
    }

    pub fn delete_shader(&mut self, handle: ShaderHandle) {
        let freed = self.shared.shaders.write().unwrap().free(handle);

        if let Some(shader) = freed {
            let device = &mut self.device;
            shader.state.free(|| {
                if let Some(id) = shader.program.lock().unwrap().take() {
                    device.delete_program(id);
                }
                shader.bindings.lock().unwrap().clear();
            });
        }
    }

    /// Creates one device surface per declared attachment.
    pub fn init_target(&mut self, handle: TargetHandle) -> Result<bool> {
        let target = self
            .shared
            .target(handle)
            .ok_or_else(|| Error::HandleInvalid(format!("{}", handle)))?;

        let device = &mut self.device;
        target.state.try_init(|| {
            let surfaces = create_target_surfaces(device, &target.params)?;
            *target.surfaces.lock().unwrap() = Some(surfaces);
            Ok(())
        })
    }

    /// Frees the target's surfaces and recycles the pool slot. A stale
    /// handle is ignored; deleting a target that is still on the stack is
    /// a nesting bug in the calling render pass and panics, like popping
    /// out of order.
    pub fn delete_target(&mut self, handle: TargetHandle) {
        if self.stack.contains(handle) {
            panic!(
                "render-target nesting violated: deleting {} while it is still pushed",
                handle
            );
        }

        let freed = self.shared.targets.write().unwrap().free(handle);

        if let Some(target) = freed {
            let device = &mut self.device;
            target.state.free(|| {
                if let Some(surfaces) = target.surfaces.lock().unwrap().take() {
                    delete_target_surfaces(device, surfaces);
                }
            });
        }
    }

    /// Dispatches the shader's prebuilt constant bindings: every bound
    /// constant's current value is written to its register, and texture
    /// constants are resolved through the texture pool into sampler binds.
    /// An unresolvable or uninitialized texture clears its slot.
    pub fn bind_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        let shader = self
            .shared
            .shader(handle)
            .ok_or_else(|| Error::HandleInvalid(format!("{}", handle)))?;

        if !shader.state.is_initialized() {
            return Err(Error::NotInitialized(shader.state.label().into()));
        }

        let shared = &self.shared;
        let device = &mut self.device;

        for binding in shader.bindings.lock().unwrap().iter() {
            binding.bind(&mut *device, |texture| {
                shared
                    .texture(texture)
                    .and_then(|t| t.id().map(|id| (id, t.params.sampler)))
            });
        }

        Ok(())
    }

    /// Clears the texture slots the shader's bindings occupy. Scalar
    /// registers are left as-is; the next bind overwrites them.
    pub fn unbind_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        let shader = self
            .shared
            .shader(handle)
            .ok_or_else(|| Error::HandleInvalid(format!("{}", handle)))?;

        let device = &mut self.device;
        for binding in shader.bindings.lock().unwrap().iter() {
            binding.unbind(&mut *device);
        }

        Ok(())
    }

    /// Redirects rendering to `handle`. The target must be alive and
    /// initialized. See
    /// [`TargetStack::push`](../target_stack/struct.TargetStack.html#method.push)
    /// for the capture protocol.
    pub fn push_target(&mut self, handle: TargetHandle) -> Result<()> {
        let target = self
            .shared
            .target(handle)
            .ok_or_else(|| Error::HandleInvalid(format!("{}", handle)))?;

        let guard = target.surfaces.lock().unwrap();
        let surfaces = guard
            .as_ref()
            .ok_or_else(|| Error::NotInitialized(target.state.label().into()))?;

        self.stack
            .push(&mut self.device, handle, &surfaces.colors, surfaces.depth);
        Ok(())
    }

    /// Pops `handle` and re-establishes whatever is underneath: the next
    /// target down, or the captured back buffer. Panics when `handle` is
    /// not the stack top.
    pub fn pop_target(&mut self, handle: TargetHandle) -> Result<()> {
        match self.stack.pop(&mut self.device, handle) {
            PopAction::Restored => Ok(()),
            PopAction::Rebind(next) => {
                let target = self
                    .shared
                    .target(next)
                    .ok_or_else(|| Error::HandleInvalid(format!("{}", next)))?;

                let guard = target.surfaces.lock().unwrap();
                if let Some(surfaces) = guard.as_ref() {
                    self.stack
                        .bind(&mut self.device, &surfaces.colors, surfaces.depth);
                }

                Ok(())
            }
        }
    }

    /// The target currently redirecting rendering, if any.
    #[inline]
    pub fn active_target(&self) -> Option<TargetHandle> {
        self.stack.active()
    }

    /// Pushes `handle` and returns a guard that pops it when dropped, so
    /// restoration happens on every exit path, early returns included.
    pub fn target_scope(&mut self, handle: TargetHandle) -> Result<TargetScope<D>> {
        self.push_target(handle)?;
        Ok(TargetScope {
            system: self,
            handle,
        })
    }
}

impl<D: Device> Drop for RenderSystem<D> {
    fn drop(&mut self) {
        let device = &mut self.device;
        let mut freed = 0;

        {
            let textures = self.shared.textures.read().unwrap();
            for handle in textures.iter() {
                if let Some(texture) = textures.get(handle) {
                    texture.state.free(|| {
                        if let Some(id) = texture.id.lock().unwrap().take() {
                            device.delete_texture(id);
                            freed += 1;
                        }
                    });
                }
            }
        }

        {
            let shaders = self.shared.shaders.read().unwrap();
            for handle in shaders.iter() {
                if let Some(shader) = shaders.get(handle) {
                    shader.state.free(|| {
                        if let Some(id) = shader.program.lock().unwrap().take() {
                            device.delete_program(id);
                            freed += 1;
                        }
                        // A dispatch panic can poison the binding list;
                        // teardown still has to run.
                        shader
                            .bindings
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .clear();
                    });
                }
            }
        }

        {
            let targets = self.shared.targets.read().unwrap();
            for handle in targets.iter() {
                if let Some(target) = targets.get(handle) {
                    target.state.free(|| {
                        if let Some(surfaces) = target.surfaces.lock().unwrap().take() {
                            delete_target_surfaces(&mut *device, surfaces);
                            freed += 1;
                        }
                    });
                }
            }
        }

        if self.stack.depth() > 0 {
            warn!(
                "render system dropped with {} targets still pushed",
                self.stack.depth()
            );
        }

        info!("render system down, {} resources freed at teardown", freed);
    }
}

/// Scoped redirection to one render target; see
/// [`RenderSystem::target_scope`](struct.RenderSystem.html#method.target_scope).
/// Derefs to the system so draws can be issued through it.
pub struct TargetScope<'a, D: Device> {
    system: &'a mut RenderSystem<D>,
    handle: TargetHandle,
}

impl<'a, D: Device> Deref for TargetScope<'a, D> {
    type Target = RenderSystem<D>;

    fn deref(&self) -> &RenderSystem<D> {
        self.system
    }
}

impl<'a, D: Device> DerefMut for TargetScope<'a, D> {
    fn deref_mut(&mut self) -> &mut RenderSystem<D> {
        self.system
    }
}

impl<'a, D: Device> Drop for TargetScope<'a, D> {
    fn drop(&mut self) {
        if let Err(err) = self.system.pop_target(self.handle) {
            warn!("failed to restore after scope of {}: {}", self.handle, err);
        }
    }
}

fn create_target_surfaces<D: Device>(
    device: &mut D,
    params: &TargetParams,
) -> Result<TargetSurfaces> {
    let mut colors: SmallVec<[SurfaceId; MAX_COLOR_ATTACHMENTS]> = SmallVec::new();

    for &format in params.colors.iter() {
        match device.create_surface(SurfaceFormat::Color(format), params.dimensions) {
            Ok(id) => colors.push(id),
            Err(err) => {
                for id in colors {
                    device.delete_surface(id);
                }
                return Err(err);
            }
        }
    }

    let depth = match params.depth {
        Some(format) => {
            match device.create_surface(SurfaceFormat::Depth(format), params.dimensions) {
                Ok(id) => Some(id),
                Err(err) => {
                    for id in colors {
                        device.delete_surface(id);
                    }
                    return Err(err);
                }
            }
        }
        None => None,
    };

    Ok(TargetSurfaces { colors, depth })
}

fn delete_target_surfaces<D: Device + ?Sized>(device: &mut D, surfaces: TargetSurfaces) {
    for id in surfaces.colors {
        device.delete_surface(id);
    }

    if let Some(id) = surfaces.depth {
        device.delete_surface(id);
    }
}
