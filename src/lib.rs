//! # Ember
//!
//! Ember is the resource and binding substrate of a real-time rendering
//! engine: the layer that turns declaratively registered GPU objects
//! (textures, shaders, render targets, named shader constants) into
//! correctly sequenced device calls.
//!
//! The crate is organised bottom up:
//!
//! - [`utils`](utils/index.html) supplies versioned handles and index-based
//!   object pools with slot reuse.
//! - [`res`](res/index.html) supplies the explicit registry of named shader
//!   constants and resource declarations, and the lazy
//!   construct/initialize/free lifecycle shared by every pooled resource.
//! - [`render`](render/index.html) is the substrate proper: the device
//!   facade, the render-target redirection stack and the reflection-driven
//!   shader constant binder.
//!
//! Everything above this layer — individual rendering effects, asset file
//! parsing, windowing — talks to it through [`RenderSystem`] and the
//! [`Device`] facade.
//!
//! [`RenderSystem`]: render/service/struct.RenderSystem.html
//! [`Device`]: render/device/trait.Device.html

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

#[macro_use]
pub mod utils;
pub mod res;
pub mod render;

pub mod prelude;
