//! Reflection-driven matching of named shader constants to compiled
//! program inputs, and the per-draw dispatch that pushes the current
//! constant values into the device's register banks.
//!
//! Matching runs once per shader (re)compilation: each reflected input
//! name is hashed and looked up in the registry's constant map; matches
//! become [`ConstantBinding`]s, misses are skipped. Dispatch runs on every
//! bind, potentially once per draw call, and writes through the fixed
//! width register primitives of the device.
//!
//! [`ConstantBinding`]: struct.ConstantBinding.html

use std::sync::Arc;

use smallvec::SmallVec;

use crate::render::assets::shader::{ConstantKind, ConstantVariable, ShaderConstant};
use crate::render::assets::texture::{SamplerParams, TextureHandle};
use crate::render::device::{Device, ReflectedInput, ShaderStage, TextureId};
use crate::res::registry::Registry;
use crate::utils::prelude::HashValue;

/// Scalar element kinds addressing the three constant register banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
}

/// The shape of one reflected input, classified once at build time so that
/// dispatch is an exhaustive match instead of a (kind, rows, cols) ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingShape {
    Scalar(ScalarKind),
    /// A single row of 2-4 components.
    Vector(ScalarKind, u8),
    /// 2-4 rows of up to 4 components; each row occupies one register.
    Matrix(ScalarKind, u8, u8),
    Sampler,
}

impl BindingShape {
    /// Classifies a reflected input. A combination no registered value can
    /// ever fit — bool vectors, non-float matrices, anything past 4 rows or
    /// columns — indicates a reflection/registration mismatch and is a
    /// fatal contract violation, surfaced here at build time rather than on
    /// the first draw.
    pub fn classify(input: &ReflectedInput) -> BindingShape {
        let scalar = match input.kind {
            ConstantKind::Bool => ScalarKind::Bool,
            ConstantKind::Int => ScalarKind::Int,
            ConstantKind::Float => ScalarKind::Float,
            ConstantKind::Sampler => return BindingShape::Sampler,
        };

        match (input.rows, input.cols) {
            (1, 1) => BindingShape::Scalar(scalar),
            (1, cols @ 2..=4) if scalar != ScalarKind::Bool => BindingShape::Vector(scalar, cols),
            (rows @ 2..=4, cols @ 1..=4) if scalar == ScalarKind::Float => {
                BindingShape::Matrix(scalar, rows, cols)
            }
            (rows, cols) => panic!(
                "unsupported shape for input '{}': {:?} {}x{}",
                input.name, input.kind, rows, cols
            ),
        }
    }
}

/// One prebuilt link from a registered constant to a program input. The
/// binding list of a shader is immutable between compilations.
#[derive(Clone)]
pub struct ConstantBinding {
    /// The registered constant. The registry outlives every shader, so the
    /// reference is never dangling.
    pub constant: Arc<ShaderConstant>,
    pub stage: ShaderStage,
    pub register: u32,
    pub shape: BindingShape,
    pub array_len: usize,
}

/// Per-shader binding list. Most shaders bind a handful of constants.
pub type Bindings = SmallVec<[ConstantBinding; 8]>;

/// Matches one stage's reflection table against the registry. Inputs
/// without a registered constant are skipped; when two registered names
/// hash alike the registry already resolved that in favor of the first
/// registration, so lookups here are deterministic.
pub fn build(registry: &Registry, stage: ShaderStage, inputs: &[ReflectedInput]) -> Bindings {
    let mut bindings = Bindings::new();

    for input in inputs {
        let hash = HashValue::from(&input.name);

        match registry.constant(hash) {
            Some(constant) => bindings.push(ConstantBinding {
                constant: Arc::clone(constant),
                stage,
                register: input.register,
                shape: BindingShape::classify(input),
                array_len: input.array_len.max(1),
            }),
            None => trace!("no constant registered for input '{}'", input.name),
        }
    }

    debug!(
        "{:?} stage: {} of {} reflected inputs bound",
        stage,
        bindings.len(),
        inputs.len()
    );

    bindings
}

impl ConstantBinding {
    /// Reads the constant's current value and pushes it into the register
    /// bank (or texture slot) this binding addresses. `resolve` maps a
    /// texture handle to its device id and sampler state; an unresolvable
    /// handle clears the slot instead of binding stale state.
    ///
    /// A value that does not fit the reflected shape is a fatal contract
    /// violation, never silently skipped.
    pub fn bind<F>(&self, device: &mut dyn Device, resolve: F)
    where
        F: Fn(TextureHandle) -> Option<(TextureId, SamplerParams)>,
    {
        let value = self.constant.get();

        match (self.shape, value) {
            (BindingShape::Scalar(ScalarKind::Bool), ConstantVariable::Bool(v)) => {
                device.set_bool_registers(self.stage, self.register, &[[v, false, false, false]]);
            }
            (BindingShape::Scalar(ScalarKind::Bool), ConstantVariable::BoolArray(ref vs)) => {
                let rows: Vec<[bool; 4]> = vs
                    .iter()
                    .take(self.array_len)
                    .map(|&v| [v, false, false, false])
                    .collect();
                device.set_bool_registers(self.stage, self.register, &rows);
            }
            (BindingShape::Scalar(ScalarKind::Int), ConstantVariable::Int(v)) => {
                device.set_int_registers(self.stage, self.register, &[[v, 0, 0, 0]]);
            }
            (BindingShape::Scalar(ScalarKind::Int), ConstantVariable::IntArray(ref vs)) => {
                let rows: Vec<[i32; 4]> = vs
                    .iter()
                    .take(self.array_len)
                    .map(|&v| [v, 0, 0, 0])
                    .collect();
                device.set_int_registers(self.stage, self.register, &rows);
            }
            (BindingShape::Scalar(ScalarKind::Float), ConstantVariable::Float(v)) => {
                device.set_float_registers(self.stage, self.register, &[[v, 0.0, 0.0, 0.0]]);
            }
            (BindingShape::Scalar(ScalarKind::Float), ConstantVariable::FloatArray(ref vs)) => {
                let rows: Vec<[f32; 4]> = vs
                    .iter()
                    .take(self.array_len)
                    .map(|&v| [v, 0.0, 0.0, 0.0])
                    .collect();
                device.set_float_registers(self.stage, self.register, &rows);
            }
            (BindingShape::Vector(ScalarKind::Int, 2), ConstantVariable::Vector2i(v)) => {
                device.set_int_registers(self.stage, self.register, &[[v[0], v[1], 0, 0]]);
            }
            (BindingShape::Vector(ScalarKind::Int, 3), ConstantVariable::Vector3i(v)) => {
                device.set_int_registers(self.stage, self.register, &[[v[0], v[1], v[2], 0]]);
            }
            (BindingShape::Vector(ScalarKind::Int, 4), ConstantVariable::Vector4i(v)) => {
                device.set_int_registers(self.stage, self.register, &[v]);
            }
            (BindingShape::Vector(ScalarKind::Float, 2), ConstantVariable::Vector2f(v)) => {
                device.set_float_registers(self.stage, self.register, &[[v[0], v[1], 0.0, 0.0]]);
            }
            (BindingShape::Vector(ScalarKind::Float, 3), ConstantVariable::Vector3f(v)) => {
                device.set_float_registers(self.stage, self.register, &[[v[0], v[1], v[2], 0.0]]);
            }
            (BindingShape::Vector(ScalarKind::Float, 4), ConstantVariable::Vector4f(v)) => {
                device.set_float_registers(self.stage, self.register, &[v]);
            }
            (BindingShape::Vector(ScalarKind::Float, 4), ConstantVariable::Vector4fArray(ref vs)) => {
                let n = vs.len().min(self.array_len);
                device.set_float_registers(self.stage, self.register, &vs[..n]);
            }
            (BindingShape::Matrix(ScalarKind::Float, 2, _), ConstantVariable::Matrix2f(m)) => {
                device.set_float_registers(
                    self.stage,
                    self.register,
                    &[
                        [m[0][0], m[0][1], 0.0, 0.0],
                        [m[1][0], m[1][1], 0.0, 0.0],
                    ],
                );
            }
            (BindingShape::Matrix(ScalarKind::Float, 3, _), ConstantVariable::Matrix3f(m)) => {
                device.set_float_registers(
                    self.stage,
                    self.register,
                    &[
                        [m[0][0], m[0][1], m[0][2], 0.0],
                        [m[1][0], m[1][1], m[1][2], 0.0],
                        [m[2][0], m[2][1], m[2][2], 0.0],
                    ],
                );
            }
            (BindingShape::Matrix(ScalarKind::Float, 4, _), ConstantVariable::Matrix4f(m)) => {
                device.set_float_registers(self.stage, self.register, &m);
            }
            (BindingShape::Matrix(ScalarKind::Float, 4, _), ConstantVariable::Matrix4fArray(ref ms)) => {
                let rows: Vec<[f32; 4]> = ms
                    .iter()
                    .take(self.array_len)
                    .flat_map(|m| m.iter().cloned())
                    .collect();
                device.set_float_registers(self.stage, self.register, &rows);
            }
            (BindingShape::Sampler, ConstantVariable::Texture(handle)) => {
                match resolve(handle) {
                    Some((id, sampler)) => {
                        device.bind_sampler(self.stage, self.register, id, sampler);
                    }
                    None => device.unbind_sampler(self.stage, self.register),
                }
            }
            (shape, value) => panic!(
                "constant '{}' has value {:?}, which does not fit the reflected shape {:?}",
                self.constant.name(),
                value,
                shape
            ),
        }
    }

    /// Mirrors only the texture-slot binds; register writes are left to be
    /// overwritten by the next bind.
    pub fn unbind(&self, device: &mut dyn Device) {
        if let BindingShape::Sampler = self.shape {
            device.unbind_sampler(self.stage, self.register);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::render::headless::reflected_input;

    #[test]
    fn classify_shapes() {
        let scalar = reflected_input("bEnabled", ConstantKind::Bool, 1, 1, 1, 0);
        assert_eq!(BindingShape::classify(&scalar), BindingShape::Scalar(ScalarKind::Bool));

        let vector = reflected_input("vColor", ConstantKind::Float, 1, 4, 1, 2);
        assert_eq!(
            BindingShape::classify(&vector),
            BindingShape::Vector(ScalarKind::Float, 4)
        );

        let ivector = reflected_input("vTexel", ConstantKind::Int, 1, 2, 1, 3);
        assert_eq!(
            BindingShape::classify(&ivector),
            BindingShape::Vector(ScalarKind::Int, 2)
        );

        let matrix = reflected_input("mWorld", ConstantKind::Float, 4, 4, 1, 4);
        assert_eq!(
            BindingShape::classify(&matrix),
            BindingShape::Matrix(ScalarKind::Float, 4, 4)
        );

        let normal = reflected_input("mNormal", ConstantKind::Float, 3, 3, 1, 8);
        assert_eq!(
            BindingShape::classify(&normal),
            BindingShape::Matrix(ScalarKind::Float, 3, 3)
        );

        let sampler = reflected_input("sAlbedo", ConstantKind::Sampler, 1, 1, 1, 0);
        assert_eq!(BindingShape::classify(&sampler), BindingShape::Sampler);
    }

    #[test]
    #[should_panic(expected = "unsupported shape")]
    fn oversized_shape_is_fatal() {
        let bad = reflected_input("mBroken", ConstantKind::Float, 7, 1, 1, 0);
        BindingShape::classify(&bad);
    }

    #[test]
    #[should_panic(expected = "unsupported shape")]
    fn non_float_matrix_is_fatal() {
        // No registerable value exists for a bool matrix; the mismatch is
        // reported at build time, not on the first draw.
        let bad = reflected_input("mFlags", ConstantKind::Bool, 4, 4, 1, 0);
        BindingShape::classify(&bad);
    }

    #[test]
    fn unmatched_inputs_are_skipped() {
        let registry = Registry::build()
            .constant("fExposure", ConstantVariable::Float(1.0))
            .finish();

        let inputs = vec![
            reflected_input("fExposure", ConstantKind::Float, 1, 1, 1, 0),
            reflected_input("fUnregistered", ConstantKind::Float, 1, 1, 1, 1),
        ];

        let bindings = build(&registry, ShaderStage::Pixel, &inputs);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].constant.name(), "fExposure");
        assert_eq!(bindings[0].register, 0);
    }
}
