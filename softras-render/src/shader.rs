// SPDX-FileCopyrightText: 2025 softras contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Programmable shader stages.
//!
//! A shader is a user closure plus the typed variable tables the pipeline
//! reads and writes around it: attribute slots and out-vars for the
//! vertex stage, interpolated in-vars and a color output for the fragment
//! stage, and a per-draw snapshot of the owning program's uniforms for
//! both. Variables are keyed by [`StrId`] hashes and stored as tagged
//! variants; the `integer` tag decides copy-vs-lerp during interpolation.

use std::collections::HashMap;
use std::rc::Rc;

use glam::{IVec2, IVec3, IVec4, Mat3, Mat4, Vec2, Vec3, Vec4};
use softras_common::StrId;

use crate::vertex_array::AttributeType;

// ── In/out variables ────────────────────────────────────────────────────

/// Value of a shader in/out variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarValue {
    I32(i32),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    F32(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl VarValue {
    /// Widen a float variant to vec4 (zero-padded) for blending.
    /// Integer variants are never blended; they widen to zero.
    pub(crate) fn to_vec4(self) -> Vec4 {
        match self {
            VarValue::F32(v) => Vec4::new(v, 0.0, 0.0, 0.0),
            VarValue::Vec2(v) => Vec4::new(v.x, v.y, 0.0, 0.0),
            VarValue::Vec3(v) => Vec4::new(v.x, v.y, v.z, 0.0),
            VarValue::Vec4(v) => v,
            _ => Vec4::ZERO,
        }
    }

    /// Rebuild the same shape from a blended vec4.
    pub(crate) fn with_vec4(self, v: Vec4) -> VarValue {
        match self {
            VarValue::F32(_) => VarValue::F32(v.x),
            VarValue::Vec2(_) => VarValue::Vec2(Vec2::new(v.x, v.y)),
            VarValue::Vec3(_) => VarValue::Vec3(Vec3::new(v.x, v.y, v.z)),
            VarValue::Vec4(_) => VarValue::Vec4(v),
            other => other,
        }
    }
}

/// Tagged in/out variable. Integer variables are copied from the leading
/// vertex instead of interpolated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InOutVar {
    pub value: VarValue,
    pub integer: bool,
}

/// Types that can live in an in/out variable slot.
pub trait VarKind: Copy {
    const INTEGER: bool;
    fn default_value() -> VarValue;
    fn get_mut(value: &mut VarValue) -> Option<&mut Self>;
}

macro_rules! impl_var_kind {
    ($($ty:ty => $variant:ident, $integer:expr, $default:expr;)*) => {
        $(impl VarKind for $ty {
            const INTEGER: bool = $integer;
            fn default_value() -> VarValue {
                VarValue::$variant($default)
            }
            fn get_mut(value: &mut VarValue) -> Option<&mut Self> {
                match value {
                    VarValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        })*
    };
}

impl_var_kind! {
    i32   => I32, true, 0;
    IVec2 => IVec2, true, IVec2::ZERO;
    IVec3 => IVec3, true, IVec3::ZERO;
    IVec4 => IVec4, true, IVec4::ZERO;
    f32   => F32, false, 0.0;
    Vec2  => Vec2, false, Vec2::ZERO;
    Vec3  => Vec3, false, Vec3::ZERO;
    Vec4  => Vec4, false, Vec4::ZERO;
}

/// Variable table keyed by hashed names.
#[derive(Debug, Clone, Default)]
pub struct InOutVars {
    vars: HashMap<StrId, InOutVar>,
}

impl InOutVars {
    /// Typed access, creating the slot on first use. Re-tags the variant
    /// and the integer flag to `T`, so every write to a key must agree on
    /// its type.
    pub fn var_mut<T: VarKind>(&mut self, name: StrId) -> &mut T {
        let var = self.vars.entry(name).or_insert(InOutVar {
            value: T::default_value(),
            integer: T::INTEGER,
        });
        var.integer = T::INTEGER;
        if T::get_mut(&mut var.value).is_none() {
            var.value = T::default_value();
        }
        T::get_mut(&mut var.value).expect("variant was just set")
    }

    pub fn get(&self, name: StrId) -> Option<&InOutVar> {
        self.vars.get(&name)
    }

    pub(crate) fn insert(&mut self, name: StrId, var: InOutVar) {
        self.vars.insert(name, var);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StrId, &InOutVar)> {
        self.vars.iter()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ── Uniforms ────────────────────────────────────────────────────────────

/// Value of a program uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    I32(i32),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    F32(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

/// Types readable out of a uniform slot.
pub trait UniformKind: Copy {
    fn extract(value: &UniformValue) -> Option<Self>;
}

macro_rules! impl_uniform_kind {
    ($($ty:ty => $variant:ident;)*) => {
        $(
            impl UniformKind for $ty {
                fn extract(value: &UniformValue) -> Option<Self> {
                    match value {
                        UniformValue::$variant(v) => Some(*v),
                        _ => None,
                    }
                }
            }
            impl From<$ty> for UniformValue {
                fn from(v: $ty) -> Self {
                    UniformValue::$variant(v)
                }
            }
        )*
    };
}

impl_uniform_kind! {
    i32 => I32;
    IVec2 => IVec2;
    IVec3 => IVec3;
    IVec4 => IVec4;
    f32 => F32;
    Vec2 => Vec2;
    Vec3 => Vec3;
    Vec4 => Vec4;
    Mat3 => Mat3;
    Mat4 => Mat4;
}

/// Uniform dictionary owned by a program and snapshotted into its shaders
/// at the start of every draw.
pub type UniformGroup = HashMap<StrId, UniformValue>;

// ── Vertex attributes ───────────────────────────────────────────────────

/// Fetched value of one vertex attribute slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrValue {
    I32(i32),
    F32(f32),
    Vec2(Vec2),
    IVec2(IVec2),
    Vec3(Vec3),
    IVec3(IVec3),
    Vec4(Vec4),
    IVec4(IVec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl AttrValue {
    /// Reinterpret raw vertex-buffer bytes as the declared shape.
    /// `bytes` must be exactly `ty.byte_size()` long.
    pub(crate) fn from_bytes(ty: AttributeType, bytes: &[u8]) -> AttrValue {
        use bytemuck::pod_read_unaligned as read;
        match ty {
            AttributeType::I32 => AttrValue::I32(read(bytes)),
            AttributeType::F32 => AttrValue::F32(read(bytes)),
            AttributeType::Vec2 => AttrValue::Vec2(read(bytes)),
            AttributeType::IVec2 => AttrValue::IVec2(read(bytes)),
            AttributeType::Vec3 => AttrValue::Vec3(read(bytes)),
            AttributeType::IVec3 => AttrValue::IVec3(read(bytes)),
            AttributeType::Vec4 => AttrValue::Vec4(read(bytes)),
            AttributeType::IVec4 => AttrValue::IVec4(read(bytes)),
            AttributeType::Mat3 => AttrValue::Mat3(read(bytes)),
            AttributeType::Mat4 => AttrValue::Mat4(read(bytes)),
        }
    }
}

/// Types readable out of an attribute slot.
pub trait AttrKind: Copy {
    fn extract(value: &AttrValue) -> Option<Self>;
}

macro_rules! impl_attr_kind {
    ($($ty:ty => $variant:ident;)*) => {
        $(impl AttrKind for $ty {
            fn extract(value: &AttrValue) -> Option<Self> {
                match value {
                    AttrValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        })*
    };
}

impl_attr_kind! {
    i32 => I32;
    f32 => F32;
    Vec2 => Vec2;
    IVec2 => IVec2;
    Vec3 => Vec3;
    IVec3 => IVec3;
    Vec4 => Vec4;
    IVec4 => IVec4;
    Mat3 => Mat3;
    Mat4 => Mat4;
}

// ── Shader stages ───────────────────────────────────────────────────────

/// Vertex stage: runs once per vertex id, reads attribute slots and
/// uniforms, writes `position` and out-vars.
pub struct VertexShader {
    func: Rc<dyn Fn(&mut VertexShader)>,
    /// Output clip-space position.
    pub position: Vec4,
    /// Input vertex id, set by the driver before each invocation.
    pub vertex_id: u32,
    pub(crate) attributes: Vec<AttrValue>,
    pub(crate) uniforms: UniformGroup,
    pub(crate) in_vars: InOutVars,
    pub(crate) out_vars: InOutVars,
}

impl VertexShader {
    pub fn new(func: impl Fn(&mut VertexShader) + 'static) -> Self {
        Self {
            func: Rc::new(func),
            position: Vec4::ZERO,
            vertex_id: 0,
            attributes: Vec::new(),
            uniforms: UniformGroup::new(),
            in_vars: InOutVars::default(),
            out_vars: InOutVars::default(),
        }
    }

    /// Fetched attribute at `location` (its index in the vertex array),
    /// or `None` when the location is unbound or of a different shape.
    pub fn attribute<T: AttrKind>(&self, location: usize) -> Option<T> {
        self.attributes.get(location).and_then(T::extract)
    }

    /// Uniform from the bound program's dictionary.
    pub fn uniform<T: UniformKind>(&self, name: StrId) -> Option<T> {
        self.uniforms.get(&name).and_then(T::extract)
    }

    pub fn input<T: VarKind>(&mut self, name: StrId) -> &mut T {
        self.in_vars.var_mut(name)
    }

    pub fn output<T: VarKind>(&mut self, name: StrId) -> &mut T {
        self.out_vars.var_mut(name)
    }

    pub fn out_vars(&self) -> &InOutVars {
        &self.out_vars
    }

    pub(crate) fn execute(&mut self) {
        let func = Rc::clone(&self.func);
        func(self);
    }
}

/// Fragment stage: runs once per rasterized fragment, reads interpolated
/// in-vars and uniforms, writes `frag_color` (or discards).
pub struct FragmentShader {
    func: Rc<dyn Fn(&mut FragmentShader)>,
    /// Input fragment coordinate: xy pixel center, z interpolated depth, w 1.
    pub frag_coord: Vec4,
    /// Input facing flag of the primitive that produced the fragment.
    pub front_facing: bool,
    /// Input point-sprite coordinate (reserved; points are unimplemented).
    pub point_coord: Vec2,
    /// Output color.
    pub frag_color: Vec4,
    pub(crate) discarded: bool,
    pub(crate) uniforms: UniformGroup,
    pub(crate) in_vars: InOutVars,
    pub(crate) out_vars: InOutVars,
}

impl FragmentShader {
    pub fn new(func: impl Fn(&mut FragmentShader) + 'static) -> Self {
        Self {
            func: Rc::new(func),
            frag_coord: Vec4::ZERO,
            front_facing: false,
            point_coord: Vec2::ZERO,
            frag_color: Vec4::ZERO,
            discarded: false,
            uniforms: UniformGroup::new(),
            in_vars: InOutVars::default(),
            out_vars: InOutVars::default(),
        }
    }

    /// Drop the current fragment: the depth test and color write are
    /// skipped, nothing is written for this pixel.
    pub fn discard(&mut self) {
        self.discarded = true;
    }

    pub fn uniform<T: UniformKind>(&self, name: StrId) -> Option<T> {
        self.uniforms.get(&name).and_then(T::extract)
    }

    pub fn input<T: VarKind>(&mut self, name: StrId) -> &mut T {
        self.in_vars.var_mut(name)
    }

    pub fn output<T: VarKind>(&mut self, name: StrId) -> &mut T {
        self.out_vars.var_mut(name)
    }

    pub fn in_vars(&self) -> &InOutVars {
        &self.in_vars
    }

    pub(crate) fn execute(&mut self) {
        self.discarded = false;
        let func = Rc::clone(&self.func);
        func(self);
    }
}
