// SPDX-FileCopyrightText: 2025 softras contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shader program: one vertex shader, one fragment shader, and the
//! uniform dictionary both stages read.
//!
//! The driver copies the dictionary into the bound shaders at the start
//! of every draw, so uniforms set through [`Program::set_uniform`]
//! between draws are visible to the next draw and cannot change
//! mid-draw.

use softras_common::StrId;

use crate::shader::{FragmentShader, UniformGroup, UniformValue, VertexShader};
use crate::store::Handle;

/// Linked pair of shader stages plus their shared uniforms.
pub struct Program {
    pub(crate) vertex_shader: Handle<VertexShader>,
    pub(crate) fragment_shader: Handle<FragmentShader>,
    pub(crate) uniforms: UniformGroup,
}

impl Program {
    pub fn new(vertex_shader: Handle<VertexShader>, fragment_shader: Handle<FragmentShader>) -> Self {
        Self {
            vertex_shader,
            fragment_shader,
            uniforms: UniformGroup::new(),
        }
    }

    /// Insert or overwrite a uniform.
    pub fn set_uniform(&mut self, name: StrId, value: impl Into<UniformValue>) {
        self.uniforms.insert(name, value.into());
    }

    pub fn vertex_shader(&self) -> Handle<VertexShader> {
        self.vertex_shader
    }

    pub fn fragment_shader(&self) -> Handle<FragmentShader> {
        self.fragment_shader
    }

    pub fn uniforms(&self) -> &UniformGroup {
        &self.uniforms
    }
}
