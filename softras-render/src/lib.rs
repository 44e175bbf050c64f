// SPDX-FileCopyrightText: 2025 softras contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! softras-render: a programmable CPU rasterization pipeline.
//!
//! The crate renders triangles and lines into memory-backed framebuffers
//! by running a deterministic pipeline per draw call: vertex shading,
//! primitive assembly, near-plane clipping, perspective divide, viewport
//! transform, face culling, rasterization (Pineda triangle scan or
//! Bresenham lines), perspectively-correct attribute interpolation,
//! fragment shading, depth test, and color write.
//!
//! All state lives in an explicit [`Context`]: create one, register
//! buffers, textures, shaders and programs through it, bind what the
//! next draw should use, and call [`Context::draw_arrays`] or
//! [`Context::draw_indexed`].
//!
//! ```
//! use glam::{uvec2, vec4, Vec3};
//! use softras_render::{
//!     AttributeType, Context, DrawPrimitive, FragmentShader, VertexArray, VertexAttribute,
//!     VertexBuffer, VertexShader,
//! };
//!
//! let mut ctx = Context::new(uvec2(64, 64));
//!
//! let vbo = ctx.create_vertex_buffer(VertexBuffer::new(vec![
//!     -0.5, -0.5, 0.0,
//!      0.5, -0.5, 0.0,
//!      0.0,  0.5, 0.0,
//! ]));
//! let vao = ctx.create_vertex_array(VertexArray::new(
//!     vec![VertexAttribute { buffer: vbo, ty: AttributeType::Vec3, stride: 12, offset: 0 }],
//!     None,
//! ));
//!
//! let vs = ctx.create_vertex_shader(VertexShader::new(|vs| {
//!     let pos: Vec3 = vs.attribute(0).unwrap();
//!     vs.position = vec4(pos.x, pos.y, pos.z, 1.0);
//! }));
//! let fs = ctx.create_fragment_shader(FragmentShader::new(|fs| {
//!     fs.frag_color = vec4(0.0, 1.0, 0.0, 1.0);
//! }));
//! let prg = ctx.create_program(vs, fs).unwrap();
//!
//! ctx.set_active_program(prg.id()).unwrap();
//! ctx.set_active_vertex_array(Some(vao.id())).unwrap();
//! ctx.clear(Some(vec4(0.1, 0.1, 0.1, 1.0)), true);
//! ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap();
//! ```

pub mod buffer;
pub mod context;
pub mod framebuffer;
pub mod pipeline;
pub mod primitive;
pub mod program;
pub mod shader;
pub mod store;
pub mod texture;
pub mod vertex_array;

mod raster;

pub use buffer::{IndexBuffer, VertexBuffer};
pub use context::{Context, CullFace};
pub use framebuffer::{Framebuffer, FramebufferSpec, FramebufferStatus};
pub use pipeline::{DrawPrimitive, RenderCommand};
pub use program::Program;
pub use shader::{
    AttrValue, FragmentShader, InOutVar, InOutVars, UniformGroup, UniformValue, VarValue,
    VertexShader,
};
pub use store::{Handle, ObjectStore};
pub use texture::{FilterMode, TexFormat, Texture, TextureSpec, WrapMode};
pub use vertex_array::{AttributeType, VertexArray, VertexAttribute};

pub use softras_common::{str_id, Color, ObjectId, RenderError, Result, StrId};
