// SPDX-FileCopyrightText: 2025 softras contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Rasterizer state context.
//!
//! The context owns every pipeline object (buffers, vertex arrays,
//! textures, framebuffers, shaders, programs) in typed stores and tracks
//! the active bindings and fixed-function toggles. It is an explicit
//! object rather than process-wide state: the pipeline takes it as a
//! parameter, hosts create and drop it like any other value. It is not
//! thread-safe; draw calls must be serialized by the embedding.

use glam::UVec2;
use softras_common::{Color, ObjectId, RenderError, Result};

use crate::buffer::{IndexBuffer, VertexBuffer};
use crate::framebuffer::{Framebuffer, FramebufferSpec, FramebufferStatus};
use crate::pipeline::{self, DrawPrimitive, RenderCommand};
use crate::program::Program;
use crate::shader::{FragmentShader, VertexShader};
use crate::store::{Handle, ObjectStore};
use crate::texture::{TexFormat, Texture};
use crate::vertex_array::VertexArray;

/// Face culling mode, tested in screen space after the viewport map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullFace {
    /// Keep everything.
    #[default]
    None,
    /// Drop clockwise triangles.
    Cw,
    /// Drop counter-clockwise triangles.
    Ccw,
}

/// Owner of all rasterizer objects and the active draw state.
pub struct Context {
    pub(crate) vertex_buffers: ObjectStore<VertexBuffer>,
    pub(crate) index_buffers: ObjectStore<IndexBuffer>,
    pub(crate) vertex_arrays: ObjectStore<VertexArray>,
    pub(crate) textures: ObjectStore<Texture>,
    pub(crate) framebuffers: ObjectStore<Framebuffer>,
    pub(crate) vertex_shaders: ObjectStore<VertexShader>,
    pub(crate) fragment_shaders: ObjectStore<FragmentShader>,
    pub(crate) programs: ObjectStore<Program>,

    pub(crate) default_framebuffer: ObjectId,
    pub(crate) active_framebuffer: ObjectId,
    pub(crate) active_program: Option<ObjectId>,
    pub(crate) active_vertex_array: Option<ObjectId>,
    pub(crate) cull_face: CullFace,
    pub(crate) depth_test: bool,
    pub(crate) wireframe: bool,
}

impl Context {
    /// Create a context with a default framebuffer of the given size.
    pub fn new(size: UVec2) -> Self {
        let mut ctx = Self {
            vertex_buffers: ObjectStore::new(),
            index_buffers: ObjectStore::new(),
            vertex_arrays: ObjectStore::new(),
            textures: ObjectStore::new(),
            framebuffers: ObjectStore::new(),
            vertex_shaders: ObjectStore::new(),
            fragment_shaders: ObjectStore::new(),
            programs: ObjectStore::new(),
            default_framebuffer: 0,
            active_framebuffer: 0,
            active_program: None,
            active_vertex_array: None,
            cull_face: CullFace::None,
            depth_test: false,
            wireframe: false,
        };
        let fb = ctx.create_basic_framebuffer(size);
        ctx.default_framebuffer = fb.id();
        ctx.active_framebuffer = fb.id();
        log::debug!("context: init {}x{} default framebuffer", size.x, size.y);
        ctx
    }

    /// Tear down every object and reset the bindings. Handles created
    /// before this call no longer resolve; id counters keep running so
    /// ids are never recycled.
    pub fn destroy(&mut self) {
        self.framebuffers.clear();
        self.vertex_arrays.clear();
        self.programs.clear();
        self.vertex_shaders.clear();
        self.fragment_shaders.clear();
        self.vertex_buffers.clear();
        self.index_buffers.clear();
        self.textures.clear();
        self.default_framebuffer = 0;
        self.active_framebuffer = 0;
        self.active_program = None;
        self.active_vertex_array = None;
        log::debug!("context: destroyed");
    }

    // ── Fixed-function toggles ───────────────────────────────────────────

    pub fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    pub fn set_cull_face(&mut self, mode: CullFace) {
        self.cull_face = mode;
    }

    pub fn set_wireframe(&mut self, enabled: bool) {
        self.wireframe = enabled;
    }

    pub fn depth_test(&self) -> bool {
        self.depth_test
    }

    pub fn cull_face(&self) -> CullFace {
        self.cull_face
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    // ── Active bindings ──────────────────────────────────────────────────

    /// Bind a framebuffer for rendering; `None` selects the default one.
    pub fn set_active_framebuffer(&mut self, id: Option<ObjectId>) -> Result<()> {
        match id {
            Some(id) => {
                if !self.framebuffers.contains_id(id) {
                    return Err(RenderError::ObjectNotFound(id));
                }
                self.active_framebuffer = id;
            }
            None => self.active_framebuffer = self.default_framebuffer,
        }
        Ok(())
    }

    pub fn set_active_program(&mut self, id: ObjectId) -> Result<()> {
        if !self.programs.contains_id(id) {
            return Err(RenderError::ObjectNotFound(id));
        }
        self.active_program = Some(id);
        Ok(())
    }

    /// Bind a vertex array; `None` unbinds.
    pub fn set_active_vertex_array(&mut self, id: Option<ObjectId>) -> Result<()> {
        match id {
            Some(id) => {
                if !self.vertex_arrays.contains_id(id) {
                    return Err(RenderError::ObjectNotFound(id));
                }
                self.active_vertex_array = Some(id);
            }
            None => self.active_vertex_array = None,
        }
        Ok(())
    }

    pub fn active_framebuffer(&self) -> ObjectId {
        self.active_framebuffer
    }

    pub fn default_framebuffer(&self) -> Option<Handle<Framebuffer>> {
        self.framebuffers.handle_of(self.default_framebuffer)
    }

    // ── Object creation and lookup ───────────────────────────────────────

    pub fn create_vertex_buffer(&mut self, buffer: VertexBuffer) -> Handle<VertexBuffer> {
        self.vertex_buffers.insert(buffer)
    }

    pub fn vertex_buffer(&self, handle: Handle<VertexBuffer>) -> Option<&VertexBuffer> {
        self.vertex_buffers.get(handle)
    }

    pub fn create_index_buffer(&mut self, buffer: IndexBuffer) -> Handle<IndexBuffer> {
        self.index_buffers.insert(buffer)
    }

    pub fn index_buffer(&self, handle: Handle<IndexBuffer>) -> Option<&IndexBuffer> {
        self.index_buffers.get(handle)
    }

    pub fn create_vertex_array(&mut self, vao: VertexArray) -> Handle<VertexArray> {
        self.vertex_arrays.insert(vao)
    }

    pub fn vertex_array(&self, handle: Handle<VertexArray>) -> Option<&VertexArray> {
        self.vertex_arrays.get(handle)
    }

    pub fn create_texture(&mut self, texture: Texture) -> Handle<Texture> {
        self.textures.insert(texture)
    }

    pub fn texture(&self, handle: Handle<Texture>) -> Option<&Texture> {
        self.textures.get(handle)
    }

    pub fn texture_mut(&mut self, handle: Handle<Texture>) -> Option<&mut Texture> {
        self.textures.get_mut(handle)
    }

    pub fn create_vertex_shader(&mut self, shader: VertexShader) -> Handle<VertexShader> {
        self.vertex_shaders.insert(shader)
    }

    pub fn create_fragment_shader(&mut self, shader: FragmentShader) -> Handle<FragmentShader> {
        self.fragment_shaders.insert(shader)
    }

    /// Link a program from existing shader handles.
    pub fn create_program(
        &mut self,
        vertex_shader: Handle<VertexShader>,
        fragment_shader: Handle<FragmentShader>,
    ) -> Result<Handle<Program>> {
        if self.vertex_shaders.get(vertex_shader).is_none() {
            return Err(RenderError::ObjectNotFound(vertex_shader.id()));
        }
        if self.fragment_shaders.get(fragment_shader).is_none() {
            return Err(RenderError::ObjectNotFound(fragment_shader.id()));
        }
        Ok(self.programs.insert(Program::new(vertex_shader, fragment_shader)))
    }

    pub fn program(&self, handle: Handle<Program>) -> Option<&Program> {
        self.programs.get(handle)
    }

    pub fn program_mut(&mut self, handle: Handle<Program>) -> Option<&mut Program> {
        self.programs.get_mut(handle)
    }

    /// Validate the attachments and register a framebuffer. Attachment
    /// sizes are checked once, here; the status is fixed afterwards.
    pub fn create_framebuffer(
        &mut self,
        size: UVec2,
        spec: FramebufferSpec,
    ) -> Result<Handle<Framebuffer>> {
        let mut status = FramebufferStatus::Complete;

        for &color in &spec.colors {
            let tex = self
                .textures
                .get(color)
                .ok_or(RenderError::ObjectNotFound(color.id()))?;
            if tex.size() != size {
                status = FramebufferStatus::SizeMismatch;
            }
        }
        if let Some(depth) = spec.depth {
            let tex = self
                .textures
                .get(depth)
                .ok_or(RenderError::ObjectNotFound(depth.id()))?;
            if tex.size() != size {
                status = FramebufferStatus::SizeMismatch;
            }
        }
        if status == FramebufferStatus::Complete && spec.colors.is_empty() {
            status = FramebufferStatus::MissingColor;
        }

        if status != FramebufferStatus::Complete {
            log::warn!("framebuffer created with status {:?}", status);
        }
        Ok(self.framebuffers.insert(Framebuffer::new(size, spec, status)))
    }

    /// One rgba color attachment plus an rgba-sized depth plane read as
    /// f32 by the depth test.
    pub fn create_basic_framebuffer(&mut self, size: UVec2) -> Handle<Framebuffer> {
        let depth = self.textures.insert(Texture::blank(size, TexFormat::Rgba));
        let color = self.textures.insert(Texture::blank(size, TexFormat::Rgba));
        let spec = FramebufferSpec {
            depth: Some(depth),
            colors: vec![color],
        };
        self.framebuffers
            .insert(Framebuffer::new(size, spec, FramebufferStatus::Complete))
    }

    pub fn framebuffer(&self, handle: Handle<Framebuffer>) -> Option<&Framebuffer> {
        self.framebuffers.get(handle)
    }

    // ── Frame operations ─────────────────────────────────────────────────

    /// Clear the active framebuffer: `color` fills every color
    /// attachment, `depth` resets the depth plane to 1.0.
    pub fn clear(&mut self, color: Option<Color>, depth: bool) {
        let Some(fb) = self.framebuffers.get_id(self.active_framebuffer) else {
            return;
        };
        let colors = fb.color_attachments().to_vec();
        let depth_attachment = fb.depth_attachment();

        if let Some(c) = color {
            for attachment in colors {
                if let Some(tex) = self.textures.get_mut(attachment) {
                    tex.fill(c);
                }
            }
        }
        if depth {
            if let Some(attachment) = depth_attachment {
                if let Some(tex) = self.textures.get_mut(attachment) {
                    tex.fill_depth(1.0);
                }
            }
        }
    }

    /// Draw `count` vertices starting at `offset` from the bound vertex
    /// array.
    pub fn draw_arrays(
        &mut self,
        primitive: DrawPrimitive,
        offset: usize,
        count: usize,
    ) -> Result<()> {
        pipeline::draw(
            self,
            RenderCommand {
                primitive,
                indexed: false,
                count,
                offset,
            },
        )
    }

    /// Draw `count` indices from the bound vertex array's index buffer.
    pub fn draw_indexed(&mut self, primitive: DrawPrimitive, count: usize) -> Result<()> {
        pipeline::draw(
            self,
            RenderCommand {
                primitive,
                indexed: true,
                count,
                offset: 0,
            },
        )
    }
}
