// SPDX-FileCopyrightText: 2025 softras contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Draw-call driver.
//!
//! One call to [`draw`] runs the whole pipeline synchronously on the
//! calling thread: snapshot the bound state, iterate the vertex-id
//! stream, fetch attributes, run the vertex shader, assemble primitives,
//! and push every completed primitive through clip → divide → viewport →
//! cull → rasterize. Each fragment is interpolated, shaded, depth-tested
//! and written to color attachment 0 of the bound framebuffer.

use glam::{UVec2, Vec4};
use softras_common::{RenderError, Result};

use crate::buffer::IndexBuffer;
use crate::context::{Context, CullFace};
use crate::framebuffer::FramebufferStatus;
use crate::primitive::{Assembler, Primitive};
use crate::shader::{AttrValue, FragmentShader, VertexShader};
use crate::store::{Handle, ObjectStore};
use crate::texture::Texture;
use crate::vertex_array::VertexAttribute;

pub use crate::primitive::DrawPrimitive;

/// One draw request, as built by `draw_arrays` / `draw_indexed`.
#[derive(Debug, Clone, Copy)]
pub struct RenderCommand {
    pub primitive: DrawPrimitive,
    pub indexed: bool,
    pub count: usize,
    pub offset: usize,
}

/// Immutable snapshot of the bound state for one draw call. Handles are
/// resolved (and descriptors copied out) up front so a missing object
/// aborts before anything is mutated.
struct RenderContext {
    cmd: RenderCommand,
    attributes: Vec<VertexAttribute>,
    index_buffer: Option<Handle<IndexBuffer>>,
    fb_size: UVec2,
    depth_attachment: Option<Handle<Texture>>,
    color_attachment: Option<Handle<Texture>>,
    cull: CullFace,
    depth_test: bool,
    wireframe: bool,
}

/// Run one draw call against the context's bound state.
pub(crate) fn draw(ctx: &mut Context, cmd: RenderCommand) -> Result<()> {
    // Id 0 is never assigned, so it doubles as "nothing bound".
    let program_id = ctx.active_program.ok_or(RenderError::ObjectNotFound(0))?;
    let program = ctx
        .programs
        .get_id(program_id)
        .ok_or(RenderError::ObjectNotFound(program_id))?;
    let vs_handle = program.vertex_shader();
    let fs_handle = program.fragment_shader();
    let uniforms = program.uniforms().clone();

    let vao_id = ctx.active_vertex_array.ok_or(RenderError::ObjectNotFound(0))?;
    let vao = ctx
        .vertex_arrays
        .get_id(vao_id)
        .ok_or(RenderError::ObjectNotFound(vao_id))?;
    let attributes = vao.attributes().to_vec();
    let index_buffer = vao.index_buffer();

    let fb_id = ctx.active_framebuffer;
    let fb = ctx
        .framebuffers
        .get_id(fb_id)
        .ok_or(RenderError::ObjectNotFound(fb_id))?;
    if fb.status() != FramebufferStatus::Complete {
        return Err(RenderError::InvalidArgument(format!(
            "framebuffer {} is {:?}",
            fb_id,
            fb.status()
        )));
    }

    let rcx = RenderContext {
        cmd,
        attributes,
        index_buffer,
        fb_size: fb.size(),
        depth_attachment: fb.depth_attachment(),
        color_attachment: fb.color_attachment(0),
        cull: ctx.cull_face,
        depth_test: ctx.depth_test,
        wireframe: ctx.wireframe,
    };

    // Vertex-id stream: the index buffer when the vertex array has one,
    // a running range otherwise.
    let ids: Vec<u32> = match rcx.index_buffer {
        Some(handle) => {
            let ibo = ctx
                .index_buffers
                .get(handle)
                .ok_or(RenderError::ObjectNotFound(handle.id()))?;
            if rcx.cmd.count > ibo.data.len() {
                return Err(RenderError::InvalidArgument(format!(
                    "count {} exceeds index buffer length {}",
                    rcx.cmd.count,
                    ibo.data.len()
                )));
            }
            ibo.data[..rcx.cmd.count].to_vec()
        }
        None => {
            if rcx.cmd.indexed {
                return Err(RenderError::InvalidArgument(
                    "indexed draw without an index buffer".into(),
                ));
            }
            (rcx.cmd.offset..rcx.cmd.offset + rcx.cmd.count)
                .map(|i| i as u32)
                .collect()
        }
    };

    let mut assembler = Assembler::new(rcx.cmd.primitive)?;

    log::trace!(
        "draw: {:?}, {} vertex ids, {}x{} target",
        rcx.cmd.primitive,
        ids.len(),
        rcx.fb_size.x,
        rcx.fb_size.y
    );

    // Split the context so the shaders, the source buffers and the
    // attachment textures can be borrowed side by side for the whole
    // draw.
    let Context {
        vertex_buffers,
        textures,
        vertex_shaders,
        fragment_shaders,
        ..
    } = ctx;

    let vs = vertex_shaders
        .get_mut(vs_handle)
        .ok_or(RenderError::ObjectNotFound(vs_handle.id()))?;
    let fs = fragment_shaders
        .get_mut(fs_handle)
        .ok_or(RenderError::ObjectNotFound(fs_handle.id()))?;

    vs.attributes.resize(rcx.attributes.len(), AttrValue::F32(0.0));
    vs.uniforms = uniforms.clone();
    fs.uniforms = uniforms;
    fs.in_vars.clear();

    // Resolve every attribute's source bytes once.
    let sources: Vec<&[u8]> = rcx
        .attributes
        .iter()
        .map(|attr| {
            vertex_buffers
                .get(attr.buffer)
                .map(|vbo| bytemuck::cast_slice::<f32, u8>(&vbo.data))
                .ok_or(RenderError::ObjectNotFound(attr.buffer.id()))
        })
        .collect::<Result<_>>()?;

    for &vertex_id in &ids {
        fetch_attributes(vs, &rcx.attributes, &sources, vertex_id)?;
        vs.vertex_id = vertex_id;
        vs.execute();
        if let Some(prim) = assembler.push(vs.position, vs.out_vars.clone()) {
            process_primitive(prim, &rcx, fs, textures);
        }
    }
    // Line loops still owe their closing segment.
    if let Some(prim) = assembler.finish() {
        process_primitive(prim, &rcx, fs, textures);
    }

    Ok(())
}

/// Copy each attribute's bytes for `vertex_id` into the shader's slots,
/// reinterpreted as the declared shape.
fn fetch_attributes(
    vs: &mut VertexShader,
    attributes: &[VertexAttribute],
    sources: &[&[u8]],
    vertex_id: u32,
) -> Result<()> {
    for (location, (attr, bytes)) in attributes.iter().zip(sources).enumerate() {
        let start = attr.offset + attr.stride * vertex_id as usize;
        let end = start + attr.ty.byte_size();
        if end > bytes.len() {
            return Err(RenderError::InvalidArgument(format!(
                "attribute {} ({:?}) reads bytes {}..{} past buffer end {}",
                location,
                attr.ty,
                start,
                end,
                bytes.len()
            )));
        }
        vs.attributes[location] = AttrValue::from_bytes(attr.ty, &bytes[start..end]);
    }
    Ok(())
}

/// Per-primitive stages: clip, divide, viewport, cull, rasterize, and
/// the per-fragment tail.
fn process_primitive(
    prim: Primitive,
    rcx: &RenderContext,
    fs: &mut FragmentShader,
    textures: &mut ObjectStore<Texture>,
) {
    for mut sub in prim.clip() {
        sub.perspective_divide();
        sub.viewport(rcx.fb_size);
        if sub.cull(rcx.cull) {
            continue;
        }
        if !sub.clip_viewport(rcx.fb_size) {
            continue;
        }
        let front_facing = sub.front_facing();
        sub.rasterize(rcx.fb_size, rcx.wireframe, &mut |mut pos| {
            sub.interpolate(&mut pos, &mut fs.in_vars);
            fs.frag_coord = pos;
            fs.front_facing = front_facing;
            fs.execute();
            if fs.discarded {
                return;
            }
            write_fragment(rcx, fs, textures, pos);
        });
    }
}

/// Fragment output stage: depth test against the f32 plane, then the
/// opaque color write to attachment 0.
fn write_fragment(
    rcx: &RenderContext,
    fs: &FragmentShader,
    textures: &mut ObjectStore<Texture>,
    pos: Vec4,
) {
    let x = pos.x as u32;
    let y = pos.y as u32;

    if rcx.depth_test {
        if let Some(tex) = rcx.depth_attachment.and_then(|h| textures.get_mut(h)) {
            if let Some(offset) = tex.pixel_offset(x, y) {
                let data = tex.data_mut();
                if offset + 4 <= data.len() {
                    let stored = f32::from_ne_bytes([
                        data[offset],
                        data[offset + 1],
                        data[offset + 2],
                        data[offset + 3],
                    ]);
                    if pos.z >= stored {
                        return;
                    }
                    data[offset..offset + 4].copy_from_slice(&pos.z.to_ne_bytes());
                }
            }
        }
    }

    if let Some(tex) = rcx.color_attachment.and_then(|h| textures.get_mut(h)) {
        let channels = tex.format().channels();
        if let Some(offset) = tex.pixel_offset(x, y) {
            let bytes = [
                (fs.frag_color.x * 255.0) as u8,
                (fs.frag_color.y * 255.0) as u8,
                (fs.frag_color.z * 255.0) as u8,
                (fs.frag_color.w * 255.0) as u8,
            ];
            tex.data_mut()[offset..offset + channels].copy_from_slice(&bytes[..channels]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::VertexBuffer;
    use crate::vertex_array::{AttributeType, VertexArray};
    use glam::{uvec2, vec4, Vec3};
    use softras_common::{str_id, BLUE, GRAY, GREEN, RED, WHITE};

    /// Full-screen triangle in NDC: covers every pixel after the
    /// viewport map.
    const FULLSCREEN: [f32; 9] = [-1.0, -1.0, 0.0, 3.0, -1.0, 0.0, -1.0, 3.0, 0.0];

    struct Scene {
        ctx: Context,
        prg: crate::store::Handle<crate::program::Program>,
    }

    /// 4x4 target, one vec3 position attribute, pass-through vertex
    /// shader, fragment color from the `tint` uniform (white fallback),
    /// depth offset from the `z` uniform.
    fn scene(positions: &[f32], indices: Option<Vec<u32>>) -> Scene {
        let mut ctx = Context::new(uvec2(4, 4));

        let vbo = ctx.create_vertex_buffer(VertexBuffer::new(positions.to_vec()));
        let ibo = indices.map(|data| ctx.create_index_buffer(IndexBuffer::new(data)));
        let vao = ctx.create_vertex_array(VertexArray::new(
            vec![VertexAttribute {
                buffer: vbo,
                ty: AttributeType::Vec3,
                stride: 12,
                offset: 0,
            }],
            ibo,
        ));

        let vs = ctx.create_vertex_shader(VertexShader::new(|vs| {
            let pos: Vec3 = vs.attribute(0).unwrap();
            let z: f32 = vs.uniform(str_id("z")).unwrap_or(pos.z);
            vs.position = vec4(pos.x, pos.y, z, 1.0);
        }));
        let fs = ctx.create_fragment_shader(FragmentShader::new(|fs| {
            fs.frag_color = fs.uniform(str_id("tint")).unwrap_or(WHITE);
        }));
        let prg = ctx.create_program(vs, fs).unwrap();

        ctx.set_active_program(prg.id()).unwrap();
        ctx.set_active_vertex_array(Some(vao.id())).unwrap();
        Scene { ctx, prg }
    }

    fn pixel(ctx: &Context, x: u32, y: u32) -> [u8; 4] {
        let fb = ctx.framebuffer(ctx.default_framebuffer().unwrap()).unwrap();
        let tex = ctx.texture(fb.color_attachment(0).unwrap()).unwrap();
        tex.pixel(x, y).unwrap().try_into().unwrap()
    }

    fn count_pixels(ctx: &Context, rgba: [u8; 4]) -> usize {
        let fb = ctx.framebuffer(ctx.default_framebuffer().unwrap()).unwrap();
        let tex = ctx.texture(fb.color_attachment(0).unwrap()).unwrap();
        tex.data().chunks_exact(4).filter(|px| *px == rgba).count()
    }

    // ── Whole-pipeline scenarios ─────────────────────────────────────────

    #[test]
    fn test_fullscreen_triangle_colors_every_pixel() {
        let mut s = scene(&FULLSCREEN, None);
        s.ctx.program_mut(s.prg).unwrap().set_uniform(str_id("tint"), GREEN);
        s.ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap();
        assert_eq!(count_pixels(&s.ctx, [0, 255, 0, 255]), 16);
    }

    #[test]
    fn test_depth_test_keeps_nearer_fragment() {
        // A red full-screen triangle at z=0.9 and a blue one at z=0.1,
        // drawn in both orders: the nearer (blue) fragment always wins.
        for order in [[0.9f32, 0.1], [0.1, 0.9]] {
            let mut s = scene(&FULLSCREEN, None);
            s.ctx.set_depth_test(true);
            s.ctx.clear(Some(GRAY), true);

            for &z in &order {
                let prg = s.ctx.program_mut(s.prg).unwrap();
                prg.set_uniform(str_id("z"), z);
                prg.set_uniform(str_id("tint"), if z < 0.5 { BLUE } else { RED });
                s.ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap();
            }

            assert_eq!(count_pixels(&s.ctx, [0, 0, 255, 255]), 16, "order {order:?}");
        }
    }

    #[test]
    fn test_indexed_quad_covers_target() {
        let quad = [
            -1.0f32, -1.0, 0.0, 1.0, -1.0, 0.0, -1.0, 1.0, 0.0, 1.0, 1.0, 0.0,
        ];
        let mut s = scene(&quad, Some(vec![0, 1, 2, 2, 1, 3]));
        s.ctx.program_mut(s.prg).unwrap().set_uniform(str_id("tint"), GREEN);
        s.ctx.draw_indexed(DrawPrimitive::Triangles, 6).unwrap();
        assert_eq!(count_pixels(&s.ctx, [0, 255, 0, 255]), 16);
    }

    #[test]
    fn test_wireframe_leaves_interior_untouched() {
        let mut s = scene(&FULLSCREEN, None);
        s.ctx.set_wireframe(true);
        s.ctx.clear(Some(GRAY), true);
        s.ctx.program_mut(s.prg).unwrap().set_uniform(str_id("tint"), GREEN);
        s.ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap();

        // The two on-screen edges land on the first row and column.
        for i in 0..4 {
            assert_eq!(pixel(&s.ctx, i, 0), [0, 255, 0, 255], "row pixel {i}");
            assert_eq!(pixel(&s.ctx, 0, i), [0, 255, 0, 255], "column pixel {i}");
        }
        // Interior pixels keep the clear color.
        assert_eq!(pixel(&s.ctx, 2, 2), [25, 25, 25, 255]);

        // Drawing again produces the same pixel set.
        let before = count_pixels(&s.ctx, [0, 255, 0, 255]);
        s.ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap();
        assert_eq!(count_pixels(&s.ctx, [0, 255, 0, 255]), before);
    }

    #[test]
    fn test_near_plane_clip_emits_partial_triangle() {
        // First vertex behind the near plane; the clipped triangles must
        // rasterize without any fragment from beyond it.
        let positions = [0.0f32, 1.0, -2.0, -1.0, -1.0, 0.5, 1.0, -1.0, 0.5];
        let mut s = scene(&positions, None);
        s.ctx.program_mut(s.prg).unwrap().set_uniform(str_id("tint"), GREEN);
        s.ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap();
        let covered = count_pixels(&s.ctx, [0, 255, 0, 255]);
        assert!(covered > 0, "clipped triangle still covers pixels");
        assert!(covered < 16, "clipping must remove part of the triangle");
    }

    #[test]
    fn test_culling_symmetry() {
        // CCW-culled triangle disappears; flipping the vertex order (or
        // the cull mode) brings it back.
        let mut s = scene(&FULLSCREEN, None);
        s.ctx.set_cull_face(CullFace::Ccw);
        s.ctx.program_mut(s.prg).unwrap().set_uniform(str_id("tint"), GREEN);
        s.ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap();
        let ccw_culled = count_pixels(&s.ctx, [0, 255, 0, 255]);

        s.ctx.set_cull_face(CullFace::Cw);
        s.ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap();
        let cw_culled = count_pixels(&s.ctx, [0, 255, 0, 255]);

        assert!(ccw_culled == 0 || cw_culled == 0);
        assert_eq!(ccw_culled + cw_culled, 16);
    }

    #[test]
    fn test_lines_draw_bresenham_row() {
        let positions = [-1.0f32, -0.99, 0.0, 1.0, -0.99, 0.0];
        let mut s = scene(&positions, None);
        s.ctx.program_mut(s.prg).unwrap().set_uniform(str_id("tint"), GREEN);
        s.ctx.draw_arrays(DrawPrimitive::Lines, 0, 2).unwrap();
        // y = 0.02 in screen space rounds onto row 0.
        assert!(count_pixels(&s.ctx, [0, 255, 0, 255]) >= 4);
        for x in 0..4 {
            assert_eq!(pixel(&s.ctx, x, 0), [0, 255, 0, 255]);
        }
    }

    #[test]
    fn test_line_loop_closes_shape() {
        // Three corners well inside the target; the loop's closing
        // segment must also be drawn.
        let positions = [
            -0.5f32, -0.5, 0.0, 0.5, -0.5, 0.0, 0.5, 0.5, 0.0,
        ];
        let mut s = scene(&positions, None);
        s.ctx.program_mut(s.prg).unwrap().set_uniform(str_id("tint"), GREEN);

        s.ctx.draw_arrays(DrawPrimitive::LineStrip, 0, 3).unwrap();
        let open = count_pixels(&s.ctx, [0, 255, 0, 255]);

        s.ctx.clear(Some(vec4(0.0, 0.0, 0.0, 0.0)), true);
        s.ctx.draw_arrays(DrawPrimitive::LineLoop, 0, 3).unwrap();
        let closed = count_pixels(&s.ctx, [0, 255, 0, 255]);

        assert!(closed > open, "loop ({closed} px) adds the closing edge to the strip ({open} px)");
    }

    #[test]
    fn test_uniforms_visible_per_draw() {
        let mut s = scene(&FULLSCREEN, None);
        s.ctx.program_mut(s.prg).unwrap().set_uniform(str_id("tint"), RED);
        s.ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap();
        assert_eq!(count_pixels(&s.ctx, [255, 0, 0, 255]), 16);

        s.ctx.program_mut(s.prg).unwrap().set_uniform(str_id("tint"), BLUE);
        s.ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap();
        assert_eq!(count_pixels(&s.ctx, [0, 0, 255, 255]), 16);
    }

    #[test]
    fn test_discard_skips_fragment_output() {
        let mut ctx = Context::new(uvec2(4, 4));
        let vbo = ctx.create_vertex_buffer(VertexBuffer::new(FULLSCREEN.to_vec()));
        let vao = ctx.create_vertex_array(VertexArray::new(
            vec![VertexAttribute {
                buffer: vbo,
                ty: AttributeType::Vec3,
                stride: 12,
                offset: 0,
            }],
            None,
        ));
        let vs = ctx.create_vertex_shader(VertexShader::new(|vs| {
            let pos: Vec3 = vs.attribute(0).unwrap();
            vs.position = vec4(pos.x, pos.y, pos.z, 1.0);
        }));
        let fs = ctx.create_fragment_shader(FragmentShader::new(|fs| {
            if fs.frag_coord.x < 2.0 {
                fs.discard();
            }
            fs.frag_color = GREEN;
        }));
        let prg = ctx.create_program(vs, fs).unwrap();
        ctx.set_active_program(prg.id()).unwrap();
        ctx.set_active_vertex_array(Some(vao.id())).unwrap();

        ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap();
        for y in 0..4 {
            assert_eq!(pixel(&ctx, 0, y), [0, 0, 0, 0], "discarded column");
            assert_eq!(pixel(&ctx, 3, y), [0, 255, 0, 255], "kept column");
        }
    }

    // ── Error paths ──────────────────────────────────────────────────────

    #[test]
    fn test_draw_without_program_fails() {
        let mut ctx = Context::new(uvec2(4, 4));
        let err = ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap_err();
        assert!(matches!(err, RenderError::ObjectNotFound(_)));
    }

    #[test]
    fn test_draw_without_vertex_array_fails() {
        let mut ctx = Context::new(uvec2(4, 4));
        let vs = ctx.create_vertex_shader(VertexShader::new(|_| {}));
        let fs = ctx.create_fragment_shader(FragmentShader::new(|_| {}));
        let prg = ctx.create_program(vs, fs).unwrap();
        ctx.set_active_program(prg.id()).unwrap();
        let err = ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap_err();
        assert!(matches!(err, RenderError::ObjectNotFound(_)));
    }

    #[test]
    fn test_reserved_primitive_is_not_implemented() {
        let mut s = scene(&FULLSCREEN, None);
        let err = s.ctx.draw_arrays(DrawPrimitive::Points, 0, 3).unwrap_err();
        assert!(matches!(err, RenderError::NotImplemented(_)));
    }

    #[test]
    fn test_indexed_draw_without_index_buffer_fails() {
        let mut s = scene(&FULLSCREEN, None);
        let err = s.ctx.draw_indexed(DrawPrimitive::Triangles, 3).unwrap_err();
        assert!(matches!(err, RenderError::InvalidArgument(_)));
    }

    #[test]
    fn test_index_count_beyond_buffer_fails() {
        let quad = [
            -1.0f32, -1.0, 0.0, 1.0, -1.0, 0.0, -1.0, 1.0, 0.0, 1.0, 1.0, 0.0,
        ];
        let mut s = scene(&quad, Some(vec![0, 1, 2]));
        let err = s.ctx.draw_indexed(DrawPrimitive::Triangles, 6).unwrap_err();
        assert!(matches!(err, RenderError::InvalidArgument(_)));
    }

    #[test]
    fn test_attribute_overrun_fails() {
        // Two vertices' worth of data, three requested.
        let mut s = scene(&FULLSCREEN[..6], None);
        let err = s.ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap_err();
        assert!(matches!(err, RenderError::InvalidArgument(_)));
    }

    #[test]
    fn test_incomplete_framebuffer_rejected() {
        let mut s = scene(&FULLSCREEN, None);
        let small = s
            .ctx
            .create_texture(Texture::blank(uvec2(2, 2), crate::texture::TexFormat::Rgba));
        let bad = s
            .ctx
            .create_framebuffer(
                uvec2(4, 4),
                crate::framebuffer::FramebufferSpec {
                    depth: None,
                    colors: vec![small],
                },
            )
            .unwrap();
        s.ctx.set_active_framebuffer(Some(bad.id())).unwrap();
        let err = s.ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap_err();
        assert!(matches!(err, RenderError::InvalidArgument(_)));
    }

    // ── Interpolation through the whole pipeline ─────────────────────────

    #[test]
    fn test_vertex_colors_interpolate_to_fragments() {
        // Positions + colors interleaved; red/green/blue corners.
        let data = [
            -1.0f32, -1.0, 0.0, 1.0, 0.0, 0.0, //
            3.0, -1.0, 0.0, 0.0, 1.0, 0.0, //
            -1.0, 3.0, 0.0, 0.0, 0.0, 1.0, //
        ];
        let mut ctx = Context::new(uvec2(4, 4));
        let vbo = ctx.create_vertex_buffer(VertexBuffer::new(data.to_vec()));
        let vao = ctx.create_vertex_array(VertexArray::new(
            vec![
                VertexAttribute {
                    buffer: vbo,
                    ty: AttributeType::Vec3,
                    stride: 24,
                    offset: 0,
                },
                VertexAttribute {
                    buffer: vbo,
                    ty: AttributeType::Vec3,
                    stride: 24,
                    offset: 12,
                },
            ],
            None,
        ));
        let vs = ctx.create_vertex_shader(VertexShader::new(|vs| {
            let pos: Vec3 = vs.attribute(0).unwrap();
            let color: Vec3 = vs.attribute(1).unwrap();
            *vs.output::<Vec3>(str_id("color")) = color;
            vs.position = vec4(pos.x, pos.y, pos.z, 1.0);
        }));
        let fs = ctx.create_fragment_shader(FragmentShader::new(|fs| {
            let color = *fs.input::<Vec3>(str_id("color"));
            fs.frag_color = vec4(color.x, color.y, color.z, 1.0);
        }));
        let prg = ctx.create_program(vs, fs).unwrap();
        ctx.set_active_program(prg.id()).unwrap();
        ctx.set_active_vertex_array(Some(vao.id())).unwrap();

        ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap();

        // Pixel (0,0) sits at the red corner; its red channel dominates.
        let near_red = pixel(&ctx, 0, 0);
        assert!(near_red[0] > near_red[1] && near_red[0] > near_red[2], "{near_red:?}");
        // The channels of every pixel sum to roughly 255: the three
        // barycentric weights sum to one.
        for y in 0..4 {
            for x in 0..4 {
                let px = pixel(&ctx, x, y);
                let sum = px[0] as i32 + px[1] as i32 + px[2] as i32;
                assert!((sum - 255).abs() <= 3, "pixel ({x},{y}) = {px:?}");
            }
        }
    }

    #[test]
    fn test_integer_out_var_not_interpolated() {
        let data = [
            -1.0f32, -1.0, 0.0, //
            3.0, -1.0, 0.0, //
            -1.0, 3.0, 0.0, //
        ];
        let mut ctx = Context::new(uvec2(4, 4));
        let vbo = ctx.create_vertex_buffer(VertexBuffer::new(data.to_vec()));
        let vao = ctx.create_vertex_array(VertexArray::new(
            vec![VertexAttribute {
                buffer: vbo,
                ty: AttributeType::Vec3,
                stride: 12,
                offset: 0,
            }],
            None,
        ));
        let vs = ctx.create_vertex_shader(VertexShader::new(|vs| {
            let pos: Vec3 = vs.attribute(0).unwrap();
            // Integer out-var differs per vertex; fragments must all see
            // the first vertex's value.
            *vs.output::<i32>(str_id("layer")) = vs.vertex_id as i32 * 100;
            vs.position = vec4(pos.x, pos.y, pos.z, 1.0);
        }));
        let fs = ctx.create_fragment_shader(FragmentShader::new(|fs| {
            let layer = *fs.input::<i32>(str_id("layer"));
            fs.frag_color = if layer == 0 { GREEN } else { RED };
        }));
        let prg = ctx.create_program(vs, fs).unwrap();
        ctx.set_active_program(prg.id()).unwrap();
        ctx.set_active_vertex_array(Some(vao.id())).unwrap();

        ctx.draw_arrays(DrawPrimitive::Triangles, 0, 3).unwrap();
        assert_eq!(count_pixels(&ctx, [0, 255, 0, 255]), 16);
    }

    #[test]
    fn test_draw_offset_selects_vertices() {
        // Six vertices: a degenerate triangle first, the full-screen one
        // second; offset skips the first.
        let mut data = vec![0.0f32; 9];
        data.extend_from_slice(&FULLSCREEN);
        let mut s = scene(&data, None);
        s.ctx.program_mut(s.prg).unwrap().set_uniform(str_id("tint"), GREEN);
        s.ctx.draw_arrays(DrawPrimitive::Triangles, 3, 3).unwrap();
        assert_eq!(count_pixels(&s.ctx, [0, 255, 0, 255]), 16);
    }
}
