// SPDX-FileCopyrightText: 2025 softras contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Primitive assembly and per-primitive pipeline stages.
//!
//! The [`Assembler`] turns the stream of shaded vertices into complete
//! primitives according to the draw mode (lists, strips, fans, loops).
//! Each completed [`Primitive`] then runs the per-primitive stages:
//! near-plane clip, perspective divide, viewport map, face cull,
//! rasterization, and per-fragment attribute interpolation. Triangle and
//! line state is kept inline and dispatched by match.

use glam::{vec2, vec4, UVec2, Vec2, Vec4};
use softras_common::{RenderError, Result};

use crate::context::CullFace;
use crate::raster::{bresenham, clip_line};
use crate::shader::{InOutVar, InOutVars};

/// Rendering modes accepted by the draw calls.
///
/// `Points` and `Polygon` are reserved and raise
/// [`RenderError::NotImplemented`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPrimitive {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Polygon,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// A vertex after the vertex stage: clip-space position plus a snapshot
/// of the shader's out-vars.
#[derive(Debug, Clone)]
pub(crate) struct ShadedVertex {
    pub pos: Vec4,
    pub vars: InOutVars,
}

/// `true` when the vertex lies in front of the near plane (clipped side).
fn outside_near(v: &ShadedVertex) -> bool {
    v.pos.z < -v.pos.w
}

/// Interpolate the float attributes of `a` toward `b` at parameter `t`.
/// Integer attributes keep `a`'s value.
fn lerp_vars(a: &InOutVars, b: &InOutVars, t: f32) -> InOutVars {
    let mut out = InOutVars::default();
    for (&name, var) in a.iter() {
        if var.integer {
            out.insert(name, *var);
        } else {
            let other = b.get(name).copied().unwrap_or(*var);
            let blended = var.value.to_vec4().lerp(other.value.to_vec4(), t);
            out.insert(
                name,
                InOutVar {
                    value: var.value.with_vec4(blended),
                    integer: false,
                },
            );
        }
    }
    out
}

// ── Triangle ────────────────────────────────────────────────────────────

/// Triangle in flight through the pipeline stages.
#[derive(Debug, Clone)]
pub(crate) struct TrianglePrim {
    pub verts: [ShadedVertex; 3],
    /// Reciprocal of twice the triangle area in the vertices' current
    /// space. The scale cancels in the perspective normalization, so it
    /// is computed once at construction.
    inv_area: f32,
}

impl TrianglePrim {
    pub(crate) fn new(verts: [ShadedVertex; 3]) -> Self {
        let a = verts[0].pos;
        let ab = vec2(verts[1].pos.x - a.x, verts[1].pos.y - a.y);
        let ac = vec2(verts[2].pos.x - a.x, verts[2].pos.y - a.y);
        let inv_area = 1.0 / (ac.x * ab.y - ac.y * ab.x).abs();
        Self { verts, inv_area }
    }

    fn is_ccw(&self) -> bool {
        let a = self.verts[0].pos;
        let ab = vec2(self.verts[1].pos.x - a.x, self.verts[1].pos.y - a.y);
        let ac = vec2(self.verts[2].pos.x - a.x, self.verts[2].pos.y - a.y);
        ac.x * ab.y - ac.y * ab.x <= 0.0
    }

    /// Cut the edge from `a` (kept side) to `b` (clipped side) against the
    /// near plane. Float attributes lerp with the cut parameter, integer
    /// attributes copy from `a`.
    fn cut_edge(a: &ShadedVertex, b: &ShadedVertex) -> ShadedVertex {
        let num = a.pos.z + a.pos.w;
        let t = num / (num - (b.pos.z + b.pos.w));
        ShadedVertex {
            pos: a.pos.lerp(b.pos, t),
            vars: lerp_vars(&a.vars, &b.vars, t),
        }
    }

    /// Near-plane clip. Yields zero, one, or two triangles whose vertices
    /// all satisfy `z >= -w`, with the original winding restored.
    fn clip(mut self) -> Vec<TrianglePrim> {
        let outside = [
            outside_near(&self.verts[0]),
            outside_near(&self.verts[1]),
            outside_near(&self.verts[2]),
        ];

        match outside.iter().filter(|&&o| o).count() {
            0 => vec![self],
            3 => vec![],
            1 => {
                // Rotate the clipped vertex into slot 0; rotation keeps
                // the winding.
                let k = outside.iter().position(|&o| o).unwrap_or(0);
                self.verts.rotate_left(k);
                let was_ccw = self.is_ccw();

                let i1 = Self::cut_edge(&self.verts[1], &self.verts[0]);
                let i2 = Self::cut_edge(&self.verts[2], &self.verts[0]);
                let mut p1 =
                    TrianglePrim::new([self.verts[1].clone(), i1, i2.clone()]);
                let mut p2 =
                    TrianglePrim::new([self.verts[1].clone(), i2, self.verts[2].clone()]);
                if was_ccw != p1.is_ccw() {
                    p1.verts.swap(1, 2);
                    p2.verts.swap(1, 2);
                }
                vec![p1, p2]
            }
            _ => {
                // Two clipped: rotate the surviving vertex into slot 2.
                let k = outside.iter().position(|&o| !o).unwrap_or(2);
                self.verts.rotate_left((k + 1) % 3);
                let was_ccw = self.is_ccw();

                let mut p = TrianglePrim::new([
                    Self::cut_edge(&self.verts[2], &self.verts[1]),
                    Self::cut_edge(&self.verts[2], &self.verts[0]),
                    self.verts[2].clone(),
                ]);
                if was_ccw != p.is_ccw() {
                    p.verts.swap(1, 2);
                }
                vec![p]
            }
        }
    }

    fn perspective_divide(&mut self) {
        for v in &mut self.verts {
            let w = v.pos.w;
            v.pos.x /= w;
            v.pos.y /= w;
            v.pos.z /= w;
        }
    }

    fn viewport(&mut self, size: UVec2) {
        for v in &mut self.verts {
            v.pos.x = (v.pos.x + 1.0) * size.x as f32 * 0.5;
            v.pos.y = (v.pos.y + 1.0) * size.y as f32 * 0.5;
        }
    }

    fn cull(&self, mode: CullFace) -> bool {
        match mode {
            CullFace::None => false,
            CullFace::Ccw => self.is_ccw(),
            CullFace::Cw => !self.is_ccw(),
        }
    }

    /// Pineda edge-function scan over the clamped bounding box.
    fn solid(&self, fb_size: UVec2, frag: &mut impl FnMut(Vec4)) {
        let mut v = [
            vec2(self.verts[0].pos.x, self.verts[0].pos.y),
            vec2(self.verts[1].pos.x, self.verts[1].pos.y),
            vec2(self.verts[2].pos.x, self.verts[2].pos.y),
        ];

        // The scan expects CCW order; flip if needed.
        let ab = v[1] - v[0];
        let ac = v[2] - v[0];
        if ac.x * ab.y - ac.y * ab.x >= 0.0 {
            v.swap(1, 2);
        }

        let bmin = v[0].min(v[1]).min(v[2]).floor().max(Vec2::ZERO);
        let bmax = v[0].max(v[1]).max(v[2]).ceil().min(fb_size.as_vec2());

        let d1 = v[1] - v[0];
        let d2 = v[2] - v[1];
        let d3 = v[0] - v[2];
        // Edge values at the first sample (pixel center of bmin).
        let mut e1 = (bmin.y - v[0].y + 0.5) * d1.x - (bmin.x - v[0].x + 0.5) * d1.y;
        let mut e2 = (bmin.y - v[1].y + 0.5) * d2.x - (bmin.x - v[1].x + 0.5) * d2.y;
        let mut e3 = (bmin.y - v[2].y + 0.5) * d3.x - (bmin.x - v[2].x + 0.5) * d3.y;

        for y in bmin.y as i32..bmax.y as i32 {
            let (mut t1, mut t2, mut t3) = (e1, e2, e3);
            for x in bmin.x as i32..bmax.x as i32 {
                if t1 >= 0.0 && t2 >= 0.0 && t3 >= 0.0 {
                    // Depth is filled in by interpolation.
                    frag(vec4(x as f32 + 0.5, y as f32 + 0.5, 0.0, 1.0));
                }
                t1 -= d1.y;
                t2 -= d2.y;
                t3 -= d3.y;
            }
            e1 += d1.x;
            e2 += d2.x;
            e3 += d3.x;
        }
    }

    /// Draw the three edges, each clipped to the framebuffer rectangle.
    fn wireframe(&self, fb_size: UVec2, frag: &mut impl FnMut(Vec4)) {
        let min = Vec2::ZERO;
        let max = fb_size.as_vec2() - Vec2::ONE;
        let corners = [
            vec2(self.verts[0].pos.x, self.verts[0].pos.y),
            vec2(self.verts[1].pos.x, self.verts[1].pos.y),
            vec2(self.verts[2].pos.x, self.verts[2].pos.y),
        ];
        for i in 0..3 {
            let mut a = corners[i];
            let mut b = corners[(i + 1) % 3];
            if clip_line(&mut a, &mut b, min, max) {
                bresenham(a.as_ivec2(), b.as_ivec2(), frag);
            }
        }
    }

    /// Perspectively-correct attribute and depth interpolation at `pos`.
    fn interpolate(&self, pos: &mut Vec4, out: &mut InOutVars) {
        let [a, b, c] = &self.verts;
        let p = vec2(pos.x, pos.y);
        let fa = vec2(a.pos.x, a.pos.y) - p;
        let fb = vec2(b.pos.x, b.pos.y) - p;
        let fc = vec2(c.pos.x, c.pos.y) - p;

        let vol = |u: Vec2, v: Vec2| (u.x * v.y - u.y * v.x).abs();
        let la = vol(fb, fc) * self.inv_area;
        let lb = vol(fa, fc) * self.inv_area;
        let lc = vol(fb, fa) * self.inv_area;

        let s = la / a.pos.w + lb / b.pos.w + lc / c.pos.w;
        let pcl = vec4(
            la / (a.pos.w * s),
            lb / (b.pos.w * s),
            lc / (c.pos.w * s),
            0.0,
        );

        for (&name, va) in a.vars.iter() {
            if va.integer {
                out.insert(name, *va);
            } else {
                let vb = b.vars.get(name).copied().unwrap_or(*va);
                let vc = c.vars.get(name).copied().unwrap_or(*va);
                let blended = va.value.to_vec4() * pcl.x
                    + vb.value.to_vec4() * pcl.y
                    + vc.value.to_vec4() * pcl.z;
                out.insert(
                    name,
                    InOutVar {
                        value: va.value.with_vec4(blended),
                        integer: false,
                    },
                );
            }
        }

        pos.z = pcl.x * a.pos.z + pcl.y * b.pos.z + pcl.z * c.pos.z;
    }
}

// ── Line ────────────────────────────────────────────────────────────────

/// Line segment in flight through the pipeline stages.
#[derive(Debug, Clone)]
pub(crate) struct LinePrim {
    pub verts: [ShadedVertex; 2],
}

impl LinePrim {
    /// Near-plane clip: discard when both endpoints are clipped, slide a
    /// clipped endpoint onto the plane otherwise.
    fn clip(mut self) -> Option<LinePrim> {
        let a_out = outside_near(&self.verts[0]);
        let b_out = outside_near(&self.verts[1]);

        if a_out && b_out {
            return None;
        }
        if !a_out && !b_out {
            return Some(self);
        }

        let (head, tail) = self.verts.split_at_mut(1);
        let (vo, vi) = if a_out {
            (&mut head[0], &tail[0])
        } else {
            (&mut tail[0], &head[0])
        };

        let ap = vo.pos;
        let bp = vi.pos;
        let u = bp / bp.w - ap / ap.w;
        let t = (-ap.w - ap.z) / u.z;
        vo.pos.x += u.x * t;
        vo.pos.y += u.y * t;
        vo.pos.z = -ap.w;
        vo.vars = lerp_vars(&vo.vars, &vi.vars, t);

        Some(self)
    }

    fn perspective_divide(&mut self) {
        for v in &mut self.verts {
            let w = v.pos.w;
            v.pos.x /= w;
            v.pos.y /= w;
            v.pos.z /= w;
        }
    }

    fn viewport(&mut self, size: UVec2) {
        for v in &mut self.verts {
            v.pos.x = (v.pos.x + 1.0) * size.x as f32 * 0.5;
            v.pos.y = (v.pos.y + 1.0) * size.y as f32 * 0.5;
        }
    }

    /// Clip the screen-space segment to the framebuffer rectangle,
    /// mutating the stored endpoints so interpolation sees the clipped
    /// segment. Returns `false` when nothing remains.
    fn clip_viewport(&mut self, fb_size: UVec2) -> bool {
        let mut a = vec2(self.verts[0].pos.x, self.verts[0].pos.y);
        let mut b = vec2(self.verts[1].pos.x, self.verts[1].pos.y);
        if !clip_line(&mut a, &mut b, Vec2::ZERO, fb_size.as_vec2() - Vec2::ONE) {
            return false;
        }
        self.verts[0].pos.x = a.x;
        self.verts[0].pos.y = a.y;
        self.verts[1].pos.x = b.x;
        self.verts[1].pos.y = b.y;
        true
    }

    fn rasterize(&self, frag: &mut impl FnMut(Vec4)) {
        let a = vec2(self.verts[0].pos.x, self.verts[0].pos.y);
        let b = vec2(self.verts[1].pos.x, self.verts[1].pos.y);
        bresenham(a.round().as_ivec2(), b.round().as_ivec2(), frag);
    }

    /// Project the fragment onto the segment for a 1D barycentric, then
    /// apply the perspective-correct pair of weights.
    fn interpolate(&self, pos: &mut Vec4, out: &mut InOutVars) {
        let [a, b] = &self.verts;
        let ab = b.pos - a.pos;
        let lb = (-ab.y * (pos.y - a.pos.y) - ab.x * (pos.x - a.pos.x))
            / (-(ab.x * ab.x + ab.y * ab.y));
        let la = 1.0 - lb;

        let k = la / a.pos.w + lb / b.pos.w;
        let pcl = vec2(la / (a.pos.w * k), lb / (b.pos.w * k));

        for (&name, va) in a.vars.iter() {
            if va.integer {
                out.insert(name, *va);
            } else {
                let vb = b.vars.get(name).copied().unwrap_or(*va);
                let blended = va.value.to_vec4() * pcl.x + vb.value.to_vec4() * pcl.y;
                out.insert(
                    name,
                    InOutVar {
                        value: va.value.with_vec4(blended),
                        integer: false,
                    },
                );
            }
        }

        pos.z = pcl.x * a.pos.z + pcl.y * b.pos.z;
    }
}

// ── Dispatch ────────────────────────────────────────────────────────────

/// A complete primitive moving through the per-primitive stages.
#[derive(Debug, Clone)]
pub(crate) enum Primitive {
    Triangle(TrianglePrim),
    Line(LinePrim),
}

impl Primitive {
    /// Near-plane clip; the result replaces the primitive.
    pub(crate) fn clip(self) -> Vec<Primitive> {
        match self {
            Primitive::Triangle(t) => t.clip().into_iter().map(Primitive::Triangle).collect(),
            Primitive::Line(l) => l.clip().into_iter().map(Primitive::Line).collect(),
        }
    }

    /// Divide x, y, z by w; w is kept for perspective correction.
    pub(crate) fn perspective_divide(&mut self) {
        match self {
            Primitive::Triangle(t) => t.perspective_divide(),
            Primitive::Line(l) => l.perspective_divide(),
        }
    }

    /// Map NDC x/y to pixel coordinates.
    pub(crate) fn viewport(&mut self, size: UVec2) {
        match self {
            Primitive::Triangle(t) => t.viewport(size),
            Primitive::Line(l) => l.viewport(size),
        }
    }

    /// `true` drops the primitive. Lines are never culled.
    pub(crate) fn cull(&self, mode: CullFace) -> bool {
        match self {
            Primitive::Triangle(t) => t.cull(mode),
            Primitive::Line(_) => false,
        }
    }

    /// Screen-rect pre-clip for lines; triangles pass through.
    pub(crate) fn clip_viewport(&mut self, fb_size: UVec2) -> bool {
        match self {
            Primitive::Triangle(_) => true,
            Primitive::Line(l) => l.clip_viewport(fb_size),
        }
    }

    /// Emit fragments in bounding-box scan order (triangles) or along the
    /// stepped line. The wireframe flag draws triangle edges instead of
    /// the interior; for lines it is the ordinary path.
    pub(crate) fn rasterize(&self, fb_size: UVec2, wireframe: bool, frag: &mut impl FnMut(Vec4)) {
        match self {
            Primitive::Triangle(t) => {
                if wireframe {
                    t.wireframe(fb_size, frag);
                } else {
                    t.solid(fb_size, frag);
                }
            }
            Primitive::Line(l) => l.rasterize(frag),
        }
    }

    pub(crate) fn interpolate(&self, pos: &mut Vec4, out: &mut InOutVars) {
        match self {
            Primitive::Triangle(t) => t.interpolate(pos, out),
            Primitive::Line(l) => l.interpolate(pos, out),
        }
    }

    /// Facing flag handed to the fragment shader: clockwise-in-buffer
    /// triangles are front faces, lines always are.
    pub(crate) fn front_facing(&self) -> bool {
        match self {
            Primitive::Triangle(t) => !t.is_ccw(),
            Primitive::Line(_) => true,
        }
    }
}

// ── Assembly ────────────────────────────────────────────────────────────

/// Accumulates shaded vertices into primitives according to the draw
/// mode. One assembler lives for the duration of a draw call.
pub(crate) enum Assembler {
    Triangles {
        verts: Vec<ShadedVertex>,
    },
    TriangleStrip {
        window: Vec<ShadedVertex>,
        even: bool,
    },
    TriangleFan {
        pivot: Option<ShadedVertex>,
        prev: Option<ShadedVertex>,
    },
    Lines {
        pending: Option<ShadedVertex>,
    },
    LineStrip {
        prev: Option<ShadedVertex>,
    },
    LineLoop {
        first: Option<ShadedVertex>,
        prev: Option<ShadedVertex>,
        count: usize,
    },
}

impl Assembler {
    pub(crate) fn new(mode: DrawPrimitive) -> Result<Self> {
        match mode {
            DrawPrimitive::Triangles => Ok(Assembler::Triangles { verts: Vec::new() }),
            DrawPrimitive::TriangleStrip => Ok(Assembler::TriangleStrip {
                window: Vec::new(),
                even: true,
            }),
            DrawPrimitive::TriangleFan => Ok(Assembler::TriangleFan {
                pivot: None,
                prev: None,
            }),
            DrawPrimitive::Lines => Ok(Assembler::Lines { pending: None }),
            DrawPrimitive::LineStrip => Ok(Assembler::LineStrip { prev: None }),
            DrawPrimitive::LineLoop => Ok(Assembler::LineLoop {
                first: None,
                prev: None,
                count: 0,
            }),
            DrawPrimitive::Points => Err(RenderError::NotImplemented("point primitives")),
            DrawPrimitive::Polygon => Err(RenderError::NotImplemented("polygon primitives")),
        }
    }

    /// Feed one shaded vertex; returns a primitive when one completes.
    pub(crate) fn push(&mut self, pos: Vec4, vars: InOutVars) -> Option<Primitive> {
        let v = ShadedVertex { pos, vars };
        match self {
            Assembler::Triangles { verts } => {
                verts.push(v);
                if verts.len() < 3 {
                    return None;
                }
                let mut it = std::mem::take(verts).into_iter();
                let tri = [it.next()?, it.next()?, it.next()?];
                Some(Primitive::Triangle(TrianglePrim::new(tri)))
            }
            Assembler::TriangleStrip { window, even } => {
                window.push(v);
                if window.len() < 3 {
                    return None;
                }
                let p2 = window[0].clone();
                let p1 = window[1].clone();
                let v = window[2].clone();
                window.remove(0);
                // Every other triangle swaps two vertices so the strip
                // keeps a consistent winding.
                let tri = if *even { [p2, p1, v] } else { [p2, v, p1] };
                *even = !*even;
                Some(Primitive::Triangle(TrianglePrim::new(tri)))
            }
            Assembler::TriangleFan { pivot, prev } => {
                if pivot.is_none() {
                    *pivot = Some(v);
                    return None;
                }
                match prev.replace(v.clone()) {
                    None => None,
                    Some(p) => {
                        let pivot = pivot.clone()?;
                        Some(Primitive::Triangle(TrianglePrim::new([pivot, p, v])))
                    }
                }
            }
            Assembler::Lines { pending } => match pending.take() {
                None => {
                    *pending = Some(v);
                    None
                }
                Some(a) => Some(Primitive::Line(LinePrim { verts: [a, v] })),
            },
            Assembler::LineStrip { prev } => match prev.replace(v.clone()) {
                None => None,
                Some(a) => Some(Primitive::Line(LinePrim { verts: [a, v] })),
            },
            Assembler::LineLoop { first, prev, count } => {
                *count += 1;
                if first.is_none() {
                    *first = Some(v.clone());
                }
                match prev.replace(v.clone()) {
                    None => None,
                    Some(a) => Some(Primitive::Line(LinePrim { verts: [a, v] })),
                }
            }
        }
    }

    /// Flush after the vertex stream ends: a line loop emits its closing
    /// segment.
    pub(crate) fn finish(&mut self) -> Option<Primitive> {
        match self {
            Assembler::LineLoop { first, prev, count } if *count >= 2 => {
                let a = prev.take()?;
                let b = first.take()?;
                Some(Primitive::Line(LinePrim { verts: [a, b] }))
            }
            _ => None,
        }
    }
}
