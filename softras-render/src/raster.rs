// SPDX-FileCopyrightText: 2025 softras contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Scanline-level drawing algorithms: Bresenham line stepping and
//! Liang–Barsky segment clipping. Both are shared by the line primitive
//! and the triangle wireframe path.

use glam::{vec4, IVec2, Vec2, Vec4};

/// Walk the pixels of the segment `a..=b` with Bresenham stepping and
/// feed each pixel center to `frag`.
///
/// Negative directions are normalized by mirroring the axis and
/// un-mirroring on emission, so the core loop always steps +x/+y.
pub(crate) fn bresenham(mut a: IVec2, mut b: IVec2, frag: &mut impl FnMut(Vec4)) {
    let mut u = b - a;
    let mut flip_x = false;
    let mut flip_y = false;

    if u.x < 0 {
        u.x = -u.x;
        a.x = -a.x;
        b.x = -b.x;
        flip_x = true;
    }
    if u.y < 0 {
        u.y = -u.y;
        a.y = -a.y;
        b.y = -b.y;
        flip_y = true;
    }

    let mut x = a.x;
    let mut y = a.y;
    let mut e = (u.x - u.y) / 2;

    while x <= b.x && y <= b.y {
        let px = if flip_x { -x } else { x };
        let py = if flip_y { -y } else { y };
        frag(vec4(px as f32 + 0.5, py as f32 + 0.5, 0.0, 1.0));
        if e < 0 {
            y += 1;
            e += u.x;
        } else {
            x += 1;
            e -= u.y;
        }
    }
}

/// Liang–Barsky clip of the segment `a..b` against the rectangle
/// `[min, max]` (inclusive). Writes the clipped endpoints in place and
/// returns `false` when the segment lies entirely outside.
pub(crate) fn clip_line(a: &mut Vec2, b: &mut Vec2, min: Vec2, max: Vec2) -> bool {
    let p1 = -(b.x - a.x);
    let p2 = -p1;
    let p3 = -(b.y - a.y);
    let p4 = -p3;

    let q1 = a.x - min.x;
    let q2 = max.x - a.x;
    let q3 = a.y - min.y;
    let q4 = max.y - a.y;

    // Parallel to a boundary and outside it.
    if (p1 == 0.0 && q1 < 0.0)
        || (p2 == 0.0 && q2 < 0.0)
        || (p3 == 0.0 && q3 < 0.0)
        || (p4 == 0.0 && q4 < 0.0)
    {
        return false;
    }

    // Entering (negative p) and leaving (positive p) parameter values.
    let mut neg = [0.0f32; 5];
    let mut pos = [1.0f32; 5];
    let mut neg_len = 1;
    let mut pos_len = 1;

    if p1 != 0.0 {
        let r1 = q1 / p1;
        let r2 = q2 / p2;
        if p1 < 0.0 {
            neg[neg_len] = r1;
            pos[pos_len] = r2;
        } else {
            neg[neg_len] = r2;
            pos[pos_len] = r1;
        }
        neg_len += 1;
        pos_len += 1;
    }
    if p3 != 0.0 {
        let r3 = q3 / p3;
        let r4 = q4 / p4;
        if p3 < 0.0 {
            neg[neg_len] = r3;
            pos[pos_len] = r4;
        } else {
            neg[neg_len] = r4;
            pos[pos_len] = r3;
        }
        neg_len += 1;
        pos_len += 1;
    }

    let t0 = neg[..neg_len].iter().fold(0.0f32, |m, &v| m.max(v));
    let t1 = pos[..pos_len].iter().fold(1.0f32, |m, &v| m.min(v));

    if t0 > t1 {
        return false;
    }

    b.x = a.x + p2 * t1;
    b.y = a.y + p4 * t1;
    a.x += p2 * t0;
    a.y += p4 * t0;
    true
}
