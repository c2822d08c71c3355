//! Painting overlay shapes on a 2D canvas.
//!
//! Shapes are first turned into plain path operations, then replayed on the
//! context. Every closed piece is counter-clockwise so one nonzero fill
//! covers the union without holes.

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::graph::Point;
use crate::overlay::{Capsule, OverlayDraw, OverlayShape, PaddedHull, Wedge};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    MoveTo(Point),
    LineTo(Point),
    /// Arc along a wedge's rim. Draws a line from the current point to the
    /// arc start first.
    Arc(Wedge),
    /// Full sector: center, rim, back to center.
    Sector(Wedge),
    Close,
}

fn polygon(ops: &mut Vec<PathOp>, points: &[Point]) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    ops.push(PathOp::MoveTo(*first));
    ops.extend(rest.iter().map(|p| PathOp::LineTo(*p)));
    ops.push(PathOp::Close);
}

fn capsule_outline(ops: &mut Vec<PathOp>, capsule: &Capsule) {
    let [a, b, _, d] = capsule.body;
    ops.push(PathOp::MoveTo(a));
    ops.push(PathOp::LineTo(b));
    ops.push(PathOp::Arc(capsule.caps[0]));
    ops.push(PathOp::LineTo(d));
    ops.push(PathOp::Arc(capsule.caps[1]));
    ops.push(PathOp::Close);
}

/// Filled area: strips, corner sectors and interior for a hull; the outline
/// for a capsule.
pub fn fill_ops(shape: &OverlayShape) -> Vec<PathOp> {
    let mut ops = Vec::new();
    match shape {
        OverlayShape::Capsule(capsule) => capsule_outline(&mut ops, capsule),
        OverlayShape::Hull(hull) => {
            for strip in &hull.strips {
                polygon(&mut ops, strip);
            }
            ops.extend(hull.wedges.iter().map(|w| PathOp::Sector(*w)));
            polygon(&mut ops, &hull.hull);
        }
    }
    ops
}

fn hull_outline(ops: &mut Vec<PathOp>, hull: &PaddedHull) {
    for (wedge, strip) in hull.wedges.iter().zip(&hull.strips) {
        ops.push(PathOp::Arc(*wedge));
        ops.push(PathOp::LineTo(strip[1]));
    }
    ops.push(PathOp::Close);
}

/// Outer border of the padded shape.
pub fn outline_ops(shape: &OverlayShape) -> Vec<PathOp> {
    let mut ops = Vec::new();
    match shape {
        OverlayShape::Capsule(capsule) => capsule_outline(&mut ops, capsule),
        OverlayShape::Hull(hull) => hull_outline(&mut ops, hull),
    }
    ops
}

fn replay(ctx: &CanvasRenderingContext2d, ops: &[PathOp]) -> Result<(), JsValue> {
    ctx.begin_path();
    for op in ops {
        match *op {
            PathOp::MoveTo(p) => ctx.move_to(p.x, p.y),
            PathOp::LineTo(p) => ctx.line_to(p.x, p.y),
            PathOp::Arc(w) => ctx.arc(w.center.x, w.center.y, w.radius, w.start, w.end)?,
            PathOp::Sector(w) => {
                ctx.move_to(w.center.x, w.center.y);
                ctx.arc(w.center.x, w.center.y, w.radius, w.start, w.end)?;
                ctx.close_path();
            }
            PathOp::Close => ctx.close_path(),
        }
    }
    Ok(())
}

fn paint_one(ctx: &CanvasRenderingContext2d, draw: &OverlayDraw) -> Result<(), JsValue> {
    ctx.set_shadow_color(&draw.style.glow);
    ctx.set_shadow_blur(draw.blur);
    ctx.set_fill_style_str(&draw.style.fill);
    replay(ctx, &fill_ops(&draw.shape))?;
    ctx.fill();

    ctx.set_shadow_blur(0.0);
    ctx.set_stroke_style_str(&draw.style.stroke);
    ctx.set_line_width(draw.width);
    replay(ctx, &outline_ops(&draw.shape))?;
    ctx.stroke();
    Ok(())
}

/// Paint overlays in the given order (ancestors first).
pub fn paint_overlays(ctx: &CanvasRenderingContext2d, draws: &[OverlayDraw]) -> Result<(), JsValue> {
    for draw in draws {
        ctx.save();
        let painted = paint_one(ctx, draw);
        ctx.restore();
        painted?;
    }
    Ok(())
}
