use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

use jigsaw_core::{PathSegment, PiecePath};

// Non-deprecated helpers to set canvas styles via property assignment.
pub fn set_fill_style(ctx: &CanvasRenderingContext2d, color: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(color),
    );
}

pub fn set_stroke_style(ctx: &CanvasRenderingContext2d, color: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("strokeStyle"),
        &JsValue::from_str(color),
    );
}

/// Replay a piece boundary onto the context translated to `(dx, dy)`. The
/// caller decides whether to clip, fill or stroke the resulting path.
pub fn trace_piece_path(ctx: &CanvasRenderingContext2d, path: &PiecePath, dx: f64, dy: f64) {
    ctx.begin_path();
    ctx.move_to(dx + path.start.x, dy + path.start.y);
    for seg in &path.segments {
        match *seg {
            PathSegment::Line(p) => ctx.line_to(dx + p.x, dy + p.y),
            PathSegment::Cubic { c1, c2, to } => ctx.bezier_curve_to(
                dx + c1.x,
                dy + c1.y,
                dx + c2.x,
                dy + c2.y,
                dx + to.x,
                dy + to.y,
            ),
        }
    }
    ctx.close_path();
}
