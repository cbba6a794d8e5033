use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, HtmlImageElement,
    MouseEvent, Request, RequestInit, Window,
};

use jigsaw_core::{
    DEFAULT_PIECE_COUNT, DragOutcome, ImageSize, Point, PuzzleConfig, PuzzleInstance, StageLayout,
};

mod canvas;
mod state;
mod upload;
mod utils;

use crate::canvas::{set_fill_style, set_stroke_style, trace_piece_path};
use crate::state::{STATE, State};
use crate::utils::{asset_url, event_stage_coords, fetch_text_with_fallbacks, get_query_param, log};

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // console_error_panic_hook is optional; avoid extra dep here.
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let (canvas, ctx) = init_canvas(&document)?;

    let state = Rc::new(RefCell::new(State {
        window: window.clone(),
        document,
        canvas,
        ctx,
        layout: StageLayout::default(),
        config: None,
        image: None,
        puzzle: None,
        active: None,
        drag_off: (0.0, 0.0),
        stage_scale: 1.0,
        completion_sent: false,
    }));
    STATE.with(|st| st.replace(Some(state.clone())));

    attach_ui(state.clone())?;
    update_status_dom(&state.borrow());
    draw(&mut state.borrow_mut());

    // If URL param p names a stored record, fetch it; otherwise wait for an upload.
    if let Ok(search) = window.location().search()
        && let Some(p) = get_query_param(&search, "p")
    {
        let st = state.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = fetch_and_load_record(st, &p).await {
                log(&format!("Failed to load puzzle '{}': {:?}", p, err));
            }
        });
    }
    Ok(())
}

fn init_canvas(
    document: &Document,
) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), JsValue> {
    let cv = document
        .get_element_by_id("cv")
        .ok_or_else(|| JsValue::from_str("canvas #cv not found"))?
        .dyn_into::<HtmlCanvasElement>()?;
    let ctx = cv
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2D context not available"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    Ok((cv, ctx))
}

fn attach_ui(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    // File input
    upload::attach_file_input(state.clone())?;

    // Mouse events
    {
        let st = state.clone();
        let mousedown = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            let mut s = st.borrow_mut();
            let pt = event_stage_coords(&e, &s.canvas, s.stage_scale);
            let Some(puzzle) = s.puzzle.as_mut() else {
                return;
            };
            let Some(id) = puzzle.hit_test(pt) else {
                return;
            };
            if !puzzle.begin_drag(id) {
                return;
            }
            let origin = puzzle.piece(id).map(|p| p.current_position).unwrap_or_default();
            s.drag_off = (pt.x - origin.x, pt.y - origin.y);
            s.active = Some(id);
            draw(&mut s);
        }));
        state
            .borrow()
            .canvas
            .add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
        mousedown.forget();
    }
    {
        let st = state.clone();
        let mousemove = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            let mut s = st.borrow_mut();
            let pt = event_stage_coords(&e, &s.canvas, s.stage_scale);
            let drag_off = s.drag_off;
            let Some(puzzle) = s.puzzle.as_mut() else {
                return;
            };
            if let Some(id) = puzzle.dragging() {
                puzzle.drag_to(
                    id,
                    Point {
                        x: pt.x - drag_off.0,
                        y: pt.y - drag_off.1,
                    },
                );
                draw(&mut s);
            } else {
                let hit = puzzle.hit_test(pt);
                if hit != s.active {
                    s.active = hit;
                    draw(&mut s);
                }
            }
        }));
        state
            .borrow()
            .canvas
            .add_event_listener_with_callback("mousemove", mousemove.as_ref().unchecked_ref())?;
        mousemove.forget();
    }
    {
        let st = state.clone();
        let mouseup = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            let mut s = st.borrow_mut();
            let pt = event_stage_coords(&e, &s.canvas, s.stage_scale);
            let drag_off = s.drag_off;
            let Some(puzzle) = s.puzzle.as_mut() else {
                return;
            };
            let Some(id) = puzzle.dragging() else {
                return;
            };
            let release = Point {
                x: pt.x - drag_off.0,
                y: pt.y - drag_off.1,
            };
            let outcome = puzzle.end_drag(id, release);
            s.active = None;
            if let DragOutcome::Locked { completed } = outcome {
                update_status_dom(&s);
                if completed && !s.completion_sent {
                    s.completion_sent = true;
                    show_completion_dom(&s);
                    if let Some(cfg) = &s.config
                        && !cfg.id.is_empty()
                    {
                        let window = s.window.clone();
                        let record_id = cfg.id.clone();
                        wasm_bindgen_futures::spawn_local(send_completion(window, record_id));
                    }
                }
            }
            draw(&mut s);
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("mouseup", mouseup.as_ref().unchecked_ref())?;
        mouseup.forget();
    }

    // Window resize only touches the presentation scale
    {
        let st = state.clone();
        let onresize = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            draw(&mut st.borrow_mut());
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    Ok(())
}

/// Load an image and, once decoded, replace the active puzzle with a fresh
/// instance. On any failure the previous instance stays untouched.
pub(crate) fn load_image_and_start(state: Rc<RefCell<State>>, url: String) {
    let img = match HtmlImageElement::new() {
        Ok(i) => i,
        Err(e) => {
            log(&format!("Failed to create image element: {e:?}"));
            return;
        }
    };
    img.set_cross_origin(Some("anonymous"));

    let st = state.clone();
    let img_loaded = img.clone();
    let onload = Closure::<dyn FnMut()>::wrap(Box::new(move || {
        let mut s = st.borrow_mut();
        let image = ImageSize {
            width: img_loaded.natural_width() as f64,
            height: img_loaded.natural_height() as f64,
        };
        let requested = s
            .config
            .as_ref()
            .map(|c| c.puzzle_pieces)
            .unwrap_or(DEFAULT_PIECE_COUNT);
        let mut rng = rand::thread_rng();
        match PuzzleInstance::new(image, requested, s.layout, &mut rng) {
            Ok(puzzle) => {
                s.puzzle = Some(puzzle);
                s.image = Some(img_loaded.clone());
                s.active = None;
                s.completion_sent = false;
                update_note_dom(&s);
                update_status_dom(&s);
                set_message_dom(&s, "");
                draw(&mut s);
            }
            Err(e) => log(&format!("Failed to build puzzle: {e}")),
        }
    }));
    img.set_onload(Some(onload.as_ref().unchecked_ref()));
    onload.forget();

    let onerror = Closure::<dyn FnMut()>::wrap(Box::new(move || {
        log("Failed to load image; keeping the current puzzle");
    }));
    img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    img.set_src(&url);
}

async fn fetch_and_load_record(state: Rc<RefCell<State>>, slug: &str) -> Result<(), JsValue> {
    let window = state.borrow().window.clone();
    let rec_path = format!("api/puzzle/{slug}");
    let text = fetch_text_with_fallbacks(&window, &[&asset_url(&rec_path), &format!("/{rec_path}")])
        .await
        .ok_or_else(|| JsValue::from_str("record not found"))?;
    let config: PuzzleConfig =
        serde_json::from_str(&text).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let photo = config
        .photo_url
        .clone()
        .ok_or_else(|| JsValue::from_str("record has no photo"))?;
    let url = asset_url(&photo);
    state.borrow_mut().config = Some(config);
    load_image_and_start(state, url);
    Ok(())
}

/// Tell the backend the puzzle was solved. Errors are swallowed.
async fn send_completion(window: Window, record_id: String) {
    let url = asset_url(&format!("api/puzzle/complete/{record_id}"));
    let opts = RequestInit::new();
    opts.set_method("POST");
    let Ok(req) = Request::new_with_str_and_init(&url, &opts) else {
        return;
    };
    let _ = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&req)).await;
}

fn update_stage_scale(state: &mut State) {
    let avail = state
        .canvas
        .parent_element()
        .map(|el| el.client_width() as f64)
        .filter(|w| *w > 0.0)
        .or_else(|| state.window.inner_width().ok().and_then(|v| v.as_f64()))
        .unwrap_or(state.layout.stage_w);
    state.stage_scale = state.layout.stage_scale(avail);
    let w = (state.layout.stage_w * state.stage_scale).round() as u32;
    let h = (state.layout.stage_h * state.stage_scale).round() as u32;
    if state.canvas.width() != w {
        state.canvas.set_width(w);
    }
    if state.canvas.height() != h {
        state.canvas.set_height(h);
    }
}

fn draw(state: &mut State) {
    update_stage_scale(state);
    let scale = state.stage_scale;
    let ctx = &state.ctx;
    let _ = ctx.set_transform(scale, 0.0, 0.0, scale, 0.0, 0.0);
    ctx.clear_rect(0.0, 0.0, state.layout.stage_w, state.layout.stage_h);

    // board and tray panels
    let board = state.layout.board_rect();
    set_fill_style(ctx, "#fff8fb");
    ctx.fill_rect(board.x, board.y, board.w, board.h);
    ctx.set_line_width(2.0);
    set_stroke_style(ctx, "#d7a6b2");
    ctx.stroke_rect(board.x, board.y, board.w, board.h);
    let tray = state.layout.tray;
    ctx.stroke_rect(tray.x, tray.y, tray.w, tray.h);

    let (Some(puzzle), Some(img)) = (state.puzzle.as_ref(), state.image.as_ref()) else {
        return;
    };

    // interior slot lines
    let fit = puzzle.fit();
    let grid = puzzle.grid();
    ctx.set_line_width(1.0);
    set_stroke_style(ctx, "#e0e0e0");
    for c in 1..grid.cols {
        let x = fit.inner_x + c as f64 * fit.piece_w;
        ctx.begin_path();
        ctx.move_to(x, fit.inner_y);
        ctx.line_to(x, fit.inner_y + fit.fit_h);
        ctx.stroke();
    }
    for r in 1..grid.rows {
        let y = fit.inner_y + r as f64 * fit.piece_h;
        ctx.begin_path();
        ctx.move_to(fit.inner_x, y);
        ctx.line_to(fit.inner_x + fit.fit_w, y);
        ctx.stroke();
    }

    // locked pieces sit beneath the free ones
    for free_pass in [false, true] {
        for id in puzzle.stacking() {
            let piece = &puzzle.pieces()[id.0 as usize];
            if piece.locked() == free_pass {
                continue;
            }
            let active = free_pass && state.active == Some(*id);
            draw_piece(ctx, img, piece, active);
        }
    }
}

fn draw_piece(
    ctx: &CanvasRenderingContext2d,
    img: &HtmlImageElement,
    piece: &jigsaw_core::Piece,
    active: bool,
) {
    let pos = piece.current_position;
    ctx.save();
    trace_piece_path(ctx, &piece.boundary, pos.x, pos.y);
    ctx.clip();
    let _ = ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
        img,
        piece.crop.x,
        piece.crop.y,
        piece.crop.w,
        piece.crop.h,
        pos.x,
        pos.y,
        piece.w,
        piece.h,
    );
    ctx.restore();

    if active {
        trace_piece_path(ctx, &piece.boundary, pos.x, pos.y);
        ctx.set_line_width(2.0);
        set_stroke_style(ctx, "#b22222");
        ctx.stroke();
    }
}

fn update_status_dom(state: &State) {
    if let Some(el) = state.document.get_element_by_id("status")
        && let Ok(el) = el.dyn_into::<HtmlElement>()
    {
        let txt = match &state.puzzle {
            Some(p) => format!(
                "{} / {} pieces placed ({}%)",
                p.locked_count(),
                p.pieces().len(),
                (p.progress() * 100.0).round() as u32
            ),
            None => "Pick a photo to start".to_string(),
        };
        el.set_inner_text(&txt);
    }
}

fn update_note_dom(state: &State) {
    if let Some(el) = state.document.get_element_by_id("note")
        && let Ok(el) = el.dyn_into::<HtmlElement>()
    {
        let txt = state
            .config
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_default();
        el.set_inner_text(&txt);
    }
}

fn set_message_dom(state: &State, txt: &str) {
    if let Some(el) = state.document.get_element_by_id("message")
        && let Ok(el) = el.dyn_into::<HtmlElement>()
    {
        el.set_inner_text(txt);
    }
}

fn show_completion_dom(state: &State) {
    let msg = state
        .config
        .as_ref()
        .map(|c| c.secret_message.trim())
        .filter(|m| !m.is_empty())
        .unwrap_or("Puzzle complete!")
        .to_string();
    set_message_dom(state, &msg);
}
