use std::cell::RefCell;
use std::rc::Rc;

use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement, Window};

use jigsaw_core::{PieceId, PuzzleConfig, PuzzleInstance, StageLayout};

/// Global application state stored behind an `Rc<RefCell<_>>` so it can be
/// shared across the WASM callbacks.
pub struct State {
    pub window: Window,
    pub document: Document,
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub layout: StageLayout,
    /// Backend record driving the current puzzle, if one was resolved.
    pub config: Option<PuzzleConfig>,
    /// Decoded source image; present only while a puzzle is active.
    pub image: Option<HtmlImageElement>,
    pub puzzle: Option<PuzzleInstance>,
    /// Piece under the pointer, drawn with the highlight outline.
    pub active: Option<PieceId>,
    /// Screen-space offset between the grab point and the piece origin.
    pub drag_off: (f64, f64),
    /// Presentation-only scale; stored piece coordinates never change.
    pub stage_scale: f64,
    /// Completion notification sent for the current instance.
    pub completion_sent: bool,
}

/// Thread local storage for the single runtime state instance.
thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}
