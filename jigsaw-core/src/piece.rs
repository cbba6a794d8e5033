use serde::{Deserialize, Serialize};

use crate::edges::PieceEdges;
use crate::geometry::{PiecePath, Point, Rect, poly_contains_point};

/// Stable piece identifier, unique within one puzzle instance and equal to
/// the piece's row-major index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub u32);

/// Drag interaction state. Locking is one-way: a locked piece never
/// becomes draggable again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockState {
    #[default]
    Free,
    Locked,
}

/// One interlocking piece of an active puzzle. Created once during
/// initialization; only `current_position` and `lock_state` mutate
/// afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub row: u32,
    pub col: u32,
    /// Render-space size of the rectangular cell (tabs overhang it).
    pub w: f64,
    pub h: f64,
    /// Source-image pixel region supplying this piece's texture.
    pub crop: Rect,
    /// Edge classification quadruple for this cell.
    pub edges: PieceEdges,
    /// Closed interlocking outline in piece-local coordinates.
    pub boundary: PiecePath,
    /// Where the piece belongs when solved.
    pub correct_position: Point,
    /// Current top-left position, mutated by dragging.
    pub current_position: Point,
    pub lock_state: LockState,
    // cached flattened outline for hit-testing (not serialized)
    #[serde(skip)]
    outline: Vec<Point>,
}

impl Piece {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: u32,
        row: u32,
        col: u32,
        w: f64,
        h: f64,
        crop: Rect,
        edges: PieceEdges,
        boundary: PiecePath,
        correct_position: Point,
    ) -> Self {
        let outline = boundary.flatten();
        Piece {
            id: PieceId(id),
            row,
            col,
            w,
            h,
            crop,
            edges,
            boundary,
            correct_position,
            current_position: Point::default(),
            lock_state: LockState::Free,
            outline,
        }
    }

    pub fn locked(&self) -> bool {
        self.lock_state == LockState::Locked
    }

    /// Hit test against the interlocking outline at the current position,
    /// tab overhangs included.
    pub fn contains(&self, p: Point) -> bool {
        let local = Point {
            x: p.x - self.current_position.x,
            y: p.y - self.current_position.y,
        };
        if self.outline.is_empty() {
            return self.boundary.contains(local);
        }
        poly_contains_point(&self.outline, local)
    }
}
