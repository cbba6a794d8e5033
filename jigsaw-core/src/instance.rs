use rand::Rng;

use crate::config::StageLayout;
use crate::edges::{EdgeMap, generate_edges};
use crate::error::Error;
use crate::geometry::{BoardFit, Point, build_pieces};
use crate::grid::{Grid, compute_grid};
use crate::piece::{LockState, Piece, PieceId};
use crate::scatter::scatter;

/// Pixel dimensions of the decoded source image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

/// Result of releasing a dragged piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragOutcome {
    /// Piece stayed free at the release position.
    Released,
    /// Piece snapped into its slot. `completed` is true exactly once, on
    /// the lock that finishes the puzzle.
    Locked { completed: bool },
    /// Drag event for a locked or unknown piece; ignored, not an error.
    Rejected,
}

/// One-shot completion signal over the aggregate lock state.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompletionLatch {
    fired: bool,
}

impl CompletionLatch {
    /// Re-evaluate after a lock transition; true only on the transition
    /// into the all-locked state. Never fires for an empty piece set and
    /// never fires twice.
    pub fn observe(&mut self, pieces: &[Piece]) -> bool {
        if self.fired {
            return false;
        }
        let all_locked = !pieces.is_empty() && pieces.iter().all(Piece::locked);
        if all_locked {
            self.fired = true;
        }
        all_locked
    }

    pub fn fired(&self) -> bool {
        self.fired
    }
}

/// One active puzzle: the full piece set plus drag bookkeeping. Built as a
/// whole and replaced as a whole; a configuration change never merges old
/// piece state into a new grid.
#[derive(Clone, Debug)]
pub struct PuzzleInstance {
    grid: Grid,
    edges: EdgeMap,
    pieces: Vec<Piece>,
    stacking: Vec<PieceId>,
    fit: BoardFit,
    layout: StageLayout,
    image: ImageSize,
    dragging: Option<PieceId>,
    completion: CompletionLatch,
}

impl PuzzleInstance {
    /// Run the full pipeline in order: grid partition, edge topology,
    /// piece geometry, scatter. Either every stage succeeds or nothing is
    /// produced.
    pub fn new(
        image: ImageSize,
        requested_pieces: u32,
        layout: StageLayout,
        rng: &mut impl Rng,
    ) -> Result<Self, Error> {
        if !image.is_valid() {
            return Err(Error::EmptyImage);
        }
        let grid = compute_grid(requested_pieces);
        let edges = generate_edges(grid.rows, grid.cols, rng);
        let (fit, mut pieces) = build_pieces(image.width, image.height, grid, &edges, &layout);
        let stacking = scatter(&mut pieces, layout.tray, layout.tray_margin, rng);
        debug_assert!(pieces.iter().enumerate().all(|(i, p)| p.id.0 as usize == i));
        Ok(PuzzleInstance {
            grid,
            edges,
            pieces,
            stacking,
            fit,
            layout,
            image,
            dragging: None,
            completion: CompletionLatch::default(),
        })
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn edges(&self) -> &EdgeMap {
        &self.edges
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id.0 as usize)
    }

    /// Draw order, bottom to top.
    pub fn stacking(&self) -> &[PieceId] {
        &self.stacking
    }

    pub fn fit(&self) -> &BoardFit {
        &self.fit
    }

    pub fn layout(&self) -> &StageLayout {
        &self.layout
    }

    pub fn image(&self) -> ImageSize {
        self.image
    }

    pub fn dragging(&self) -> Option<PieceId> {
        self.dragging
    }

    /// Topmost free piece whose outline contains the point. Locked pieces
    /// are not interactive and never hit.
    pub fn hit_test(&self, p: Point) -> Option<PieceId> {
        self.stacking
            .iter()
            .rev()
            .copied()
            .find(|id| {
                let piece = &self.pieces[id.0 as usize];
                !piece.locked() && piece.contains(p)
            })
    }

    /// Start dragging a free piece and raise it to the top of the stacking
    /// order. Returns false for locked or unknown pieces.
    pub fn begin_drag(&mut self, id: PieceId) -> bool {
        let Some(piece) = self.piece(id) else {
            return false;
        };
        if piece.locked() {
            return false;
        }
        self.dragging = Some(id);
        if let Some(pos) = self.stacking.iter().position(|s| *s == id) {
            let raised = self.stacking.remove(pos);
            self.stacking.push(raised);
        }
        true
    }

    /// Free movement while dragging. Locked pieces ignore the command.
    pub fn drag_to(&mut self, id: PieceId, position: Point) {
        if let Some(piece) = self.pieces.get_mut(id.0 as usize)
            && !piece.locked()
        {
            piece.current_position = position;
        }
    }

    /// Release at `position`: within the snap threshold of the correct
    /// slot the piece locks in exactly; otherwise it stays free where it
    /// was dropped. Locking is terminal.
    pub fn end_drag(&mut self, id: PieceId, position: Point) -> DragOutcome {
        if self.dragging == Some(id) {
            self.dragging = None;
        }
        let Some(piece) = self.pieces.get_mut(id.0 as usize) else {
            return DragOutcome::Rejected;
        };
        if piece.locked() {
            return DragOutcome::Rejected;
        }
        let correct = piece.correct_position;
        let dist = (position.x - correct.x).hypot(position.y - correct.y);
        if dist < self.layout.snap_threshold {
            piece.current_position = correct;
            piece.lock_state = LockState::Locked;
            let completed = self.completion.observe(&self.pieces);
            DragOutcome::Locked { completed }
        } else {
            piece.current_position = position;
            DragOutcome::Released
        }
    }

    pub fn locked_count(&self) -> usize {
        self.pieces.iter().filter(|p| p.locked()).count()
    }

    /// Fraction of pieces locked in, 0.0 for an empty set.
    pub fn progress(&self) -> f64 {
        if self.pieces.is_empty() {
            return 0.0;
        }
        self.locked_count() as f64 / self.pieces.len() as f64
    }

    pub fn is_complete(&self) -> bool {
        self.completion.fired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const SNAP: f64 = crate::config::SNAP_THRESHOLD;

    fn square_puzzle(pieces: u32, seed: u64) -> PuzzleInstance {
        let mut rng = StdRng::seed_from_u64(seed);
        PuzzleInstance::new(
            ImageSize {
                width: 800.0,
                height: 800.0,
            },
            pieces,
            StageLayout::default(),
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_images() {
        let mut rng = StdRng::seed_from_u64(0);
        for (w, h) in [(0.0, 600.0), (800.0, 0.0), (f64::NAN, 600.0)] {
            let err = PuzzleInstance::new(
                ImageSize { width: w, height: h },
                16,
                StageLayout::default(),
                &mut rng,
            )
            .unwrap_err();
            assert_eq!(err, Error::EmptyImage);
        }
    }

    #[test]
    fn release_on_the_slot_locks_exactly() {
        let mut puzzle = square_puzzle(16, 21);
        let id = puzzle.pieces()[0].id;
        let correct = puzzle.piece(id).unwrap().correct_position;
        assert!(puzzle.begin_drag(id));
        assert_eq!(
            puzzle.end_drag(id, correct),
            DragOutcome::Locked { completed: false }
        );
        let piece = puzzle.piece(id).unwrap();
        assert_eq!(piece.current_position, correct);
        assert!(piece.locked());
    }

    #[test]
    fn release_at_the_threshold_stays_free() {
        let mut puzzle = square_puzzle(16, 22);
        let id = puzzle.pieces()[0].id;
        let correct = puzzle.piece(id).unwrap().correct_position;
        let at_threshold = Point {
            x: correct.x + SNAP,
            y: correct.y,
        };
        assert_eq!(puzzle.end_drag(id, at_threshold), DragOutcome::Released);
        assert_eq!(puzzle.piece(id).unwrap().current_position, at_threshold);
        assert!(!puzzle.piece(id).unwrap().locked());
    }

    #[test]
    fn just_inside_the_threshold_snaps() {
        let mut puzzle = square_puzzle(16, 23);
        let id = puzzle.pieces()[0].id;
        let correct = puzzle.piece(id).unwrap().correct_position;
        let near = Point {
            x: correct.x + SNAP - 0.5,
            y: correct.y,
        };
        assert!(matches!(
            puzzle.end_drag(id, near),
            DragOutcome::Locked { .. }
        ));
        assert_eq!(puzzle.piece(id).unwrap().current_position, correct);
    }

    #[test]
    fn locked_pieces_ignore_further_drags() {
        let mut puzzle = square_puzzle(16, 24);
        let id = puzzle.pieces()[0].id;
        let correct = puzzle.piece(id).unwrap().correct_position;
        puzzle.end_drag(id, correct);
        assert!(!puzzle.begin_drag(id));
        let far = Point { x: 700.0, y: 500.0 };
        puzzle.drag_to(id, far);
        assert_eq!(puzzle.end_drag(id, far), DragOutcome::Rejected);
        assert_eq!(puzzle.piece(id).unwrap().current_position, correct);
    }

    #[test]
    fn hit_test_prefers_the_topmost_free_piece() {
        let mut puzzle = square_puzzle(4, 25);
        // stack two pieces on the same spot
        let ids: Vec<PieceId> = puzzle.pieces().iter().map(|p| p.id).collect();
        let spot = Point { x: 550.0, y: 100.0 };
        puzzle.drag_to(ids[0], spot);
        puzzle.drag_to(ids[1], spot);
        assert!(puzzle.begin_drag(ids[0])); // raises 0 above 1
        puzzle.end_drag(ids[0], spot);
        let hit = puzzle
            .hit_test(Point {
                x: spot.x + 10.0,
                y: spot.y + 10.0,
            })
            .unwrap();
        assert_eq!(hit, ids[0]);
    }

    #[test]
    fn hit_test_skips_locked_pieces() {
        let mut puzzle = square_puzzle(4, 26);
        let id = puzzle.pieces()[0].id;
        let correct = puzzle.piece(id).unwrap().correct_position;
        // park every other piece far from the board
        let others: Vec<PieceId> = puzzle
            .pieces()
            .iter()
            .map(|p| p.id)
            .filter(|i| *i != id)
            .collect();
        for (n, other) in others.iter().enumerate() {
            puzzle.drag_to(
                *other,
                Point {
                    x: 600.0 + n as f64 * 10.0,
                    y: 450.0,
                },
            );
        }
        puzzle.end_drag(id, correct);
        let inside = Point {
            x: correct.x + 10.0,
            y: correct.y + 10.0,
        };
        assert_eq!(puzzle.hit_test(inside), None);
    }

    #[test]
    fn completion_latch_never_fires_on_empty_sets() {
        let mut latch = CompletionLatch::default();
        assert!(!latch.observe(&[]));
        assert!(!latch.fired());
    }

    #[test]
    fn progress_counts_locked_pieces() {
        let mut puzzle = square_puzzle(4, 27);
        assert_eq!(puzzle.progress(), 0.0);
        let id = puzzle.pieces()[0].id;
        let correct = puzzle.piece(id).unwrap().correct_position;
        puzzle.end_drag(id, correct);
        assert!((puzzle.progress() - 0.25).abs() < 1e-12);
        assert_eq!(puzzle.locked_count(), 1);
        assert!(!puzzle.is_complete());
    }
}
