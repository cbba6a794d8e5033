use rand::Rng;
use rand::seq::SliceRandom;

use crate::geometry::{Point, Rect};
use crate::piece::{Piece, PieceId};

/// Scatter pieces across the tray: each piece gets an independent uniform
/// position keeping its cell rectangle inside `tray` shrunk by `margin` on
/// every side, and the stacking order is shuffled so it carries no
/// solve-order signal. Pieces may overlap in the tray; that is accepted.
/// Returns the new stacking order, bottom to top.
pub fn scatter(pieces: &mut [Piece], tray: Rect, margin: f64, rng: &mut impl Rng) -> Vec<PieceId> {
    let mut order: Vec<PieceId> = pieces.iter().map(|p| p.id).collect();
    order.shuffle(rng);
    for p in pieces.iter_mut() {
        // a piece wider than the shrunk tray parks at the margin origin
        let span_x = (tray.w - p.w - margin * 2.0).max(0.0);
        let span_y = (tray.h - p.h - margin * 2.0).max(0.0);
        p.current_position = Point {
            x: tray.x + margin + rng.gen_range(0.0..=span_x),
            y: tray.y + margin + rng.gen_range(0.0..=span_y),
        };
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageLayout;
    use crate::edges::generate_edges;
    use crate::geometry::build_pieces;
    use crate::grid::compute_grid;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build_set(seed: u64) -> (Vec<Piece>, Rect, f64) {
        let layout = StageLayout::default();
        let grid = compute_grid(24);
        let mut rng = StdRng::seed_from_u64(seed);
        let edges = generate_edges(grid.rows, grid.cols, &mut rng);
        let (_, pieces) = build_pieces(1024.0, 768.0, grid, &edges, &layout);
        (pieces, layout.tray, layout.tray_margin)
    }

    fn assert_in_bounds(pieces: &[Piece], tray: Rect, margin: f64) {
        for p in pieces {
            assert!(p.current_position.x >= tray.x + margin);
            assert!(p.current_position.y >= tray.y + margin);
            assert!(p.current_position.x + p.w <= tray.x + tray.w - margin + 1e-9);
            assert!(p.current_position.y + p.h <= tray.y + tray.h - margin + 1e-9);
        }
    }

    #[test]
    fn positions_stay_inside_the_shrunk_tray() {
        let (mut pieces, tray, margin) = build_set(3);
        let mut rng = StdRng::seed_from_u64(11);
        scatter(&mut pieces, tray, margin, &mut rng);
        assert_in_bounds(&pieces, tray, margin);
    }

    #[test]
    fn rescattering_preserves_the_bounds_invariant() {
        let (mut pieces, tray, margin) = build_set(4);
        let mut rng = StdRng::seed_from_u64(12);
        scatter(&mut pieces, tray, margin, &mut rng);
        let first: Vec<Point> = pieces.iter().map(|p| p.current_position).collect();
        scatter(&mut pieces, tray, margin, &mut rng);
        assert_in_bounds(&pieces, tray, margin);
        let second: Vec<Point> = pieces.iter().map(|p| p.current_position).collect();
        assert_ne!(first, second);
    }

    #[test]
    fn stacking_order_is_a_permutation_of_all_ids() {
        let (mut pieces, tray, margin) = build_set(5);
        let mut rng = StdRng::seed_from_u64(13);
        let mut order = scatter(&mut pieces, tray, margin, &mut rng);
        assert_eq!(order.len(), pieces.len());
        order.sort();
        let mut ids: Vec<PieceId> = pieces.iter().map(|p| p.id).collect();
        ids.sort();
        assert_eq!(order, ids);
    }
}
