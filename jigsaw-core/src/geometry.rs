use serde::{Deserialize, Serialize};

use crate::config::{StageLayout, TAB_RATIO};
use crate::edges::{EdgeMap, PieceEdges};
use crate::grid::Grid;
use crate::piece::Piece;

/// Basic two dimensional point used for geometry operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

/// Axis-aligned rectangle, used for tray bounds and source-image crops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// One drawing command of a closed piece boundary.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PathSegment {
    /// Straight segment to the endpoint.
    Line(Point),
    /// Cubic segment with two control points.
    Cubic { c1: Point, c2: Point, to: Point },
}

/// Closed boundary outline in piece-local coordinates: origin at the cell's
/// top-left corner, y growing downward, tabs overhanging the cell rectangle.
/// The final point implicitly connects back to `start`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PiecePath {
    pub start: Point,
    pub segments: Vec<PathSegment>,
}

/// Subdivisions used when approximating a cubic segment with line segments.
const CURVE_SAMPLES: usize = 8;

impl PiecePath {
    /// Polygonal approximation of the closed outline, for hit-testing and
    /// for hosts without a native curve primitive.
    pub fn flatten(&self) -> Vec<Point> {
        let mut pts = vec![self.start];
        let mut cur = self.start;
        for seg in &self.segments {
            match *seg {
                PathSegment::Line(p) => {
                    pts.push(p);
                    cur = p;
                }
                PathSegment::Cubic { c1, c2, to } => {
                    for i in 1..=CURVE_SAMPLES {
                        let t = i as f64 / CURVE_SAMPLES as f64;
                        pts.push(cubic_point(cur, c1, c2, to, t));
                    }
                    cur = to;
                }
            }
        }
        pts
    }

    pub fn contains(&self, p: Point) -> bool {
        poly_contains_point(&self.flatten(), p)
    }
}

fn cubic_point(p0: Point, c1: Point, c2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    Point {
        x: a * p0.x + b * c1.x + c * c2.x + d * p3.x,
        y: a * p0.y + b * c1.y + c * c2.y + d * p3.y,
    }
}

/// Even-odd ray test over a closed polygon.
pub fn poly_contains_point(poly: &[Point], p: Point) -> bool {
    let (x, y) = (p.x, p.y);
    let mut inside = false;
    let n = poly.len();
    if n == 0 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let xi = poly[i].x;
        let yi = poly[i].y;
        let xj = poly[j].x;
        let yj = poly[j].y;
        let intersect =
            ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi + 1e-12) + xi);
        if intersect {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Build the interlocking outline for one cell. Walks top, right, bottom,
/// left; a `Flat` side is a straight run, a `Tab`/`Blank` side detours
/// through a cubic excursion between the side's thirds, bulging
/// `min(w, h) * TAB_RATIO` outward or inward with control points mirrored
/// around the side midpoint. All-flat edges produce a plain rectangle.
pub fn build_boundary(w: f64, h: f64, e: PieceEdges) -> PiecePath {
    let tab = w.min(h) * TAB_RATIO;
    let third_w = w / 3.0;
    let third_h = h / 3.0;
    let mut segments = Vec::new();

    // Top: (0,0) -> (w,0); a Tab bulges toward negative y.
    let top = e.top.sign();
    if top == 0.0 {
        segments.push(PathSegment::Line(Point { x: w, y: 0.0 }));
    } else {
        segments.push(PathSegment::Line(Point { x: third_w, y: 0.0 }));
        segments.push(PathSegment::Cubic {
            c1: Point {
                x: third_w + tab,
                y: -top * tab,
            },
            c2: Point {
                x: 2.0 * third_w - tab,
                y: -top * tab,
            },
            to: Point {
                x: 2.0 * third_w,
                y: 0.0,
            },
        });
        segments.push(PathSegment::Line(Point { x: w, y: 0.0 }));
    }

    // Right: (w,0) -> (w,h)
    let right = e.right.sign();
    if right == 0.0 {
        segments.push(PathSegment::Line(Point { x: w, y: h }));
    } else {
        segments.push(PathSegment::Line(Point { x: w, y: third_h }));
        segments.push(PathSegment::Cubic {
            c1: Point {
                x: w + right * tab,
                y: third_h + tab,
            },
            c2: Point {
                x: w + right * tab,
                y: 2.0 * third_h - tab,
            },
            to: Point {
                x: w,
                y: 2.0 * third_h,
            },
        });
        segments.push(PathSegment::Line(Point { x: w, y: h }));
    }

    // Bottom: (w,h) -> (0,h)
    let bottom = e.bottom.sign();
    if bottom == 0.0 {
        segments.push(PathSegment::Line(Point { x: 0.0, y: h }));
    } else {
        segments.push(PathSegment::Line(Point {
            x: 2.0 * third_w,
            y: h,
        }));
        segments.push(PathSegment::Cubic {
            c1: Point {
                x: 2.0 * third_w - tab,
                y: h + bottom * tab,
            },
            c2: Point {
                x: third_w + tab,
                y: h + bottom * tab,
            },
            to: Point { x: third_w, y: h },
        });
        segments.push(PathSegment::Line(Point { x: 0.0, y: h }));
    }

    // Left: (0,h) -> (0,0); the implicit closure finishes a flat side.
    let left = e.left.sign();
    if left != 0.0 {
        segments.push(PathSegment::Line(Point {
            x: 0.0,
            y: 2.0 * third_h,
        }));
        segments.push(PathSegment::Cubic {
            c1: Point {
                x: -left * tab,
                y: 2.0 * third_h - tab,
            },
            c2: Point {
                x: -left * tab,
                y: third_h + tab,
            },
            to: Point { x: 0.0, y: third_h },
        });
    }

    PiecePath {
        start: Point::default(),
        segments,
    }
}

/// Fitted placement of the source image inside the board, plus the derived
/// per-cell piece dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardFit {
    /// Uniform scale from native image pixels to render-space units.
    pub fit_scale: f64,
    pub fit_w: f64,
    pub fit_h: f64,
    /// Origin centering the fitted image inside the board.
    pub inner_x: f64,
    pub inner_y: f64,
    pub piece_w: f64,
    pub piece_h: f64,
}

/// Scale the image uniformly into the board, preserving aspect ratio, and
/// center it.
pub fn board_fit(image_w: f64, image_h: f64, grid: Grid, layout: &StageLayout) -> BoardFit {
    let fit_scale = (layout.board_size / image_w).min(layout.board_size / image_h);
    let fit_w = image_w * fit_scale;
    let fit_h = image_h * fit_scale;
    BoardFit {
        fit_scale,
        fit_w,
        fit_h,
        inner_x: layout.board_x + (layout.board_size - fit_w) / 2.0,
        inner_y: layout.board_y + (layout.board_size - fit_h) / 2.0,
        piece_w: fit_w / grid.cols as f64,
        piece_h: fit_h / grid.rows as f64,
    }
}

/// Build every piece of the grid: boundary outline, solved position and the
/// inverse-scaled source crop, in row-major id order.
pub fn build_pieces(
    image_w: f64,
    image_h: f64,
    grid: Grid,
    edges: &EdgeMap,
    layout: &StageLayout,
) -> (BoardFit, Vec<Piece>) {
    let fit = board_fit(image_w, image_h, grid, layout);
    let mut pieces = Vec::with_capacity((grid.rows * grid.cols) as usize);
    let mut id = 0;
    for r in 0..grid.rows as usize {
        for c in 0..grid.cols as usize {
            let correct = Point {
                x: fit.inner_x + c as f64 * fit.piece_w,
                y: fit.inner_y + r as f64 * fit.piece_h,
            };
            // crop addresses native image pixels regardless of display size
            let crop = Rect {
                x: c as f64 * (fit.piece_w / fit.fit_scale),
                y: r as f64 * (fit.piece_h / fit.fit_scale),
                w: fit.piece_w / fit.fit_scale,
                h: fit.piece_h / fit.fit_scale,
            };
            let boundary = build_boundary(fit.piece_w, fit.piece_h, edges[r][c]);
            pieces.push(Piece::new(
                id,
                r as u32,
                c as u32,
                fit.piece_w,
                fit.piece_h,
                crop,
                edges[r][c],
                boundary,
                correct,
            ));
            id += 1;
        }
    }
    (fit, pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::{EdgeSign, PieceEdges, generate_edges};
    use crate::grid::compute_grid;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn all_flat_boundary_is_a_rectangle() {
        let path = build_boundary(90.0, 60.0, PieceEdges::default());
        assert_eq!(path.start, Point::default());
        assert_eq!(
            path.segments,
            vec![
                PathSegment::Line(Point { x: 90.0, y: 0.0 }),
                PathSegment::Line(Point { x: 90.0, y: 60.0 }),
                PathSegment::Line(Point { x: 0.0, y: 60.0 }),
            ]
        );
    }

    #[test]
    fn tab_bulges_outward_and_blank_cuts_inward() {
        let tabbed = build_boundary(
            90.0,
            90.0,
            PieceEdges {
                top: EdgeSign::Tab,
                ..Default::default()
            },
        );
        let min_y = tabbed
            .flatten()
            .iter()
            .map(|p| p.y)
            .fold(f64::INFINITY, f64::min);
        assert!(min_y < 0.0, "tab must overhang the cell, got {min_y}");

        let blanked = build_boundary(
            90.0,
            90.0,
            PieceEdges {
                top: EdgeSign::Blank,
                ..Default::default()
            },
        );
        let min_y = blanked
            .flatten()
            .iter()
            .map(|p| p.y)
            .fold(f64::INFINITY, f64::min);
        assert!(min_y >= 0.0, "blank must stay inside the cell, got {min_y}");
    }

    #[test]
    fn excursion_control_points_mirror_around_the_midpoint() {
        let path = build_boundary(
            90.0,
            90.0,
            PieceEdges {
                top: EdgeSign::Tab,
                ..Default::default()
            },
        );
        let PathSegment::Cubic { c1, c2, .. } = path.segments[1] else {
            panic!("expected a cubic on the tabbed side");
        };
        assert!((c1.x - 30.0 + (c2.x - 60.0)).abs() < 1e-9);
        assert_eq!(c1.y, c2.y);
    }

    #[test]
    fn tab_size_scales_with_the_piece() {
        for (w, h) in [(30.0, 30.0), (300.0, 200.0)] {
            let path = build_boundary(
                w,
                h,
                PieceEdges {
                    top: EdgeSign::Tab,
                    ..Default::default()
                },
            );
            let min_y = path
                .flatten()
                .iter()
                .map(|p| p.y)
                .fold(f64::INFINITY, f64::min);
            let tab = w.min(h) * TAB_RATIO;
            assert!((-min_y - tab * 0.75).abs() < tab * 0.25);
        }
    }

    #[test]
    fn piece_sizes_reconstruct_the_fitted_image() {
        let layout = StageLayout::default();
        let grid = compute_grid(12);
        let fit = board_fit(641.0, 480.0, grid, &layout);
        let row_sum: f64 = (0..grid.cols).map(|_| fit.piece_w).sum();
        let col_sum: f64 = (0..grid.rows).map(|_| fit.piece_h).sum();
        assert!((row_sum - fit.fit_w).abs() < 1e-9);
        assert!((col_sum - fit.fit_h).abs() < 1e-9);
    }

    #[test]
    fn crops_invert_the_fit_scale() {
        let layout = StageLayout::default();
        let grid = compute_grid(16);
        let mut rng = StdRng::seed_from_u64(5);
        let edges = generate_edges(grid.rows, grid.cols, &mut rng);
        let (fit, pieces) = build_pieces(800.0, 800.0, grid, &edges, &layout);
        for p in &pieces {
            assert!((p.crop.w * fit.fit_scale - p.w).abs() < 1e-9);
            assert!((p.crop.h * fit.fit_scale - p.h).abs() < 1e-9);
            assert!((p.crop.x * fit.fit_scale + fit.inner_x - p.correct_position.x).abs() < 1e-9);
        }
        // crops tile the full native image
        let last = pieces.last().unwrap();
        assert!((last.crop.x + last.crop.w - 800.0).abs() < 1e-9);
        assert!((last.crop.y + last.crop.h - 800.0).abs() < 1e-9);
    }

    #[test]
    fn point_in_polygon_basics() {
        let square = vec![
            Point { x: 0.0, y: 0.0 },
            Point { x: 10.0, y: 0.0 },
            Point { x: 10.0, y: 10.0 },
            Point { x: 0.0, y: 10.0 },
        ];
        assert!(poly_contains_point(&square, Point { x: 5.0, y: 5.0 }));
        assert!(!poly_contains_point(&square, Point { x: 15.0, y: 5.0 }));
        assert!(!poly_contains_point(&square, Point { x: -1.0, y: -1.0 }));
    }
}
