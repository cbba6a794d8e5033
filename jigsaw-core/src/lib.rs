//! Interlocking jigsaw geometry and assembly engine.
//!
//! Turns an image's pixel dimensions plus a requested piece count into a
//! scattered set of interlocking pieces, then drives the drag/snap/lock
//! cycle until the puzzle is solved. Rendering and input wiring live in the
//! host crate; everything here is plain geometry and state.

pub mod config;
pub mod edges;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod instance;
pub mod piece;
pub mod scatter;

pub use config::{DEFAULT_PIECE_COUNT, PuzzleConfig, StageLayout};
pub use edges::{EdgeMap, EdgeSign, PieceEdges, generate_edges};
pub use error::Error;
pub use geometry::{BoardFit, PathSegment, PiecePath, Point, Rect, board_fit, build_pieces};
pub use grid::{Grid, compute_grid};
pub use instance::{CompletionLatch, DragOutcome, ImageSize, PuzzleInstance};
pub use piece::{LockState, Piece, PieceId};
pub use scatter::scatter;
