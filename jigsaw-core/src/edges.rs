use rand::Rng;
use serde::{Deserialize, Serialize};

/// Protrusion classification on one side of one piece's boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeSign {
    /// Straight border-facing edge.
    #[default]
    Flat,
    /// Outward bulge; the neighbor across this edge carries a `Blank`.
    Tab,
    /// Inward cut; the neighbor across this edge carries a `Tab`.
    Blank,
}

impl EdgeSign {
    /// Numeric sign used by the path builder: Flat 0, Tab +1, Blank -1.
    pub fn sign(self) -> f64 {
        match self {
            EdgeSign::Flat => 0.0,
            EdgeSign::Tab => 1.0,
            EdgeSign::Blank => -1.0,
        }
    }

    /// The complementary sign carried by the adjacent piece.
    pub fn complement(self) -> EdgeSign {
        match self {
            EdgeSign::Flat => EdgeSign::Flat,
            EdgeSign::Tab => EdgeSign::Blank,
            EdgeSign::Blank => EdgeSign::Tab,
        }
    }
}

/// Edge classification quadruple for one grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceEdges {
    pub top: EdgeSign,
    pub right: EdgeSign,
    pub bottom: EdgeSign,
    pub left: EdgeSign,
}

/// Row-major edge classification for the whole grid.
pub type EdgeMap = Vec<Vec<PieceEdges>>;

/// Draw one fair Tab/Blank sign per internal shared edge and mirror its
/// complement onto the neighbor, leaving border slots `Flat`. Must run
/// exactly once per puzzle instance: re-running after pieces are built
/// would desynchronize boundary shapes from already-rendered crops.
pub fn generate_edges(rows: u32, cols: u32, rng: &mut impl Rng) -> EdgeMap {
    let rows = rows as usize;
    let cols = cols as usize;
    let mut edges = vec![vec![PieceEdges::default(); cols]; rows];
    for r in 0..rows {
        for c in 0..cols {
            if c + 1 < cols {
                let v = if rng.gen_bool(0.5) {
                    EdgeSign::Tab
                } else {
                    EdgeSign::Blank
                };
                edges[r][c].right = v;
                edges[r][c + 1].left = v.complement();
            }
            if r + 1 < rows {
                let v = if rng.gen_bool(0.5) {
                    EdgeSign::Tab
                } else {
                    EdgeSign::Blank
                };
                edges[r][c].bottom = v;
                edges[r + 1][c].top = v.complement();
            }
        }
    }
    edges
}
