use serde::{Deserialize, Serialize};

/// Near-square partition of a requested piece count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub rows: u32,
    pub cols: u32,
}

impl Grid {
    pub fn piece_count(&self) -> u32 {
        self.rows * self.cols
    }
}

/// Split `requested` into the most-square `rows x cols` factor pair.
///
/// Searches divisors up to `sqrt(requested)` and keeps the pair with the
/// smallest `cols - rows` gap, so `12 -> 3x4` and `48 -> 6x8`. A request of
/// zero takes the fallback path and yields a 2x2 grid.
pub fn compute_grid(requested: u32) -> Grid {
    if requested == 0 {
        return fallback_grid(requested);
    }
    let max = (requested as f64).sqrt().floor() as u32;
    let mut best: Option<Grid> = None;
    let mut best_gap = u32::MAX;
    for r in 1..=max {
        if requested % r == 0 {
            let c = requested / r;
            // r <= sqrt <= c, so the gap is never negative
            let gap = c - r;
            if gap < best_gap {
                best_gap = gap;
                best = Some(Grid { rows: r, cols: c });
            }
        }
    }
    best.unwrap_or_else(|| fallback_grid(requested))
}

fn fallback_grid(requested: u32) -> Grid {
    let rows = ((requested as f64).sqrt().floor() as u32).max(2);
    let cols = requested.div_ceil(rows).max(2);
    Grid { rows, cols }
}
