use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Stage size in render-space units.
pub const STAGE_W: f64 = 900.0;
pub const STAGE_H: f64 = 600.0;
/// Board panel (left side of the stage).
pub const BOARD_X: f64 = 40.0;
pub const BOARD_Y: f64 = 40.0;
pub const BOARD_SIZE: f64 = 420.0;
/// Tray panel (right side of the stage) where pieces scatter.
pub const TRAY_X: f64 = 500.0;
pub const TRAY_Y: f64 = 40.0;
pub const TRAY_W: f64 = STAGE_W - TRAY_X - 40.0;
pub const TRAY_H: f64 = STAGE_H - 80.0;
/// Margin kept between a scattered piece and the tray border.
pub const TRAY_MARGIN: f64 = 12.0;
/// Snap tolerance, loose enough to absorb the visual tab overhang.
pub const SNAP_THRESHOLD: f64 = 22.0;
/// Tab excursion as a fraction of the smaller piece dimension.
pub const TAB_RATIO: f64 = 0.18;
/// Piece count used when a record does not carry one.
pub const DEFAULT_PIECE_COUNT: u32 = 16;

/// Fixed stage geometry the engine lays pieces out against.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageLayout {
    pub stage_w: f64,
    pub stage_h: f64,
    pub board_x: f64,
    pub board_y: f64,
    pub board_size: f64,
    pub tray: Rect,
    pub tray_margin: f64,
    pub snap_threshold: f64,
}

impl Default for StageLayout {
    fn default() -> Self {
        StageLayout {
            stage_w: STAGE_W,
            stage_h: STAGE_H,
            board_x: BOARD_X,
            board_y: BOARD_Y,
            board_size: BOARD_SIZE,
            tray: Rect {
                x: TRAY_X,
                y: TRAY_Y,
                w: TRAY_W,
                h: TRAY_H,
            },
            tray_margin: TRAY_MARGIN,
            snap_threshold: SNAP_THRESHOLD,
        }
    }
}

impl StageLayout {
    /// Uniform presentation scale for a host viewport of `available_width`.
    /// Applied at draw time only; stored piece coordinates never change.
    pub fn stage_scale(&self, available_width: f64) -> f64 {
        (available_width / self.stage_w).min(1.0)
    }

    pub fn board_rect(&self) -> Rect {
        Rect {
            x: self.board_x,
            y: self.board_y,
            w: self.board_size,
            h: self.board_size,
        }
    }
}

/// Puzzle record as served by the backend. The engine consumes
/// `puzzle_pieces` and the photo URL; the remaining fields are passed
/// through untouched for presentation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PuzzleConfig {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default = "default_piece_count")]
    pub puzzle_pieces: u32,
    #[serde(default)]
    pub secret_message: String,
}

fn default_piece_count() -> u32 {
    DEFAULT_PIECE_COUNT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_record() {
        let raw = r#"{
            "_id": "abc123",
            "name": "Leyla",
            "photo_url": "/uploads/leyla.jpg",
            "puzzle_pieces": 48,
            "secret_message": "made with love"
        }"#;
        let cfg: PuzzleConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.id, "abc123");
        assert_eq!(cfg.puzzle_pieces, 48);
        assert_eq!(cfg.photo_url.as_deref(), Some("/uploads/leyla.jpg"));
        assert_eq!(cfg.secret_message, "made with love");
    }

    #[test]
    fn missing_fields_fall_back() {
        let cfg: PuzzleConfig = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert_eq!(cfg.puzzle_pieces, DEFAULT_PIECE_COUNT);
        assert!(cfg.photo_url.is_none());
        assert!(cfg.secret_message.is_empty());
    }

    #[test]
    fn stage_scale_caps_at_one() {
        let layout = StageLayout::default();
        assert_eq!(layout.stage_scale(1800.0), 1.0);
        let half = layout.stage_scale(450.0);
        assert!((half - 0.5).abs() < 1e-12);
    }
}
