//! Collision detection
//!
//! Continuous game: axis-aligned boxes with closed-interval overlap, so touching
//! edges count as a hit. Grid game: cell equality and grid bounds.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::snake::Cell;

/// Axis-aligned rectangle (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Square box of side `size` around `center`
    pub fn centered(center: Vec2, size: f32) -> Self {
        let half = size / 2.0;
        Self::new(center.x - half, center.y - half, center.x + half, center.y + half)
    }

    /// Closed-interval overlap test
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.right >= other.left
            && self.left <= other.right
            && self.bottom >= other.top
            && self.top <= other.bottom
    }
}

/// True if `entity` touches any of `obstacles`
pub fn hits_any<'a>(entity: &Rect, obstacles: impl IntoIterator<Item = &'a Rect>) -> bool {
    obstacles.into_iter().any(|r| entity.overlaps(r))
}

/// True if `cell` lies inside `[0, cols) x [0, rows)`
#[inline]
pub fn in_grid(cell: Cell, cols: i32, rows: i32) -> bool {
    (0..cols).contains(&cell.x) && (0..rows).contains(&cell.y)
}

/// True if `cell` equals any cell of `body` (linear scan, grids are small)
pub fn hits_body<'a>(cell: Cell, body: impl IntoIterator<Item = &'a Cell>) -> bool {
    body.into_iter().any(|c| *c == cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_touch_is_collision() {
        let bird = Rect::new(10.0, 5.0, 20.0, 15.0);
        let pipe_top = Rect::new(20.0, 0.0, 40.0, 8.0);
        assert!(bird.overlaps(&pipe_top));
        assert!(pipe_top.overlaps(&bird));
    }

    #[test]
    fn test_separated_boxes() {
        let bird = Rect::new(10.0, 5.0, 20.0, 15.0);
        assert!(!bird.overlaps(&Rect::new(20.01, 0.0, 40.0, 8.0)));
        assert!(!bird.overlaps(&Rect::new(0.0, 15.5, 40.0, 30.0)));
    }

    #[test]
    fn test_hits_any() {
        let bird = Rect::centered(Vec2::new(50.0, 50.0), 10.0);
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(55.0, 0.0, 60.0, 45.0),
        ];
        // Corner-to-corner contact at (55, 45)
        assert!(hits_any(&bird, &rects));
        assert!(!hits_any(&bird, &rects[..1]));
    }

    #[test]
    fn test_grid_bounds() {
        assert!(in_grid(Cell::new(0, 0), 20, 20));
        assert!(in_grid(Cell::new(19, 19), 20, 20));
        assert!(!in_grid(Cell::new(20, 5), 20, 20));
        assert!(!in_grid(Cell::new(5, -1), 20, 20));
    }

    #[test]
    fn test_hits_body() {
        let body = [Cell::new(1, 1), Cell::new(2, 1), Cell::new(3, 1)];
        assert!(hits_body(Cell::new(2, 1), &body));
        assert!(!hits_body(Cell::new(4, 1), &body));
    }
}
