//! Grid model for the dots-and-boxes board
//!
//! A `width x height` grid of boxes is bounded by horizontal and vertical
//! unit lines. The grid itself is pure data: it enumerates lines and boxes
//! and answers adjacency queries, independent of players or turns. Line and
//! box ownership lives in the game state machine, not here.
//!
//! Coordinate conventions (matching the box at `(x, y)`):
//! - top edge:    horizontal line `(x, y)`
//! - bottom edge: horizontal line `(x, y + 1)`
//! - left edge:   vertical line `(x, y)`
//! - right edge:  vertical line `(x + 1, y)`
//!
//! Horizontal lines therefore span `0 <= x < width`, `0 <= y <= height`;
//! vertical lines span `0 <= x <= width`, `0 <= y < height`.

use serde::{Deserialize, Serialize};

/// Whether a line runs along a row edge or a column edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Identifies a single ownable edge of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineId {
    pub orientation: Orientation,
    pub x: u8,
    pub y: u8,
}

impl LineId {
    pub fn horizontal(x: u8, y: u8) -> Self {
        Self {
            orientation: Orientation::Horizontal,
            x,
            y,
        }
    }

    pub fn vertical(x: u8, y: u8) -> Self {
        Self {
            orientation: Orientation::Vertical,
            x,
            y,
        }
    }
}

/// Identifies a unit cell bounded by four lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoxId {
    pub x: u8,
    pub y: u8,
}

impl BoxId {
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

/// Dimensions of a board, in boxes.
///
/// All adjacency is computed on demand from the dimensions; there is no
/// stored adjacency table or object graph. Out-of-range coordinates passed
/// to [`Grid::lines_of`] or [`Grid::boxes_adjacent_to`] are a programming
/// error and panic; callers validating remote input use
/// [`Grid::contains_line`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u8,
    height: u8,
}

impl Grid {
    /// Creates a grid of `width x height` boxes.
    ///
    /// # Panics
    /// Panics if either dimension is zero.
    pub fn new(width: u8, height: u8) -> Self {
        assert!(
            width >= 1 && height >= 1,
            "grid dimensions must be at least 1x1, got {}x{}",
            width,
            height
        );
        Self { width, height }
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Number of boxes on the board.
    pub fn box_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of ownable lines on the board.
    pub fn line_count(&self) -> usize {
        let w = self.width as usize;
        let h = self.height as usize;
        // horizontal: width * (height + 1), vertical: (width + 1) * height
        w * (h + 1) + (w + 1) * h
    }

    /// True if the box coordinate is on the board.
    pub fn contains_box(&self, b: BoxId) -> bool {
        b.x < self.width && b.y < self.height
    }

    /// True if the line coordinate names an actual edge of this board.
    pub fn contains_line(&self, line: LineId) -> bool {
        match line.orientation {
            Orientation::Horizontal => line.x < self.width && line.y <= self.height,
            Orientation::Vertical => line.x <= self.width && line.y < self.height,
        }
    }

    /// The four bounding lines of a box: top, bottom, left, right.
    ///
    /// # Panics
    /// Panics if the box is out of range.
    pub fn lines_of(&self, b: BoxId) -> [LineId; 4] {
        assert!(
            self.contains_box(b),
            "box ({}, {}) out of range for {}x{} grid",
            b.x,
            b.y,
            self.width,
            self.height
        );
        [
            LineId::horizontal(b.x, b.y),
            LineId::horizontal(b.x, b.y + 1),
            LineId::vertical(b.x, b.y),
            LineId::vertical(b.x + 1, b.y),
        ]
    }

    /// The boxes a line borders: two for interior lines, one for edge lines.
    ///
    /// # Panics
    /// Panics if the line is out of range.
    pub fn boxes_adjacent_to(&self, line: LineId) -> Vec<BoxId> {
        assert!(
            self.contains_line(line),
            "line {:?} out of range for {}x{} grid",
            line,
            self.width,
            self.height
        );
        let mut boxes = Vec::with_capacity(2);
        match line.orientation {
            Orientation::Horizontal => {
                // A horizontal line is the bottom of the box above it and
                // the top of the box below it.
                if line.y > 0 {
                    boxes.push(BoxId::new(line.x, line.y - 1));
                }
                if line.y < self.height {
                    boxes.push(BoxId::new(line.x, line.y));
                }
            }
            Orientation::Vertical => {
                if line.x > 0 {
                    boxes.push(BoxId::new(line.x - 1, line.y));
                }
                if line.x < self.width {
                    boxes.push(BoxId::new(line.x, line.y));
                }
            }
        }
        boxes
    }

    /// Iterates every box on the board in row-major order.
    pub fn boxes(&self) -> impl Iterator<Item = BoxId> {
        let (w, h) = (self.width, self.height);
        (0..h).flat_map(move |y| (0..w).map(move |x| BoxId::new(x, y)))
    }

    /// Iterates every line on the board, horizontals first.
    pub fn lines(&self) -> impl Iterator<Item = LineId> {
        let (w, h) = (self.width, self.height);
        let horizontals =
            (0..=h).flat_map(move |y| (0..w).map(move |x| LineId::horizontal(x, y)));
        let verticals = (0..h).flat_map(move |y| (0..=w).map(move |x| LineId::vertical(x, y)));
        horizontals.chain(verticals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_box_counts() {
        let grid = Grid::new(3, 3);
        assert_eq!(grid.box_count(), 9);
        // 3*4 horizontal + 4*3 vertical
        assert_eq!(grid.line_count(), 24);
        assert_eq!(grid.lines().count(), grid.line_count());
        assert_eq!(grid.boxes().count(), grid.box_count());
    }

    #[test]
    fn test_lines_of_box() {
        let grid = Grid::new(2, 2);
        let lines = grid.lines_of(BoxId::new(1, 0));

        assert_eq!(lines[0], LineId::horizontal(1, 0)); // top
        assert_eq!(lines[1], LineId::horizontal(1, 1)); // bottom
        assert_eq!(lines[2], LineId::vertical(1, 0)); // left
        assert_eq!(lines[3], LineId::vertical(2, 0)); // right
    }

    #[test]
    fn test_interior_line_touches_two_boxes() {
        let grid = Grid::new(2, 2);

        let boxes = grid.boxes_adjacent_to(LineId::horizontal(0, 1));
        assert_eq!(boxes, vec![BoxId::new(0, 0), BoxId::new(0, 1)]);

        let boxes = grid.boxes_adjacent_to(LineId::vertical(1, 0));
        assert_eq!(boxes, vec![BoxId::new(0, 0), BoxId::new(1, 0)]);
    }

    #[test]
    fn test_edge_line_touches_one_box() {
        let grid = Grid::new(2, 2);

        assert_eq!(
            grid.boxes_adjacent_to(LineId::horizontal(1, 0)),
            vec![BoxId::new(1, 0)]
        );
        assert_eq!(
            grid.boxes_adjacent_to(LineId::horizontal(1, 2)),
            vec![BoxId::new(1, 1)]
        );
        assert_eq!(
            grid.boxes_adjacent_to(LineId::vertical(0, 1)),
            vec![BoxId::new(0, 1)]
        );
        assert_eq!(
            grid.boxes_adjacent_to(LineId::vertical(2, 1)),
            vec![BoxId::new(1, 1)]
        );
    }

    #[test]
    fn test_adjacency_is_consistent_with_lines_of() {
        let grid = Grid::new(3, 2);

        for b in grid.boxes() {
            for line in grid.lines_of(b) {
                assert!(grid.contains_line(line));
                assert!(
                    grid.boxes_adjacent_to(line).contains(&b),
                    "box {:?} missing from adjacency of its own line {:?}",
                    b,
                    line
                );
            }
        }
    }

    #[test]
    fn test_line_bounds() {
        let grid = Grid::new(2, 3);

        assert!(grid.contains_line(LineId::horizontal(1, 3)));
        assert!(!grid.contains_line(LineId::horizontal(2, 0)));
        assert!(!grid.contains_line(LineId::horizontal(0, 4)));

        assert!(grid.contains_line(LineId::vertical(2, 2)));
        assert!(!grid.contains_line(LineId::vertical(3, 0)));
        assert!(!grid.contains_line(LineId::vertical(0, 3)));
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_box_panics() {
        let grid = Grid::new(2, 2);
        grid.lines_of(BoxId::new(2, 0));
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_line_panics() {
        let grid = Grid::new(2, 2);
        grid.boxes_adjacent_to(LineId::vertical(3, 0));
    }

    #[test]
    #[should_panic]
    fn test_zero_sized_grid_panics() {
        Grid::new(0, 2);
    }
}
