//! Grid placement of stream windows
//!
//! Windows are laid out left-to-right, top-to-bottom in registration order on
//! a grid with a fixed number of rows. Coordinates are in pixels.

/// A point in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Window position and size in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl WindowRect {
    /// Right edge (exclusive)
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Number of grid columns for `n` windows on `rows` rows
///
/// `n / rows` rounded half up, and never less than one.
pub fn column_count(n: usize, rows: usize) -> usize {
    let rows = rows.max(1);
    ((2 * n + rows) / (2 * rows)).max(1)
}

/// Place `n` windows of `width`×`height` on a grid with `rows` rows
///
/// Window `k` lands in row `k / cols`, column `k % cols`. When `n` is not a
/// multiple of the column count, extra rows are added below.
pub fn window_placement(
    n: usize,
    width: u32,
    height: u32,
    rows: usize,
    origin: Point,
) -> Vec<WindowRect> {
    let cols = column_count(n, rows);
    (0..n)
        .map(|k| {
            let (row, col) = ((k / cols) as u32, (k % cols) as u32);
            WindowRect {
                x: origin.x + width * col,
                y: origin.y + height * row,
                width,
                height,
            }
        })
        .collect()
}

/// Smallest rectangle containing every window, anchored at the origin
pub fn bounding_size(rects: &[WindowRect]) -> (u32, u32) {
    rects.iter().fold((0, 0), |(w, h), r| (w.max(r.right()), h.max(r.bottom())))
}
