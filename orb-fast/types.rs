/// Half-open pixel window `[x0, x1) x [y0, y1)` inside a level image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellWindow {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl CellWindow {
    pub fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }
}

/// Detection grid laid over the interior region of one level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Inset of the region from the top-left corner, on both axes
    pub min_border: usize,
    /// Exclusive right edge of the region
    pub max_border_x: usize,
    /// Exclusive bottom edge of the region
    pub max_border_y: usize,
    pub cols: usize,
    pub rows: usize,
    pub cell_width: usize,
    pub cell_height: usize,
    /// Extra pixels each cell reaches into its right/bottom neighbour
    pub overlap: usize,
}

impl GridLayout {
    /// Window of cell `(row, col)` clamped to the region, `None` if too small to hold a corner
    pub fn cell(&self, row: usize, col: usize, min_extent: usize) -> Option<CellWindow> {
        let x0 = self.min_border + col * self.cell_width;
        let y0 = self.min_border + row * self.cell_height;
        let window = CellWindow {
            x0,
            y0,
            x1: (x0 + self.cell_width + self.overlap).min(self.max_border_x),
            y1: (y0 + self.cell_height + self.overlap).min(self.max_border_y),
        };
        if window.width() < min_extent || window.height() < min_extent {
            return None;
        }
        Some(window)
    }
}

/// Corner type classification for a circle pixel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CornerType {
    Bright,
    Dark,
    None,
}
