#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellGlyph {
    pub ch: char,
    /// Sampled source color encoded as RGB bytes.
    pub fg: [u8; 3],
}

impl CellGlyph {
    pub const BLANK: CellGlyph = CellGlyph { ch: ' ', fg: [0; 3] };

    pub fn new(ch: char, fg: [u8; 3]) -> Self {
        Self { ch, fg }
    }

    pub fn is_blank(&self) -> bool {
        self.ch.is_whitespace()
    }
}

/// Final glyph map of an image, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphGrid {
    pub columns: u32,
    pub rows: u32,
    pub cells: Vec<CellGlyph>,
}

impl GlyphGrid {
    pub fn new(columns: u32, rows: u32, cells: Vec<CellGlyph>) -> Self {
        assert_eq!(columns as usize * rows as usize, cells.len());
        Self { columns, rows, cells }
    }

    pub fn empty() -> Self {
        Self { columns: 0, rows: 0, cells: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, column: u32, row: u32) -> Option<&CellGlyph> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.cells.get((row * self.columns + column) as usize)
    }

    /// Indices of every cell that carries a visible glyph.
    pub fn visible_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells.iter().enumerate().filter(|(_, cell)| !cell.is_blank()).map(|(idx, _)| idx)
    }

    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        let width = (self.columns as usize).max(1);
        self.cells.chunks(width).map(|row| row.iter().map(|cell| cell.ch).collect::<String>())
    }

    pub fn to_text(&self) -> String {
        join_rows(self.rows())
    }

    /// A frame showing exactly this grid.
    pub fn settled_frame(&self) -> RenderFrame {
        RenderFrame {
            columns: self.columns,
            rows: self.rows,
            cells: self.cells.iter().map(|cell| cell.ch).collect(),
        }
    }
}

/// Characters shown for one animation tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderFrame {
    pub columns: u32,
    pub rows: u32,
    pub cells: Vec<char>,
}

impl RenderFrame {
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        let width = (self.columns as usize).max(1);
        self.cells.chunks(width).map(|row| row.iter().collect::<String>())
    }

    pub fn to_text(&self) -> String {
        join_rows(self.rows())
    }

    /// Whether every cell shows the grid's final glyph.
    pub fn matches(&self, grid: &GlyphGrid) -> bool {
        self.columns == grid.columns
            && self.rows == grid.rows
            && self.cells.iter().zip(&grid.cells).all(|(ch, cell)| *ch == cell.ch)
    }
}

fn join_rows(rows: impl Iterator<Item = String>) -> String {
    let mut text = String::new();
    for row in rows {
        text.push_str(&row);
        text.push('\n');
    }
    text
}
