//! World serialization: the column-major comparison file and the
//! row-major debug dump.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::EngineError;
use crate::grid::Grid;

/// Writes the current buffer to `path` in the comparison layout: one line
/// per column, each running top to bottom. The layout is compared byte
/// for byte across implementations, so it never changes.
pub fn write_final_grid(grid: &Grid, path: &Path) -> Result<(), EngineError> {
    write_file(grid, path).map_err(|source| EngineError::Output {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(grid: &Grid, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&column_lines(grid))?;
    writer.flush()
}

fn column_lines(grid: &Grid) -> Vec<u8> {
    let cells = grid.snapshot();
    let (width, height) = (grid.width(), grid.height());
    let mut out = Vec::with_capacity((height + 1) * width);
    for x in 0..width {
        for y in 0..height {
            out.push(b'0' + cells[y * width + x]);
        }
        out.push(b'\n');
    }
    out
}

/// Row-major text dump of the current buffer, one line per row.
pub fn render_rows(grid: &Grid) -> String {
    let mut out = String::with_capacity((grid.width() + 1) * grid.height());
    let mut row = vec![0u8; grid.width()];
    for y in 0..grid.height() {
        grid.load_row(y, &mut row);
        for &cell in &row {
            out.push((b'0' + cell) as char);
        }
        out.push('\n');
    }
    out
}
