//! Tab-aligned table writer
//!
//! Every cell except the last in a row is padded to the width of its column:
//! the widest visible cell plus padding, never less than the minimum width.
//! Widths ignore ANSI escape sequences so coloured cells line up with plain
//! ones. The last cell of a row is written as-is.

/// Buffered table that aligns columns across all pushed rows
#[derive(Debug, Clone)]
pub struct TableWriter {
    min_width: usize,
    padding: usize,
    rows: Vec<Vec<String>>,
}

impl TableWriter {
    pub fn new(min_width: usize, padding: usize) -> Self {
        Self {
            min_width,
            padding,
            rows: Vec::new(),
        }
    }

    /// Table with the layout used for region listings and sweeps
    pub fn standard() -> Self {
        Self::new(crate::defaults::TABLE_MIN_WIDTH, crate::defaults::TABLE_PADDING)
    }

    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render all rows, one line each, newline terminated
    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let mut output = String::new();

        for row in &self.rows {
            output.push_str(&render_row(row, &widths));
            output.push('\n');
        }

        output
    }

    /// Width of every aligned column. A cell only counts toward its column
    /// when it is not the last cell of its row.
    fn column_widths(&self) -> Vec<usize> {
        let columns = self.rows.iter().map(|r| r.len().saturating_sub(1)).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];

        for row in &self.rows {
            for (idx, cell) in row.iter().take(row.len().saturating_sub(1)).enumerate() {
                widths[idx] = widths[idx].max(visible_width(cell));
            }
        }

        widths
            .into_iter()
            .map(|w| (w + self.padding).max(self.min_width))
            .collect()
    }
}

/// Render one row on its own with every non-final cell padded to
/// `max(min_width, width + padding)`. Used when rows are written as results
/// arrive and the table cannot be buffered.
pub fn fixed_row(cells: &[String], min_width: usize, padding: usize) -> String {
    let widths: Vec<usize> = cells
        .iter()
        .take(cells.len().saturating_sub(1))
        .map(|cell| (visible_width(cell) + padding).max(min_width))
        .collect();
    render_row(cells, &widths)
}

fn render_row(row: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    let last = row.len().saturating_sub(1);

    for (idx, cell) in row.iter().enumerate() {
        if idx < last {
            line.push_str(&pad_cell(cell, widths[idx]));
        } else {
            line.push_str(cell);
        }
    }

    line
}

/// Left-align `text` in `width` visible columns
pub fn pad_cell(text: &str, width: usize) -> String {
    let visible = visible_width(text);
    if visible >= width {
        return text.to_string();
    }
    format!("{}{}", text, " ".repeat(width - visible))
}

/// Character count of `text` with ANSI CSI sequences removed
pub fn visible_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            // ESC [ params final-byte
            if chars.next() == Some('[') {
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            }
            continue;
        }
        width += 1;
    }

    width
}
