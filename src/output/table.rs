#![forbid(unsafe_code)]

use std::io;

use unicode_width::UnicodeWidthStr as _;

/// Column-aligned plain-text table for non-TTY output.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    max_cell_width: Option<usize>,
}

impl Table {
    pub fn new(headers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            max_cell_width: None,
        }
    }

    /// Cells wider than `width` columns are cut with an ellipsis.
    #[must_use]
    pub fn max_cell_width(mut self, width: usize) -> Self {
        self.max_cell_width = Some(width.max(2));
        self
    }

    pub fn row(&mut self, cols: impl IntoIterator<Item = impl Into<String>>) {
        let row = cols
            .into_iter()
            .map(Into::into)
            .map(|cell: String| match self.max_cell_width {
                Some(max) => truncate_to_width(&cell, max),
                None => cell,
            })
            .collect();
        self.rows.push(row);
    }

    pub fn print(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        self.write_to(&mut out)
    }

    pub fn write_csv(&self) -> io::Result<()> {
        self.write_csv_to(io::stdout().lock())
    }

    pub fn write_csv_to(&self, out: impl io::Write) -> io::Result<()> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_to(&self, mut out: impl io::Write) -> io::Result<()> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i >= widths.len() {
                    widths.push(0);
                }
                widths[i] = widths[i].max(cell.width());
            }
        }

        writeln!(&mut out, "{}", format_row(&self.headers, &widths))?;
        for row in &self.rows {
            writeln!(&mut out, "{}", format_row(row, &widths))?;
        }
        Ok(())
    }
}

fn format_row(row: &[String], widths: &[usize]) -> String {
    let mut out = String::new();
    let last = row.len().saturating_sub(1);
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push_str(cell);
        if i == last {
            break;
        }
        let w = widths.get(i).copied().unwrap_or_else(|| cell.width());
        let pad = w.saturating_sub(cell.width());
        out.extend(std::iter::repeat_n(' ', pad));
    }
    out
}

/// Cuts `s` to at most `max` display columns, ending in "…" when shortened.
#[must_use]
pub fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_owned();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
