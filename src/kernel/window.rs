//! Sliding-window channel statistics.
//!
//! `ColumnSums` keeps per-column, per-channel sums over a band of `rows`
//! consecutive frame rows. Sliding the band down one row costs one row of
//! updates, and sliding a window across the band costs one column per step,
//! so window sums are O(1) amortized instead of O(w·h).

use crate::frame::{Frame, CHANNELS};

/// Exact channel sums over one window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct WindowStats {
    pub sum: [u64; CHANNELS],
    pub sum_sq: [u64; CHANNELS],
}

/// Column sums over the band `[top, top + rows)`.
pub(crate) struct ColumnSums {
    rows: usize,
    top: usize,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

impl ColumnSums {
    /// Accumulates the band starting at row `top`.
    pub(crate) fn new(frame: &Frame, top: usize, rows: usize) -> Self {
        let len = frame.width() * CHANNELS;
        let mut columns = Self {
            rows,
            top,
            sum: vec![0; len],
            sum_sq: vec![0; len],
        };
        for y in top..top + rows {
            if let Some(row) = frame.row(y) {
                columns.add_row(row);
            }
        }
        columns
    }

    /// Moves the band down by one row.
    pub(crate) fn advance(&mut self, frame: &Frame) {
        if let Some(row) = frame.row(self.top + self.rows) {
            self.add_row(row);
        }
        if let Some(row) = frame.row(self.top) {
            for (idx, &v) in row.iter().enumerate() {
                let v = v as u64;
                self.sum[idx] -= v;
                self.sum_sq[idx] -= v * v;
            }
        }
        self.top += 1;
    }

    /// Returns stats for every window of `width` columns, indexed by left x.
    pub(crate) fn windows(&self, width: usize) -> Vec<WindowStats> {
        let columns = self.sum.len() / CHANNELS;
        if width == 0 || width > columns {
            return Vec::new();
        }

        let mut acc = WindowStats::default();
        for col in 0..width {
            self.add_column(&mut acc, col);
        }
        let mut out = Vec::with_capacity(columns - width + 1);
        out.push(acc);
        for x in 1..=columns - width {
            self.add_column(&mut acc, x + width - 1);
            for c in 0..CHANNELS {
                let old = (x - 1) * CHANNELS + c;
                acc.sum[c] -= self.sum[old];
                acc.sum_sq[c] -= self.sum_sq[old];
            }
            out.push(acc);
        }
        out
    }

    fn add_row(&mut self, row: &[u8]) {
        for (idx, &v) in row.iter().enumerate() {
            let v = v as u64;
            self.sum[idx] += v;
            self.sum_sq[idx] += v * v;
        }
    }

    fn add_column(&self, acc: &mut WindowStats, col: usize) {
        for c in 0..CHANNELS {
            let idx = col * CHANNELS + c;
            acc.sum[c] += self.sum[idx];
            acc.sum_sq[c] += self.sum_sq[idx];
        }
    }
}

/// Computes window stats directly from pixels.
pub(crate) fn window_stats_at(
    frame: &Frame,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> WindowStats {
    let mut stats = WindowStats::default();
    for ty in y..y + height {
        let Some(row) = frame.row(ty) else { break };
        for px in row[x * CHANNELS..(x + width) * CHANNELS].chunks_exact(CHANNELS) {
            for c in 0..CHANNELS {
                let v = px[c] as u64;
                stats.sum[c] += v;
                stats.sum_sq[c] += v * v;
            }
        }
    }
    stats
}
