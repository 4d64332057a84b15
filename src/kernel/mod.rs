//! Correlation kernel implementations.
//!
//! Scores are multi-channel zero-mean normalized cross-correlation:
//! channel means are removed separately, and the numerator and both energies
//! are summed over all channels before normalizing. Scores lie in `[-1, 1]`.

use crate::frame::{Frame, CHANNELS};
use crate::template::plan::centered_energy;
use crate::template::TemplatePlan;
use crate::util::{TriggerError, TriggerResult};

use self::window::{ColumnSums, WindowStats};

pub mod scalar;
pub(crate) mod window;

#[cfg(feature = "rayon")]
pub mod rayon;

/// Best placement found by a scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// X coordinate (column) of the template's top-left corner.
    pub x: usize,
    /// Y coordinate (row) of the template's top-left corner.
    pub y: usize,
    /// ZNCC score at the placement.
    pub score: f32,
}

/// Kernel trait for scoring and scan operations.
pub trait Kernel {
    /// Computes the score at a single placement (top-left coordinates).
    ///
    /// Returns negative infinity when the placement does not fit.
    fn score_at(frame: &Frame, plan: &TemplatePlan, x: usize, y: usize) -> f32;

    /// Scans every valid placement and returns the first maximum in
    /// row-major order.
    fn scan_full(frame: &Frame, plan: &TemplatePlan) -> TriggerResult<Peak>;
}

pub(crate) fn check_fits(frame: &Frame, plan: &TemplatePlan) -> TriggerResult<()> {
    if plan.size().fits_within(frame.size()) {
        return Ok(());
    }
    Err(TriggerError::TemplateLargerThanFrame {
        template_width: plan.width(),
        template_height: plan.height(),
        frame_width: frame.width(),
        frame_height: frame.height(),
    })
}

/// Scores one placement given its precomputed window stats.
///
/// A flat template or a flat window has no correlation signal: the score is
/// 1.0 when both are flat with identical channel means, otherwise 0.0.
pub(crate) fn window_score(
    frame: &Frame,
    plan: &TemplatePlan,
    x: usize,
    y: usize,
    stats: &WindowStats,
) -> f64 {
    let n = plan.pixel_count();
    let window_energy: f64 = (0..CHANNELS)
        .map(|c| centered_energy(stats.sum[c], stats.sum_sq[c], n))
        .sum();

    if plan.is_flat() || window_energy <= 0.0 {
        let identical = plan.is_flat() && window_energy <= 0.0 && stats.sum == *plan.channel_sums();
        return if identical { 1.0 } else { 0.0 };
    }

    let start = x * CHANNELS;
    let end = start + plan.width() * CHANNELS;
    let mut dot = 0.0f64;
    for ty in 0..plan.height() {
        let Some(row) = frame.row(y + ty) else {
            return f64::NEG_INFINITY;
        };
        dot += plan
            .zero_mean_row(ty)
            .iter()
            .zip(&row[start..end])
            .map(|(&t, &v)| t * v as f64)
            .sum::<f64>();
    }

    let score = dot / (plan.energy() * window_energy).sqrt();
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Returns the first maximum of row `y`, whose band sums are in `columns`.
pub(crate) fn best_in_row(
    frame: &Frame,
    plan: &TemplatePlan,
    y: usize,
    columns: &ColumnSums,
) -> Option<Peak> {
    let mut best: Option<Peak> = None;
    for (x, stats) in columns.windows(plan.width()).iter().enumerate() {
        let score = window_score(frame, plan, x, y, stats) as f32;
        if best.map_or(true, |b| score > b.score) {
            best = Some(Peak { x, y, score });
        }
    }
    best
}

/// Keeps the earlier peak on ties. Callers fold rows in ascending y.
pub(crate) fn keep_first_max(best: Option<Peak>, candidate: Option<Peak>) -> Option<Peak> {
    match (best, candidate) {
        (Some(b), Some(c)) if c.score > b.score => Some(c),
        (Some(b), _) => Some(b),
        (None, c) => c,
    }
}

pub(crate) fn no_placement(frame: &Frame) -> TriggerError {
    TriggerError::InvalidDimensions {
        width: frame.width(),
        height: frame.height(),
    }
}

/// Row band starting at `y`, used by kernels that score rows independently.
#[cfg(feature = "rayon")]
pub(crate) fn row_band(frame: &Frame, plan: &TemplatePlan, y: usize) -> ColumnSums {
    ColumnSums::new(frame, y, plan.height())
}
