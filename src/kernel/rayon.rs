//! Rayon-parallel kernel (feature-gated).
//!
//! Rows of placements are scored independently, each with its own band of
//! column sums, then reduced in ascending row order so ties resolve exactly
//! as in the scalar kernel.

use crate::frame::Frame;
use crate::kernel::{best_in_row, check_fits, keep_first_max, no_placement, row_band, Peak};
use crate::template::TemplatePlan;
use crate::trace::trace_span;
use crate::util::TriggerResult;
use rayon::prelude::*;

/// Row-parallel full scan for the ZNCC kernel.
pub fn zncc_scan_full_par(frame: &Frame, plan: &TemplatePlan) -> TriggerResult<Peak> {
    check_fits(frame, plan)?;
    let _span = trace_span!(
        "zncc_scan_par",
        frame_width = frame.width(),
        frame_height = frame.height(),
        template_width = plan.width(),
        template_height = plan.height()
    )
    .entered();

    let max_y = frame.height() - plan.height();
    let row_results: Vec<Option<Peak>> = (0..=max_y)
        .into_par_iter()
        .map(|y| best_in_row(frame, plan, y, &row_band(frame, plan, y)))
        .collect();

    row_results
        .into_iter()
        .fold(None, keep_first_max)
        .ok_or_else(|| no_placement(frame))
}
