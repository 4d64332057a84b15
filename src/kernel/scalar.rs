//! Scalar reference kernel for score evaluation.

use crate::frame::Frame;
use crate::kernel::window::{window_stats_at, ColumnSums};
use crate::kernel::{best_in_row, check_fits, keep_first_max, no_placement, window_score};
use crate::kernel::{Kernel, Peak};
use crate::template::TemplatePlan;
use crate::trace::trace_span;
use crate::util::TriggerResult;

/// Scalar multi-channel ZNCC kernel.
pub struct ZnccScalar;

impl Kernel for ZnccScalar {
    fn score_at(frame: &Frame, plan: &TemplatePlan, x: usize, y: usize) -> f32 {
        if check_fits(frame, plan).is_err() {
            return f32::NEG_INFINITY;
        }
        if x > frame.width() - plan.width() || y > frame.height() - plan.height() {
            return f32::NEG_INFINITY;
        }
        let stats = window_stats_at(frame, x, y, plan.width(), plan.height());
        window_score(frame, plan, x, y, &stats) as f32
    }

    fn scan_full(frame: &Frame, plan: &TemplatePlan) -> TriggerResult<Peak> {
        check_fits(frame, plan)?;
        let _span = trace_span!(
            "zncc_scan",
            frame_width = frame.width(),
            frame_height = frame.height(),
            template_width = plan.width(),
            template_height = plan.height()
        )
        .entered();

        let max_y = frame.height() - plan.height();
        let mut columns = ColumnSums::new(frame, 0, plan.height());
        let mut best = None;
        for y in 0..=max_y {
            if y > 0 {
                columns.advance(frame);
            }
            best = keep_first_max(best, best_in_row(frame, plan, y, &columns));
        }
        best.ok_or_else(|| no_placement(frame))
    }
}
